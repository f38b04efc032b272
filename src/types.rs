use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub default_favor: Option<i64>,
    pub date_joined: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Favorite {
    pub id: i64,
    pub name: String,
    pub is_public: bool,
    pub entries_num: i64,
    pub created_by: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Bookmark priority, stored as 1 / 0 / -1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_i64(self) -> i64 {
        match self {
            Priority::High => 1,
            Priority::Medium => 0,
            Priority::Low => -1,
        }
    }

    pub fn from_i64(v: i64) -> Self {
        match v {
            x if x > 0 => Priority::High,
            0 => Priority::Medium,
            _ => Priority::Low,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub priority: Priority,
    pub remark: String,
    pub is_public: bool,
    pub views: i64,
    pub belong: i64,
    pub created_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub tags: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagRelation {
    pub entry_id: i64,
    pub tag_id: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DisplayStyle {
    Detail,
    #[default]
    Medium,
    Short,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum LayoutStyle {
    Wide,
    #[default]
    Medium,
    Narrow,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant),)+
                }
            }

            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $(stringify!($variant) => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

text_enum!(DisplayStyle { Detail, Medium, Short });
text_enum!(LayoutStyle { Wide, Medium, Narrow });

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Setting {
    pub id: i64,
    pub owner: i64,
    pub display_style: DisplayStyle,
    pub layout_style: LayoutStyle,
    pub quick_mode: bool,
}

// Request bodies

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub default_favor: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFavoriteRequest {
    pub name: Option<String>,
    pub is_public: Option<bool>,
    pub created_by: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFavoriteRequest {
    pub name: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub belong: i64,
    pub url: String,
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub remark: Option<String>,
    pub tags: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEntryRequest {
    pub belong: Option<i64>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub remark: Option<String>,
    pub is_public: Option<bool>,
    pub tags: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSettingRequest {
    pub display_style: Option<DisplayStyle>,
    pub layout_style: Option<LayoutStyle>,
    pub quick_mode: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub path: String,
}

/// Result of a bulk purge or count repair on one favorite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountAdjustment {
    pub favorite_id: i64,
    pub entries_num: i64,
    pub changed_by: i64,
}

// Query strings

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoriteFilter {
    pub created_by: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryFilter {
    pub belong: Option<i64>,
    pub created_by: Option<i64>,
    pub tag: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE_SIZE: i64 = 1000;
