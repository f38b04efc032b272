#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::store::{favorites::DEFAULT_FAVORITE_NAME, EntityStore};
    use crate::tests::{count, test_store};
    use crate::types::{
        CreateEntryRequest, CreateFavoriteRequest, CreateUserRequest, DisplayStyle, EntryFilter, FavoriteFilter,
        LayoutStyle, Paging, Priority, TagRelation, UpdateEntryRequest, UpdateSettingRequest, User,
    };

    async fn user(store: &EntityStore, name: &str) -> User {
        store.create_user(&CreateUserRequest { username: name.to_string(), email: None }).await.unwrap()
    }

    fn entry_req(belong: i64, url: &str, tags: Option<Vec<i64>>) -> CreateEntryRequest {
        CreateEntryRequest {
            belong,
            url: url.to_string(),
            title: Some("  Rust  ".to_string()),
            priority: Some(Priority::High),
            remark: Some("read later".to_string()),
            tags,
        }
    }

    #[tokio::test]
    async fn test_entry_tags_and_filter() {
        let store = test_store().await;
        let u = user(&store, "alice").await;
        let favorite_id = u.default_favor.unwrap();
        let rust = store.create_tag("rust").await.unwrap();
        let web = store.create_tag("web").await.unwrap();

        let entry = store
            .create_entry(&entry_req(favorite_id, "https://www.rust-lang.org", Some(vec![web.id, rust.id])))
            .await
            .unwrap();
        assert_eq!(entry.title, "Rust");
        assert_eq!(entry.priority, Priority::High);
        assert_eq!(entry.tags, {
            let mut ids = vec![rust.id, web.id];
            ids.sort_unstable();
            ids
        });

        let tagged = store.list_entries(&EntryFilter { tag: Some(rust.id), ..Default::default() }).await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].id, entry.id);

        let updated = store
            .update_entry(entry.id, &UpdateEntryRequest { tags: Some(vec![web.id]), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(updated.tags, vec![web.id]);
        assert!(store.list_entries(&EntryFilter { tag: Some(rust.id), ..Default::default() }).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tag_rolls_back_entry() {
        let store = test_store().await;
        let u = user(&store, "bob").await;
        let favorite_id = u.default_favor.unwrap();

        let err = store.create_entry(&entry_req(favorite_id, "https://example.org", Some(vec![404]))).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(count(store.pool(), "entries").await, 1);
        assert_eq!(store.get_favorite(favorite_id).await.unwrap().entries_num, 1);
    }

    #[tokio::test]
    async fn test_tag_relations() {
        let store = test_store().await;
        let u = user(&store, "cleo").await;
        let entry = store.list_entries(&EntryFilter::default()).await.unwrap().remove(0);
        let tag = store.create_tag("news").await.unwrap();

        let relation = TagRelation { entry_id: entry.id, tag_id: tag.id };
        store.attach_tag(&relation).await.unwrap();
        assert!(matches!(store.attach_tag(&relation).await, Err(AppError::Conflict(_))));
        assert_eq!(store.list_tag_relations(&Paging::default()).await.unwrap(), vec![relation.clone()]);
        assert_eq!(store.get_entry(entry.id).await.unwrap().tags, vec![tag.id]);

        store.detach_tag(entry.id, tag.id).await.unwrap();
        assert!(matches!(store.detach_tag(entry.id, tag.id).await, Err(AppError::NotFound(_))));

        store.attach_tag(&relation).await.unwrap();
        store.delete_tag(tag.id).await.unwrap();
        assert!(store.get_entry(entry.id).await.unwrap().tags.is_empty());
        assert_eq!(store.get_favorite(u.default_favor.unwrap()).await.unwrap().entries_num, 1);
    }

    #[tokio::test]
    async fn test_tag_name_rules() {
        let store = test_store().await;
        assert!(matches!(store.create_tag("   ").await, Err(AppError::ValidationError { .. })));
        assert!(matches!(store.create_tag(&"x".repeat(17)).await, Err(AppError::ValidationError { .. })));
        let tag = store.create_tag("go").await.unwrap();
        assert_eq!(store.rename_tag(tag.id, "golang").await.unwrap().name, "golang");
        assert!(matches!(store.rename_tag(999, "x").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_setting() {
        let store = test_store().await;
        let u = user(&store, "dora").await;
        let setting = store.get_user_setting(u.id).await.unwrap();

        let req = UpdateSettingRequest {
            display_style: Some(DisplayStyle::Short),
            layout_style: None,
            quick_mode: Some(true),
        };
        let updated = store.update_setting(setting.id, &req).await.unwrap();
        assert_eq!(updated.display_style, DisplayStyle::Short);
        assert_eq!(updated.layout_style, LayoutStyle::Medium);
        assert!(updated.quick_mode);
        assert_eq!(store.get_setting(setting.id).await.unwrap(), updated);
        assert!(matches!(store.update_setting(999, &req).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_paths() {
        let store = test_store().await;
        let u = user(&store, "emil").await;
        let avatar = store.assign_avatar(u.id, "avatar", "me.PNG").await.unwrap();
        assert!(avatar.starts_with("avatar/emil/"));
        assert!(avatar.ends_with(".PNG"));
        assert_eq!(store.get_user(u.id).await.unwrap().avatar.as_deref(), Some(avatar.as_str()));

        let entry = store.list_entries(&EntryFilter::default()).await.unwrap().remove(0);
        let thumb = store.assign_thumbnail(entry.id, "thumbnail", "shot.jpg").await.unwrap();
        assert!(thumb.starts_with(&format!("thumbnail/{}/", entry.id)));
        assert_eq!(store.get_entry(entry.id).await.unwrap().thumbnail.as_deref(), Some(thumb.as_str()));

        let err = store.assign_avatar(u.id, "avatar", "noextension").await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError { ref field, .. } if field == "filename"));
        assert!(matches!(store.assign_avatar(999, "avatar", "a.png").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_record_visit() {
        let store = test_store().await;
        user(&store, "finn").await;
        let entry = store.list_entries(&EntryFilter::default()).await.unwrap().remove(0);
        store.record_visit(entry.id).await.unwrap();
        assert_eq!(store.record_visit(entry.id).await.unwrap().views, 2);
        assert!(matches!(store.record_visit(999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_listing_filters_and_paging() {
        let store = test_store().await;
        let a = user(&store, "gus").await;
        let b = user(&store, "hana").await;
        for name in ["one", "two"] {
            store
                .create_favorite(&CreateFavoriteRequest { name: Some(name.into()), is_public: None, created_by: a.id })
                .await
                .unwrap();
        }

        let mine = store
            .list_favorites(&FavoriteFilter { created_by: Some(a.id), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(mine.len(), 3);
        assert!(mine.iter().all(|f| f.created_by == a.id));

        let page = store
            .list_favorites(&FavoriteFilter { limit: Some(2), offset: Some(2), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let by_b = store.list_entries(&EntryFilter { created_by: Some(b.id), ..Default::default() }).await.unwrap();
        assert_eq!(by_b.len(), 1);
        assert_eq!(store.list_users(&Paging { limit: Some(1), offset: Some(1) }).await.unwrap()[0].id, b.id);
    }

    #[tokio::test]
    async fn test_unnamed_favorite_gets_default_name() {
        let store = test_store().await;
        let u = user(&store, "gus").await;
        let favorite = store
            .create_favorite(&CreateFavoriteRequest { name: None, is_public: None, created_by: u.id })
            .await
            .unwrap();
        assert_eq!(favorite.name, DEFAULT_FAVORITE_NAME);
        assert_eq!(favorite.created_by, u.id);
        assert!(!favorite.is_public);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_connection_usable() {
        let store = test_store().await;
        let err = store.create_entry(&entry_req(404, "https://example.org", None)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Single pooled connection: a leftover open transaction would make this fail
        let u = user(&store, "hugo").await;
        store.create_entry(&entry_req(u.default_favor.unwrap(), "https://example.org", None)).await.unwrap();
        assert_eq!(store.get_favorite(u.default_favor.unwrap()).await.unwrap().entries_num, 2);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let store = test_store().await;
        let u = user(&store, "ines").await;
        let favorite_id = u.default_favor.unwrap();

        let bad_url = CreateEntryRequest { url: "ftp://example.org".into(), ..entry_req(favorite_id, "", None) };
        assert!(matches!(store.create_entry(&bad_url).await, Err(AppError::ValidationError { .. })));

        let long_title = CreateEntryRequest { title: Some("t".repeat(129)), ..entry_req(favorite_id, "https://a.io", None) };
        assert!(matches!(store.create_entry(&long_title).await, Err(AppError::ValidationError { .. })));

        let bad_name = CreateUserRequest { username: "no spaces".into(), email: None };
        assert!(matches!(store.create_user(&bad_name).await, Err(AppError::ValidationError { .. })));

        let no_owner = CreateFavoriteRequest { name: None, is_public: None, created_by: 999 };
        assert!(matches!(store.create_favorite(&no_owner).await, Err(AppError::NotFound(_))));
    }
}
