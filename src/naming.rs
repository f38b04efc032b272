//! Storage names for uploaded images.
//!
//! Uploaded avatars and thumbnails are stored under
//! `<sub_path>/<owner_identifier>/<token>.<extension>`. The token is a fresh random
//! 128-bit value, so two uploads of the same file never collide. Nothing here touches the
//! disk; the caller (or an external storage service) writes the bytes.

use thiserror::Error;
use uuid::Uuid;

use crate::types::{Entry, User};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("filename must not be empty")]
    EmptyFilename,
    #[error("filename '{0}' has no extension")]
    MissingExtension(String),
    #[error("sub path must not be empty")]
    EmptySubPath,
}

/// Whoever owns an uploaded file. Users are identified by username, entries by id.
#[derive(Debug, Clone, Copy)]
pub struct StorageOwner<'a> {
    pub id: i64,
    pub username: Option<&'a str>,
}

impl<'a> StorageOwner<'a> {
    fn identifier(&self) -> String {
        match self.username {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.id.to_string(),
        }
    }
}

impl<'a> From<&'a User> for StorageOwner<'a> {
    fn from(user: &'a User) -> Self {
        Self { id: user.id, username: Some(user.username.as_str()) }
    }
}

impl<'a> From<&'a Entry> for StorageOwner<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self { id: entry.id, username: None }
    }
}

/// Builds `<sub_path>/<owner>/<32 hex chars>.<ext>` for an uploaded file.
///
/// The extension is the text after the last `.` of the final path component of
/// `original_filename`. A name without one is rejected rather than defaulted.
pub fn build_storage_path(
    sub_path: &str,
    owner: StorageOwner<'_>,
    original_filename: &str,
) -> Result<String, NamingError> {
    let sub_path = sub_path.trim_matches('/');
    if sub_path.is_empty() {
        return Err(NamingError::EmptySubPath);
    }
    let ext = extension_of(original_filename)?;
    let token = Uuid::new_v4().simple().to_string();
    Ok(format!("{}/{}/{}.{}", sub_path, owner.identifier(), token, ext))
}

fn extension_of(filename: &str) -> Result<&str, NamingError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(NamingError::EmptyFilename);
    }
    // Browsers on Windows may send the full client path
    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    match base.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Ok(ext),
        _ => Err(NamingError::MissingExtension(filename.to_string())),
    }
}
