pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod role;
pub mod router;
pub mod services;
pub mod session;
pub mod sort;
pub mod storage;
pub mod token;
pub mod views;

pub use error::ClientError;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Owner of the album. Set by the server on creation, never by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl Album {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            ..Self::default()
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl User {
    pub fn normalized_role(&self) -> &str {
        role::normalize(&self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn album_uses_camel_case_and_omits_absent_fields() {
        let mut album = Album::new("Kind of Blue", "Miles Davis");
        album.release_year = Some(1959);
        album.record_label = Some("Columbia".into());

        let json = serde_json::to_value(&album).unwrap();
        assert_eq!(json["releaseYear"], 1959);
        assert_eq!(json["recordLabel"], "Columbia");
        assert!(json.get("id").is_none());
        assert!(json.get("userId").is_none());
        assert!(json.get("price").is_none());
    }

    #[test]
    fn album_parses_server_payload() {
        let album: Album = serde_json::from_str(
            r#"{"id":4,"title":"Blue Train","artist":"John Coltrane","price":49.99,"stock":0,"userId":2}"#,
        )
        .unwrap();
        assert_eq!(album.id, Some(4));
        assert_eq!(album.price, Some(49.99));
        assert_eq!(album.stock, Some(0));
        assert_eq!(album.user_id, Some(2));
        assert!(album.is_persisted());
    }

    #[test]
    fn user_without_enabled_flag_defaults_to_enabled() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"username":"ana","role":"ROLE_EDITOR"}"#).unwrap();
        assert!(user.enabled);
        assert_eq!(user.normalized_role(), "EDITOR");
    }
}
