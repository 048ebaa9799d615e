//! Terminal renditions of the client's screens.
//!
//! Each view owns its own state (the loaded rows, an optional error banner,
//! which row is being edited or awaits delete confirmation) and talks to
//! exactly one service. Methods take `&mut self`, so a view never has two
//! requests in flight. After every mutation the view reloads its list.

pub mod album_list;
pub mod auth;
pub mod home;
pub mod user_management;

pub use album_list::AlbumListView;
pub use auth::{LoginPage, RegisterPage};
pub use home::HomeView;
pub use user_management::UserManagementView;

use crate::error::ClientError;

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Text for the dismissible error banner.
pub fn describe(err: &ClientError, fallback: &str) -> String {
    match err {
        ClientError::Unauthorized => SESSION_EXPIRED.to_string(),
        ClientError::Validation(e) => capitalize(&e.to_string()),
        other => other
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string()),
    }
}

pub(crate) fn banner(error: Option<&str>) -> String {
    match error {
        Some(msg) => format!("❌ {}  [x]\n", msg),
        None => String::new(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormError;
    use reqwest::StatusCode;

    #[test]
    fn describe_prefers_server_message() {
        let err = ClientError::from_status(StatusCode::BAD_REQUEST, Some("Username already exists".into()));
        assert_eq!(describe(&err, "fallback"), "Username already exists");

        let err = ClientError::from_status(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(describe(&err, "Could not save the album."), "Could not save the album.");
    }

    #[test]
    fn describe_special_cases() {
        assert_eq!(describe(&ClientError::Unauthorized, "x"), SESSION_EXPIRED);
        assert_eq!(
            describe(&FormError::MissingTitleOrArtist.into(), "x"),
            "Title and artist are required"
        );
    }

    #[test]
    fn banner_is_empty_without_error() {
        assert_eq!(banner(None), "");
        assert_eq!(banner(Some("boom")), "❌ boom  [x]\n");
    }
}
