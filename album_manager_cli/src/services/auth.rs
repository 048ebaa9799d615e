use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::session::{Session, SessionStore, UserInfo};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Talks to `/auth` and owns the persisted session keys.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn session(&self) -> &SessionStore {
        self.api.session()
    }

    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.api.post("/auth/login", credentials).await
    }

    pub async fn register(&self, user: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        self.api.post("/auth/register", user).await
    }

    /// Local only; the server keeps no session to end.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.session().clear()
    }

    pub fn is_authenticated(&self) -> Result<bool, ClientError> {
        self.session().is_authenticated()
    }

    pub fn token(&self) -> Result<Option<String>, ClientError> {
        self.session().token()
    }

    pub fn save_user(&self, session: &Session) -> Result<(), ClientError> {
        self.session().save(session)
    }

    pub fn get_user(&self) -> Result<Option<UserInfo>, ClientError> {
        self.session().user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_response_with_and_without_user_id() {
        let resp: AuthResponse =
            serde_json::from_str(r#"{"token":"t","username":"ana","role":"ROLE_USER"}"#).unwrap();
        assert_eq!(resp.user_id, None);

        let resp: AuthResponse =
            serde_json::from_str(r#"{"token":"t","username":"ana","role":"USER","userId":9}"#).unwrap();
        assert_eq!(resp.user_id, Some(9));
    }

    #[test]
    fn register_request_omits_missing_role() {
        let req = RegisterRequest {
            username: "ana".into(),
            password: "secret".into(),
            role: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("role").is_none());
    }
}
