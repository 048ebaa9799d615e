//! Session persistence and the in-memory session context.
//!
//! The persisted form is two storage keys: `token` holds the raw bearer token
//! and `user` holds `{id?, username, role}` as JSON. The context is what the
//! views consult; it is hydrated from storage once at startup and afterwards
//! only changes through login, register, logout or a 401 from the server.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ClientError;
use crate::forms::{LoginForm, RegisterForm};
use crate::role::{self, Capabilities};
use crate::services::auth::{AuthResponse, AuthService};
use crate::storage::SharedStorage;
use crate::token;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub username: String,
    pub role: String,
}

impl UserInfo {
    pub fn normalized_role(&self) -> &str {
        role::normalize(&self.role)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities::for_role_str(&self.role, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserInfo,
}

impl From<AuthResponse> for Session {
    fn from(resp: AuthResponse) -> Self {
        Session {
            token: resp.token,
            user: UserInfo {
                id: resp.user_id,
                username: resp.username,
                role: resp.role,
            },
        }
    }
}

/// Reads and writes the two session keys.
#[derive(Clone)]
pub struct SessionStore {
    storage: SharedStorage,
}

impl SessionStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub fn token(&self) -> Result<Option<String>, ClientError> {
        Ok(self
            .storage
            .get(TOKEN_KEY)?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    /// The stored user info. Unreadable JSON counts as no user.
    pub fn user(&self) -> Result<Option<UserInfo>, ClientError> {
        let Some(raw) = self.storage.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("ignoring malformed stored user info: {}", e);
                Ok(None)
            }
        }
    }

    pub fn is_authenticated(&self) -> Result<bool, ClientError> {
        Ok(self.token()?.is_some())
    }

    pub fn load(&self) -> Result<Option<Session>, ClientError> {
        match (self.token()?, self.user()?) {
            (Some(token), Some(user)) => Ok(Some(Session { token, user })),
            _ => Ok(None),
        }
    }

    /// Writes both keys. If the second write fails the first is rolled back.
    pub fn save(&self, session: &Session) -> Result<(), ClientError> {
        let user_json = serde_json::to_string(&session.user)?;
        self.storage.set(TOKEN_KEY, &session.token)?;
        if let Err(e) = self.storage.set(USER_KEY, &user_json) {
            let _ = self.storage.remove(TOKEN_KEY);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ClientError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        Ok(())
    }
}

/// Who is logged in right now.
pub struct SessionContext {
    auth: AuthService,
    current: Option<UserInfo>,
}

impl SessionContext {
    /// Restores the persisted session. A half-written or already expired
    /// session is cleared rather than restored.
    pub fn hydrate(auth: AuthService) -> Result<Self, ClientError> {
        let store = auth.session();
        let current = match store.load()? {
            Some(session) if token_expired(&session.token) => {
                info!(username = %session.user.username, "stored token has expired, clearing session");
                store.clear()?;
                None
            }
            Some(session) => Some(session.user),
            None => {
                if store.token()?.is_some() || store.user()?.is_some() {
                    store.clear()?;
                }
                None
            }
        };
        Ok(Self { auth, current })
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn current_user(&self) -> Option<&UserInfo> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.current
            .as_ref()
            .map(UserInfo::capabilities)
            .unwrap_or_else(Capabilities::anonymous)
    }

    pub async fn login(&mut self, form: &LoginForm) -> Result<&UserInfo, ClientError> {
        let request = form.validate()?;
        let resp = self.auth.login(&request).await?;
        self.establish(resp.into())
    }

    pub async fn register(&mut self, form: &RegisterForm) -> Result<&UserInfo, ClientError> {
        let request = form.validate()?;
        let resp = self.auth.register(&request).await?;
        self.establish(resp.into())
    }

    pub fn logout(&mut self) -> Result<(), ClientError> {
        self.auth.logout()?;
        if let Some(user) = self.current.take() {
            info!(username = %user.username, "logged out");
        }
        Ok(())
    }

    /// Drops the in-memory user when a request came back 401. The api client
    /// has already wiped the persisted keys by then.
    pub fn observe(&mut self, err: &ClientError) {
        if err.is_unauthorized() {
            self.current = None;
        }
    }

    fn establish(&mut self, session: Session) -> Result<&UserInfo, ClientError> {
        self.auth.save_user(&session)?;
        info!(username = %session.user.username, role = %session.user.role, "session established");
        Ok(self.current.insert(session.user))
    }
}

fn token_expired(raw: &str) -> bool {
    match token::read_claims(raw) {
        Ok(claims) => claims.is_expired(),
        // Opaque tokens are the server's business.
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::{MemoryStorage, Storage};

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let memory = Arc::new(MemoryStorage::new());
        (memory.clone(), SessionStore::new(memory))
    }

    fn session() -> Session {
        Session {
            token: "tok".into(),
            user: UserInfo {
                id: Some(3),
                username: "ana".into(),
                role: "ROLE_EDITOR".into(),
            },
        }
    }

    #[test]
    fn save_writes_both_keys() {
        let (memory, store) = store();
        store.save(&session()).unwrap();

        assert_eq!(memory.get(TOKEN_KEY).unwrap().as_deref(), Some("tok"));
        let raw = memory.get(USER_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["username"], "ana");
        assert_eq!(json["id"], 3);
        assert_eq!(store.load().unwrap(), Some(session()));
    }

    #[test]
    fn clear_removes_everything() {
        let (memory, store) = store();
        store.save(&session()).unwrap();
        store.clear().unwrap();
        assert!(memory.is_empty());
        assert!(!store.is_authenticated().unwrap());
    }

    #[test]
    fn malformed_user_json_is_ignored() {
        let (memory, store) = store();
        memory.set(TOKEN_KEY, "tok").unwrap();
        memory.set(USER_KEY, "{not json").unwrap();
        assert_eq!(store.user().unwrap(), None);
        assert_eq!(store.load().unwrap(), None);
        assert!(store.is_authenticated().unwrap());
    }

    #[test]
    fn blank_token_is_no_token() {
        let (memory, store) = store();
        memory.set(TOKEN_KEY, "  \n").unwrap();
        assert_eq!(store.token().unwrap(), None);
    }

    #[test]
    fn user_info_capabilities_follow_role() {
        let user = session().user;
        assert_eq!(user.normalized_role(), "EDITOR");
        assert!(user.capabilities().can_create_album());
        assert!(!user.capabilities().can_manage_users());
    }
}
