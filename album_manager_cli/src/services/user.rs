use serde::{Deserialize, Serialize};

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::role::Role;
use crate::User;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UpdateRoleRequest {
    pub role: String,
}

/// User administration over `/users`. The server only answers these for ADMIN.
#[derive(Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_all_users(&self) -> Result<Vec<User>, ClientError> {
        self.api.get("/users").await
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<User, ClientError> {
        self.api.get(&format!("/users/{}", id)).await
    }

    pub async fn update_user_role(&self, id: i64, role: Role) -> Result<User, ClientError> {
        let body = UpdateRoleRequest {
            role: role.as_str().to_string(),
        };
        self.api.put(&format!("/users/{}/role", id), &body).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ClientError> {
        self.api.delete(&format!("/users/{}", id)).await
    }
}
