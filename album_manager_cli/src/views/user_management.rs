use std::fmt::Write as _;

use tracing::info;

use super::{banner, describe};
use crate::error::ClientError;
use crate::role::{self, Role};
use crate::services::UserService;
use crate::session::UserInfo;
use crate::User;

const LOAD_FAILED: &str = "Could not load users.";
const LOAD_FORBIDDEN: &str =
    "You do not have permission to view users. Only administrators can access this section.";
const ROLE_FAILED: &str = "Could not update the user's role.";
const DELETE_FAILED: &str = "Could not delete the user.";
const SELF_DELETE: &str = "You cannot delete your own account!";

/// ADMIN screen listing every non-admin account.
pub struct UserManagementView {
    service: UserService,
    acting: UserInfo,
    users: Vec<User>,
    loading: bool,
    error: Option<String>,
    editing: Option<(i64, Role)>,
    delete_confirm: Option<i64>,
}

impl UserManagementView {
    pub fn new(service: UserService, acting: UserInfo) -> Self {
        Self {
            service,
            acting,
            users: Vec::new(),
            loading: true,
            error: None,
            editing: None,
            delete_confirm: None,
        }
    }

    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.loading = true;
        self.error = None;
        let result = self.service.get_all_users().await;
        self.loading = false;
        match result {
            Ok(users) => {
                self.users = users
                    .into_iter()
                    .filter(|u| !self.is_self(u) && Role::parse(&u.role) != Some(Role::Admin))
                    .collect();
                Ok(())
            }
            Err(e) => {
                self.error = Some(if e.is_forbidden() {
                    LOAD_FORBIDDEN.to_string()
                } else {
                    describe(&e, LOAD_FAILED)
                });
                Err(e)
            }
        }
    }

    /// Matches on id when the session knows it, otherwise on username.
    pub fn is_self(&self, user: &User) -> bool {
        match self.acting.id {
            Some(id) => id == user.id,
            None => self.acting.username == user.username,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Starts the inline role editor on the user's current role.
    pub fn start_role_edit(&mut self, id: i64) -> bool {
        let Some(user) = self.users.iter().find(|u| u.id == id) else {
            return false;
        };
        let current = Role::parse(&user.role).unwrap_or(Role::User);
        self.editing = Some((id, current));
        true
    }

    pub fn editing(&self) -> Option<(i64, Role)> {
        self.editing
    }

    pub fn choose_role(&mut self, role: Role) {
        if let Some((_, pending)) = self.editing.as_mut() {
            *pending = role;
        }
    }

    pub fn cancel_role_edit(&mut self) {
        self.editing = None;
    }

    pub async fn save_role(&mut self) -> Result<(), ClientError> {
        let Some((id, role)) = self.editing else {
            return Ok(());
        };
        self.error = None;

        match self.service.update_user_role(id, role).await {
            Ok(updated) => {
                info!(id, role = %role, username = %updated.username, "role updated");
                self.editing = None;
                self.load().await
            }
            Err(e) => {
                self.error = Some(describe(&e, ROLE_FAILED));
                Err(e)
            }
        }
    }

    /// Refuses the acting admin's own account.
    pub fn request_delete(&mut self, id: i64) -> bool {
        let is_self = match self.acting.id {
            Some(me) => me == id,
            None => self
                .users
                .iter()
                .any(|u| u.id == id && u.username == self.acting.username),
        };
        if is_self {
            self.error = Some(SELF_DELETE.to_string());
            return false;
        }
        self.delete_confirm = Some(id);
        true
    }

    pub fn pending_delete(&self) -> Option<i64> {
        self.delete_confirm
    }

    pub fn cancel_delete(&mut self) {
        self.delete_confirm = None;
    }

    pub async fn confirm_delete(&mut self) -> Result<(), ClientError> {
        let Some(id) = self.delete_confirm else {
            return Ok(());
        };
        self.error = None;

        let result = self.service.delete_user(id).await;
        self.delete_confirm = None;
        match result {
            Ok(()) => {
                info!(id, "user deleted");
                self.load().await
            }
            Err(e) => {
                self.error = Some(describe(&e, DELETE_FAILED));
                Err(e)
            }
        }
    }

    pub fn render(&self) -> String {
        if self.loading {
            return "Loading users...\n".to_string();
        }

        let mut out = String::from("👥 User Management\n");
        out.push_str(&banner(self.error.as_deref()));

        if let Some(id) = self.delete_confirm {
            let _ = writeln!(
                out,
                "⚠️ Confirm delete of user #{}: this action cannot be undone. [Cancel] [Delete]",
                id
            );
        }

        if self.users.is_empty() {
            out.push_str("No users yet.\n");
            return out;
        }

        let _ = writeln!(out, "{:<6} {:<20} {:<22} {:<9} Actions", "ID", "Username", "Role", "Status");
        for user in &self.users {
            let role_cell = match self.editing {
                Some((id, pending)) if id == user.id => {
                    let options: Vec<String> = Role::ALL
                        .iter()
                        .map(|r| if *r == pending { format!("({})", r) } else { r.to_string() })
                        .collect();
                    format!("{} ✓ ✕", options.join(" "))
                }
                _ => role::normalize(&user.role).to_string(),
            };
            let status = if user.enabled { "Active" } else { "Disabled" };

            let mut actions = Vec::new();
            if self.editing.map(|(id, _)| id) != Some(user.id) {
                actions.push("[Change role]");
            }
            if !self.is_self(user) {
                actions.push("[Delete]");
            }
            let _ = writeln!(
                out,
                "{:<6} {:<20} {:<22} {:<9} {}",
                user.id,
                user.username,
                role_cell,
                status,
                actions.join(" ")
            );
        }
        out
    }
}
