//! Role tiers and the capability table the client uses to hide actions.
//!
//! Everything here is advisory. The server re-checks every request, so a
//! wrong answer only ever shows or hides a button.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Album;

const ROLE_PREFIX: &str = "ROLE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Editor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Editor, Role::Admin];

    /// Roles a visitor may pick for themselves when registering.
    pub const SELF_ASSIGNABLE: [Role; 2] = [Role::User, Role::Editor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Editor => "EDITOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Parses a role string as the server sends it, with or without the `ROLE_` prefix.
    pub fn parse(raw: &str) -> Option<Role> {
        match normalize(raw).to_ascii_uppercase().as_str() {
            "USER" => Some(Role::User),
            "EDITOR" => Some(Role::Editor),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}', expected USER, EDITOR or ADMIN", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Strips a leading `ROLE_` so `ROLE_ADMIN` and `ADMIN` compare equal.
pub fn normalize(raw: &str) -> &str {
    raw.strip_prefix(ROLE_PREFIX).unwrap_or(raw)
}

/// What the acting user may see and do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    authenticated: bool,
    role: Option<Role>,
    user_id: Option<i64>,
}

impl Capabilities {
    /// Capabilities of a logged-in user. An unrecognised role still views albums.
    pub fn new(role: Option<Role>, user_id: Option<i64>) -> Self {
        Self {
            authenticated: true,
            role,
            user_id,
        }
    }

    pub fn for_role_str(raw: &str, user_id: Option<i64>) -> Self {
        Self::new(Role::parse(raw), user_id)
    }

    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            role: None,
            user_id: None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn can_view_albums(&self) -> bool {
        self.authenticated
    }

    pub fn can_create_album(&self) -> bool {
        matches!(self.role, Some(Role::Editor | Role::Admin))
    }

    /// ADMIN may modify any album; EDITOR only albums whose owner id matches theirs.
    pub fn can_modify_album(&self, album: &Album) -> bool {
        match self.role {
            Some(Role::Admin) => true,
            Some(Role::Editor) => match (self.user_id, album.user_id) {
                (Some(me), Some(owner)) => me == owner,
                _ => false,
            },
            _ => false,
        }
    }

    pub fn can_manage_users(&self) -> bool {
        self.role == Some(Role::Admin)
    }
}
