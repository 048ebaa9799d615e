use crate::error::ClientError;
use crate::services::{AlbumService, UserService};
use crate::session::SessionContext;

use super::{AlbumListView, UserManagementView};

/// The protected main page.
pub struct HomeView {
    username: String,
    role: String,
    albums: AlbumListView,
    users: Option<UserManagementView>,
}

impl HomeView {
    /// `None` when nobody is logged in.
    pub fn new(ctx: &SessionContext, albums: AlbumService, users: UserService) -> Option<Self> {
        let user = ctx.current_user()?;
        let caps = ctx.capabilities();
        Some(Self {
            username: user.username.clone(),
            role: user.normalized_role().to_string(),
            albums: AlbumListView::new(albums, caps),
            users: caps
                .can_manage_users()
                .then(|| UserManagementView::new(users, user.clone())),
        })
    }

    /// Loads every section. The first 401 stops loading since the session is gone.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        if let Err(e) = self.albums.load().await {
            if e.is_unauthorized() {
                return Err(e);
            }
        }
        if let Some(users) = self.users.as_mut() {
            if let Err(e) = users.load().await {
                if e.is_unauthorized() {
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    pub fn albums(&self) -> &AlbumListView {
        &self.albums
    }

    pub fn albums_mut(&mut self) -> &mut AlbumListView {
        &mut self.albums
    }

    pub fn users(&self) -> Option<&UserManagementView> {
        self.users.as_ref()
    }

    pub fn users_mut(&mut self) -> Option<&mut UserManagementView> {
        self.users.as_mut()
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "Music Album Manager\nWelcome, {} ({})   [Logout]\n\n",
            self.username, self.role
        );
        out.push_str(&self.albums.render());
        if let Some(users) = &self.users {
            out.push('\n');
            out.push_str(&users.render());
        }
        out
    }
}
