use std::fmt::Write as _;

use tracing::info;

use super::{banner, describe};
use crate::error::ClientError;
use crate::forms::AlbumForm;
use crate::role::Capabilities;
use crate::services::AlbumService;
use crate::sort::{AlbumSort, SortField};
use crate::Album;

const LOAD_FAILED: &str = "Could not load albums.";
const SAVE_FAILED: &str = "Could not save the album. Please try again.";
const DELETE_FAILED: &str = "Could not delete the album. It may no longer exist.";
const DELETE_FORBIDDEN: &str =
    "You do not have permission to delete this album. Only the owner or an administrator can delete albums.";

pub struct AlbumListView {
    service: AlbumService,
    caps: Capabilities,
    albums: Vec<Album>,
    sort: AlbumSort,
    loading: bool,
    error: Option<String>,
    form: Option<AlbumForm>,
    form_error: Option<String>,
    delete_confirm: Option<i64>,
}

impl AlbumListView {
    pub fn new(service: AlbumService, caps: Capabilities) -> Self {
        Self {
            service,
            caps,
            albums: Vec::new(),
            sort: AlbumSort::default(),
            loading: true,
            error: None,
            form: None,
            form_error: None,
            delete_confirm: None,
        }
    }

    pub async fn load(&mut self) -> Result<(), ClientError> {
        self.loading = true;
        self.error = None;
        let result = self.service.get_all_albums().await;
        self.loading = false;
        match result {
            Ok(mut albums) => {
                self.sort.apply(&mut albums);
                self.albums = albums;
                Ok(())
            }
            Err(e) => {
                self.error = Some(describe(&e, LOAD_FAILED));
                Err(e)
            }
        }
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    pub fn find(&self, id: i64) -> Option<&Album> {
        self.albums.iter().find(|a| a.id == Some(id))
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

    pub fn sort(&self) -> AlbumSort {
        self.sort
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.sort.toggle(field);
        self.sort.apply(&mut self.albums);
    }

    pub fn set_sort(&mut self, sort: AlbumSort) {
        self.sort = sort;
        self.sort.apply(&mut self.albums);
    }

    pub fn can_create(&self) -> bool {
        self.caps.can_create_album()
    }

    pub fn can_modify(&self, album: &Album) -> bool {
        self.caps.can_modify_album(album)
    }

    /// Opens an empty form. Returns false when the role may not create.
    pub fn open_create(&mut self) -> bool {
        if !self.can_create() {
            return false;
        }
        self.form = Some(AlbumForm::default());
        self.form_error = None;
        true
    }

    /// Opens the form pre-filled from a loaded album the user may modify.
    pub fn open_edit(&mut self, id: i64) -> bool {
        let Some(album) = self.find(id) else {
            return false;
        };
        if !self.can_modify(album) {
            return false;
        }
        let form = AlbumForm::from_album(album);
        self.form = Some(form);
        self.form_error = None;
        true
    }

    pub fn form(&self) -> Option<&AlbumForm> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut AlbumForm> {
        self.form_error = None;
        self.form.as_mut()
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.form_error = None;
        self.error = None;
    }

    /// Creates or updates depending on whether the form carries an id. On
    /// success the form closes and the list is fetched again; on failure the
    /// form stays open with the message.
    pub async fn submit_form(&mut self) -> Result<Album, ClientError> {
        let Some(form) = self.form.as_ref() else {
            return Err(ClientError::NotFound {
                message: Some("no album form is open".into()),
            });
        };

        let result = match form.validate() {
            Ok(album) => match album.id {
                Some(id) => self.service.update_album(id, &album).await,
                None => self.service.create_album(&album).await,
            },
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(saved) => {
                info!(id = ?saved.id, title = %saved.title, "album saved");
                self.form = None;
                self.form_error = None;
                self.load().await?;
                Ok(saved)
            }
            Err(e) => {
                self.form_error = Some(describe(&e, SAVE_FAILED));
                Err(e)
            }
        }
    }

    /// Marks an album for deletion pending confirmation.
    pub fn request_delete(&mut self, id: i64) -> bool {
        let allowed = self.find(id).is_some_and(|album| self.can_modify(album));
        if allowed {
            self.delete_confirm = Some(id);
        }
        allowed
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

        match self.service.delete_album(id).await {
            Ok(()) => {
                info!(id, "album deleted");
                self.delete_confirm = None;
                self.load().await
            }
            Err(e) => {
                let msg = if e.is_forbidden() {
                    DELETE_FORBIDDEN.to_string()
                } else {
                    describe(&e, DELETE_FAILED)
                };
                self.error = Some(msg);
                self.delete_confirm = None;
                Err(e)
            }
        }
    }

    pub fn render(&self) -> String {
        if self.loading {
            return "Loading albums...\n".to_string();
        }

        let mut out = String::new();
        let _ = writeln!(out, "🎵 Music Albums (sorted by {})", self.sort);
        if self.can_create() {
            out.push_str("[+ Create album]\n");
        }
        out.push_str(&banner(self.error.as_deref()));

        if let Some(id) = self.delete_confirm {
            let _ = writeln!(
                out,
                "⚠️ Confirm delete of album #{}: this action cannot be undone. [Cancel] [Delete]",
                id
            );
        }

        if let Some(form) = &self.form {
            out.push_str(&render_form(form, self.form_error.as_deref()));
        }

        if self.albums.is_empty() {
            out.push_str("No albums yet.\n");
            if self.can_create() {
                out.push_str("[Create the first album]\n");
            }
            return out;
        }

        for album in &self.albums {
            out.push_str(&render_album(album, self.can_modify(album)));
        }
        out
    }
}

fn render_album(album: &Album, actions: bool) -> String {
    let mut out = String::new();
    let id = album.id.map(|id| format!("#{}", id)).unwrap_or_else(|| "#-".into());
    let _ = write!(out, "{:<5} {} — {}", id, album.title, album.artist);

    let mut details = Vec::new();
    if let Some(genre) = &album.genre {
        details.push(genre.clone());
    }
    if let Some(year) = album.release_year {
        details.push(format!("year {}", year));
    }
    if let Some(label) = &album.record_label {
        details.push(format!("label {}", label));
    }
    if let Some(price) = album.price.filter(|p| *p > 0.0) {
        details.push(format!("price {:.2} RON", price));
    }
    if let Some(stock) = album.stock {
        details.push(format!("stock {}", stock));
    }
    if !details.is_empty() {
        let _ = write!(out, " ({})", details.join(", "));
    }
    if actions {
        out.push_str(" [Edit] [Delete]");
    }
    out.push('\n');
    if let Some(url) = &album.image_url {
        let _ = writeln!(out, "      cover: {}", url);
    }
    out
}

fn render_form(form: &AlbumForm, error: Option<&str>) -> String {
    let mut out = String::new();
    let heading = if form.is_edit() { "Edit album" } else { "New album" };
    let _ = writeln!(out, "┌ {}", heading);
    if let Some(msg) = error {
        let _ = writeln!(out, "│ ❌ {}", msg);
    }
    let opt = |v: Option<String>| v.unwrap_or_default();
    let _ = writeln!(out, "│ Title*:       {}", form.title);
    let _ = writeln!(out, "│ Artist*:      {}", form.artist);
    let _ = writeln!(out, "│ Genre:        {}", form.genre);
    let _ = writeln!(out, "│ Release year: {}", opt(form.release_year.map(|y| y.to_string())));
    let _ = writeln!(out, "│ Record label: {}", form.record_label);
    let _ = writeln!(out, "│ Price (RON):  {}", opt(form.price.map(|p| format!("{:.2}", p))));
    let _ = writeln!(out, "│ Stock:        {}", opt(form.stock.map(|s| s.to_string())));
    let _ = writeln!(out, "│ Image URL:    {}", form.image_url);
    let submit = if form.is_edit() { "Update" } else { "Create" };
    let _ = writeln!(out, "└ [Cancel] [{}]", submit);
    out
}
