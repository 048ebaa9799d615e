use tracing::debug;

use crate::api::ApiClient;
use crate::error::ClientError;
use crate::Album;

/// CRUD over `/albums`.
#[derive(Clone)]
pub struct AlbumService {
    api: ApiClient,
}

impl AlbumService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get_all_albums(&self) -> Result<Vec<Album>, ClientError> {
        let albums: Vec<Album> = self.api.get("/albums").await?;
        debug!(count = albums.len(), "fetched albums");
        Ok(albums)
    }

    pub async fn get_album_by_id(&self, id: i64) -> Result<Album, ClientError> {
        self.api.get(&format!("/albums/{}", id)).await
    }

    /// The server ignores any `id` or owner on the payload and assigns its own.
    pub async fn create_album(&self, album: &Album) -> Result<Album, ClientError> {
        let payload = Album {
            id: None,
            user_id: None,
            ..album.clone()
        };
        self.api.post("/albums", &payload).await
    }

    pub async fn update_album(&self, id: i64, album: &Album) -> Result<Album, ClientError> {
        self.api.put(&format!("/albums/{}", id), album).await
    }

    pub async fn delete_album(&self, id: i64) -> Result<(), ClientError> {
        self.api.delete(&format!("/albums/{}", id)).await
    }
}
