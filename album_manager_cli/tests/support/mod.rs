//! In-process stand-in for the album REST API, enough to drive the client
//! end to end. Accounts, albums and tokens live in memory.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use album_manager_cli::api::ApiClient;
use album_manager_cli::config::Config;
use album_manager_cli::role::{self, Role};
use album_manager_cli::services::auth::{AuthResponse, LoginRequest, RegisterRequest};
use album_manager_cli::services::user::UpdateRoleRequest;
use album_manager_cli::services::{AlbumService, AuthService, UserService};
use album_manager_cli::session::{SessionContext, SessionStore};
use album_manager_cli::storage::{MemoryStorage, SharedStorage};
use album_manager_cli::{Album, User};
use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use dashmap::DashMap;
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: String,
    pub enabled: bool,
}

impl Account {
    fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    fn to_user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
            enabled: self.enabled,
        }
    }
}

#[derive(Default)]
struct Inner {
    accounts: DashMap<i64, Account>,
    albums: DashMap<i64, Album>,
    tokens: DashMap<String, i64>,
    next_id: AtomicI64,
    album_list_calls: AtomicUsize,
    lists_broken: AtomicBool,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Inner>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn add_account(&self, username: &str, password: &str, role: &str) -> i64 {
        let id = self.next_id();
        self.inner.accounts.insert(
            id,
            Account {
                id,
                username: username.to_string(),
                password: password.to_string(),
                role: role.to_string(),
                enabled: true,
            },
        );
        id
    }

    pub fn add_album(&self, title: &str, artist: &str, year: Option<i32>, owner: Option<i64>) -> i64 {
        let id = self.next_id();
        self.inner.albums.insert(
            id,
            Album {
                id: Some(id),
                release_year: year,
                user_id: owner,
                ..Album::new(title, artist)
            },
        );
        id
    }

    pub fn set_album_owner(&self, id: i64, owner: i64) {
        if let Some(mut album) = self.inner.albums.get_mut(&id) {
            album.user_id = Some(owner);
        }
    }

    pub fn album(&self, id: i64) -> Option<Album> {
        self.inner.albums.get(&id).map(|a| a.clone())
    }

    pub fn account(&self, id: i64) -> Option<Account> {
        self.inner.accounts.get(&id).map(|a| a.clone())
    }

    pub fn album_count(&self) -> usize {
        self.inner.albums.len()
    }

    pub fn album_list_calls(&self) -> usize {
        self.inner.album_list_calls.load(Ordering::SeqCst)
    }

    /// Makes every later `GET /albums` and `GET /users` answer 500.
    pub fn break_lists(&self) {
        self.inner.lists_broken.store(true, Ordering::SeqCst);
    }

    fn list_failure(&self) -> Result<(), Response> {
        if self.inner.lists_broken.load(Ordering::SeqCst) {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "Error: database unavailable").into_response());
        }
        Ok(())
    }

    /// Forgets every issued token, so the next authenticated call gets a 401.
    pub fn revoke_all_tokens(&self) {
        self.inner.tokens.clear();
    }

    fn issue_token(&self, account: &Account) -> AuthResponse {
        let token = format!("token-{}-{}", account.id, self.next_id());
        self.inner.tokens.insert(token.clone(), account.id);
        AuthResponse {
            token,
            username: account.username.clone(),
            role: account.role.clone(),
            user_id: Some(account.id),
        }
    }

    fn authenticate(&self, headers: &HeaderMap) -> Result<Account, Response> {
        let unauthorized = || StatusCode::UNAUTHORIZED.into_response();
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;
        let id = self.inner.tokens.get(token).map(|id| *id).ok_or_else(unauthorized)?;
        self.account(id).ok_or_else(unauthorized)
    }

    pub async fn start(self) -> String {
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/albums", get(list_albums).post(create_album))
            .route(
                "/api/albums/{id}",
                get(get_album).put(update_album).delete(delete_album),
            )
            .route("/api/users", get(list_users))
            .route("/api/users/{id}", get(get_user).delete(delete_user))
            .route("/api/users/{id}/role", put(update_role))
            .with_state(self);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }
}

fn forbidden() -> Response {
    StatusCode::FORBIDDEN.into_response()
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": format!("{} not found", what) }))).into_response()
}

async fn login(State(backend): State<FakeBackend>, Json(req): Json<LoginRequest>) -> Response {
    let account = backend
        .inner
        .accounts
        .iter()
        .find(|a| a.username == req.username && a.password == req.password)
        .map(|a| a.clone());
    match account {
        Some(account) => Json(backend.issue_token(&account)).into_response(),
        None => (StatusCode::UNAUTHORIZED, "Error: Invalid username or password").into_response(),
    }
}

async fn register(State(backend): State<FakeBackend>, Json(req): Json<RegisterRequest>) -> Response {
    let taken = backend.inner.accounts.iter().any(|a| a.username == req.username);
    if taken {
        return (
            StatusCode::BAD_REQUEST,
            format!("Error: Username already exists: {}", req.username),
        )
            .into_response();
    }
    let role = req.role.unwrap_or_else(|| "USER".to_string());
    let id = backend.add_account(&req.username, &req.password, &role);
    let account = backend.account(id).unwrap();
    (StatusCode::CREATED, Json(backend.issue_token(&account))).into_response()
}

async fn list_albums(State(backend): State<FakeBackend>, headers: HeaderMap) -> Result<Json<Vec<Album>>, Response> {
    backend.authenticate(&headers)?;
    backend.inner.album_list_calls.fetch_add(1, Ordering::SeqCst);
    backend.list_failure()?;
    let mut albums: Vec<Album> = backend.inner.albums.iter().map(|a| a.clone()).collect();
    albums.sort_by_key(|a| a.id);
    Ok(Json(albums))
}

async fn get_album(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Album>, Response> {
    backend.authenticate(&headers)?;
    backend.album(id).map(Json).ok_or_else(|| not_found("Album"))
}

async fn create_album(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(album): Json<Album>,
) -> Result<(StatusCode, Json<Album>), Response> {
    let account = backend.authenticate(&headers)?;
    let id = backend.next_id();
    let saved = Album {
        id: Some(id),
        user_id: Some(account.id),
        ..album
    };
    backend.inner.albums.insert(id, saved.clone());
    if account.role() == Some(Role::User) {
        if let Some(mut acc) = backend.inner.accounts.get_mut(&account.id) {
            acc.role = "EDITOR".to_string();
        }
    }
    Ok((StatusCode::CREATED, Json(saved)))
}

fn may_modify(account: &Account, album: &Album) -> bool {
    match account.role() {
        Some(Role::Admin) => true,
        Some(Role::Editor) => album.user_id == Some(account.id),
        _ => false,
    }
}

async fn update_album(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(details): Json<Album>,
) -> Result<Json<Album>, Response> {
    let account = backend.authenticate(&headers)?;
    let existing = backend.album(id).ok_or_else(|| not_found("Album"))?;
    if !may_modify(&account, &existing) {
        return Err(forbidden());
    }
    let updated = Album {
        id: existing.id,
        user_id: existing.user_id,
        ..details
    };
    backend.inner.albums.insert(id, updated.clone());
    Ok(Json(updated))
}

async fn delete_album(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Response> {
    let account = backend.authenticate(&headers)?;
    let existing = backend.album(id).ok_or_else(|| not_found("Album"))?;
    if !may_modify(&account, &existing) {
        return Err(forbidden());
    }
    backend.inner.albums.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

fn require_admin(backend: &FakeBackend, headers: &HeaderMap) -> Result<Account, Response> {
    let account = backend.authenticate(headers)?;
    if account.role() != Some(Role::Admin) {
        return Err(forbidden());
    }
    Ok(account)
}

async fn list_users(State(backend): State<FakeBackend>, headers: HeaderMap) -> Result<Json<Vec<User>>, Response> {
    require_admin(&backend, &headers)?;
    backend.list_failure()?;
    let mut users: Vec<User> = backend.inner.accounts.iter().map(|a| a.to_user()).collect();
    users.sort_by_key(|u| u.id);
    Ok(Json(users))
}

async fn get_user(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<User>, Response> {
    require_admin(&backend, &headers)?;
    backend
        .account(id)
        .map(|a| Json(a.to_user()))
        .ok_or_else(|| not_found("User"))
}

async fn update_role(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<User>, Response> {
    require_admin(&backend, &headers)?;
    let Some(mut account) = backend.inner.accounts.get_mut(&id) else {
        return Err(not_found("User"));
    };
    account.role = format!("ROLE_{}", role::normalize(&req.role));
    Ok(Json(account.to_user()))
}

async fn delete_user(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, Response> {
    let admin = require_admin(&backend, &headers)?;
    if admin.id == id {
        return Err((StatusCode::BAD_REQUEST, Json(json!({ "message": "Cannot delete yourself" }))).into_response());
    }
    backend
        .inner
        .accounts
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| not_found("User"))
}

/// Client-side wiring against a running fake.
pub struct Client {
    pub storage: Arc<MemoryStorage>,
    pub api: ApiClient,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        Self::with_storage(base_url, storage.clone(), storage)
    }

    pub fn with_storage(base_url: &str, memory: Arc<MemoryStorage>, storage: SharedStorage) -> Self {
        let config = Config::new(base_url, "unused", 5).unwrap();
        let api = ApiClient::new(&config, SessionStore::new(storage)).unwrap();
        Self { storage: memory, api }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    pub fn albums(&self) -> AlbumService {
        AlbumService::new(self.api.clone())
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.api.clone())
    }

    pub fn context(&self) -> SessionContext {
        SessionContext::hydrate(self.auth()).unwrap()
    }
}
