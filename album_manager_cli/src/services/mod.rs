pub mod album;
pub mod auth;
pub mod user;

pub use album::AlbumService;
pub use auth::AuthService;
pub use user::UserService;
