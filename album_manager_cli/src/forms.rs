use chrono::{Datelike, Utc};
use thiserror::Error;
use url::Url;

use crate::role::Role;
use crate::services::auth::{LoginRequest, RegisterRequest};
use crate::Album;

pub const MIN_PASSWORD_LEN: usize = 3;
pub const MIN_RELEASE_YEAR: i32 = 1900;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FormError {
    #[error("please fill in all fields")]
    MissingCredentials,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("role {0} cannot be chosen at registration")]
    RoleNotSelfAssignable(Role),

    #[error("title and artist are required")]
    MissingTitleOrArtist,

    #[error("release year {year} must be between {min} and {max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    #[error("price cannot be negative")]
    NegativePrice,

    #[error("stock cannot be negative")]
    NegativeStock,

    #[error("image url '{0}' is not a valid absolute url")]
    InvalidImageUrl(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<LoginRequest, FormError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(FormError::MissingCredentials);
        }
        Ok(LoginRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            role: Role::User,
        }
    }
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, FormError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(FormError::MissingCredentials);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        if !Role::SELF_ASSIGNABLE.contains(&self.role) {
            return Err(FormError::RoleNotSelfAssignable(self.role));
        }
        Ok(RegisterRequest {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            role: Some(self.role.as_str().to_string()),
        })
    }
}

/// Create/edit form for an album. Text fields left blank are sent as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumForm {
    /// Set when editing an existing album.
    pub id: Option<i64>,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub release_year: Option<i32>,
    pub record_label: String,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub image_url: String,
}

impl AlbumForm {
    pub fn from_album(album: &Album) -> Self {
        Self {
            id: album.id,
            title: album.title.clone(),
            artist: album.artist.clone(),
            genre: album.genre.clone().unwrap_or_default(),
            release_year: album.release_year,
            record_label: album.record_label.clone().unwrap_or_default(),
            price: album.price,
            stock: album.stock,
            image_url: album.image_url.clone().unwrap_or_default(),
        }
    }

    pub fn is_edit(&self) -> bool {
        self.id.is_some()
    }

    pub fn validate(&self) -> Result<Album, FormError> {
        self.validate_for_year(Utc::now().year())
    }

    pub fn validate_for_year(&self, current_year: i32) -> Result<Album, FormError> {
        let title = self.title.trim();
        let artist = self.artist.trim();
        if title.is_empty() || artist.is_empty() {
            return Err(FormError::MissingTitleOrArtist);
        }

        if let Some(year) = self.release_year {
            if !(MIN_RELEASE_YEAR..=current_year).contains(&year) {
                return Err(FormError::YearOutOfRange {
                    year,
                    min: MIN_RELEASE_YEAR,
                    max: current_year,
                });
            }
        }
        if self.price.is_some_and(|p| p.is_nan() || p < 0.0) {
            return Err(FormError::NegativePrice);
        }
        if self.stock.is_some_and(|s| s < 0) {
            return Err(FormError::NegativeStock);
        }

        let image_url = non_blank(&self.image_url);
        if let Some(raw) = &image_url {
            if Url::parse(raw).is_err() {
                return Err(FormError::InvalidImageUrl(raw.clone()));
            }
        }

        Ok(Album {
            id: self.id,
            title: title.to_string(),
            artist: artist.to_string(),
            genre: non_blank(&self.genre),
            release_year: self.release_year,
            record_label: non_blank(&self.record_label),
            price: self.price,
            stock: self.stock,
            image_url,
            user_id: None,
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
