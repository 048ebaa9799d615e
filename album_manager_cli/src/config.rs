use std::env;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ClientError;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const SESSION_DIR_NAME: &str = ".album-manager";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub session_dir: PathBuf,
    pub timeout: Duration,
}

impl Config {
    pub fn new(api_url: &str, session_dir: impl Into<PathBuf>, timeout_secs: u64) -> Result<Self, ClientError> {
        Ok(Self {
            api_url: Url::parse(api_url)?,
            session_dir: session_dir.into(),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url is valid"),
            session_dir: default_session_dir(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// `$HOME/.album-manager`, or `./.album-manager` when there is no home directory.
pub fn default_session_dir() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home).join(SESSION_DIR_NAME),
        _ => PathBuf::from(SESSION_DIR_NAME),
    }
}
