use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::error::ClientError;
use crate::session::SessionStore;

/// JSON client for the album REST API.
///
/// Every request carries the stored bearer token when there is one. A 401
/// from the server wipes the stored session before the error is returned, so
/// callers only need to send the user back to the login page.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionStore) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: Client::builder()
                .timeout(config.timeout)
                .default_headers(headers)
                .build()?,
            base_url: config.api_url.clone(),
            session,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&joined)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let req = self.client.get(self.endpoint(path)?);
        Ok(self.send(req).await?.json::<T>().await?)
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.post(self.endpoint(path)?).json(body);
        Ok(self.send(req).await?.json::<T>().await?)
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.client.put(self.endpoint(path)?).json(body);
        Ok(self.send(req).await?.json::<T>().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let req = self.client.delete(self.endpoint(path)?);
        self.send(req).await?;
        Ok(())
    }

    async fn send(&self, mut req: RequestBuilder) -> Result<Response, ClientError> {
        if let Some(token) = self.session.token()? {
            req = req.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let res = req.send().await?;
        let status = res.status();
        debug!(url = %res.url(), %status, "api response");

        if status.is_success() {
            return Ok(res);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!(url = %res.url(), "server answered 401, clearing stored session");
            self.session.clear()?;
            return Err(ClientError::Unauthorized);
        }

        let body = res.text().await.unwrap_or_default();
        Err(ClientError::from_status(status, error_message(&body)))
    }
}

/// Pulls a human readable message out of an error body. The server answers
/// either `{"message": "..."}` or a bare string such as `Error: Invalid username or password`.
pub fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return ["message", "error"]
            .iter()
            .find_map(|key| value.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty()))
            .or_else(|| value.as_str())
            .map(str::to_string);
    }

    Some(body.to_string())
}
