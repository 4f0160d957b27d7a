//! REST client for the GuruDesk backend.
//!
//! All authenticated requests go through [`ApiClient`], which carries the
//! injected [`Session`]. A 401 from any endpoint clears the persisted
//! session before the error is surfaced.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::Session;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

pub mod auth;
pub mod resources;
pub mod upload;

pub use resources::{
    ClassSummary, DocSummary, ManagedUser, MyClass, NewClass, NewSchool, NewUser, School, Subject,
    UploadStatus,
};

pub struct ApiClient {
    http: Client,
    base: Url,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &Config, session: Session) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;
        let base = Url::parse(&config.api_url)
            .map_err(|e| Error::Config(format!("Invalid api_url '{}': {}", config.api_url, e)))?;
        Ok(Self {
            http,
            base,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base.join(path)?)
    }

    /// Attach the bearer token when the session has one.
    pub(crate) fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) fn get(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.authed(self.http.get(self.endpoint(path)?)))
    }

    pub(crate) fn post(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.authed(self.http.post(self.endpoint(path)?)))
    }

    pub(crate) fn put(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.authed(self.http.put(self.endpoint(path)?)))
    }

    pub(crate) fn delete(&self, path: &str) -> Result<RequestBuilder> {
        Ok(self.authed(self.http.delete(self.endpoint(path)?)))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get(path)?.send().await.map_err(map_send_error)?;
        self.read_json(response).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .post(path)?
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        self.read_json(response).await
    }

    pub(crate) async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .put(path)?
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        self.read_json(response).await
    }

    pub(crate) async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.delete(path)?.send().await.map_err(map_send_error)?;
        self.read_json(response).await
    }

    /// Check the status, then deserialize. Error bodies carry their message
    /// under `msg`, `message` or `error` depending on the endpoint.
    pub(crate) async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let response = self.check_status(response).await?;
        Ok(response.json().await?)
    }

    pub(crate) async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            crate::session::clear_persisted()?;
            return Err(Error::Auth(
                "Session expired or invalid; please log in again".to_string(),
            ));
        }

        Err(Error::Api(extract_api_message(status, &body)))
    }
}

/// Connection-level failures become the generic connectivity error; anything
/// else keeps the reqwest detail.
pub(crate) fn map_send_error(error: reqwest::Error) -> Error {
    if error.is_connect() || error.is_timeout() {
        Error::Network(error.to_string())
    } else {
        Error::Request(error)
    }
}

fn extract_api_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    format!("HTTP {status}")
}
