//! Login, logout and profile endpoints.

use super::ApiClient;
use crate::error::Result;
use crate::session::UserProfile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

impl ApiClient {
    /// `POST /api/auth/login` with a username or email, then fetch and
    /// cache the profile. The token is persisted for later invocations.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<UserProfile> {
        let body = LoginRequest { login, password };
        let response: LoginResponse = self.post_json("/api/auth/login", &body).await?;
        self.session_mut().set_token(response.token)?;

        let profile = self.fetch_profile().await?;
        self.session_mut().set_profile(profile.clone());
        Ok(profile)
    }

    /// `GET /api/auth/profile` for the current token.
    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        self.get_json("/api/auth/profile").await
    }

    /// Forget the token locally. The server keeps no session state.
    pub fn logout(&mut self) -> Result<()> {
        self.session_mut().clear()
    }
}
