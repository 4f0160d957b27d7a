//! Bearer-token session with an explicit login/logout lifecycle.
//!
//! One `Session` instance is created at startup and handed to every
//! network-calling component. Nothing else in the crate touches the token
//! store, so clearing the session on a 401 is a single code path.

use crate::config::global_config_dir;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const TOKEN_FILE: &str = "token";

/// Profile returned by `GET /api/auth/profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub school_id: Option<i64>,
}

/// Holds the bearer token and cached profile for one CLI invocation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    profile: Option<UserProfile>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a previously persisted token, if any.
    pub fn load() -> Result<Self> {
        let path = token_path()?;
        match std::fs::read_to_string(&path) {
            Ok(token) => {
                let token = token.trim().to_string();
                if token.is_empty() {
                    return Err(Error::Auth("Saved session is empty; please log in".to_string()));
                }
                Ok(Self {
                    token: Some(token),
                    profile: None,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::Auth("Not logged in; run `gurudesk login` first".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Install a fresh token and persist it for later invocations.
    pub fn set_token(&mut self, token: String) -> Result<()> {
        let path = token_path()?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, &token)?;
        restrict_permissions(&path)?;
        self.token = Some(token);
        Ok(())
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
    }

    /// Drop the token and remove the persisted copy. Called on explicit
    /// logout and whenever the server answers 401.
    pub fn clear(&mut self) -> Result<()> {
        self.token = None;
        self.profile = None;
        let path = token_path()?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Remove the persisted token without needing a `Session` instance.
/// Used by the API layer when the server answers 401.
pub fn clear_persisted() -> Result<()> {
    let path = token_path()?;
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn token_path() -> Result<PathBuf> {
    Ok(global_config_dir()?.join(TOKEN_FILE))
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> Result<()> {
    Ok(())
}
