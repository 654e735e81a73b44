//! Locally persisted proof-of-login.
//!
//! The session lives under two fixed keys of a small key/value store: the
//! bearer token and the serialized user profile. It is written on login,
//! read at startup, and cleared on logout or on any 401 from the backend.

pub mod storage;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::User;

pub use storage::{FileStorage, MemoryStorage, Storage};

pub const TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "userData";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read storage file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write storage file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is not valid JSON: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize user profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Option<User>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().map(User::is_admin).unwrap_or(false)
    }
}

pub struct SessionStore {
    storage: Box<dyn Storage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::default()))
    }

    pub fn save(&self, token: &str, user: Option<&User>) -> Result<(), SessionError> {
        self.storage.set(TOKEN_KEY, token)?;
        match user {
            Some(user) => self.storage.set(USER_KEY, &serde_json::to_string(user)?)?,
            None => self.storage.remove(USER_KEY)?,
        }
        debug!("session saved");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.storage
            .get(TOKEN_KEY)
            .ok()
            .flatten()
            .filter(|t| !t.trim().is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Reads the stored profile. An unreadable profile invalidates the whole
    /// session.
    pub fn current_user(&self) -> Option<User> {
        let raw = self.storage.get(USER_KEY).ok().flatten()?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "stored user profile is corrupt, clearing session");
                if let Err(e) = self.clear() {
                    warn!(error = %e, "failed to clear session");
                }
                None
            }
        }
    }

    pub fn load(&self) -> Option<Session> {
        let token = self.token()?;
        let user = self.current_user();
        // current_user may have cleared a corrupt session.
        let token = if user.is_none() { self.token()? } else { token };
        Some(Session { token, user })
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        debug!("session cleared");
        Ok(())
    }
}
