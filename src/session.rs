//! Session store: the single owner of the authentication token.
//!
//! The store is a cheap handle over shared state. Clone it to hand the same
//! store to the API client and to whatever drives the UI; there is no global.
//! A file-backed store keeps the token in a small JSON object under a fixed
//! key so it survives restarts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Key under which the token is persisted.
pub const STORAGE_KEY: &str = "token";

const APP_NAME: &str = "notes-client";
const SESSION_FILE: &str = "session.json";

/// Errors reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not determine data directory")]
    NoDataDir,
}

/// Client-wide authentication state.
///
/// `Authenticated` only means a token is held; it is not checked against the
/// server until the first protected call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    token: Arc<Mutex<Option<String>>>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Open a file-backed store, loading any token already persisted there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let token = read_entries(&path)?.remove(STORAGE_KEY);
        tracing::debug!(
            "Opened session store at {} ({})",
            path.display(),
            if token.is_some() { "token found" } else { "empty" }
        );
        Ok(Self {
            token: Arc::new(Mutex::new(token)),
            path: Some(path),
        })
    }

    /// Open the store in the platform data directory.
    pub fn open_default() -> Result<Self, SessionError> {
        Self::open(default_path()?)
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            token: Arc::new(Mutex::new(None)),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> Option<String> {
        self.token.lock().expect("session lock poisoned").clone()
    }

    /// Replace the stored token and persist it.
    pub fn set(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let token = token.into();
        *self.token.lock().expect("session lock poisoned") = Some(token.clone());
        self.persist(Some(token))
    }

    /// Forget the token. Clearing an empty store is a no-op.
    pub fn clear(&self) -> Result<(), SessionError> {
        let previous = self.token.lock().expect("session lock poisoned").take();
        if previous.is_none() {
            return Ok(());
        }
        tracing::info!("Session cleared");
        self.persist(None)
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some_and(|t| !t.is_empty())
    }

    pub fn state(&self) -> AuthState {
        if self.is_authenticated() {
            AuthState::Authenticated
        } else {
            AuthState::Anonymous
        }
    }

    fn persist(&self, token: Option<String>) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        // Other keys in the file are left alone.
        let mut entries = read_entries(path)?;
        match token {
            Some(token) => {
                entries.insert(STORAGE_KEY.to_string(), token);
            }
            None => {
                entries.remove(STORAGE_KEY);
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| SessionError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(&entries).map_err(|source| {
            SessionError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(path, content).map_err(|source| SessionError::Io {
            path: path.clone(),
            source,
        })
    }
}

/// Default location of the persisted session.
pub fn default_path() -> Result<PathBuf, SessionError> {
    let dirs =
        directories::ProjectDirs::from("", "", APP_NAME).ok_or(SessionError::NoDataDir)?;
    Ok(dirs.data_dir().join(SESSION_FILE))
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, SessionError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let content = fs::read_to_string(path).map_err(|source| SessionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(&content).map_err(|source| SessionError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}
