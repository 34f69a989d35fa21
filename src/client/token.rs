//! Where the client gets its bearer token from.
//!
//! The token is read before every request, so a login or logout elsewhere in
//! the application takes effect on the next call.

use std::fmt;
use std::path::PathBuf;
use std::sync::RwLock;

/// A source of the current API token.
pub trait TokenSource: Send + Sync + fmt::Debug {
    /// The token to send, or `None` to send the request without one.
    fn token(&self) -> Option<String>;
}

/// Token held in memory, replaceable at runtime.
#[derive(Debug, Default)]
pub struct MemoryToken {
    token: RwLock<Option<String>>,
}

impl MemoryToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}

impl TokenSource for MemoryToken {
    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }
}

/// Token stored in a file, e.g. written by a separate login command.
/// A missing or blank file means no token.
#[derive(Debug, Clone)]
pub struct FileToken {
    path: PathBuf,
}

impl FileToken {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenSource for FileToken {
    fn token(&self) -> Option<String> {
        let contents = std::fs::read_to_string(&self.path).ok()?;
        let token = contents.trim();
        (!token.is_empty()).then(|| token.to_string())
    }
}
