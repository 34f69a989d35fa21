//! Test utilities for database and server setup.
//!
//! Provides helpers that reuse the real schema initialization,
//! eliminating schema duplication in test code.

use axum_test::TestServer;
use rusqlite::Connection;
use std::path::Path;
use std::sync::MutexGuard;
use tempfile::TempDir;

use crate::config::Config;
use crate::db;
use crate::state::AppState;

/// In-memory connection with foreign keys on and all migrations applied.
pub fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory database");
    db::prepare(&conn).expect("run migrations");
    conn
}

/// Application state over an in-memory database, with exports written to a
/// temporary directory that is removed on drop.
pub struct TestEnv {
    /// Temporary directory (kept alive for exported files)
    pub temp: TempDir,
    pub state: AppState,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Require `Authorization: Bearer <token>` on the API.
    pub fn with_token(token: &str) -> Self {
        let token = token.to_string();
        Self::with_config(move |config| config.api_token = Some(token))
    }

    fn with_config(customize: impl FnOnce(&mut Config)) -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let mut config = Config {
            db_path: temp.path().join("flashcard.db"),
            export_dir: temp.path().join("exports"),
            api_token: None,
            ..Config::default()
        };
        customize(&mut config);

        let pool = db::open_in_memory().expect("open in-memory database");
        Self {
            temp,
            state: AppState::new(pool, config),
        }
    }

    /// Router under test, served in-process
    pub fn server(&self) -> TestServer {
        TestServer::new(crate::handlers::router(self.state.clone())).expect("build test server")
    }

    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        db::try_lock(&self.state.db).expect("database lock")
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}
