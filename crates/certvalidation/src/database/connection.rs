/*
 *  Copyright 2025-2026 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Database connection management.
//!
//! This module provides an async connection pool implementation using `deadpool-diesel`
//! over SQLite. Every DAL operation borrows a pooled connection and runs its
//! diesel queries inside `interact`, which moves the blocking work onto the
//! pool's thread.
//!
//! # Example
//!
//! ```rust,ignore
//! use certvalidation::Database;
//!
//! let db = Database::try_new("sqlite:///var/lib/certvalidation/state.db", 4)?;
//! db.run_migrations().await?;
//! ```

use thiserror::Error;
use tracing::info;

use deadpool_diesel::sqlite::{
    Manager as SqliteManager, Pool as SqlitePool, Runtime as SqliteRuntime,
};

const SQLITE_POOL_SIZE: usize = 1;

/// Errors raised while building the pool or preparing the schema.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to create connection pool: {0}")]
    Pool(String),

    #[error("Failed to run migrations: {0}")]
    Migration(String),
}

/// Handle to the trust store. Clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    location: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .finish()
    }
}

impl Database {
    /// Creates a new connection pool.
    ///
    /// # Arguments
    ///
    /// * `connection_string` - A file path, `sqlite://` URL, or `:memory:`
    /// * `max_size` - Requested pool size
    ///
    /// SQLite allows a single writer, so the pool holds one connection
    /// whatever `max_size` asks for.
    pub fn try_new(connection_string: &str, max_size: u32) -> Result<Self, DatabaseError> {
        let location = Self::build_sqlite_url(connection_string);
        let manager = SqliteManager::new(location.clone(), SqliteRuntime::Tokio1);

        let pool = SqlitePool::builder(manager)
            .max_size(SQLITE_POOL_SIZE)
            .build()
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        info!(
            requested = max_size,
            size = SQLITE_POOL_SIZE,
            location = %location,
            "SQLite connection pool initialized"
        );

        Ok(Self { pool, location })
    }

    /// The path or URI the pool connects to.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Strips an optional `sqlite://` prefix.
    fn build_sqlite_url(connection_string: &str) -> String {
        if let Some(path) = connection_string.strip_prefix("sqlite://") {
            path.to_string()
        } else {
            connection_string.to_string()
        }
    }

    /// Configures the connection and runs pending migrations.
    pub async fn run_migrations(&self) -> Result<(), DatabaseError> {
        use diesel::prelude::*;
        use diesel_migrations::MigrationHarness;

        let conn = self
            .get_connection()
            .await
            .map_err(|e| DatabaseError::Pool(e.to_string()))?;

        conn.interact(|conn| {
            // WAL lets readers proceed while the single writer commits.
            diesel::sql_query("PRAGMA journal_mode=WAL;")
                .execute(conn)
                .map_err(|e| e.to_string())?;
            diesel::sql_query("PRAGMA busy_timeout=30000;")
                .execute(conn)
                .map_err(|e| e.to_string())?;

            conn.run_pending_migrations(super::MIGRATIONS)
                .map(|applied| applied.len())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?
        .map(|applied| info!("Applied {} pending migration(s)", applied))
        .map_err(DatabaseError::Migration)
    }

    /// Gets a pooled connection.
    pub async fn get_connection(
        &self,
    ) -> Result<
        deadpool::managed::Object<SqliteManager>,
        deadpool::managed::PoolError<deadpool_diesel::Error>,
    > {
        self.pool.get().await
    }
}
