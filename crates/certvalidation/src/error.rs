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

//! Error types.
//!
//! Concurrency conflicts are not errors here. Losing an insert race or an
//! optimistic-concurrency check is reported through the `CreateOutcome`,
//! `SaveOutcome` and `CommitOutcome` result types, and callers re-read the
//! winning state. The enums below cover everything that is actually wrong.

use crate::database::UniversalUuid;
use thiserror::Error;

/// Errors raised by the data access layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

impl From<deadpool::managed::PoolError<deadpool_diesel::Error>> for StorageError {
    fn from(error: deadpool::managed::PoolError<deadpool_diesel::Error>) -> Self {
        StorageError::ConnectionPool(error.to_string())
    }
}

/// Contract violations between callers and stored state.
///
/// These are never retried: replaying a message against the same state
/// produces the same violation.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    #[error(
        "Validation {validation_id} is recorded for package {stored} but was requested for package {requested}"
    )]
    PackageMismatch {
        validation_id: UniversalUuid,
        stored: i64,
        requested: i64,
    },

    #[error(
        "Validation {validation_id} is recorded for validator '{stored}' but was requested by '{requested}'"
    )]
    ValidatorMismatch {
        validation_id: UniversalUuid,
        stored: String,
        requested: String,
    },

    #[error("Unrecognized {entity} status: {value}")]
    UnrecognizedStatus { entity: &'static str, value: String },

    #[error("Certificate validation {validation_id} for certificate {certificate_id} holds non-terminal outcome '{value}'")]
    NonTerminalOutcome {
        certificate_id: i64,
        validation_id: UniversalUuid,
        value: String,
    },
}

/// Errors raised by a certificate byte store.
#[derive(Debug, Error)]
pub enum CertificateStoreError {
    #[error("Certificate not found: {0}")]
    NotFound(String),

    #[error("Certificate store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while handling a certificate validation message.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    #[error("Failed to load certificate {thumbprint}: {source}")]
    CertificateLoad {
        thumbprint: String,
        #[source]
        source: CertificateStoreError,
    },
}

impl CoordinatorError {
    /// Whether redelivering the message can never succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoordinatorError::Consistency(_)
                | CoordinatorError::Storage(StorageError::Consistency(_))
                | CoordinatorError::Storage(StorageError::CorruptRecord(_))
        )
    }
}

/// Errors raised by validators facing the orchestrator.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to enqueue certificate validation: {0}")]
    Enqueue(String),
}

/// Errors raised by a message source.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Message source closed")]
    Closed,

    #[error("Unknown delivery: {0}")]
    UnknownDelivery(u64),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Validator name must not be empty")]
    EmptyValidatorName,

    #[error("Invalid inconclusive threshold: {0} (must be at least 1)")]
    InvalidInconclusiveThreshold(i32),

    #[error("Invalid pool size: {0} (must be at least 1)")]
    InvalidPoolSize(u32),
}
