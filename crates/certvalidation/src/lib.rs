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

//! # certvalidation
//!
//! Re-evaluates trust in the certificates behind package signatures.
//!
//! A package validation attempt fans out into one certificate validation per
//! certificate the package depends on (its signers and the timestamp
//! authorities that counter-signed them). Each certificate validation is
//! carried by a message to the [`CertificateValidationCoordinator`], which
//! verifies the certificate and hands the result to the
//! [`CertificateTrustEngine`]. The engine commits the new certificate status
//! together with every signature and package it invalidates, in one
//! transaction guarded by optimistic concurrency.
//!
//! The orchestrator drives the whole flow through the [`Validator`] trait,
//! implemented by [`CertificateRevalidator`] on top of a
//! [`ValidatorStatusStore`].
//!
//! ## Wiring
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use certvalidation::*;
//!
//! let config = CertificateValidationConfig::default();
//! let database = Database::try_new("sqlite://trust.db", config.db_pool_size())?;
//! database.run_migrations().await?;
//! let dal = DAL::new(database);
//!
//! let queue = InMemoryQueue::new();
//! let store = ValidatorStatusStore::new(dal.clone(), config.validator_name());
//! let validator = CertificateRevalidator::new(store, dal.clone(), Arc::new(queue.clone()));
//!
//! let engine = CertificateTrustEngine::from_config(dal.clone(), Arc::new(AuditAlertSink), &config);
//! let shutdown = ShutdownSignal::new();
//! let coordinator = CertificateValidationCoordinator::new(
//!     dal, certificate_store, verifier, engine, shutdown.clone(),
//! );
//! let consumer = ValidationConsumer::new(
//!     Arc::new(queue), Arc::new(coordinator), shutdown, config.poll_interval(),
//! );
//! tokio::spawn(async move { consumer.run().await });
//! ```

pub mod audit;
pub mod config;
pub mod coordinator;
pub mod dal;
pub mod database;
pub mod error;
pub mod models;
pub mod status;
pub mod trust;

pub use config::{CertificateValidationConfig, CertificateValidationConfigBuilder};
pub use coordinator::{
    CertificateValidationCoordinator, CertificateValidationMessage, Delivery, HandleOutcome,
    InMemoryQueue, MessageSource, ShutdownSignal, ValidationConsumer,
};
pub use dal::DAL;
pub use database::{Database, DatabaseError, UniversalTimestamp, UniversalUuid};
pub use error::{
    CertificateStoreError, ConfigError, ConsistencyError, CoordinatorError, QueueError,
    StorageError, ValidatorError,
};
pub use status::{CertificateRevalidator, ValidationEnqueuer, Validator, ValidatorStatusStore};
pub use trust::{
    Alert, AlertSink, AuditAlertSink, CertificateStore, CertificateTrustEngine,
    CertificateVerifier, ChannelAlertSink, VerificationResult, VerificationStatus,
};

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber.
///
/// `level` takes any `EnvFilter` directive; without one `RUST_LOG` is used,
/// falling back to `info`. Calling this again after a subscriber is installed
/// does nothing.
pub fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(directive) => EnvFilter::new(directive),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
