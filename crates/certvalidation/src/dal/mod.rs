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

//! Data Access Layer
//!
//! Per-entity accessors over the SQLite pool. Each accessor borrows the DAL
//! and runs its queries on a pooled connection inside `interact`.
//!
//! Optimistic-concurrency results are returned as values, not errors:
//! [`CreateOutcome`], [`SaveOutcome`] and [`CommitOutcome`].

use crate::database::Database;

pub mod certificate;
pub mod certificate_validation;
pub mod models;
pub mod package_signature;
pub mod validator_status;

pub use certificate::{CertificateDAL, CommitOutcome};
pub use certificate_validation::CertificateValidationDAL;
pub use package_signature::PackageSignatureDAL;
pub use validator_status::{CreateOutcome, SaveOutcome, ValidatorStatusDAL};

/// The main Data Access Layer struct.
#[derive(Clone, Debug)]
pub struct DAL {
    pub database: Database,
}

impl DAL {
    /// Creates a new DAL instance over the given database.
    pub fn new(database: Database) -> Self {
        DAL { database }
    }

    pub fn certificate(&self) -> CertificateDAL<'_> {
        CertificateDAL::new(self)
    }

    pub fn certificate_validation(&self) -> CertificateValidationDAL<'_> {
        CertificateValidationDAL::new(self)
    }

    pub fn package_signature(&self) -> PackageSignatureDAL<'_> {
        PackageSignatureDAL::new(self)
    }

    pub fn validator_status(&self) -> ValidatorStatusDAL<'_> {
        ValidatorStatusDAL::new(self)
    }
}
