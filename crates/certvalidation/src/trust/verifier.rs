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

//! Boundaries to certificate storage and raw verification.
//!
//! Chain building and revocation probing live behind [`CertificateVerifier`].
//! A verifier never fails: a transient problem is reported as
//! [`VerificationStatus::Unknown`] so the inconclusive threshold applies.

use async_trait::async_trait;

use crate::database::universal_types::UniversalTimestamp;
use crate::error::CertificateStoreError;
use crate::models::CertificateStatus;

/// Outcome of verifying a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Good,
    Invalid,
    Revoked { revoked_at: UniversalTimestamp },
    /// Neither confirmed nor refuted; usually a transient check failure
    Unknown,
}

impl VerificationStatus {
    /// The certificate status this outcome corresponds to.
    pub fn certificate_status(&self) -> CertificateStatus {
        match self {
            VerificationStatus::Good => CertificateStatus::Good,
            VerificationStatus::Invalid => CertificateStatus::Invalid,
            VerificationStatus::Revoked { .. } => CertificateStatus::Revoked,
            VerificationStatus::Unknown => CertificateStatus::Unknown,
        }
    }
}

/// A verification outcome plus revocation-source metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    pub status: VerificationStatus,
    /// When the revocation source last published status, if it said
    pub status_update_time: Option<UniversalTimestamp>,
}

impl VerificationResult {
    pub fn new(status: VerificationStatus) -> Self {
        Self {
            status,
            status_update_time: None,
        }
    }

    pub fn good() -> Self {
        Self::new(VerificationStatus::Good)
    }

    pub fn invalid() -> Self {
        Self::new(VerificationStatus::Invalid)
    }

    pub fn revoked(revoked_at: UniversalTimestamp) -> Self {
        Self::new(VerificationStatus::Revoked { revoked_at })
    }

    pub fn unknown() -> Self {
        Self::new(VerificationStatus::Unknown)
    }

    pub fn with_status_update_time(mut self, time: UniversalTimestamp) -> Self {
        self.status_update_time = Some(time);
        self
    }
}

/// Verifies raw certificate bytes.
#[async_trait]
pub trait CertificateVerifier: Send + Sync {
    async fn verify(&self, certificate: &[u8]) -> VerificationResult;
}

/// Loads certificate bytes by thumbprint.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn load(&self, thumbprint: &str) -> Result<Vec<u8>, CertificateStoreError>;
}
