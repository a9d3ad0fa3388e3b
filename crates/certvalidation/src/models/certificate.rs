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

//! Certificate Model
//!
//! A signing or timestamping certificate whose trust is re-evaluated over
//! time. The certificate row is the root of the dependency graph that trust
//! decisions cascade through.

use crate::database::universal_types::UniversalTimestamp;
use serde::{Deserialize, Serialize};

/// Trust status of a certificate, and the outcome of a validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CertificateStatus {
    /// Never successfully checked, or only inconclusive checks so far
    Unknown,
    /// Verified as trustworthy
    Good,
    /// Verified as untrustworthy regardless of time
    Invalid,
    /// Revoked at a known point in time
    Revoked,
}

impl CertificateStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Unknown => "Unknown",
            CertificateStatus::Good => "Good",
            CertificateStatus::Invalid => "Invalid",
            CertificateStatus::Revoked => "Revoked",
        }
    }

    /// Parses a status from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Unknown" => Some(CertificateStatus::Unknown),
            "Good" => Some(CertificateStatus::Good),
            "Invalid" => Some(CertificateStatus::Invalid),
            "Revoked" => Some(CertificateStatus::Revoked),
            _ => None,
        }
    }

    /// Whether no further automatic re-validation is expected.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CertificateStatus::Unknown)
    }
}

impl std::fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a certificate record (domain type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Row key
    pub id: i64,
    /// Hex SHA-256 thumbprint, immutable once recorded
    pub thumbprint: String,
    pub status: CertificateStatus,
    /// Consecutive inconclusive verifications since the last decided status
    pub inconclusive_count: i32,
    /// Set exactly when `status` is `Revoked`
    pub revocation_time: Option<UniversalTimestamp>,
    /// When the revocation source last published status for this certificate
    pub status_update_time: Option<UniversalTimestamp>,
    /// When a verification result was last applied
    pub last_verification_time: Option<UniversalTimestamp>,
    /// Optimistic-concurrency token
    pub row_version: i64,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

/// Structure for recording a new certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCertificate {
    pub thumbprint: String,
}

impl NewCertificate {
    pub fn new(thumbprint: impl Into<String>) -> Self {
        Self {
            thumbprint: thumbprint.into(),
        }
    }
}
