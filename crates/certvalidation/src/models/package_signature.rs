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

//! Package Signature Models
//!
//! Signatures and trusted timestamps recorded for published packages, and the
//! aggregate signing state of each package. These rows are the dependents a
//! certificate trust decision cascades to.

use crate::database::universal_types::UniversalTimestamp;
use serde::{Deserialize, Serialize};

/// Status of a single package signature.
///
/// Once `Invalid`, a signature never reverts automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageSignatureStatus {
    Valid,
    Invalid,
}

impl PackageSignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageSignatureStatus::Valid => "Valid",
            PackageSignatureStatus::Invalid => "Invalid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Valid" => Some(PackageSignatureStatus::Valid),
            "Invalid" => Some(PackageSignatureStatus::Invalid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PackageSignatureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who applied a package signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageSignatureType {
    /// Signed by the package author before upload
    Author,
    /// Signed by the repository on ingestion
    Repository,
}

impl PackageSignatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageSignatureType::Author => "Author",
            PackageSignatureType::Repository => "Repository",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Author" => Some(PackageSignatureType::Author),
            "Repository" => Some(PackageSignatureType::Repository),
            _ => None,
        }
    }
}

/// Aggregate signing status of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageSigningStatus {
    Unsigned,
    Valid,
    /// Set as soon as any owned signature becomes invalid; never auto-reverts
    Invalid,
}

impl PackageSigningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageSigningStatus::Unsigned => "Unsigned",
            PackageSigningStatus::Valid => "Valid",
            PackageSigningStatus::Invalid => "Invalid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Unsigned" => Some(PackageSigningStatus::Unsigned),
            "Valid" => Some(PackageSigningStatus::Valid),
            "Invalid" => Some(PackageSigningStatus::Invalid),
            _ => None,
        }
    }
}

impl std::fmt::Display for PackageSigningStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A timestamp counter-signed by a timestamping authority certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedTimestamp {
    pub id: i64,
    /// The signature this timestamp belongs to
    pub package_signature_id: i64,
    /// The authority certificate that counter-signed the timestamp
    pub certificate_id: i64,
    /// Time asserted by the authority
    pub value: UniversalTimestamp,
}

/// A signature over a package (domain type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSignature {
    pub id: i64,
    pub package_key: i64,
    /// The certificate that produced the signature
    pub certificate_id: i64,
    pub signature_type: PackageSignatureType,
    pub status: PackageSignatureStatus,
    /// Timestamps ordered by value, earliest first
    pub trusted_timestamps: Vec<TrustedTimestamp>,
    pub row_version: i64,
}

impl PackageSignature {
    /// The earliest time the signature is proven to have existed.
    pub fn earliest_timestamp(&self) -> Option<UniversalTimestamp> {
        self.trusted_timestamps.iter().map(|t| t.value).min()
    }
}

/// Aggregate signing state of a package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageSigningState {
    pub package_key: i64,
    pub package_id: String,
    pub package_version: String,
    pub status: PackageSigningStatus,
}

/// Structure for recording a package signing state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPackageSigningState {
    pub package_key: i64,
    pub package_id: String,
    pub package_version: String,
    pub status: PackageSigningStatus,
}

/// Structure for recording a package signature. New signatures are `Valid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPackageSignature {
    pub package_key: i64,
    pub certificate_id: i64,
    pub signature_type: PackageSignatureType,
}

/// Structure for recording a trusted timestamp on a signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrustedTimestamp {
    pub package_signature_id: i64,
    pub certificate_id: i64,
    pub value: UniversalTimestamp,
}
