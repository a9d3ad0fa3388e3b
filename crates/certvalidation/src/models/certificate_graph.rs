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

//! The dependency graph of a certificate, as read for one trust decision and
//! as written back by it.
//!
//! Rows reference each other by key. A signature depends on a certificate
//! when the certificate signed it, or when the certificate counter-signed one
//! of the signature's trusted timestamps.

use super::certificate::Certificate;
use super::certificate_validation::CertificateValidation;
use super::package_signature::{PackageSignature, PackageSigningState};
use std::collections::BTreeMap;

/// A certificate and everything that depends on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateGraph {
    pub certificate: Certificate,
    /// Dependent signatures by id, each with all of its trusted timestamps
    pub signatures: BTreeMap<i64, PackageSignature>,
    /// Signing states of the packages owning the dependent signatures
    pub signing_states: BTreeMap<i64, PackageSigningState>,
}

impl CertificateGraph {
    /// Signatures produced by the certificate itself.
    pub fn signed_by_certificate(&self) -> impl Iterator<Item = &PackageSignature> {
        let certificate_id = self.certificate.id;
        self.signatures
            .values()
            .filter(move |s| s.certificate_id == certificate_id)
    }

    /// Signatures with at least one timestamp counter-signed by the certificate.
    pub fn timestamped_by_certificate(&self) -> impl Iterator<Item = &PackageSignature> {
        let certificate_id = self.certificate.id;
        self.signatures.values().filter(move |s| {
            s.trusted_timestamps
                .iter()
                .any(|t| t.certificate_id == certificate_id)
        })
    }
}

/// The rows changed by one trust decision, committed atomically.
///
/// Each versioned row carries the `row_version` it was read with; the commit
/// fails as a whole if any of them moved in the meantime.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphUpdate {
    pub certificate: Certificate,
    /// The attempt with its new outcome; written only while still undecided
    pub validation: CertificateValidation,
    pub invalidated_signatures: Vec<PackageSignature>,
    /// Packages whose signing state becomes `Invalid`
    pub invalidated_packages: Vec<i64>,
}
