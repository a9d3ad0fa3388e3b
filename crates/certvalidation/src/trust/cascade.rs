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

//! Applying a verification result to a certificate's dependency graph.
//!
//! This is the in-memory half of a trust decision: it reads a graph and
//! produces the rows to write plus the alerts to raise once they are written.
//! Nothing here touches storage.
//!
//! | Result        | Certificate                  | Attempt  | Dependents                         |
//! |---------------|------------------------------|----------|------------------------------------|
//! | Good          | Good, count 0, no revocation | Good     | untouched                          |
//! | Invalid       | Invalid, count 0             | Invalid  | all invalidated                    |
//! | Revoked(T)    | Revoked at T, count 0        | Revoked  | invalidated if event time >= T     |
//! | Unknown < max | count + 1                    | open     | untouched                          |
//! | Unknown >= max| Invalid, count + 1           | Invalid  | untouched, operator alerted        |

use std::collections::BTreeSet;

use crate::database::universal_types::UniversalTimestamp;
use crate::models::{
    Certificate, CertificateGraph, CertificateStatus, CertificateValidation, GraphUpdate,
    PackageSignature, PackageSignatureStatus, PackageSigningStatus,
};

use super::alerts::Alert;
use super::verifier::{VerificationResult, VerificationStatus};

/// The rows a verification result changes and the alerts it raises.
#[derive(Debug, Clone, PartialEq)]
pub struct TrustDecision {
    pub update: GraphUpdate,
    /// Raised only after `update` is committed
    pub alerts: Vec<Alert>,
}

/// Which dependents a decided certificate status invalidates.
enum Cascade {
    None,
    All,
    AtOrAfter(UniversalTimestamp),
}

/// Applies `result` to `graph` and the attempt being validated.
pub fn decide(
    graph: &CertificateGraph,
    validation: &CertificateValidation,
    result: &VerificationResult,
    max_inconclusive_count: i32,
    now: UniversalTimestamp,
) -> TrustDecision {
    let mut certificate = graph.certificate.clone();
    let mut validation = validation.clone();
    let mut alerts = Vec::new();

    let (cascade, outcome) = match result.status {
        VerificationStatus::Good => {
            decided(&mut certificate, CertificateStatus::Good, None, result, now);
            (Cascade::None, Some(CertificateStatus::Good))
        }
        VerificationStatus::Invalid => {
            decided(&mut certificate, CertificateStatus::Invalid, None, result, now);
            (Cascade::All, Some(CertificateStatus::Invalid))
        }
        VerificationStatus::Revoked { revoked_at } => {
            decided(
                &mut certificate,
                CertificateStatus::Revoked,
                Some(revoked_at),
                result,
                now,
            );
            (
                Cascade::AtOrAfter(revoked_at),
                Some(CertificateStatus::Revoked),
            )
        }
        VerificationStatus::Unknown => {
            certificate.inconclusive_count += 1;
            if certificate.inconclusive_count < max_inconclusive_count {
                (Cascade::None, None)
            } else {
                // Only the certificate is distrusted; dependents are left to
                // an operator.
                certificate.status = CertificateStatus::Invalid;
                certificate.revocation_time = None;
                alerts.push(Alert::UnableToValidateCertificate {
                    certificate_id: certificate.id,
                    thumbprint: certificate.thumbprint.clone(),
                    inconclusive_count: certificate.inconclusive_count,
                });
                (Cascade::None, Some(CertificateStatus::Invalid))
            }
        }
    };
    validation.status = outcome;

    let invalidated_signatures: Vec<PackageSignature> = graph
        .signatures
        .values()
        .filter(|s| s.status == PackageSignatureStatus::Valid)
        .filter(|s| invalidates(&cascade, certificate.id, s))
        .map(|s| PackageSignature {
            status: PackageSignatureStatus::Invalid,
            ..s.clone()
        })
        .collect();

    let mut invalidated_packages = BTreeSet::new();
    for signature in &invalidated_signatures {
        alerts.push(Alert::PackageSignatureShouldBeInvalidated {
            signature_id: signature.id,
            package_key: signature.package_key,
            certificate_id: certificate.id,
            thumbprint: certificate.thumbprint.clone(),
        });
        let already_invalid = graph
            .signing_states
            .get(&signature.package_key)
            .is_some_and(|s| s.status == PackageSigningStatus::Invalid);
        if !already_invalid {
            invalidated_packages.insert(signature.package_key);
        }
    }

    TrustDecision {
        update: GraphUpdate {
            certificate,
            validation,
            invalidated_signatures,
            invalidated_packages: invalidated_packages.into_iter().collect(),
        },
        alerts,
    }
}

fn decided(
    certificate: &mut Certificate,
    status: CertificateStatus,
    revocation_time: Option<UniversalTimestamp>,
    result: &VerificationResult,
    now: UniversalTimestamp,
) {
    certificate.status = status;
    certificate.revocation_time = revocation_time;
    certificate.inconclusive_count = 0;
    certificate.status_update_time = result.status_update_time;
    certificate.last_verification_time = Some(now);
}

fn invalidates(cascade: &Cascade, certificate_id: i64, signature: &PackageSignature) -> bool {
    match cascade {
        Cascade::None => false,
        Cascade::All => true,
        Cascade::AtOrAfter(revoked_at) => {
            // A signature with no timestamp cannot prove it predates the
            // revocation.
            let signed_after = signature.certificate_id == certificate_id
                && signature
                    .earliest_timestamp()
                    .map_or(true, |signed_at| signed_at >= *revoked_at);
            let timestamped_after = signature
                .trusted_timestamps
                .iter()
                .any(|t| t.certificate_id == certificate_id && t.value >= *revoked_at);
            signed_after || timestamped_after
        }
    }
}
