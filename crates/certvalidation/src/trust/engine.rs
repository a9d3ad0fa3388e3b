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

//! Certificate trust engine.
//!
//! Reads a certificate's dependency graph fresh, applies a verification
//! result to it in memory, and commits the result in one transaction. Alerts
//! are raised only after the commit lands, so an attempt that loses the
//! commit race raises nothing and its retry raises them once.

use std::sync::Arc;

use crate::audit;
use crate::config::CertificateValidationConfig;
use crate::dal::{CommitOutcome, DAL};
use crate::database::universal_types::UniversalTimestamp;
use crate::error::StorageError;
use crate::models::{CertificateStatus, CertificateValidation};

use super::alerts::AlertSink;
use super::cascade;
use super::verifier::{VerificationResult, VerificationStatus};

/// Applies verification results to certificates and their dependents.
#[derive(Clone)]
pub struct CertificateTrustEngine {
    dal: DAL,
    alert_sink: Arc<dyn AlertSink>,
    max_inconclusive_count: i32,
}

impl std::fmt::Debug for CertificateTrustEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateTrustEngine")
            .field("max_inconclusive_count", &self.max_inconclusive_count)
            .finish_non_exhaustive()
    }
}

impl CertificateTrustEngine {
    pub fn new(dal: DAL, alert_sink: Arc<dyn AlertSink>, max_inconclusive_count: i32) -> Self {
        Self {
            dal,
            alert_sink,
            max_inconclusive_count,
        }
    }

    pub fn from_config(
        dal: DAL,
        alert_sink: Arc<dyn AlertSink>,
        config: &CertificateValidationConfig,
    ) -> Self {
        Self::new(dal, alert_sink, config.max_inconclusive_count())
    }

    /// Applies `result` to the attempt's certificate and commits the cascade.
    ///
    /// Returns `Ok(false)` when another writer changed the graph first; the
    /// caller should retry the whole attempt. On `Ok(true)` the attempt's
    /// status reflects the committed outcome, which is still `None` when the
    /// result was inconclusive and below the threshold.
    pub async fn try_save_result(
        &self,
        validation: &mut CertificateValidation,
        result: &VerificationResult,
    ) -> Result<bool, StorageError> {
        let graph = self
            .dal
            .certificate()
            .load_graph(validation.certificate_id)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "certificate",
                key: validation.certificate_id.to_string(),
            })?;

        let decision = cascade::decide(
            &graph,
            validation,
            result,
            self.max_inconclusive_count,
            UniversalTimestamp::now(),
        );

        let certificate = decision.update.certificate.clone();
        let outcome = decision.update.validation.status;
        let invalidated = decision.update.invalidated_signatures.len();

        match self.dal.certificate().commit(decision.update).await? {
            CommitOutcome::Conflict => {
                metrics::counter!("certvalidation_commit_conflicts_total").increment(1);
                Ok(false)
            }
            CommitOutcome::Committed => {
                validation.status = outcome;

                match outcome {
                    None => audit::log_certificate_inconclusive(
                        certificate.id,
                        &certificate.thumbprint,
                        certificate.inconclusive_count,
                        self.max_inconclusive_count,
                    ),
                    Some(status) => audit::log_certificate_decided(
                        certificate.id,
                        &certificate.thumbprint,
                        status,
                        certificate.revocation_time,
                        invalidated,
                    ),
                }
                metrics::counter!(
                    "certvalidation_results_total",
                    "status" => status_label(&result.status)
                )
                .increment(1);
                metrics::counter!("certvalidation_signatures_invalidated_total")
                    .increment(invalidated as u64);

                for alert in decision.alerts {
                    self.alert_sink.raise(alert);
                }
                Ok(true)
            }
        }
    }
}

fn status_label(status: &VerificationStatus) -> &'static str {
    match status.certificate_status() {
        CertificateStatus::Good => "good",
        CertificateStatus::Invalid => "invalid",
        CertificateStatus::Revoked => "revoked",
        CertificateStatus::Unknown => "unknown",
    }
}
