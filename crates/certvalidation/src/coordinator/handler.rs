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

//! Certificate validation message handling.
//!
//! One message drives one certificate validation attempt forward. Handling
//! ends in [`HandleOutcome::Handled`] (consume the message) or
//! [`HandleOutcome::Retry`] (leave it for redelivery). Ordinary races are
//! never errors: an attempt that is not visible yet, a lost commit, or an
//! inconclusive verification all end in `Retry`.
//!
//! Messages arrive at least once and in any order, so handling is guarded
//! twice before any verification happens:
//!
//! 1. an attempt that already has an outcome is consumed without work;
//! 2. a certificate already known to be revoked is consumed without
//!    verification unless the message asks for revoked certificates to be
//!    re-checked. The attempt is recorded as `Revoked` so the validation it
//!    belongs to can finish.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audit;
use crate::dal::DAL;
use crate::database::universal_types::UniversalUuid;
use crate::error::{ConsistencyError, CoordinatorError, StorageError};
use crate::models::CertificateStatus;
use crate::trust::{CertificateStore, CertificateTrustEngine, CertificateVerifier};

use super::shutdown::ShutdownSignal;

/// A request to validate one certificate as part of a validation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateValidationMessage {
    pub certificate_id: i64,
    pub validation_id: UniversalUuid,
    /// Re-check the certificate even if it is already known to be revoked
    pub revalidate_revoked_certificate: bool,
}

/// What the transport should do with a message after handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Consume the message
    Handled,
    /// Leave the message for redelivery
    Retry,
}

impl HandleOutcome {
    fn label(&self) -> &'static str {
        match self {
            HandleOutcome::Handled => "handled",
            HandleOutcome::Retry => "retry",
        }
    }
}

/// Drives certificate validation attempts to completion.
#[derive(Clone)]
pub struct CertificateValidationCoordinator {
    dal: DAL,
    certificate_store: Arc<dyn CertificateStore>,
    verifier: Arc<dyn CertificateVerifier>,
    engine: CertificateTrustEngine,
    shutdown: ShutdownSignal,
}

impl CertificateValidationCoordinator {
    pub fn new(
        dal: DAL,
        certificate_store: Arc<dyn CertificateStore>,
        verifier: Arc<dyn CertificateVerifier>,
        engine: CertificateTrustEngine,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            dal,
            certificate_store,
            verifier,
            engine,
            shutdown,
        }
    }

    /// Handles one delivery of `message`.
    ///
    /// Errors are either transient (storage or certificate store trouble, the
    /// message should be redelivered later) or fatal consistency violations;
    /// see [`CoordinatorError::is_fatal`].
    pub async fn handle(
        &self,
        message: &CertificateValidationMessage,
    ) -> Result<HandleOutcome, CoordinatorError> {
        let result = self.handle_message(message).await;

        let label = match &result {
            Ok(outcome) => outcome.label(),
            Err(e) if e.is_fatal() => "fatal",
            Err(_) => "error",
        };
        metrics::counter!("certvalidation_messages_total", "outcome" => label).increment(1);

        result
    }

    async fn handle_message(
        &self,
        message: &CertificateValidationMessage,
    ) -> Result<HandleOutcome, CoordinatorError> {
        if self.shutdown.is_triggered() {
            debug!(
                certificate_id = message.certificate_id,
                validation_id = %message.validation_id,
                "Shutdown requested; leaving message for redelivery"
            );
            return Ok(HandleOutcome::Retry);
        }

        let Some(mut validation) = self
            .dal
            .certificate_validation()
            .get(message.certificate_id, message.validation_id)
            .await?
        else {
            debug!(
                certificate_id = message.certificate_id,
                validation_id = %message.validation_id,
                "Certificate validation not visible yet"
            );
            return Ok(HandleOutcome::Retry);
        };

        if let Some(status) = validation.status {
            if !status.is_terminal() {
                let error = ConsistencyError::NonTerminalOutcome {
                    certificate_id: validation.certificate_id,
                    validation_id: validation.validation_id,
                    value: status.to_string(),
                };
                audit::log_consistency_violation("certificate validation", &error.to_string());
                return Err(error.into());
            }
            warn!(
                certificate_id = validation.certificate_id,
                validation_id = %validation.validation_id,
                status = %status,
                "Certificate validation already decided; dropping duplicate message"
            );
            return Ok(HandleOutcome::Handled);
        }

        let certificate = self
            .dal
            .certificate()
            .get_by_id(validation.certificate_id)
            .await?
            .ok_or_else(|| StorageError::NotFound {
                entity: "certificate",
                key: validation.certificate_id.to_string(),
            })?;

        if certificate.status == CertificateStatus::Revoked
            && !message.revalidate_revoked_certificate
        {
            warn!(
                certificate_id = certificate.id,
                thumbprint = %certificate.thumbprint,
                validation_id = %validation.validation_id,
                "Certificate already revoked; skipping validation"
            );
            self.dal
                .certificate_validation()
                .record_outcome(validation.id, CertificateStatus::Revoked)
                .await?;
            return Ok(HandleOutcome::Handled);
        }

        let bytes = self
            .certificate_store
            .load(&certificate.thumbprint)
            .await
            .map_err(|source| CoordinatorError::CertificateLoad {
                thumbprint: certificate.thumbprint.clone(),
                source,
            })?;

        let result = self.verifier.verify(&bytes).await;
        debug!(
            certificate_id = certificate.id,
            thumbprint = %certificate.thumbprint,
            result = ?result.status,
            "Certificate verified"
        );

        if !self.engine.try_save_result(&mut validation, &result).await? {
            info!(
                certificate_id = certificate.id,
                validation_id = %validation.validation_id,
                "Certificate changed while validating; retrying"
            );
            return Ok(HandleOutcome::Retry);
        }

        Ok(match validation.status {
            Some(_) => HandleOutcome::Handled,
            None => HandleOutcome::Retry,
        })
    }
}
