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

//! The validator interface exposed to the orchestrator.
//!
//! The orchestrator calls [`Validator::start_validation`] and polls
//! [`Validator::get_status`] for each package validation attempt. Both calls
//! are idempotent and safe to repeat for the same validation id.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::coordinator::CertificateValidationMessage;
use crate::dal::DAL;
use crate::error::ValidatorError;
use crate::models::{
    NewCertificateValidation, PackageSigningStatus, ValidationRequest, ValidationStatus,
};

use super::store::ValidatorStatusStore;

/// A package validator driven by the orchestrator.
#[async_trait]
pub trait Validator: Send + Sync {
    async fn get_status(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationStatus, ValidatorError>;

    async fn start_validation(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationStatus, ValidatorError>;
}

/// Sends certificate validation messages to the coordinator's transport.
#[async_trait]
pub trait ValidationEnqueuer: Send + Sync {
    async fn enqueue(&self, message: CertificateValidationMessage) -> Result<(), ValidatorError>;
}

/// Re-validates the certificates a package's signatures depend on.
#[derive(Clone)]
pub struct CertificateRevalidator {
    store: ValidatorStatusStore,
    dal: DAL,
    enqueuer: Arc<dyn ValidationEnqueuer>,
}

impl CertificateRevalidator {
    pub fn new(
        store: ValidatorStatusStore,
        dal: DAL,
        enqueuer: Arc<dyn ValidationEnqueuer>,
    ) -> Self {
        Self {
            store,
            dal,
            enqueuer,
        }
    }

    /// Certificates the package depends on: its signers and the authorities
    /// that timestamped its signatures.
    async fn dependent_certificates(
        &self,
        package_key: i64,
    ) -> Result<BTreeSet<i64>, ValidatorError> {
        let signatures = self
            .dal
            .package_signature()
            .list_for_package(package_key)
            .await?;

        let mut certificates = BTreeSet::new();
        for signature in &signatures {
            certificates.insert(signature.certificate_id);
            certificates.extend(signature.trusted_timestamps.iter().map(|t| t.certificate_id));
        }
        Ok(certificates)
    }
}

#[async_trait]
impl Validator for CertificateRevalidator {
    /// Returns the stored state, finishing an `Incomplete` validation once
    /// every certificate attempt under it has an outcome.
    async fn get_status(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationStatus, ValidatorError> {
        let status = self.store.get_status(request).await?;
        if status.state != ValidationStatus::Incomplete {
            return Ok(status.state);
        }

        let attempts = self
            .dal
            .certificate_validation()
            .list_by_validation_id(request.validation_id)
            .await?;
        if attempts.iter().any(|a| !a.is_decided()) {
            return Ok(status.state);
        }

        let signing_state = self
            .dal
            .package_signature()
            .get_signing_state(request.package_key)
            .await?;
        let desired = match signing_state.map(|s| s.status) {
            Some(PackageSigningStatus::Invalid) => ValidationStatus::Failed,
            _ => ValidationStatus::Succeeded,
        };

        let winner = self.store.try_update_with_state(&status, desired).await?;
        info!(
            validation_id = %request.validation_id,
            package_key = request.package_key,
            state = %winner.state,
            "Certificate revalidation finished"
        );
        Ok(winner.state)
    }

    /// Enqueues one message per dependent certificate and records the
    /// validation as `Incomplete`. A package with no dependent certificates
    /// succeeds immediately.
    async fn start_validation(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidationStatus, ValidatorError> {
        let status = self.store.get_status(request).await?;
        if status.state != ValidationStatus::NotStarted {
            debug!(
                validation_id = %request.validation_id,
                state = %status.state,
                "Validation already started"
            );
            return Ok(status.state);
        }

        let revalidate_revoked_certificate = self.store.is_revalidation_request(request).await?;
        let certificates = self.dependent_certificates(request.package_key).await?;

        for certificate_id in &certificates {
            let attempt = self
                .dal
                .certificate_validation()
                .create(NewCertificateValidation {
                    certificate_id: *certificate_id,
                    validation_id: request.validation_id,
                })
                .await?;
            if attempt.is_decided() {
                continue;
            }
            self.enqueuer
                .enqueue(CertificateValidationMessage {
                    certificate_id: *certificate_id,
                    validation_id: request.validation_id,
                    revalidate_revoked_certificate,
                })
                .await?;
        }

        let desired = if certificates.is_empty() {
            ValidationStatus::Succeeded
        } else {
            ValidationStatus::Incomplete
        };
        let winner = self.store.try_add_with_state(request, desired).await?;
        info!(
            validation_id = %request.validation_id,
            package_key = request.package_key,
            certificates = certificates.len(),
            state = %winner.state,
            "Certificate revalidation started"
        );
        Ok(winner.state)
    }
}
