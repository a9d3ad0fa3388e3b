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

//! Audit logging for trust decisions.
//!
//! Durable trust changes and validator status transitions are emitted as
//! structured `tracing` events carrying an `event_type` field.

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::models::{CertificateStatus, ValidationStatus};

/// Event types for trust decisions.
pub mod events {
    /// Certificate verified as good.
    pub const CERTIFICATE_STATUS_GOOD: &str = "certificate.status.good";
    /// Certificate verified as invalid.
    pub const CERTIFICATE_STATUS_INVALID: &str = "certificate.status.invalid";
    /// Certificate verified as revoked.
    pub const CERTIFICATE_STATUS_REVOKED: &str = "certificate.status.revoked";
    /// Verification was inconclusive and will be retried.
    pub const CERTIFICATE_VALIDATION_INCONCLUSIVE: &str = "certificate.validation.inconclusive";
    /// Too many inconclusive verifications; the certificate was marked invalid.
    pub const CERTIFICATE_VALIDATION_ABANDONED: &str = "certificate.validation.abandoned";

    /// A package signature was invalidated by a certificate decision.
    pub const SIGNATURE_INVALIDATED: &str = "signature.invalidated";

    /// Validator status record created.
    pub const VALIDATOR_STATUS_CREATED: &str = "validator.status.created";
    /// Validator status record updated.
    pub const VALIDATOR_STATUS_SAVED: &str = "validator.status.saved";

    /// An alert could not be handed to its sink.
    pub const ALERT_DELIVERY_FAILED: &str = "alert.delivery.failed";
    /// Stored state contradicts a caller's request.
    pub const CONSISTENCY_VIOLATION: &str = "consistency.violation";
}

/// Log a decided certificate status.
pub fn log_certificate_decided(
    certificate_id: i64,
    thumbprint: &str,
    status: CertificateStatus,
    revocation_time: Option<UniversalTimestamp>,
    invalidated_signatures: usize,
) {
    let revoked_at = revocation_time
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "<none>".to_string());
    match status {
        CertificateStatus::Good => tracing::info!(
            event_type = events::CERTIFICATE_STATUS_GOOD,
            certificate_id = certificate_id,
            thumbprint = %thumbprint,
            "Certificate verified as good"
        ),
        CertificateStatus::Invalid => tracing::warn!(
            event_type = events::CERTIFICATE_STATUS_INVALID,
            certificate_id = certificate_id,
            thumbprint = %thumbprint,
            invalidated_signatures = invalidated_signatures,
            "Certificate verified as invalid"
        ),
        CertificateStatus::Revoked => tracing::warn!(
            event_type = events::CERTIFICATE_STATUS_REVOKED,
            certificate_id = certificate_id,
            thumbprint = %thumbprint,
            revoked_at = %revoked_at,
            invalidated_signatures = invalidated_signatures,
            "Certificate verified as revoked"
        ),
        CertificateStatus::Unknown => tracing::debug!(
            certificate_id = certificate_id,
            thumbprint = %thumbprint,
            "Certificate status left undecided"
        ),
    }
}

/// Log an inconclusive verification that will be retried.
pub fn log_certificate_inconclusive(
    certificate_id: i64,
    thumbprint: &str,
    inconclusive_count: i32,
    max_inconclusive_count: i32,
) {
    tracing::info!(
        event_type = events::CERTIFICATE_VALIDATION_INCONCLUSIVE,
        certificate_id = certificate_id,
        thumbprint = %thumbprint,
        inconclusive_count = inconclusive_count,
        max_inconclusive_count = max_inconclusive_count,
        "Certificate verification inconclusive"
    );
}

/// Log a certificate marked invalid after repeated inconclusive verifications.
pub fn log_certificate_abandoned(certificate_id: i64, thumbprint: &str, inconclusive_count: i32) {
    tracing::error!(
        event_type = events::CERTIFICATE_VALIDATION_ABANDONED,
        certificate_id = certificate_id,
        thumbprint = %thumbprint,
        inconclusive_count = inconclusive_count,
        "Unable to validate certificate; marked invalid without invalidating dependents"
    );
}

/// Log a package signature invalidated by a certificate decision.
pub fn log_signature_invalidated(
    signature_id: i64,
    package_key: i64,
    certificate_id: i64,
    thumbprint: &str,
) {
    tracing::warn!(
        event_type = events::SIGNATURE_INVALIDATED,
        signature_id = signature_id,
        package_key = package_key,
        certificate_id = certificate_id,
        thumbprint = %thumbprint,
        "Package signature should be invalidated"
    );
}

/// Log a validator status creation.
pub fn log_validator_status_created(
    validator_name: &str,
    validation_id: UniversalUuid,
    package_key: i64,
    state: ValidationStatus,
) {
    tracing::info!(
        event_type = events::VALIDATOR_STATUS_CREATED,
        validator_name = %validator_name,
        validation_id = %validation_id,
        package_key = package_key,
        state = %state,
        "Validator status created"
    );
}

/// Log a validator status update.
pub fn log_validator_status_saved(
    validator_name: &str,
    validation_id: UniversalUuid,
    package_key: i64,
    state: ValidationStatus,
) {
    tracing::info!(
        event_type = events::VALIDATOR_STATUS_SAVED,
        validator_name = %validator_name,
        validation_id = %validation_id,
        package_key = package_key,
        state = %state,
        "Validator status saved"
    );
}

/// Log an alert that could not be delivered.
pub fn log_alert_delivery_failed(alert: &str, error: &str) {
    tracing::error!(
        event_type = events::ALERT_DELIVERY_FAILED,
        alert = %alert,
        error = %error,
        "Failed to deliver alert"
    );
}

/// Log a consistency violation surfaced to a caller.
pub fn log_consistency_violation(context: &str, error: &str) {
    tracing::error!(
        event_type = events::CONSISTENCY_VIOLATION,
        context = %context,
        error = %error,
        "Consistency violation"
    );
}
