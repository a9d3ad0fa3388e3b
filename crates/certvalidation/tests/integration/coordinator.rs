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

//! Message handling by the certificate validation coordinator.

use std::sync::Arc;

use certvalidation::models::{CertificateStatus, CertificateValidation};
use certvalidation::{
    AuditAlertSink, CertificateTrustEngine, CertificateValidationCoordinator,
    CertificateValidationMessage, CoordinatorError, HandleOutcome, ShutdownSignal,
    VerificationResult,
};

use crate::fixtures::{at, MemoryCertificateStore, ScriptedVerifier, TestFixture};

struct Harness {
    coordinator: CertificateValidationCoordinator,
    verifier: Arc<ScriptedVerifier>,
    shutdown: ShutdownSignal,
}

fn harness(
    fixture: &TestFixture,
    thumbprints: &[&str],
    results: impl IntoIterator<Item = VerificationResult>,
) -> Harness {
    let verifier = ScriptedVerifier::new(results);
    let shutdown = ShutdownSignal::new();
    let engine = CertificateTrustEngine::new(fixture.dal(), Arc::new(AuditAlertSink), 3);
    let coordinator = CertificateValidationCoordinator::new(
        fixture.dal(),
        MemoryCertificateStore::with(thumbprints),
        verifier.clone(),
        engine,
        shutdown.clone(),
    );
    Harness {
        coordinator,
        verifier,
        shutdown,
    }
}

fn message_for(attempt: &CertificateValidation) -> CertificateValidationMessage {
    CertificateValidationMessage {
        certificate_id: attempt.certificate_id,
        validation_id: attempt.validation_id,
        revalidate_revoked_certificate: false,
    }
}

#[tokio::test]
async fn test_conclusive_result_consumes_message() {
    let fixture = TestFixture::new().await;
    let h = harness(&fixture, &["c1"], [VerificationResult::good()]);

    let cert = fixture.certificate("c1").await;
    let attempt = fixture.attempt(cert.id).await;

    let outcome = h.coordinator.handle(&message_for(&attempt)).await.unwrap();
    assert_eq!(outcome, HandleOutcome::Handled);
    assert_eq!(
        fixture.reload_certificate(cert.id).await.status,
        CertificateStatus::Good
    );
}

#[tokio::test]
async fn test_inconclusive_result_asks_for_redelivery() {
    let fixture = TestFixture::new().await;
    let h = harness(&fixture, &["c1"], [VerificationResult::unknown()]);

    let cert = fixture.certificate("c1").await;
    let attempt = fixture.attempt(cert.id).await;
    let message = message_for(&attempt);

    assert_eq!(
        h.coordinator.handle(&message).await.unwrap(),
        HandleOutcome::Retry
    );
    assert_eq!(fixture.reload_certificate(cert.id).await.inconclusive_count, 1);

    // Redeliveries keep answering Unknown until the threshold of three.
    assert_eq!(
        h.coordinator.handle(&message).await.unwrap(),
        HandleOutcome::Retry
    );
    assert_eq!(
        h.coordinator.handle(&message).await.unwrap(),
        HandleOutcome::Handled
    );
    assert_eq!(
        fixture.reload_certificate(cert.id).await.status,
        CertificateStatus::Invalid
    );
}

#[tokio::test]
async fn test_missing_attempt_asks_for_redelivery() {
    let fixture = TestFixture::new().await;
    let h = harness(&fixture, &["c1"], []);

    let cert = fixture.certificate("c1").await;
    let message = CertificateValidationMessage {
        certificate_id: cert.id,
        validation_id: certvalidation::UniversalUuid::new_v4(),
        revalidate_revoked_certificate: false,
    };

    assert_eq!(
        h.coordinator.handle(&message).await.unwrap(),
        HandleOutcome::Retry
    );
    assert_eq!(h.verifier.calls(), 0);
}

#[tokio::test]
async fn test_duplicate_message_is_consumed_without_verifying() {
    let fixture = TestFixture::new().await;
    let h = harness(&fixture, &["c1"], [VerificationResult::invalid()]);

    let cert = fixture.certificate("c1").await;
    let attempt = fixture.attempt(cert.id).await;
    let message = message_for(&attempt);

    assert_eq!(
        h.coordinator.handle(&message).await.unwrap(),
        HandleOutcome::Handled
    );
    let committed = fixture.reload_certificate(cert.id).await;

    assert_eq!(
        h.coordinator.handle(&message).await.unwrap(),
        HandleOutcome::Handled
    );
    assert_eq!(h.verifier.calls(), 1);
    assert_eq!(fixture.reload_certificate(cert.id).await, committed);
}

#[tokio::test]
async fn test_revoked_certificate_is_skipped_unless_revalidation_requested() {
    let fixture = TestFixture::new().await;
    let h = harness(
        &fixture,
        &["c1"],
        [VerificationResult::revoked(at(0)), VerificationResult::good()],
    );

    let cert = fixture.certificate("c1").await;
    let first = fixture.attempt(cert.id).await;
    assert_eq!(
        h.coordinator.handle(&message_for(&first)).await.unwrap(),
        HandleOutcome::Handled
    );

    let second = fixture.attempt(cert.id).await;
    assert_eq!(
        h.coordinator.handle(&message_for(&second)).await.unwrap(),
        HandleOutcome::Handled
    );
    assert_eq!(h.verifier.calls(), 1);
    let skipped = fixture
        .dal()
        .certificate_validation()
        .get(cert.id, second.validation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(skipped.status, Some(CertificateStatus::Revoked));

    let third = fixture.attempt(cert.id).await;
    let revalidate = CertificateValidationMessage {
        revalidate_revoked_certificate: true,
        ..message_for(&third)
    };
    assert_eq!(
        h.coordinator.handle(&revalidate).await.unwrap(),
        HandleOutcome::Handled
    );
    assert_eq!(h.verifier.calls(), 2);
    assert_eq!(
        fixture.reload_certificate(cert.id).await.status,
        CertificateStatus::Good
    );
}

#[tokio::test]
async fn test_shutdown_leaves_message_unconsumed() {
    let fixture = TestFixture::new().await;
    let h = harness(&fixture, &["c1"], [VerificationResult::good()]);

    let cert = fixture.certificate("c1").await;
    let attempt = fixture.attempt(cert.id).await;
    h.shutdown.trigger();

    assert_eq!(
        h.coordinator.handle(&message_for(&attempt)).await.unwrap(),
        HandleOutcome::Retry
    );
    assert_eq!(h.verifier.calls(), 0);
    assert_eq!(
        fixture.reload_certificate(cert.id).await.status,
        CertificateStatus::Unknown
    );
}

#[tokio::test]
async fn test_unloadable_certificate_is_a_transient_error() {
    let fixture = TestFixture::new().await;
    let h = harness(&fixture, &[], [VerificationResult::good()]);

    let cert = fixture.certificate("c1").await;
    let attempt = fixture.attempt(cert.id).await;

    let error = h
        .coordinator
        .handle(&message_for(&attempt))
        .await
        .unwrap_err();
    assert!(matches!(error, CoordinatorError::CertificateLoad { .. }));
    assert!(!error.is_fatal());
    assert_eq!(h.verifier.calls(), 0);
}
