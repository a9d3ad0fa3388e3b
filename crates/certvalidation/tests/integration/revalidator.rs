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

//! The orchestrator-facing validator end to end.

use std::sync::Arc;

use certvalidation::models::{ValidationRequest, ValidationStatus};
use certvalidation::{
    AuditAlertSink, CertificateRevalidator, CertificateTrustEngine,
    CertificateValidationCoordinator, HandleOutcome, InMemoryQueue, MessageSource, ShutdownSignal,
    UniversalUuid, Validator, ValidatorStatusStore, VerificationResult,
};

use crate::fixtures::{at, MemoryCertificateStore, ScriptedVerifier, TestFixture};

const VALIDATOR: &str = "certificate-validator";

fn revalidator(fixture: &TestFixture, queue: &InMemoryQueue) -> CertificateRevalidator {
    CertificateRevalidator::new(
        ValidatorStatusStore::new(fixture.dal(), VALIDATOR),
        fixture.dal(),
        Arc::new(queue.clone()),
    )
}

fn request(package_key: i64) -> ValidationRequest {
    ValidationRequest::new(UniversalUuid::new_v4(), package_key, "Contoso.Package1", "1.0.0")
}

#[tokio::test]
async fn test_start_validation_enqueues_signers_and_authorities() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let validator = revalidator(&fixture, &queue);

    let signer = fixture.certificate("r1").await;
    let authority = fixture.certificate("r2").await;
    fixture.package(1).await;
    let signature = fixture.signature(1, signer.id).await;
    fixture.timestamp(signature.id, authority.id, at(0)).await;

    let request = request(1);
    assert_eq!(
        validator.start_validation(&request).await.unwrap(),
        ValidationStatus::Incomplete
    );
    assert_eq!(queue.len(), 2);

    let mut enqueued = Vec::new();
    while let Some(delivery) = queue.receive().await.unwrap() {
        assert_eq!(delivery.message.validation_id, request.validation_id);
        assert!(!delivery.message.revalidate_revoked_certificate);
        enqueued.push(delivery.message.certificate_id);
        queue.complete(&delivery).await.unwrap();
    }
    enqueued.sort_unstable();
    assert_eq!(enqueued, vec![signer.id, authority.id]);

    // Starting again is a no-op.
    assert_eq!(
        validator.start_validation(&request).await.unwrap(),
        ValidationStatus::Incomplete
    );
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_unsigned_package_succeeds_immediately() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let validator = revalidator(&fixture, &queue);
    fixture.package(1).await;

    let request = request(1);
    assert_eq!(
        validator.get_status(&request).await.unwrap(),
        ValidationStatus::NotStarted
    );
    assert_eq!(
        validator.start_validation(&request).await.unwrap(),
        ValidationStatus::Succeeded
    );
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_status_follows_certificate_outcomes() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let validator = revalidator(&fixture, &queue);
    let engine = CertificateTrustEngine::new(fixture.dal(), Arc::new(AuditAlertSink), 10);

    let good = fixture.certificate("s1").await;
    let revoked = fixture.certificate("s2").await;
    fixture.package(1).await;
    fixture.signature(1, good.id).await;
    fixture.signature(1, revoked.id).await;

    let request = request(1);
    validator.start_validation(&request).await.unwrap();

    let dal = fixture.dal();
    let mut good_attempt = dal
        .certificate_validation()
        .get(good.id, request.validation_id)
        .await
        .unwrap()
        .unwrap();
    engine
        .try_save_result(&mut good_attempt, &VerificationResult::good())
        .await
        .unwrap();
    assert_eq!(
        validator.get_status(&request).await.unwrap(),
        ValidationStatus::Incomplete
    );

    let mut revoked_attempt = dal
        .certificate_validation()
        .get(revoked.id, request.validation_id)
        .await
        .unwrap()
        .unwrap();
    engine
        .try_save_result(&mut revoked_attempt, &VerificationResult::revoked(at(0)))
        .await
        .unwrap();
    assert_eq!(
        validator.get_status(&request).await.unwrap(),
        ValidationStatus::Failed
    );
}

#[tokio::test]
async fn test_second_attempt_requests_revoked_revalidation() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let validator = revalidator(&fixture, &queue);

    let signer = fixture.certificate("t1").await;
    fixture.package(1).await;
    fixture.signature(1, signer.id).await;

    validator.start_validation(&request(1)).await.unwrap();
    validator.start_validation(&request(1)).await.unwrap();

    let first = queue.receive().await.unwrap().unwrap();
    let second = queue.receive().await.unwrap().unwrap();
    assert!(!first.message.revalidate_revoked_certificate);
    assert!(second.message.revalidate_revoked_certificate);
}

#[tokio::test]
async fn test_package_signed_by_revoked_certificate_finishes() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let validator = revalidator(&fixture, &queue);
    let engine = CertificateTrustEngine::new(fixture.dal(), Arc::new(AuditAlertSink), 10);

    let signer = fixture.certificate("p1").await;
    fixture.package(2).await;
    fixture.signature(2, signer.id).await;

    // An earlier, unrelated check revokes the signer.
    let mut earlier = fixture.attempt(signer.id).await;
    engine
        .try_save_result(&mut earlier, &VerificationResult::revoked(at(0)))
        .await
        .unwrap();

    let request = request(2);
    assert_eq!(
        validator.start_validation(&request).await.unwrap(),
        ValidationStatus::Incomplete
    );

    let verifier = ScriptedVerifier::new([]);
    let coordinator = CertificateValidationCoordinator::new(
        fixture.dal(),
        MemoryCertificateStore::with(&["p1"]),
        verifier.clone(),
        engine,
        ShutdownSignal::new(),
    );
    let delivery = queue.receive().await.unwrap().unwrap();
    assert!(!delivery.message.revalidate_revoked_certificate);
    assert_eq!(
        coordinator.handle(&delivery.message).await.unwrap(),
        HandleOutcome::Handled
    );
    queue.complete(&delivery).await.unwrap();
    assert_eq!(verifier.calls(), 0);
    assert!(queue.is_empty());

    assert_eq!(
        validator.get_status(&request).await.unwrap(),
        ValidationStatus::Failed
    );
}
