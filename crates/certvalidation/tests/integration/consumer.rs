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

//! Delivery routing by the consumer loop.

use std::sync::Arc;
use std::time::Duration;

use certvalidation::database::schema::certificate_validations;
use certvalidation::models::{CertificateStatus, CertificateValidation};
use certvalidation::{
    AuditAlertSink, CertificateTrustEngine, CertificateValidationCoordinator,
    CertificateValidationMessage, InMemoryQueue, ShutdownSignal, ValidationConsumer,
    VerificationResult,
};
use diesel::prelude::*;

use crate::fixtures::{MemoryCertificateStore, ScriptedVerifier, TestFixture};

fn consumer(
    fixture: &TestFixture,
    queue: &InMemoryQueue,
    results: impl IntoIterator<Item = VerificationResult>,
) -> (ValidationConsumer, ShutdownSignal) {
    let shutdown = ShutdownSignal::new();
    let coordinator = CertificateValidationCoordinator::new(
        fixture.dal(),
        MemoryCertificateStore::with(&["q1", "q2"]),
        ScriptedVerifier::new(results),
        CertificateTrustEngine::new(fixture.dal(), Arc::new(AuditAlertSink), 10),
        shutdown.clone(),
    );
    let consumer = ValidationConsumer::new(
        Arc::new(queue.clone()),
        Arc::new(coordinator),
        shutdown.clone(),
        Duration::from_millis(10),
    );
    (consumer, shutdown)
}

fn message_for(attempt: &CertificateValidation) -> CertificateValidationMessage {
    CertificateValidationMessage {
        certificate_id: attempt.certificate_id,
        validation_id: attempt.validation_id,
        revalidate_revoked_certificate: false,
    }
}

#[tokio::test]
async fn test_deliveries_are_settled_by_outcome() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let (consumer, _shutdown) = consumer(
        &fixture,
        &queue,
        [VerificationResult::good(), VerificationResult::unknown()],
    );

    let decided = fixture.certificate("q1").await;
    let undecided = fixture.certificate("q2").await;
    let first = fixture.attempt(decided.id).await;
    let second = fixture.attempt(undecided.id).await;
    queue.send(message_for(&first));
    queue.send(message_for(&second));

    assert!(consumer.process_next().await.unwrap());
    assert_eq!(queue.len(), 1);

    // The inconclusive one goes back to the queue.
    assert!(consumer.process_next().await.unwrap());
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.in_flight(), 0);

    assert_eq!(
        fixture.reload_certificate(decided.id).await.status,
        CertificateStatus::Good
    );
    assert_eq!(
        fixture.reload_certificate(undecided.id).await.inconclusive_count,
        1
    );
}

#[tokio::test]
async fn test_empty_source_reports_no_work() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let (consumer, _shutdown) = consumer(&fixture, &queue, []);

    assert!(!consumer.process_next().await.unwrap());
}

#[tokio::test]
async fn test_consistency_violation_is_dead_lettered() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let (consumer, _shutdown) = consumer(&fixture, &queue, []);

    let cert = fixture.certificate("q1").await;
    let attempt = fixture.attempt(cert.id).await;

    // An attempt can only ever be decided with a terminal outcome.
    let conn = fixture.dal().database.get_connection().await.unwrap();
    let attempt_id = attempt.id;
    conn.interact(move |conn| {
        diesel::update(certificate_validations::table.find(attempt_id))
            .set(certificate_validations::status.eq(Some("Unknown")))
            .execute(conn)
    })
    .await
    .unwrap()
    .unwrap();
    drop(conn);

    queue.send(message_for(&attempt));
    assert!(consumer.process_next().await.unwrap());

    let dead = queue.dead_letters();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].0.certificate_id, cert.id);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_run_drains_queue_until_shutdown() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let (consumer, shutdown) = consumer(&fixture, &queue, [VerificationResult::invalid()]);

    let cert = fixture.certificate("q1").await;
    let attempt = fixture.attempt(cert.id).await;
    queue.send(message_for(&attempt));

    let handle = tokio::spawn(async move { consumer.run().await });

    let mut decided = false;
    for _ in 0..100 {
        if fixture.reload_certificate(cert.id).await.status == CertificateStatus::Invalid {
            decided = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(decided);

    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("consumer did not stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_run_stops_when_source_closes() {
    let fixture = TestFixture::new().await;
    let queue = InMemoryQueue::new();
    let (consumer, _shutdown) = consumer(&fixture, &queue, []);

    queue.close();
    tokio::time::timeout(Duration::from_secs(5), consumer.run())
        .await
        .expect("consumer did not stop")
        .unwrap();
}
