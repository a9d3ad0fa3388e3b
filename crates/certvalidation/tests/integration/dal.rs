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

//! Storage behavior the engine and the validator rely on.

use certvalidation::dal::CommitOutcome;
use certvalidation::models::{CertificateStatus, NewCertificateValidation, PackageSignatureStatus};
use certvalidation::trust::cascade;
use certvalidation::{UniversalTimestamp, VerificationResult};

use crate::fixtures::{at, TestFixture};

#[tokio::test]
async fn test_load_graph_collects_signed_and_timestamped_signatures() {
    let fixture = TestFixture::new().await;
    let dal = fixture.dal();

    let cert = fixture.certificate("1a").await;
    let other = fixture.certificate("1b").await;
    fixture.package(1).await;
    fixture.package(2).await;
    fixture.package(3).await;

    let signed = fixture.signature(1, cert.id).await;
    let countersigned = fixture.signature(2, other.id).await;
    fixture.timestamp(countersigned.id, other.id, at(2)).await;
    fixture.timestamp(countersigned.id, cert.id, at(1)).await;
    let unrelated = fixture.signature(3, other.id).await;

    let graph = dal
        .certificate()
        .load_graph(cert.id)
        .await
        .unwrap()
        .expect("graph");

    assert_eq!(graph.certificate.thumbprint, "1a");
    assert_eq!(
        graph.signatures.keys().copied().collect::<Vec<_>>(),
        vec![signed.id, countersigned.id]
    );
    assert!(!graph.signatures.contains_key(&unrelated.id));
    assert_eq!(graph.signed_by_certificate().count(), 1);
    assert_eq!(graph.timestamped_by_certificate().count(), 1);

    // Every timestamp of a dependent signature is loaded, earliest first.
    let timestamps = &graph.signatures[&countersigned.id].trusted_timestamps;
    assert_eq!(timestamps.len(), 2);
    assert_eq!(timestamps[0].value, at(1));
    assert_eq!(timestamps[0].certificate_id, cert.id);

    assert_eq!(
        graph.signing_states.keys().copied().collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(dal.certificate().load_graph(cert.id + 50).await.unwrap().is_none());
}

#[tokio::test]
async fn test_commit_rejects_stale_graph() {
    let fixture = TestFixture::new().await;
    let dal = fixture.dal();

    let cert = fixture.certificate("2a").await;
    fixture.package(1).await;
    let signature = fixture.signature(1, cert.id).await;
    let first = fixture.attempt(cert.id).await;
    let second = fixture.attempt(cert.id).await;

    let graph = dal.certificate().load_graph(cert.id).await.unwrap().unwrap();
    let now = UniversalTimestamp::now();
    let invalid = cascade::decide(&graph, &first, &VerificationResult::invalid(), 10, now);
    let good = cascade::decide(&graph, &second, &VerificationResult::good(), 10, now);

    assert_eq!(
        dal.certificate().commit(invalid.update).await.unwrap(),
        CommitOutcome::Committed
    );
    assert_eq!(
        dal.certificate().commit(good.update).await.unwrap(),
        CommitOutcome::Conflict
    );

    // The losing commit left nothing behind.
    let reloaded = fixture.reload_certificate(cert.id).await;
    assert_eq!(reloaded.status, CertificateStatus::Invalid);
    assert_eq!(reloaded.row_version, cert.row_version + 1);
    let untouched = dal
        .certificate_validation()
        .get(cert.id, second.validation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(untouched.status, None);
    let signature = fixture.reload_signature(signature.id).await;
    assert_eq!(signature.status, PackageSignatureStatus::Invalid);
    assert_eq!(signature.row_version, 2);
}

#[tokio::test]
async fn test_certificate_validation_create_is_idempotent() {
    let fixture = TestFixture::new().await;
    let dal = fixture.dal();

    let cert = fixture.certificate("3a").await;
    let created = fixture.attempt(cert.id).await;

    let again = dal
        .certificate_validation()
        .create(NewCertificateValidation {
            certificate_id: cert.id,
            validation_id: created.validation_id,
        })
        .await
        .unwrap();
    assert_eq!(again, created);

    let listed = dal
        .certificate_validation()
        .list_by_validation_id(created.validation_id)
        .await
        .unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn test_record_outcome_only_fills_undecided_attempt() {
    let fixture = TestFixture::new().await;
    let dal = fixture.dal();

    let cert = fixture.certificate("3b").await;
    let attempt = fixture.attempt(cert.id).await;

    assert!(dal
        .certificate_validation()
        .record_outcome(attempt.id, CertificateStatus::Revoked)
        .await
        .unwrap());
    assert!(!dal
        .certificate_validation()
        .record_outcome(attempt.id, CertificateStatus::Good)
        .await
        .unwrap());

    let stored = dal
        .certificate_validation()
        .get(cert.id, attempt.validation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, Some(CertificateStatus::Revoked));
}

#[tokio::test]
async fn test_certificate_lookup_by_thumbprint() {
    let fixture = TestFixture::new().await;
    let dal = fixture.dal();

    let cert = fixture.certificate("4a").await;
    assert_eq!(cert.status, CertificateStatus::Unknown);
    assert_eq!(cert.inconclusive_count, 0);

    let found = dal.certificate().get_by_thumbprint("4a").await.unwrap();
    assert_eq!(found, Some(cert));
    assert!(dal.certificate().get_by_thumbprint("4b").await.unwrap().is_none());
}
