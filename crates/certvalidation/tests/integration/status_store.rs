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

//! Validator status records under concurrent writers.

use certvalidation::dal::{CreateOutcome, SaveOutcome};
use certvalidation::models::{ValidationRequest, ValidationStatus, ValidatorStatus};
use certvalidation::{ConsistencyError, StorageError, UniversalUuid, ValidatorStatusStore};

use crate::fixtures::TestFixture;

const VALIDATOR: &str = "certificate-validator";

fn request(package_key: i64) -> ValidationRequest {
    ValidationRequest::new(UniversalUuid::new_v4(), package_key, "Contoso.Core", "1.0.0")
}

#[tokio::test]
async fn test_unknown_request_is_not_started_and_not_persisted() {
    let fixture = TestFixture::new().await;
    let store = ValidatorStatusStore::new(fixture.dal(), VALIDATOR);
    let request = request(1);

    let status = store.get_status(&request).await.unwrap();
    assert_eq!(status.state, ValidationStatus::NotStarted);
    assert_eq!(status.validator_name, VALIDATOR);
    assert_eq!(status.package_key, 1);

    assert!(store
        .get_status_by_id(request.validation_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_concurrent_create_has_one_winner() {
    let fixture = TestFixture::new().await;
    let store = ValidatorStatusStore::new(fixture.dal(), VALIDATOR);
    let request = request(1);
    let candidate = ValidatorStatus {
        state: ValidationStatus::Incomplete,
        ..ValidatorStatus::not_started(&request, VALIDATOR)
    };

    let (a, b) = tokio::join!(
        store.try_add_validator_status(&candidate),
        store.try_add_validator_status(&candidate)
    );
    let outcomes = [a.unwrap(), b.unwrap()];
    let created = outcomes
        .iter()
        .filter(|o| matches!(o, CreateOutcome::Created(_)))
        .count();
    assert_eq!(created, 1);
    assert!(outcomes
        .iter()
        .any(|o| matches!(o, CreateOutcome::AlreadyExists)));

    let stored = store.get_status(&request).await.unwrap();
    assert_eq!(stored.state, ValidationStatus::Incomplete);
    assert_eq!(stored.row_version, 1);
}

#[tokio::test]
async fn test_losing_creator_is_handed_the_winner() {
    let fixture = TestFixture::new().await;
    let store = ValidatorStatusStore::new(fixture.dal(), VALIDATOR);
    let request = request(1);

    let winner = store
        .try_add_with_state(&request, ValidationStatus::Incomplete)
        .await
        .unwrap();
    let loser = store
        .try_add_with_state(&request, ValidationStatus::Succeeded)
        .await
        .unwrap();

    assert_eq!(winner.state, ValidationStatus::Incomplete);
    assert_eq!(loser, winner);
}

#[tokio::test]
async fn test_stale_save_is_rejected_without_merge() {
    let fixture = TestFixture::new().await;
    let store = ValidatorStatusStore::new(fixture.dal(), VALIDATOR);
    let request = request(1);

    let read = store
        .try_add_with_state(&request, ValidationStatus::Incomplete)
        .await
        .unwrap();

    let first = ValidatorStatus {
        state: ValidationStatus::Failed,
        ..read.clone()
    };
    let SaveOutcome::Saved(saved) = store.try_update_validator_status(&first).await.unwrap() else {
        panic!("first save should win");
    };
    assert_eq!(saved.row_version, read.row_version + 1);

    let second = ValidatorStatus {
        state: ValidationStatus::Succeeded,
        ..read.clone()
    };
    assert_eq!(
        store.try_update_validator_status(&second).await.unwrap(),
        SaveOutcome::Stale
    );

    // The convenience form resolves the same race to the stored winner.
    let resolved = store
        .try_update_with_state(&read, ValidationStatus::Succeeded)
        .await
        .unwrap();
    assert_eq!(resolved.state, ValidationStatus::Failed);
}

#[tokio::test]
async fn test_reused_validation_id_is_a_consistency_violation() {
    let fixture = TestFixture::new().await;
    let store = ValidatorStatusStore::new(fixture.dal(), VALIDATOR);
    let original = request(1);
    store
        .try_add_with_state(&original, ValidationStatus::Incomplete)
        .await
        .unwrap();

    let reused = ValidationRequest {
        package_key: 2,
        ..original.clone()
    };
    let error = store.get_status(&reused).await.unwrap_err();
    assert!(matches!(
        error,
        StorageError::Consistency(ConsistencyError::PackageMismatch {
            stored: 1,
            requested: 2,
            ..
        })
    ));
}

#[tokio::test]
async fn test_store_refuses_records_of_other_validators() {
    let fixture = TestFixture::new().await;
    let store = ValidatorStatusStore::new(fixture.dal(), VALIDATOR);
    let request = request(1);
    let foreign = ValidatorStatus::not_started(&request, "signature-validator");

    let error = store.try_add_validator_status(&foreign).await.unwrap_err();
    assert!(matches!(
        error,
        StorageError::Consistency(ConsistencyError::ValidatorMismatch { .. })
    ));

    // Records of another validator are invisible to this one.
    let other = ValidatorStatusStore::new(fixture.dal(), "signature-validator");
    other
        .try_add_with_state(&request, ValidationStatus::Succeeded)
        .await
        .unwrap();
    assert_eq!(
        store.get_status(&request).await.unwrap().state,
        ValidationStatus::NotStarted
    );
}

#[tokio::test]
async fn test_revalidation_is_detected_by_earlier_attempts() {
    let fixture = TestFixture::new().await;
    let store = ValidatorStatusStore::new(fixture.dal(), VALIDATOR);

    let first = request(1);
    assert!(!store.is_revalidation_request(&first).await.unwrap());
    store
        .try_add_with_state(&first, ValidationStatus::Succeeded)
        .await
        .unwrap();
    assert!(!store.is_revalidation_request(&first).await.unwrap());

    let second = request(1);
    assert!(store.is_revalidation_request(&second).await.unwrap());
    assert!(!store.is_revalidation_request(&request(2)).await.unwrap());
}
