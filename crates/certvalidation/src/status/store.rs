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

//! Validator status store.
//!
//! A [`ValidatorStatusStore`] is bound to one validator name and records that
//! validator's progress on each validation attempt. Several deliveries of the
//! same request may race against it; the first writer wins and everyone else
//! is handed the winner's record:
//!
//! - [`try_add_validator_status`](ValidatorStatusStore::try_add_validator_status)
//!   and [`try_update_validator_status`](ValidatorStatusStore::try_update_validator_status)
//!   report a lost race as [`CreateOutcome::AlreadyExists`] or [`SaveOutcome::Stale`].
//! - [`try_add_with_state`](ValidatorStatusStore::try_add_with_state) and
//!   [`try_update_with_state`](ValidatorStatusStore::try_update_with_state)
//!   resolve a lost race by re-reading, and return whatever state won.

use crate::audit;
use crate::dal::{CreateOutcome, SaveOutcome, DAL};
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::{ConsistencyError, StorageError};
use crate::models::{ValidationRequest, ValidationStatus, ValidatorStatus};
use tracing::debug;

/// Durable per-validator status records with optimistic concurrency.
#[derive(Clone, Debug)]
pub struct ValidatorStatusStore {
    dal: DAL,
    validator_name: String,
}

impl ValidatorStatusStore {
    pub fn new(dal: DAL, validator_name: impl Into<String>) -> Self {
        Self {
            dal,
            validator_name: validator_name.into(),
        }
    }

    pub fn validator_name(&self) -> &str {
        &self.validator_name
    }

    /// Exact lookup of this validator's record for a validation attempt.
    pub async fn get_status_by_id(
        &self,
        validation_id: UniversalUuid,
    ) -> Result<Option<ValidatorStatus>, StorageError> {
        self.dal
            .validator_status()
            .get(&self.validator_name, validation_id)
            .await
    }

    /// Returns the record for a request, or an unpersisted `NotStarted` value.
    ///
    /// A record that belongs to a different package or validator means the
    /// caller reused a validation id, and is reported as a consistency error.
    pub async fn get_status(
        &self,
        request: &ValidationRequest,
    ) -> Result<ValidatorStatus, StorageError> {
        match self.get_status_by_id(request.validation_id).await? {
            None => Ok(ValidatorStatus::not_started(request, &self.validator_name)),
            Some(status) => {
                self.check_matches(request.package_key, &status)?;
                Ok(status)
            }
        }
    }

    /// Whether this validator already has a record for the package under a
    /// different validation attempt.
    pub async fn is_revalidation_request(
        &self,
        request: &ValidationRequest,
    ) -> Result<bool, StorageError> {
        let existing = self
            .dal
            .validator_status()
            .list_by_package(&self.validator_name, request.package_key)
            .await?;

        Ok(existing
            .iter()
            .any(|s| s.validation_id != request.validation_id))
    }

    /// Inserts a record. Exactly one concurrent creator observes `Created`.
    pub async fn try_add_validator_status(
        &self,
        status: &ValidatorStatus,
    ) -> Result<CreateOutcome, StorageError> {
        self.check_owned(status)?;

        let outcome = self.dal.validator_status().insert(status).await?;
        match &outcome {
            CreateOutcome::Created(created) => audit::log_validator_status_created(
                &created.validator_name,
                created.validation_id,
                created.package_key,
                created.state,
            ),
            CreateOutcome::AlreadyExists => debug!(
                validator_name = %self.validator_name,
                validation_id = %status.validation_id,
                "Validator status already created by another writer"
            ),
        }
        Ok(outcome)
    }

    /// Updates a record under its `row_version`.
    pub async fn try_update_validator_status(
        &self,
        status: &ValidatorStatus,
    ) -> Result<SaveOutcome, StorageError> {
        self.check_owned(status)?;

        let outcome = self.dal.validator_status().update(status).await?;
        match &outcome {
            SaveOutcome::Saved(saved) => audit::log_validator_status_saved(
                &saved.validator_name,
                saved.validation_id,
                saved.package_key,
                saved.state,
            ),
            SaveOutcome::Stale => debug!(
                validator_name = %self.validator_name,
                validation_id = %status.validation_id,
                expected_version = status.row_version,
                "Validator status was updated by another writer"
            ),
        }
        Ok(outcome)
    }

    /// Creates the record for a request in `desired_state`, returning the
    /// state that actually won.
    pub async fn try_add_with_state(
        &self,
        request: &ValidationRequest,
        desired_state: ValidationStatus,
    ) -> Result<ValidatorStatus, StorageError> {
        let status = ValidatorStatus {
            state: desired_state,
            started_at: Some(UniversalTimestamp::now()),
            ..ValidatorStatus::not_started(request, &self.validator_name)
        };

        match self.try_add_validator_status(&status).await? {
            CreateOutcome::Created(created) => Ok(created),
            CreateOutcome::AlreadyExists => self.get_status(request).await,
        }
    }

    /// Moves an existing record to `desired_state`, returning the state that
    /// actually won.
    pub async fn try_update_with_state(
        &self,
        status: &ValidatorStatus,
        desired_state: ValidationStatus,
    ) -> Result<ValidatorStatus, StorageError> {
        let updated = ValidatorStatus {
            state: desired_state,
            started_at: status.started_at.or_else(|| Some(UniversalTimestamp::now())),
            ..status.clone()
        };

        match self.try_update_validator_status(&updated).await? {
            SaveOutcome::Saved(saved) => Ok(saved),
            SaveOutcome::Stale => {
                let winner = self.get_status_by_id(status.validation_id).await?;
                let winner = winner.ok_or_else(|| StorageError::NotFound {
                    entity: "validator status",
                    key: status.validation_id.to_string(),
                })?;
                self.check_matches(status.package_key, &winner)?;
                Ok(winner)
            }
        }
    }

    fn check_matches(
        &self,
        package_key: i64,
        stored: &ValidatorStatus,
    ) -> Result<(), StorageError> {
        let violation = if stored.package_key != package_key {
            Some(ConsistencyError::PackageMismatch {
                validation_id: stored.validation_id,
                stored: stored.package_key,
                requested: package_key,
            })
        } else if stored.validator_name != self.validator_name {
            Some(ConsistencyError::ValidatorMismatch {
                validation_id: stored.validation_id,
                stored: stored.validator_name.clone(),
                requested: self.validator_name.clone(),
            })
        } else {
            None
        };

        match violation {
            Some(error) => {
                audit::log_consistency_violation("validator status lookup", &error.to_string());
                Err(error.into())
            }
            None => Ok(()),
        }
    }

    fn check_owned(&self, status: &ValidatorStatus) -> Result<(), StorageError> {
        if status.validator_name == self.validator_name {
            return Ok(());
        }
        let error = ConsistencyError::ValidatorMismatch {
            validation_id: status.validation_id,
            stored: status.validator_name.clone(),
            requested: self.validator_name.clone(),
        };
        audit::log_consistency_violation("validator status write", &error.to_string());
        Err(error.into())
    }
}
