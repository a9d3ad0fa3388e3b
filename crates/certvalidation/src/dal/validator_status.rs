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

//! Validator Status Data Access Layer
//!
//! Records are keyed by `(validator_name, validation_id)`. Inserts race on
//! the primary key and updates race on `row_version`; losing either race is
//! reported as an outcome, not an error.

use super::models::{current_timestamp_string, NewSqliteValidatorStatus, SqliteValidatorStatus};
use super::DAL;
use crate::database::schema::validator_statuses;
use crate::database::universal_types::UniversalUuid;
use crate::error::StorageError;
use crate::models::ValidatorStatus;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Result of inserting a validator status.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The record as stored
    Created(ValidatorStatus),
    /// Another writer created the record first
    AlreadyExists,
}

/// Result of updating a validator status.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// The record as stored, with its new version
    Saved(ValidatorStatus),
    /// Another writer updated the record first
    Stale,
}

/// Data access layer for validator status records.
#[derive(Clone)]
pub struct ValidatorStatusDAL<'a> {
    dal: &'a DAL,
}

impl<'a> ValidatorStatusDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    pub async fn get(
        &self,
        validator_name: &str,
        validation_id: UniversalUuid,
    ) -> Result<Option<ValidatorStatus>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let validator_name = validator_name.to_string();
        let validation_blob = validation_id.to_blob();
        let row: Option<SqliteValidatorStatus> = conn
            .interact(move |conn| {
                validator_statuses::table
                    .find((validator_name, validation_blob))
                    .select(SqliteValidatorStatus::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        row.map(ValidatorStatus::try_from).transpose()
    }

    /// Lists a validator's records for one package, oldest first.
    pub async fn list_by_package(
        &self,
        validator_name: &str,
        package_key: i64,
    ) -> Result<Vec<ValidatorStatus>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let validator_name = validator_name.to_string();
        let rows: Vec<SqliteValidatorStatus> = conn
            .interact(move |conn| {
                validator_statuses::table
                    .filter(validator_statuses::validator_name.eq(validator_name))
                    .filter(validator_statuses::package_key.eq(package_key))
                    .order(validator_statuses::created_at.asc())
                    .select(SqliteValidatorStatus::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(ValidatorStatus::try_from).collect()
    }

    /// Inserts a new record. The stored record starts at version 1.
    pub async fn insert(&self, status: &ValidatorStatus) -> Result<CreateOutcome, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let now = current_timestamp_string();
        let row = NewSqliteValidatorStatus {
            validation_id: status.validation_id.to_blob(),
            validator_name: status.validator_name.clone(),
            package_key: status.package_key,
            state: status.state.as_str().to_string(),
            row_version: 1,
            started_at: status.started_at.map(|t| t.to_rfc3339()),
            created_at: now.clone(),
            updated_at: now,
        };

        let result = conn
            .interact(move |conn| {
                diesel::insert_into(validator_statuses::table)
                    .values(&row)
                    .execute(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        match result {
            Ok(_) => Ok(CreateOutcome::Created(ValidatorStatus {
                row_version: 1,
                ..status.clone()
            })),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Ok(CreateOutcome::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Updates a record if it still carries `status.row_version`.
    pub async fn update(&self, status: &ValidatorStatus) -> Result<SaveOutcome, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let validator_name = status.validator_name.clone();
        let validation_blob = status.validation_id.to_blob();
        let expected_version = status.row_version;
        let state = status.state.as_str().to_string();
        let started_at = status.started_at.map(|t| t.to_rfc3339());
        let now = current_timestamp_string();

        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    validator_statuses::table
                        .filter(validator_statuses::validator_name.eq(validator_name))
                        .filter(validator_statuses::validation_id.eq(validation_blob))
                        .filter(validator_statuses::row_version.eq(expected_version)),
                )
                .set((
                    validator_statuses::state.eq(state),
                    validator_statuses::started_at.eq(started_at),
                    validator_statuses::row_version.eq(expected_version + 1),
                    validator_statuses::updated_at.eq(now),
                ))
                .execute(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        if updated == 0 {
            return Ok(SaveOutcome::Stale);
        }

        Ok(SaveOutcome::Saved(ValidatorStatus {
            row_version: expected_version + 1,
            ..status.clone()
        }))
    }
}
