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

//! Certificate Validation Data Access Layer
//!
//! Validation attempts are unique per `(certificate_id, validation_id)`.
//! Creating an attempt that already exists returns the stored row, so
//! redelivered enqueue requests converge on one record.

use super::models::{
    current_timestamp_string, NewSqliteCertificateValidation, SqliteCertificateValidation,
};
use super::DAL;
use crate::database::schema::certificate_validations;
use crate::database::universal_types::UniversalUuid;
use crate::error::StorageError;
use crate::models::{CertificateStatus, CertificateValidation, NewCertificateValidation};
use diesel::prelude::*;

/// Data access layer for certificate validation attempts.
#[derive(Clone)]
pub struct CertificateValidationDAL<'a> {
    dal: &'a DAL,
}

impl<'a> CertificateValidationDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Creates an undecided attempt, or returns the existing one.
    pub async fn create(
        &self,
        new_validation: NewCertificateValidation,
    ) -> Result<CertificateValidation, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let now = current_timestamp_string();
        let certificate_id = new_validation.certificate_id;
        let validation_blob = new_validation.validation_id.to_blob();
        let row = NewSqliteCertificateValidation {
            certificate_id,
            validation_id: validation_blob.clone(),
            status: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let stored: SqliteCertificateValidation = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    diesel::insert_into(certificate_validations::table)
                        .values(&row)
                        .on_conflict_do_nothing()
                        .execute(conn)?;

                    certificate_validations::table
                        .filter(certificate_validations::certificate_id.eq(certificate_id))
                        .filter(certificate_validations::validation_id.eq(validation_blob))
                        .select(SqliteCertificateValidation::as_select())
                        .first(conn)
                })
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        stored.try_into()
    }

    /// Looks up the attempt for one certificate within a validation.
    pub async fn get(
        &self,
        certificate_id: i64,
        validation_id: UniversalUuid,
    ) -> Result<Option<CertificateValidation>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let validation_blob = validation_id.to_blob();
        let row: Option<SqliteCertificateValidation> = conn
            .interact(move |conn| {
                certificate_validations::table
                    .filter(certificate_validations::certificate_id.eq(certificate_id))
                    .filter(certificate_validations::validation_id.eq(validation_blob))
                    .select(SqliteCertificateValidation::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        row.map(CertificateValidation::try_from).transpose()
    }

    /// Gives an undecided attempt its outcome. Returns `false` when the attempt
    /// was already decided, leaving the stored outcome as it was.
    pub async fn record_outcome(
        &self,
        id: i64,
        outcome: CertificateStatus,
    ) -> Result<bool, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let now = current_timestamp_string();
        let updated = conn
            .interact(move |conn| {
                diesel::update(
                    certificate_validations::table
                        .filter(certificate_validations::id.eq(id))
                        .filter(certificate_validations::status.is_null()),
                )
                .set((
                    certificate_validations::status.eq(Some(outcome.as_str())),
                    certificate_validations::updated_at.eq(now),
                ))
                .execute(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        Ok(updated == 1)
    }

    /// Lists every certificate attempt that belongs to a validation.
    pub async fn list_by_validation_id(
        &self,
        validation_id: UniversalUuid,
    ) -> Result<Vec<CertificateValidation>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let validation_blob = validation_id.to_blob();
        let rows: Vec<SqliteCertificateValidation> = conn
            .interact(move |conn| {
                certificate_validations::table
                    .filter(certificate_validations::validation_id.eq(validation_blob))
                    .order(certificate_validations::id.asc())
                    .select(SqliteCertificateValidation::as_select())
                    .load(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        rows.into_iter().map(CertificateValidation::try_from).collect()
    }
}
