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

//! Package Signature Data Access Layer
//!
//! Write paths used when packages are ingested, and reads that return
//! signatures with their trusted timestamps attached.

use super::models::{
    assemble_signatures, current_timestamp_string, NewSqlitePackageSignature,
    NewSqlitePackageSigningState, NewSqliteTrustedTimestamp, SqlitePackageSignature,
    SqlitePackageSigningState, SqliteTrustedTimestamp,
};
use super::DAL;
use crate::database::schema::{package_signatures, package_signing_states, trusted_timestamps};
use crate::error::StorageError;
use crate::models::{
    NewPackageSignature, NewPackageSigningState, NewTrustedTimestamp, PackageSignature,
    PackageSignatureStatus, PackageSigningState, TrustedTimestamp,
};
use diesel::prelude::*;

/// Data access layer for package signatures, timestamps and signing states.
#[derive(Clone)]
pub struct PackageSignatureDAL<'a> {
    dal: &'a DAL,
}

impl<'a> PackageSignatureDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    pub async fn create_signing_state(
        &self,
        new_state: NewPackageSigningState,
    ) -> Result<PackageSigningState, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let now = current_timestamp_string();
        let row = NewSqlitePackageSigningState {
            package_key: new_state.package_key,
            package_id: new_state.package_id,
            package_version: new_state.package_version,
            status: new_state.status.as_str().to_string(),
            created_at: now.clone(),
            updated_at: now,
        };

        let created: SqlitePackageSigningState = conn
            .interact(move |conn| {
                diesel::insert_into(package_signing_states::table)
                    .values(&row)
                    .returning(SqlitePackageSigningState::as_returning())
                    .get_result(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        created.try_into()
    }

    pub async fn get_signing_state(
        &self,
        package_key: i64,
    ) -> Result<Option<PackageSigningState>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let row: Option<SqlitePackageSigningState> = conn
            .interact(move |conn| {
                package_signing_states::table
                    .find(package_key)
                    .select(SqlitePackageSigningState::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        row.map(PackageSigningState::try_from).transpose()
    }

    /// Records a `Valid` signature with no timestamps.
    pub async fn create(
        &self,
        new_signature: NewPackageSignature,
    ) -> Result<PackageSignature, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let now = current_timestamp_string();
        let row = NewSqlitePackageSignature {
            package_key: new_signature.package_key,
            certificate_id: new_signature.certificate_id,
            signature_type: new_signature.signature_type.as_str().to_string(),
            status: PackageSignatureStatus::Valid.as_str().to_string(),
            row_version: 1,
            created_at: now.clone(),
            updated_at: now,
        };

        let created: SqlitePackageSignature = conn
            .interact(move |conn| {
                diesel::insert_into(package_signatures::table)
                    .values(&row)
                    .returning(SqlitePackageSignature::as_returning())
                    .get_result(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        created.into_domain(Vec::new())
    }

    pub async fn add_trusted_timestamp(
        &self,
        new_timestamp: NewTrustedTimestamp,
    ) -> Result<TrustedTimestamp, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let row = NewSqliteTrustedTimestamp {
            package_signature_id: new_timestamp.package_signature_id,
            certificate_id: new_timestamp.certificate_id,
            value: new_timestamp.value.to_rfc3339(),
            created_at: current_timestamp_string(),
        };

        let created: SqliteTrustedTimestamp = conn
            .interact(move |conn| {
                diesel::insert_into(trusted_timestamps::table)
                    .values(&row)
                    .returning(SqliteTrustedTimestamp::as_returning())
                    .get_result(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        created.try_into()
    }

    pub async fn get(&self, id: i64) -> Result<Option<PackageSignature>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let rows = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    let signatures: Vec<SqlitePackageSignature> = package_signatures::table
                        .filter(package_signatures::id.eq(id))
                        .select(SqlitePackageSignature::as_select())
                        .load(conn)?;
                    let timestamps: Vec<SqliteTrustedTimestamp> = trusted_timestamps::table
                        .filter(trusted_timestamps::package_signature_id.eq(id))
                        .select(SqliteTrustedTimestamp::as_select())
                        .load(conn)?;
                    Ok((signatures, timestamps))
                })
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        let (signatures, timestamps) = rows;
        Ok(assemble_signatures(signatures, timestamps)?.into_iter().next())
    }

    /// Lists a package's signatures, each with its timestamps.
    pub async fn list_for_package(
        &self,
        package_key: i64,
    ) -> Result<Vec<PackageSignature>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let rows = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    let signatures: Vec<SqlitePackageSignature> = package_signatures::table
                        .filter(package_signatures::package_key.eq(package_key))
                        .order(package_signatures::id.asc())
                        .select(SqlitePackageSignature::as_select())
                        .load(conn)?;
                    let timestamps: Vec<SqliteTrustedTimestamp> = trusted_timestamps::table
                        .inner_join(package_signatures::table)
                        .filter(package_signatures::package_key.eq(package_key))
                        .select(SqliteTrustedTimestamp::as_select())
                        .load(conn)?;
                    Ok((signatures, timestamps))
                })
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        let (signatures, timestamps) = rows;
        assemble_signatures(signatures, timestamps)
    }
}
