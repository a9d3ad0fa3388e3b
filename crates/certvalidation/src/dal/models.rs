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

//! SQLite row models
//!
//! Diesel model definitions using SQLite-compatible types. UUIDs are stored as
//! BLOB (`Vec<u8>`) and timestamps as TEXT (RFC 3339 strings).
//!
//! Rows are converted to domain types at the DAL boundary. The conversion is
//! fallible: a status string this crate does not recognise is a consistency
//! violation and is never replaced by a default.

use crate::database::schema::*;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::{ConsistencyError, StorageError};
use crate::models::{
    Certificate, CertificateStatus, CertificateValidation, PackageSignature,
    PackageSignatureStatus, PackageSignatureType, PackageSigningState, PackageSigningStatus,
    TrustedTimestamp, ValidationStatus, ValidatorStatus,
};
use diesel::prelude::*;
use std::collections::BTreeMap;

pub(crate) fn current_timestamp_string() -> String {
    UniversalTimestamp::now().to_rfc3339()
}

pub(crate) fn parse_timestamp(
    field: &str,
    value: &str,
) -> Result<UniversalTimestamp, StorageError> {
    UniversalTimestamp::from_rfc3339(value)
        .map_err(|e| StorageError::CorruptRecord(format!("{field} '{value}': {e}")))
}

fn parse_optional_timestamp(
    field: &str,
    value: Option<&str>,
) -> Result<Option<UniversalTimestamp>, StorageError> {
    value.map(|v| parse_timestamp(field, v)).transpose()
}

pub(crate) fn parse_uuid(field: &str, bytes: &[u8]) -> Result<UniversalUuid, StorageError> {
    UniversalUuid::from_blob(bytes)
        .map_err(|e| StorageError::CorruptRecord(format!("{field}: {e}")))
}

fn unrecognized(entity: &'static str, value: &str) -> StorageError {
    ConsistencyError::UnrecognizedStatus {
        entity,
        value: value.to_string(),
    }
    .into()
}

// ============================================================================
// Certificate Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = certificates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteCertificate {
    pub id: i64,
    pub thumbprint: String,
    pub status: String,
    pub inconclusive_count: i32,
    pub revocation_time: Option<String>,
    pub status_update_time: Option<String>,
    pub last_verification_time: Option<String>,
    pub row_version: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = certificates)]
pub struct NewSqliteCertificate {
    pub thumbprint: String,
    pub status: String,
    pub inconclusive_count: i32,
    pub row_version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SqliteCertificate> for Certificate {
    type Error = StorageError;

    fn try_from(row: SqliteCertificate) -> Result<Self, Self::Error> {
        Ok(Certificate {
            id: row.id,
            status: CertificateStatus::from_str(&row.status)
                .ok_or_else(|| unrecognized("certificate", &row.status))?,
            inconclusive_count: row.inconclusive_count,
            revocation_time: parse_optional_timestamp(
                "certificates.revocation_time",
                row.revocation_time.as_deref(),
            )?,
            status_update_time: parse_optional_timestamp(
                "certificates.status_update_time",
                row.status_update_time.as_deref(),
            )?,
            last_verification_time: parse_optional_timestamp(
                "certificates.last_verification_time",
                row.last_verification_time.as_deref(),
            )?,
            row_version: row.row_version,
            created_at: parse_timestamp("certificates.created_at", &row.created_at)?,
            updated_at: parse_timestamp("certificates.updated_at", &row.updated_at)?,
            thumbprint: row.thumbprint,
        })
    }
}

// ============================================================================
// Certificate Validation Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = certificate_validations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteCertificateValidation {
    pub id: i64,
    pub certificate_id: i64,
    pub validation_id: Vec<u8>,
    pub status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = certificate_validations)]
pub struct NewSqliteCertificateValidation {
    pub certificate_id: i64,
    pub validation_id: Vec<u8>,
    pub status: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SqliteCertificateValidation> for CertificateValidation {
    type Error = StorageError;

    fn try_from(row: SqliteCertificateValidation) -> Result<Self, Self::Error> {
        let status = match row.status.as_deref() {
            None => None,
            Some(s) => Some(
                CertificateStatus::from_str(s)
                    .ok_or_else(|| unrecognized("certificate validation", s))?,
            ),
        };
        Ok(CertificateValidation {
            id: row.id,
            certificate_id: row.certificate_id,
            validation_id: parse_uuid("certificate_validations.validation_id", &row.validation_id)?,
            status,
            created_at: parse_timestamp("certificate_validations.created_at", &row.created_at)?,
            updated_at: parse_timestamp("certificate_validations.updated_at", &row.updated_at)?,
        })
    }
}

// ============================================================================
// Package Signing Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = package_signing_states)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqlitePackageSigningState {
    pub package_key: i64,
    pub package_id: String,
    pub package_version: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = package_signing_states)]
pub struct NewSqlitePackageSigningState {
    pub package_key: i64,
    pub package_id: String,
    pub package_version: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SqlitePackageSigningState> for PackageSigningState {
    type Error = StorageError;

    fn try_from(row: SqlitePackageSigningState) -> Result<Self, Self::Error> {
        Ok(PackageSigningState {
            package_key: row.package_key,
            status: PackageSigningStatus::from_str(&row.status)
                .ok_or_else(|| unrecognized("package signing state", &row.status))?,
            package_id: row.package_id,
            package_version: row.package_version,
        })
    }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = package_signatures)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqlitePackageSignature {
    pub id: i64,
    pub package_key: i64,
    pub certificate_id: i64,
    pub signature_type: String,
    pub status: String,
    pub row_version: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = package_signatures)]
pub struct NewSqlitePackageSignature {
    pub package_key: i64,
    pub certificate_id: i64,
    pub signature_type: String,
    pub status: String,
    pub row_version: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl SqlitePackageSignature {
    /// Converts the row, attaching the timestamps that belong to it.
    pub fn into_domain(
        self,
        mut trusted_timestamps: Vec<TrustedTimestamp>,
    ) -> Result<PackageSignature, StorageError> {
        trusted_timestamps.sort_by_key(|t| (t.value, t.id));
        Ok(PackageSignature {
            id: self.id,
            package_key: self.package_key,
            certificate_id: self.certificate_id,
            signature_type: PackageSignatureType::from_str(&self.signature_type)
                .ok_or_else(|| unrecognized("package signature type", &self.signature_type))?,
            status: PackageSignatureStatus::from_str(&self.status)
                .ok_or_else(|| unrecognized("package signature", &self.status))?,
            trusted_timestamps,
            row_version: self.row_version,
        })
    }
}

/// Converts signature rows, attaching each signature's timestamps.
pub(crate) fn assemble_signatures(
    signatures: Vec<SqlitePackageSignature>,
    timestamps: Vec<SqliteTrustedTimestamp>,
) -> Result<Vec<PackageSignature>, StorageError> {
    let mut by_signature: BTreeMap<i64, Vec<TrustedTimestamp>> = BTreeMap::new();
    for row in timestamps {
        let timestamp = TrustedTimestamp::try_from(row)?;
        by_signature
            .entry(timestamp.package_signature_id)
            .or_default()
            .push(timestamp);
    }

    signatures
        .into_iter()
        .map(|row| {
            let attached = by_signature.remove(&row.id).unwrap_or_default();
            row.into_domain(attached)
        })
        .collect()
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = trusted_timestamps)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteTrustedTimestamp {
    pub id: i64,
    pub package_signature_id: i64,
    pub certificate_id: i64,
    pub value: String,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = trusted_timestamps)]
pub struct NewSqliteTrustedTimestamp {
    pub package_signature_id: i64,
    pub certificate_id: i64,
    pub value: String,
    pub created_at: String,
}

impl TryFrom<SqliteTrustedTimestamp> for TrustedTimestamp {
    type Error = StorageError;

    fn try_from(row: SqliteTrustedTimestamp) -> Result<Self, Self::Error> {
        Ok(TrustedTimestamp {
            id: row.id,
            package_signature_id: row.package_signature_id,
            certificate_id: row.certificate_id,
            value: parse_timestamp("trusted_timestamps.value", &row.value)?,
        })
    }
}

// ============================================================================
// Validator Status Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = validator_statuses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteValidatorStatus {
    pub validation_id: Vec<u8>,
    pub validator_name: String,
    pub package_key: i64,
    pub state: String,
    pub row_version: i64,
    pub started_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = validator_statuses)]
pub struct NewSqliteValidatorStatus {
    pub validation_id: Vec<u8>,
    pub validator_name: String,
    pub package_key: i64,
    pub state: String,
    pub row_version: i64,
    pub started_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<SqliteValidatorStatus> for ValidatorStatus {
    type Error = StorageError;

    fn try_from(row: SqliteValidatorStatus) -> Result<Self, Self::Error> {
        Ok(ValidatorStatus {
            validation_id: parse_uuid("validator_statuses.validation_id", &row.validation_id)?,
            package_key: row.package_key,
            state: ValidationStatus::from_str(&row.state)
                .ok_or_else(|| unrecognized("validator status", &row.state))?,
            started_at: parse_optional_timestamp(
                "validator_statuses.started_at",
                row.started_at.as_deref(),
            )?,
            row_version: row.row_version,
            validator_name: row.validator_name,
        })
    }
}
