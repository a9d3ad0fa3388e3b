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

//! Certificate Data Access Layer
//!
//! Besides plain certificate lookups, this module owns the two halves of a
//! trust decision's storage cycle: reading a certificate's dependency graph
//! and committing the rows a decision changed.
//!
//! The commit is one `BEGIN IMMEDIATE` transaction. Every versioned row is
//! updated with `WHERE row_version = <version read>`; if any update matches
//! nothing, the whole transaction rolls back and the caller sees
//! [`CommitOutcome::Conflict`].

use super::models::{
    assemble_signatures, current_timestamp_string, NewSqliteCertificate, SqliteCertificate,
    SqlitePackageSignature, SqlitePackageSigningState, SqliteTrustedTimestamp,
};
use super::DAL;
use crate::database::schema::{
    certificate_validations, certificates, package_signatures, package_signing_states,
    trusted_timestamps,
};
use crate::error::StorageError;
use crate::models::{
    Certificate, CertificateGraph, CertificateStatus, GraphUpdate, NewCertificate,
    PackageSignatureStatus, PackageSigningState, PackageSigningStatus,
};
use diesel::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Result of committing a trust decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A row in the graph changed after it was read; nothing was written
    Conflict,
}

enum CommitError {
    Conflict(&'static str),
    Database(diesel::result::Error),
}

impl From<diesel::result::Error> for CommitError {
    fn from(error: diesel::result::Error) -> Self {
        CommitError::Database(error)
    }
}

type GraphRows = (
    SqliteCertificate,
    Vec<SqlitePackageSignature>,
    Vec<SqliteTrustedTimestamp>,
    Vec<SqlitePackageSigningState>,
);

/// Data access layer for certificates and their dependency graphs.
#[derive(Clone)]
pub struct CertificateDAL<'a> {
    dal: &'a DAL,
}

impl<'a> CertificateDAL<'a> {
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Records a certificate with `Unknown` status.
    pub async fn create(
        &self,
        new_certificate: NewCertificate,
    ) -> Result<Certificate, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let now = current_timestamp_string();
        let row = NewSqliteCertificate {
            thumbprint: new_certificate.thumbprint,
            status: CertificateStatus::Unknown.as_str().to_string(),
            inconclusive_count: 0,
            row_version: 1,
            created_at: now.clone(),
            updated_at: now,
        };

        let created: SqliteCertificate = conn
            .interact(move |conn| {
                diesel::insert_into(certificates::table)
                    .values(&row)
                    .returning(SqliteCertificate::as_returning())
                    .get_result(conn)
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        created.try_into()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Certificate>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let row: Option<SqliteCertificate> = conn
            .interact(move |conn| {
                certificates::table
                    .find(id)
                    .select(SqliteCertificate::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        row.map(Certificate::try_from).transpose()
    }

    pub async fn get_by_thumbprint(
        &self,
        thumbprint: &str,
    ) -> Result<Option<Certificate>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let thumbprint = thumbprint.to_string();
        let row: Option<SqliteCertificate> = conn
            .interact(move |conn| {
                certificates::table
                    .filter(certificates::thumbprint.eq(thumbprint))
                    .select(SqliteCertificate::as_select())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        row.map(Certificate::try_from).transpose()
    }

    /// Reads a certificate together with every signature that depends on it.
    ///
    /// A signature depends on the certificate when the certificate signed it
    /// or counter-signed one of its timestamps. Each returned signature
    /// carries all of its timestamps, including ones from other authorities.
    /// All rows are read in one transaction so the versions are consistent.
    pub async fn load_graph(
        &self,
        certificate_id: i64,
    ) -> Result<Option<CertificateGraph>, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let rows: Option<GraphRows> = conn
            .interact(move |conn| {
                conn.transaction::<_, diesel::result::Error, _>(|conn| {
                    let Some(certificate) = certificates::table
                        .find(certificate_id)
                        .select(SqliteCertificate::as_select())
                        .first(conn)
                        .optional()?
                    else {
                        return Ok(None);
                    };

                    let mut signature_ids: BTreeSet<i64> = package_signatures::table
                        .filter(package_signatures::certificate_id.eq(certificate_id))
                        .select(package_signatures::id)
                        .load::<i64>(conn)?
                        .into_iter()
                        .collect();
                    signature_ids.extend(
                        trusted_timestamps::table
                            .filter(trusted_timestamps::certificate_id.eq(certificate_id))
                            .select(trusted_timestamps::package_signature_id)
                            .load::<i64>(conn)?,
                    );
                    let signature_ids: Vec<i64> = signature_ids.into_iter().collect();

                    let signatures = package_signatures::table
                        .filter(package_signatures::id.eq_any(&signature_ids))
                        .select(SqlitePackageSignature::as_select())
                        .load(conn)?;
                    let timestamps = trusted_timestamps::table
                        .filter(trusted_timestamps::package_signature_id.eq_any(&signature_ids))
                        .select(SqliteTrustedTimestamp::as_select())
                        .load(conn)?;

                    let package_keys: Vec<i64> = signatures
                        .iter()
                        .map(|s: &SqlitePackageSignature| s.package_key)
                        .collect::<BTreeSet<_>>()
                        .into_iter()
                        .collect();
                    let signing_states = package_signing_states::table
                        .filter(package_signing_states::package_key.eq_any(&package_keys))
                        .select(SqlitePackageSigningState::as_select())
                        .load(conn)?;

                    Ok(Some((certificate, signatures, timestamps, signing_states)))
                })
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))??;

        let Some((certificate, signatures, timestamps, signing_states)) = rows else {
            return Ok(None);
        };

        let signatures = assemble_signatures(signatures, timestamps)?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();
        let signing_states = signing_states
            .into_iter()
            .map(|row| PackageSigningState::try_from(row).map(|s| (s.package_key, s)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Some(CertificateGraph {
            certificate: certificate.try_into()?,
            signatures,
            signing_states,
        }))
    }

    /// Atomically writes the rows changed by a trust decision.
    ///
    /// The certificate and every invalidated signature must still carry the
    /// `row_version` they were read with, and the validation attempt must
    /// still be undecided when it is given an outcome.
    pub async fn commit(&self, update: GraphUpdate) -> Result<CommitOutcome, StorageError> {
        let conn = self.dal.database.get_connection().await?;

        let certificate_id = update.certificate.id;
        let result = conn
            .interact(move |conn| {
                conn.immediate_transaction::<_, CommitError, _>(|conn| {
                    write_graph_update(conn, &update)
                })
            })
            .await
            .map_err(|e| StorageError::ConnectionPool(e.to_string()))?;

        match result {
            Ok(()) => Ok(CommitOutcome::Committed),
            Err(CommitError::Conflict(row)) => {
                debug!(
                    certificate_id = certificate_id,
                    row = row,
                    "Trust decision lost the commit race"
                );
                Ok(CommitOutcome::Conflict)
            }
            Err(CommitError::Database(e)) => Err(e.into()),
        }
    }
}

fn write_graph_update(
    conn: &mut SqliteConnection,
    update: &GraphUpdate,
) -> Result<(), CommitError> {
    let now = current_timestamp_string();
    let certificate = &update.certificate;

    let updated = diesel::update(
        certificates::table
            .filter(certificates::id.eq(certificate.id))
            .filter(certificates::row_version.eq(certificate.row_version)),
    )
    .set((
        certificates::status.eq(certificate.status.as_str()),
        certificates::inconclusive_count.eq(certificate.inconclusive_count),
        certificates::revocation_time.eq(certificate.revocation_time.map(|t| t.to_rfc3339())),
        certificates::status_update_time.eq(certificate.status_update_time.map(|t| t.to_rfc3339())),
        certificates::last_verification_time
            .eq(certificate.last_verification_time.map(|t| t.to_rfc3339())),
        certificates::row_version.eq(certificate.row_version + 1),
        certificates::updated_at.eq(&now),
    ))
    .execute(conn)?;
    if updated == 0 {
        return Err(CommitError::Conflict("certificate"));
    }

    if let Some(outcome) = update.validation.status {
        let updated = diesel::update(
            certificate_validations::table
                .filter(certificate_validations::id.eq(update.validation.id))
                .filter(certificate_validations::status.is_null()),
        )
        .set((
            certificate_validations::status.eq(Some(outcome.as_str())),
            certificate_validations::updated_at.eq(&now),
        ))
        .execute(conn)?;
        if updated == 0 {
            return Err(CommitError::Conflict("certificate validation"));
        }
    }

    for signature in &update.invalidated_signatures {
        let updated = diesel::update(
            package_signatures::table
                .filter(package_signatures::id.eq(signature.id))
                .filter(package_signatures::row_version.eq(signature.row_version)),
        )
        .set((
            package_signatures::status.eq(PackageSignatureStatus::Invalid.as_str()),
            package_signatures::row_version.eq(signature.row_version + 1),
            package_signatures::updated_at.eq(&now),
        ))
        .execute(conn)?;
        if updated == 0 {
            return Err(CommitError::Conflict("package signature"));
        }
    }

    if !update.invalidated_packages.is_empty() {
        diesel::update(
            package_signing_states::table
                .filter(package_signing_states::package_key.eq_any(&update.invalidated_packages)),
        )
        .set((
            package_signing_states::status.eq(PackageSigningStatus::Invalid.as_str()),
            package_signing_states::updated_at.eq(&now),
        ))
        .execute(conn)?;
    }

    Ok(())
}
