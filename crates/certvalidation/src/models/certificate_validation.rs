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

//! Certificate Validation Model
//!
//! One validation attempt of one certificate. The outcome stays empty until
//! the attempt reaches a terminal status and is never changed afterwards.

use super::certificate::CertificateStatus;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use serde::{Deserialize, Serialize};

/// Represents a certificate validation attempt (domain type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateValidation {
    pub id: i64,
    pub certificate_id: i64,
    /// Validation attempt this check belongs to
    pub validation_id: UniversalUuid,
    /// Terminal outcome, `None` while the attempt is still in progress
    pub status: Option<CertificateStatus>,
    pub created_at: UniversalTimestamp,
    pub updated_at: UniversalTimestamp,
}

impl CertificateValidation {
    /// Whether the attempt already holds an outcome.
    pub fn is_decided(&self) -> bool {
        self.status.is_some()
    }
}

/// Structure for creating a new validation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCertificateValidation {
    pub certificate_id: i64,
    pub validation_id: UniversalUuid,
}
