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

//! Validator Status Model
//!
//! Per-validator progress for one validation attempt of one package, keyed by
//! `(validator_name, validation_id)`.

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use serde::{Deserialize, Serialize};

/// Progress of a validator on a validation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidationStatus {
    NotStarted,
    Incomplete,
    Succeeded,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::NotStarted => "NotStarted",
            ValidationStatus::Incomplete => "Incomplete",
            ValidationStatus::Succeeded => "Succeeded",
            ValidationStatus::Failed => "Failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NotStarted" => Some(ValidationStatus::NotStarted),
            "Incomplete" => Some(ValidationStatus::Incomplete),
            "Succeeded" => Some(ValidationStatus::Succeeded),
            "Failed" => Some(ValidationStatus::Failed),
            _ => None,
        }
    }

    /// Returns true once the validator has reached a verdict.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ValidationStatus::Succeeded | ValidationStatus::Failed)
    }
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validator's status record (domain type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorStatus {
    pub validation_id: UniversalUuid,
    pub package_key: i64,
    pub validator_name: String,
    pub state: ValidationStatus,
    /// When the validator first recorded progress
    pub started_at: Option<UniversalTimestamp>,
    /// Optimistic-concurrency token; `0` for records that were never persisted
    pub row_version: i64,
}

impl ValidatorStatus {
    /// An unpersisted `NotStarted` record for a request.
    pub fn not_started(request: &ValidationRequest, validator_name: &str) -> Self {
        Self {
            validation_id: request.validation_id,
            package_key: request.package_key,
            validator_name: validator_name.to_string(),
            state: ValidationStatus::NotStarted,
            started_at: None,
            row_version: 0,
        }
    }
}

/// A request from the orchestrator to validate one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub validation_id: UniversalUuid,
    pub package_key: i64,
    pub package_id: String,
    pub package_version: String,
}

impl ValidationRequest {
    pub fn new(
        validation_id: UniversalUuid,
        package_key: i64,
        package_id: impl Into<String>,
        package_version: impl Into<String>,
    ) -> Self {
        Self {
            validation_id,
            package_key,
            package_id: package_id.into(),
            package_version: package_version.into(),
        }
    }
}
