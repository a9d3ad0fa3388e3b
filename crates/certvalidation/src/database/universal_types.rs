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

//! Domain wrapper types for values whose storage encoding differs from their
//! in-memory form.
//!
//! SQLite has no native UUID or timestamp type, so the DAL stores UUIDs as
//! 16-byte BLOBs and timestamps as RFC 3339 TEXT. Domain code only ever sees
//! [`UniversalUuid`] and [`UniversalTimestamp`]; the conversions live here so
//! the storage encoding is decided in exactly one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one validation attempt, shared by every record the attempt
/// produces across validators and certificates.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UniversalUuid(pub Uuid);

impl UniversalUuid {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// BLOB column encoding.
    pub fn to_blob(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }

    pub fn from_blob(blob: &[u8]) -> Result<Self, uuid::Error> {
        Uuid::from_slice(blob).map(Self)
    }

    /// Parses the hyphenated form operators type.
    pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for UniversalUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

/// A UTC instant: revocation times, trusted timestamp values, bookkeeping.
///
/// Ordered, so revocation checks compare event times directly.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct UniversalTimestamp(pub DateTime<Utc>);

impl UniversalTimestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// TEXT column encoding. Sub-second precision survives the round trip.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Accepts any offset and normalizes to UTC.
    pub fn from_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| Self(dt.with_timezone(&Utc)))
    }
}

impl fmt::Display for UniversalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for UniversalTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
