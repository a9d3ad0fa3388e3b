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

pub mod certificate;
pub mod migrate;
pub mod validator_status;

use anyhow::{Context, Result};
use certvalidation::{Database, DAL};

/// CLI commands run one query at a time.
const CLI_POOL_SIZE: u32 = 1;

/// Opens the database without touching its schema.
pub(crate) fn connect(database_url: &str) -> Result<DAL> {
    let database =
        Database::try_new(database_url, CLI_POOL_SIZE).context("Failed to connect to database")?;
    Ok(DAL::new(database))
}
