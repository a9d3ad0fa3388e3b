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

//! Implementation of the `validator-status` command.

use anyhow::{anyhow, Context, Result};
use certvalidation::{UniversalUuid, ValidatorStatusStore};

pub async fn run(database_url: &str, validator: &str, validation_id: &str) -> Result<()> {
    let validation_id = UniversalUuid::parse_str(validation_id)
        .with_context(|| format!("Invalid validation id: '{}'", validation_id))?;

    let dal = super::connect(database_url)?;
    let store = ValidatorStatusStore::new(dal, validator);

    let status = store
        .get_status_by_id(validation_id)
        .await
        .context("Failed to look up validator status")?
        .ok_or_else(|| anyhow!("{} has no record for validation {}", validator, validation_id))?;

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
