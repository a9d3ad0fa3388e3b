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

//! Implementation of the `certificate show` command.

use anyhow::{anyhow, Context, Result};
use certvalidation::models::{CertificateGraph, PackageSignatureStatus};
use certvalidation::UniversalTimestamp;

/// Dependents of a certificate, split by whether they are still trusted.
#[derive(Debug, Default, PartialEq, Eq)]
struct DependentCounts {
    signed: usize,
    timestamped: usize,
    invalid: usize,
}

fn count_dependents(graph: &CertificateGraph) -> DependentCounts {
    DependentCounts {
        signed: graph.signed_by_certificate().count(),
        timestamped: graph.timestamped_by_certificate().count(),
        invalid: graph
            .signatures
            .values()
            .filter(|s| s.status == PackageSignatureStatus::Invalid)
            .count(),
    }
}

fn or_dash(time: Option<UniversalTimestamp>) -> String {
    time.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".to_string())
}

pub async fn show(database_url: &str, thumbprint: &str, json: bool) -> Result<()> {
    let dal = super::connect(database_url)?;

    let certificate = dal
        .certificate()
        .get_by_thumbprint(thumbprint)
        .await
        .context("Failed to look up certificate")?
        .ok_or_else(|| anyhow!("No certificate with thumbprint {}", thumbprint))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&certificate)?);
        return Ok(());
    }

    let graph = dal
        .certificate()
        .load_graph(certificate.id)
        .await
        .context("Failed to load certificate dependents")?
        .ok_or_else(|| anyhow!("Certificate {} disappeared", certificate.id))?;
    let counts = count_dependents(&graph);

    println!("Certificate {} ({})", certificate.thumbprint, certificate.id);
    println!("  status:              {}", certificate.status);
    println!("  inconclusive checks: {}", certificate.inconclusive_count);
    println!("  revoked at:          {}", or_dash(certificate.revocation_time));
    println!("  status updated:      {}", or_dash(certificate.status_update_time));
    println!("  last verified:       {}", or_dash(certificate.last_verification_time));
    println!("  signatures signed:   {}", counts.signed);
    println!("  signatures stamped:  {}", counts.timestamped);
    println!("  invalid dependents:  {}", counts.invalid);

    Ok(())
}
