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

//! certvalidation CLI - operator commands for the certificate trust store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

/// Inspect and maintain the certificate trust store
#[derive(Parser)]
#[command(name = "certvalidation")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL (can also be set via DATABASE_URL environment variable)
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    Migrate,
    /// Certificate commands
    Certificate {
        #[command(subcommand)]
        command: CertificateCommands,
    },
    /// Show a validator's status record for a validation attempt
    ValidatorStatus {
        /// Validator name the record belongs to
        validator: String,
        /// Validation attempt id (UUID)
        validation_id: String,
    },
}

#[derive(Subcommand)]
enum CertificateCommands {
    /// Show a certificate's trust state and what depends on it
    Show {
        thumbprint: String,

        /// Print the certificate record as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let database_url = cli
        .database_url
        .context(
            "Database URL is required. Set --database-url or DATABASE_URL environment variable",
        )?;

    match cli.command {
        Commands::Migrate => commands::migrate::run(&database_url).await?,
        Commands::Certificate { command } => match command {
            CertificateCommands::Show { thumbprint, json } => {
                commands::certificate::show(&database_url, &thumbprint, json).await?
            }
        },
        Commands::ValidatorStatus {
            validator,
            validation_id,
        } => commands::validator_status::run(&database_url, &validator, &validation_id).await?,
    }

    Ok(())
}
