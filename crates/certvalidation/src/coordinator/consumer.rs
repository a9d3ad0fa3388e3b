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

//! Consumer loop feeding deliveries to the coordinator.
//!
//! Each delivery is settled according to how handling went:
//!
//! | Handling result            | Delivery settled as |
//! |----------------------------|---------------------|
//! | `Handled`                  | complete            |
//! | `Retry`                    | abandon             |
//! | fatal consistency error    | dead letter         |
//! | any other error            | abandon             |

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::QueueError;

use super::handler::{CertificateValidationCoordinator, HandleOutcome};
use super::queue::MessageSource;
use super::shutdown::ShutdownSignal;

/// Pulls messages from a [`MessageSource`] until shutdown.
#[derive(Clone)]
pub struct ValidationConsumer {
    source: Arc<dyn MessageSource>,
    coordinator: Arc<CertificateValidationCoordinator>,
    shutdown: ShutdownSignal,
    poll_interval: Duration,
}

impl ValidationConsumer {
    pub fn new(
        source: Arc<dyn MessageSource>,
        coordinator: Arc<CertificateValidationCoordinator>,
        shutdown: ShutdownSignal,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            coordinator,
            shutdown,
            poll_interval,
        }
    }

    /// Runs until shutdown is requested or the source closes.
    pub async fn run(&self) -> Result<(), QueueError> {
        info!("Certificate validation consumer started");

        while !self.shutdown.is_triggered() {
            match self.process_next().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(QueueError::Closed) => {
                    info!("Message source closed");
                    break;
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.shutdown.wait() => {}
            }
        }

        info!("Certificate validation consumer stopped");
        Ok(())
    }

    /// Receives and settles a single delivery. Returns `false` when no
    /// message was available.
    pub async fn process_next(&self) -> Result<bool, QueueError> {
        let Some(delivery) = self.source.receive().await? else {
            return Ok(false);
        };

        let message = &delivery.message;
        match self.coordinator.handle(message).await {
            Ok(HandleOutcome::Handled) => self.source.complete(&delivery).await?,
            Ok(HandleOutcome::Retry) => {
                debug!(
                    certificate_id = message.certificate_id,
                    validation_id = %message.validation_id,
                    delivery_count = delivery.delivery_count,
                    "Returning message for redelivery"
                );
                self.source.abandon(&delivery).await?
            }
            Err(e) if e.is_fatal() => {
                error!(
                    certificate_id = message.certificate_id,
                    validation_id = %message.validation_id,
                    error = %e,
                    "Dead-lettering certificate validation message"
                );
                self.source.dead_letter(&delivery, &e.to_string()).await?
            }
            Err(e) => {
                warn!(
                    certificate_id = message.certificate_id,
                    validation_id = %message.validation_id,
                    error = %e,
                    "Certificate validation failed; returning message for redelivery"
                );
                self.source.abandon(&delivery).await?
            }
        }
        Ok(true)
    }
}
