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

//! Message sources for certificate validation messages.
//!
//! [`MessageSource`] is the contract the consumer loop needs from a
//! transport: at-least-once delivery, where a delivery is either completed,
//! abandoned for redelivery, or dead-lettered. [`InMemoryQueue`] implements it
//! in process for embedding and tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{QueueError, ValidatorError};
use crate::status::ValidationEnqueuer;

use super::handler::CertificateValidationMessage;

/// One delivery of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: u64,
    pub message: CertificateValidationMessage,
    /// How many times the message has been delivered, this one included
    pub delivery_count: u32,
}

/// A transport delivering certificate validation messages.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Takes the next message, or `None` if nothing is available right now.
    async fn receive(&self) -> Result<Option<Delivery>, QueueError>;

    /// Consumes the message.
    async fn complete(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Returns the message for redelivery.
    async fn abandon(&self, delivery: &Delivery) -> Result<(), QueueError>;

    /// Removes the message from circulation.
    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError>;
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    ready: VecDeque<Delivery>,
    in_flight: HashMap<u64, Delivery>,
    dead_letters: Vec<(CertificateValidationMessage, String)>,
    closed: bool,
}

/// An in-process FIFO queue. Abandoned messages go to the back.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueue {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send(&self, message: CertificateValidationMessage) {
        let mut state = self.state.lock();
        state.next_id += 1;
        let delivery = Delivery {
            id: state.next_id,
            message,
            delivery_count: 0,
        };
        state.ready.push_back(delivery);
    }

    /// Messages waiting to be received.
    pub fn len(&self) -> usize {
        self.state.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages received but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    pub fn dead_letters(&self) -> Vec<(CertificateValidationMessage, String)> {
        self.state.lock().dead_letters.clone()
    }

    /// Stops delivery; `receive` reports [`QueueError::Closed`] afterwards.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    fn settle(&self, delivery: &Delivery) -> Result<Delivery, QueueError> {
        self.state
            .lock()
            .in_flight
            .remove(&delivery.id)
            .ok_or(QueueError::UnknownDelivery(delivery.id))
    }
}

#[async_trait]
impl MessageSource for InMemoryQueue {
    async fn receive(&self) -> Result<Option<Delivery>, QueueError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(QueueError::Closed);
        }
        let Some(mut delivery) = state.ready.pop_front() else {
            return Ok(None);
        };
        delivery.delivery_count += 1;
        state.in_flight.insert(delivery.id, delivery.clone());
        Ok(Some(delivery))
    }

    async fn complete(&self, delivery: &Delivery) -> Result<(), QueueError> {
        self.settle(delivery).map(|_| ())
    }

    async fn abandon(&self, delivery: &Delivery) -> Result<(), QueueError> {
        let returned = self.settle(delivery)?;
        self.state.lock().ready.push_back(returned);
        Ok(())
    }

    async fn dead_letter(&self, delivery: &Delivery, reason: &str) -> Result<(), QueueError> {
        let removed = self.settle(delivery)?;
        self.state
            .lock()
            .dead_letters
            .push((removed.message, reason.to_string()));
        Ok(())
    }
}

#[async_trait]
impl ValidationEnqueuer for InMemoryQueue {
    async fn enqueue(&self, message: CertificateValidationMessage) -> Result<(), ValidatorError> {
        if self.state.lock().closed {
            return Err(ValidatorError::Enqueue(QueueError::Closed.to_string()));
        }
        self.send(message);
        Ok(())
    }
}
