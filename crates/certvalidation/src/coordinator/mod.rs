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

//! Certificate validation coordination.
//!
//! The [`CertificateValidationCoordinator`] handles individual messages and
//! the [`ValidationConsumer`] feeds it from a [`MessageSource`].

pub mod consumer;
pub mod handler;
pub mod queue;
pub mod shutdown;

pub use consumer::ValidationConsumer;
pub use handler::{CertificateValidationCoordinator, CertificateValidationMessage, HandleOutcome};
pub use queue::{Delivery, InMemoryQueue, MessageSource};
pub use shutdown::ShutdownSignal;
