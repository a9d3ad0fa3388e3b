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

//! Certificate trust re-evaluation.
//!
//! [`CertificateTrustEngine`] turns a [`VerificationResult`] into durable state
//! across the certificate's dependency graph. The pure decision logic lives in
//! [`cascade`]; verification and certificate storage are external and sit
//! behind the traits in [`verifier`].

pub mod alerts;
pub mod cascade;
pub mod engine;
pub mod verifier;

pub use alerts::{Alert, AlertSink, AuditAlertSink, ChannelAlertSink};
pub use cascade::TrustDecision;
pub use engine::CertificateTrustEngine;
pub use verifier::{CertificateStore, CertificateVerifier, VerificationResult, VerificationStatus};
