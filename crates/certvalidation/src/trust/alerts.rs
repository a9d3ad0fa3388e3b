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

//! Operator alerts raised by trust decisions.
//!
//! Alerts are best-effort. A sink must not block, and a failure to deliver is
//! logged and dropped; it never fails the decision that raised the alert.

use tokio::sync::mpsc;

use crate::audit;

/// An alert for operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    /// A package signature lost its trust and should be acted on
    PackageSignatureShouldBeInvalidated {
        signature_id: i64,
        package_key: i64,
        certificate_id: i64,
        thumbprint: String,
    },
    /// Verification stayed inconclusive too many times in a row
    UnableToValidateCertificate {
        certificate_id: i64,
        thumbprint: String,
        inconclusive_count: i32,
    },
}

impl Alert {
    pub fn kind(&self) -> &'static str {
        match self {
            Alert::PackageSignatureShouldBeInvalidated { .. } => {
                "PackageSignatureShouldBeInvalidated"
            }
            Alert::UnableToValidateCertificate { .. } => "UnableToValidateCertificate",
        }
    }
}

/// Receives alerts raised by the trust engine.
pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: Alert);
}

/// Emits alerts as audit events.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditAlertSink;

impl AlertSink for AuditAlertSink {
    fn raise(&self, alert: Alert) {
        match alert {
            Alert::PackageSignatureShouldBeInvalidated {
                signature_id,
                package_key,
                certificate_id,
                thumbprint,
            } => audit::log_signature_invalidated(
                signature_id,
                package_key,
                certificate_id,
                &thumbprint,
            ),
            Alert::UnableToValidateCertificate {
                certificate_id,
                thumbprint,
                inconclusive_count,
            } => audit::log_certificate_abandoned(certificate_id, &thumbprint, inconclusive_count),
        }
    }
}

/// Forwards alerts into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    sender: mpsc::UnboundedSender<Alert>,
}

impl ChannelAlertSink {
    /// Creates a sink and the receiver that drains it.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl AlertSink for ChannelAlertSink {
    fn raise(&self, alert: Alert) {
        let kind = alert.kind();
        if let Err(e) = self.sender.send(alert) {
            audit::log_alert_delivery_failed(kind, &e.to_string());
        }
    }
}
