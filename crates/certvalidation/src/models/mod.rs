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

//! Domain models.
//!
//! These are API-level types; the DAL converts them to and from their SQLite
//! row representations.

pub mod certificate;
pub mod certificate_graph;
pub mod certificate_validation;
pub mod package_signature;
pub mod validator_status;

pub use certificate::{Certificate, CertificateStatus, NewCertificate};
pub use certificate_graph::{CertificateGraph, GraphUpdate};
pub use certificate_validation::{CertificateValidation, NewCertificateValidation};
pub use package_signature::{
    NewPackageSignature, NewPackageSigningState, NewTrustedTimestamp, PackageSignature,
    PackageSignatureStatus, PackageSignatureType, PackageSigningState, PackageSigningStatus,
    TrustedTimestamp,
};
pub use validator_status::{ValidationRequest, ValidationStatus, ValidatorStatus};
