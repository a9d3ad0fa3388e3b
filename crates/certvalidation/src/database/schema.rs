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

//! Diesel table definitions matching the embedded SQLite migrations.

diesel::table! {
    certificates (id) {
        id -> BigInt,
        thumbprint -> Text,
        status -> Text,
        inconclusive_count -> Integer,
        revocation_time -> Nullable<Text>,
        status_update_time -> Nullable<Text>,
        last_verification_time -> Nullable<Text>,
        row_version -> BigInt,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    certificate_validations (id) {
        id -> BigInt,
        certificate_id -> BigInt,
        validation_id -> Binary,
        status -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    package_signing_states (package_key) {
        package_key -> BigInt,
        package_id -> Text,
        package_version -> Text,
        status -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    package_signatures (id) {
        id -> BigInt,
        package_key -> BigInt,
        certificate_id -> BigInt,
        signature_type -> Text,
        status -> Text,
        row_version -> BigInt,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    trusted_timestamps (id) {
        id -> BigInt,
        package_signature_id -> BigInt,
        certificate_id -> BigInt,
        value -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    validator_statuses (validator_name, validation_id) {
        validation_id -> Binary,
        validator_name -> Text,
        package_key -> BigInt,
        state -> Text,
        row_version -> BigInt,
        started_at -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::joinable!(certificate_validations -> certificates (certificate_id));
diesel::joinable!(package_signatures -> certificates (certificate_id));
diesel::joinable!(package_signatures -> package_signing_states (package_key));
diesel::joinable!(trusted_timestamps -> package_signatures (package_signature_id));

diesel::allow_tables_to_appear_in_same_query!(
    certificates,
    certificate_validations,
    package_signing_states,
    package_signatures,
    trusted_timestamps,
    validator_statuses,
);
