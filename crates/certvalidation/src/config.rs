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

//! Configuration for certificate validation.

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for the certificate validator and its consumer loop.
///
/// Use [`CertificateValidationConfig::builder()`] to construct a value;
/// `build()` rejects settings the engine cannot run with.
///
/// # Example
///
/// ```rust
/// use certvalidation::CertificateValidationConfig;
/// use std::time::Duration;
///
/// let config = CertificateValidationConfig::builder()
///     .validator_name("certificate-validator")
///     .max_inconclusive_count(5)
///     .poll_interval(Duration::from_millis(250))
///     .build()
///     .unwrap();
/// assert_eq!(config.max_inconclusive_count(), 5);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CertificateValidationConfig {
    validator_name: String,
    max_inconclusive_count: i32,
    db_pool_size: u32,
    poll_interval: Duration,
}

impl CertificateValidationConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> CertificateValidationConfigBuilder {
        CertificateValidationConfigBuilder::default()
    }

    /// Identifier the validator status store is bound to.
    pub fn validator_name(&self) -> &str {
        &self.validator_name
    }

    /// Consecutive inconclusive results after which a certificate is
    /// marked invalid and an operator is alerted.
    pub fn max_inconclusive_count(&self) -> i32 {
        self.max_inconclusive_count
    }

    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size
    }

    /// How long the consumer loop waits when no message is available.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl Default for CertificateValidationConfig {
    fn default() -> Self {
        CertificateValidationConfigBuilder::default().config
    }
}

/// Builder for [`CertificateValidationConfig`].
#[derive(Debug, Clone)]
pub struct CertificateValidationConfigBuilder {
    config: CertificateValidationConfig,
}

impl Default for CertificateValidationConfigBuilder {
    fn default() -> Self {
        Self {
            config: CertificateValidationConfig {
                validator_name: "certificate-validator".to_string(),
                max_inconclusive_count: 10,
                db_pool_size: 4,
                poll_interval: Duration::from_secs(1),
            },
        }
    }
}

impl CertificateValidationConfigBuilder {
    pub fn validator_name(mut self, value: impl Into<String>) -> Self {
        self.config.validator_name = value.into();
        self
    }

    pub fn max_inconclusive_count(mut self, value: i32) -> Self {
        self.config.max_inconclusive_count = value;
        self
    }

    pub fn db_pool_size(mut self, value: u32) -> Self {
        self.config.db_pool_size = value;
        self
    }

    pub fn poll_interval(mut self, value: Duration) -> Self {
        self.config.poll_interval = value;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> Result<CertificateValidationConfig, ConfigError> {
        if self.config.validator_name.trim().is_empty() {
            return Err(ConfigError::EmptyValidatorName);
        }
        if self.config.max_inconclusive_count < 1 {
            return Err(ConfigError::InvalidInconclusiveThreshold(
                self.config.max_inconclusive_count,
            ));
        }
        if self.config.db_pool_size < 1 {
            return Err(ConfigError::InvalidPoolSize(self.config.db_pool_size));
        }
        Ok(self.config)
    }
}
