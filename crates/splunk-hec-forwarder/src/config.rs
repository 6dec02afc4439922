// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::ForwardError;

/// Destination index when the harness supplies none.
pub const DEFAULT_INDEX: &str = "aws_loom";
/// Event sourcetype when the harness supplies none.
pub const DEFAULT_SOURCETYPE: &str = "aws:loom:application";
/// Host label when the harness supplies none.
pub const DEFAULT_HOST_LABEL: &str = "unknown - refer logstream prefix to classify env names";

const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 5;

/// Resolved configuration for one forwarder instance.
///
/// Resolution (environment variables, secret stores) is the invoking
/// harness's responsibility; the core consumes the finished values by
/// value and never reaches into the environment itself.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Collector base URL, e.g. `https://splunk.example.com:8088`. A URL
    /// without an explicit port uses the scheme's standard port.
    pub endpoint: String,
    /// HEC token presented on the Authorization header.
    pub auth_token: String,
    /// Destination index stamped onto every event.
    pub index: String,
    /// Sourcetype stamped onto every event.
    pub sourcetype: String,
    /// Value of the `host` field on every event.
    pub host_label: String,
    /// Per-delivery timeout, in seconds.
    pub flush_timeout: u64,
}

impl ForwarderConfig {
    /// Creates a configuration with the given endpoint and token and the
    /// standard defaults for everything else.
    pub fn new(endpoint: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_token: auth_token.into(),
            index: DEFAULT_INDEX.to_string(),
            sourcetype: DEFAULT_SOURCETYPE.to_string(),
            host_label: DEFAULT_HOST_LABEL.to_string(),
            flush_timeout: DEFAULT_FLUSH_TIMEOUT_SECS,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ForwardError> {
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(ForwardError::InvalidConfig(format!(
                "endpoint must be an http(s) URL, got '{}'",
                self.endpoint
            )));
        }

        if self.auth_token.trim().is_empty() {
            return Err(ForwardError::InvalidConfig(
                "HEC token cannot be empty".to_string(),
            ));
        }

        if self.index.trim().is_empty() {
            return Err(ForwardError::InvalidConfig(
                "index cannot be empty".to_string(),
            ));
        }

        if self.flush_timeout == 0 {
            return Err(ForwardError::InvalidConfig(
                "flush timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
