// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

/// Errors that can abort a forwarding invocation.
///
/// "Zero events to send" and a non-2xx collector response are terminal
/// results, not errors; see [`crate::forwarder::DeliveryResult`].
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The inbound blob was not valid gzip data. Retrying the same payload
    /// cannot succeed, so callers should not.
    #[error("failed to decompress log payload: {0}")]
    Decompression(#[source] std::io::Error),

    /// The decompressed text was not the expected subscription JSON
    /// document. Not retried, for the same reason.
    #[error("malformed log payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Transport-level delivery failure: DNS, connect refused, timeout, or
    /// an aborted in-flight request. The batch is already cleared by the
    /// time this surfaces, so a retry-from-scratch invocation cannot
    /// resend it.
    #[error("failed to deliver batch to collector: {0}")]
    Delivery(#[from] reqwest::Error),

    /// Invalid forwarder configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
