// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudWatch Logs to Splunk HEC forwarding pipeline.
//!
//! One invocation handles one compressed subscription payload end-to-end:
//! decode the gzip JSON blob, map each log line into a collector event,
//! and deliver the whole batch as a single HTTP POST.
//!
//! The crate is organized into a few small modules:
//! - [`decoder`]: gzip + JSON decoding of the inbound payload
//! - [`event`]: the HEC wire event and the record-to-event mapping
//! - [`forwarder`]: batch buffering and single-shot delivery
//! - [`config`]: resolved configuration consumed by value
//! - [`error`]: the failure taxonomy shared by the pipeline
//!
//! Configuration resolution (environment variables, secret stores) is the
//! invoking harness's job; the core only consumes the finished values.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod decoder;
pub mod error;
pub mod event;
pub mod forwarder;

pub use config::ForwarderConfig;
pub use decoder::{decode, BatchMetadata, DecodedBatch, LogEvent};
pub use error::ForwardError;
pub use event::HecEvent;
pub use forwarder::{DeliveryResult, Forwarder};

/// Runs one full invocation: decode the compressed blob, map every record,
/// deliver the batch.
///
/// Decode failures abort before any delivery is attempted. After the call
/// returns — success, non-2xx result, or delivery error — the forwarder's
/// batch is empty again.
pub async fn forward(
    forwarder: &mut Forwarder,
    blob: &[u8],
) -> Result<DeliveryResult, ForwardError> {
    let batch = decoder::decode(blob)?;
    for record in &batch.events {
        forwarder.record(record, &batch.metadata);
    }
    forwarder.flush().await
}
