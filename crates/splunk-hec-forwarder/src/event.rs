// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The Splunk HEC wire event and the record-to-event mapping rule.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::config::ForwarderConfig;
use crate::decoder::{BatchMetadata, LogEvent};

/// Fallback `source` when the batch carries no log stream name.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Batch identifiers attached under `fields` on every event. Absent
/// identifiers are omitted from the wire entirely.
#[derive(Debug, Clone, Serialize)]
pub struct EventFields {
    #[serde(rename = "logGroup", skip_serializing_if = "Option::is_none")]
    pub log_group: Option<String>,
    #[serde(rename = "logStream", skip_serializing_if = "Option::is_none")]
    pub log_stream: Option<String>,
}

/// One event in the collector's JSON ingestion schema.
#[derive(Debug, Clone, Serialize)]
pub struct HecEvent {
    pub event: String,
    pub index: String,
    pub sourcetype: String,
    pub source: String,
    pub host: String,
    /// Unix seconds, fractional. This is the wall-clock instant of
    /// mapping, not the original log timestamp.
    pub time: f64,
    pub fields: EventFields,
}

impl HecEvent {
    /// Maps one decoded record into a collector event. Total over the
    /// record shape: a missing `logStream` degrades to [`UNKNOWN_SOURCE`]
    /// rather than erroring.
    pub fn from_record(
        record: &LogEvent,
        metadata: &BatchMetadata,
        config: &ForwarderConfig,
    ) -> Self {
        HecEvent {
            event: record.message.clone(),
            index: config.index.clone(),
            sourcetype: config.sourcetype.clone(),
            source: metadata
                .log_stream
                .clone()
                .unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            host: config.host_label.clone(),
            time: unix_timestamp(),
            fields: EventFields {
                log_group: metadata.log_group.clone(),
                log_stream: metadata.log_stream.clone(),
            },
        }
    }
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
