// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Decoding of compressed CloudWatch Logs subscription payloads.
//!
//! The inbound blob is gzip-compressed JSON of the shape
//! `{"logGroup": ..., "logStream": ..., "logEvents": [{"message": ...}]}`.
//! Base64 decoding of the transport envelope happens before this module is
//! reached. Decoding is a pure transform: no I/O, no buffering.

use std::io::Read;

use flate2::read::GzDecoder;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::ForwardError;

/// One raw log line from the `logEvents` array.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEvent {
    pub message: String,
}

/// Batch-level identifiers shared by every record of one decode call.
///
/// Both identifiers are optional on the wire; a missing `logStream`
/// degrades to the `"unknown"` source at mapping time instead of failing.
#[derive(Debug, Clone, Default)]
pub struct BatchMetadata {
    pub log_group: Option<String>,
    pub log_stream: Option<String>,
}

/// Result of decoding one compressed subscription payload.
#[derive(Debug)]
pub struct DecodedBatch {
    pub metadata: BatchMetadata,
    /// Records in original `logEvents` order. That order is preserved all
    /// the way into the serialized outbound batch.
    pub events: Vec<LogEvent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionPayload {
    #[serde(default)]
    log_group: Option<String>,
    #[serde(default)]
    log_stream: Option<String>,
    #[serde(default, deserialize_with = "events_or_empty")]
    log_events: Vec<LogEvent>,
}

/// An absent or non-array `logEvents` value means "no events", not a
/// malformed payload. An array element of the wrong shape is malformed.
fn events_or_empty<'de, D>(deserializer: D) -> Result<Vec<LogEvent>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(serde::de::Error::custom))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Decompresses and parses one subscription payload.
///
/// Neither failure class is worth retrying: a blob that is not gzip, or
/// gzip of something other than the subscription document, will fail the
/// same way on every attempt.
pub fn decode(blob: &[u8]) -> Result<DecodedBatch, ForwardError> {
    let mut decoder = GzDecoder::new(blob);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(ForwardError::Decompression)?;

    let payload: SubscriptionPayload = serde_json::from_slice(&decompressed)?;

    debug!(
        log_group = payload.log_group.as_deref().unwrap_or_default(),
        events = payload.log_events.len(),
        "decoded subscription payload"
    );

    Ok(DecodedBatch {
        metadata: BatchMetadata {
            log_group: payload.log_group,
            log_stream: payload.log_stream,
        },
        events: payload.log_events,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_decode_preserves_count_and_order() {
        let blob = gzip(
            br#"{"logGroup":"g","logStream":"s","logEvents":[{"message":"m1"},{"message":"m2"},{"message":"m3"}]}"#,
        );

        let batch = decode(&blob).unwrap();

        assert_eq!(batch.metadata.log_group.as_deref(), Some("g"));
        assert_eq!(batch.metadata.log_stream.as_deref(), Some("s"));
        let messages: Vec<&str> = batch.events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_decode_rejects_non_gzip() {
        let err = decode(b"definitely not gzip").unwrap_err();
        assert!(matches!(err, ForwardError::Decompression(_)));
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let err = decode(&gzip(b"{not json")).unwrap_err();
        assert!(matches!(err, ForwardError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_rejects_non_object_document() {
        let err = decode(&gzip(b"[1,2,3]")).unwrap_err();
        assert!(matches!(err, ForwardError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_missing_log_events_is_empty() {
        let batch = decode(&gzip(br#"{"logGroup":"g","logStream":"s"}"#)).unwrap();
        assert!(batch.events.is_empty());
        assert_eq!(batch.metadata.log_group.as_deref(), Some("g"));
    }

    #[test]
    fn test_decode_non_array_log_events_is_empty() {
        let batch = decode(&gzip(br#"{"logGroup":"g","logEvents":"oops"}"#)).unwrap();
        assert!(batch.events.is_empty());

        let batch = decode(&gzip(br#"{"logGroup":"g","logEvents":null}"#)).unwrap();
        assert!(batch.events.is_empty());
    }

    #[test]
    fn test_decode_rejects_malformed_event_element() {
        let err = decode(&gzip(br#"{"logEvents":[{"message":"ok"},42]}"#)).unwrap_err();
        assert!(matches!(err, ForwardError::MalformedPayload(_)));

        let err = decode(&gzip(br#"{"logEvents":[{"message":7}]}"#)).unwrap_err();
        assert!(matches!(err, ForwardError::MalformedPayload(_)));
    }

    #[test]
    fn test_decode_missing_log_stream_is_none() {
        let batch = decode(&gzip(br#"{"logGroup":"g","logEvents":[{"message":"m"}]}"#)).unwrap();
        assert!(batch.metadata.log_stream.is_none());
        assert_eq!(batch.events.len(), 1);
    }
}
