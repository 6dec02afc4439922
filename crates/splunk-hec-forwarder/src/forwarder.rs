// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Batch buffering and single-shot delivery to the HEC collector.
//!
//! One forwarder instance accumulates the events of one invocation and
//! ships them as a single `POST /services/collector/event`. There is no
//! internal retry: each invocation is one best-effort attempt, and the
//! invocation-level trigger decides whether to run again.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, error};

use crate::config::ForwarderConfig;
use crate::decoder::{BatchMetadata, LogEvent};
use crate::error::ForwardError;
use crate::event::HecEvent;

/// Path of the collector's JSON event endpoint, relative to the base URL.
const COLLECTOR_EVENT_PATH: &str = "/services/collector/event";

/// Body of the sentinel result returned when the batch is empty.
const NO_EVENTS_BODY: &str = "No events to send";

/// Terminal outcome of one delivery attempt.
///
/// A non-2xx status is a result, not an error: the collector's acceptance
/// semantics (e.g. partial-batch rejection) are opaque past the HTTP
/// layer, so success-vs-failure classification stays with the caller.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub status_code: u16,
    /// Collector response body, passed through verbatim.
    pub body: String,
}

impl DeliveryResult {
    /// Sentinel for a flush with nothing to send. A valid terminal
    /// result, not an error.
    pub fn no_events() -> Self {
        DeliveryResult {
            status_code: 204,
            body: NO_EVENTS_BODY.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Maps decoded records to collector events, buffers them, and performs
/// exactly one outbound delivery per invocation.
///
/// An instance is reusable across invocations as long as one flush is in
/// flight at a time; callers sharing an instance serialize their
/// `record`/`flush` pairs.
pub struct Forwarder {
    client: reqwest::Client,
    headers: HeaderMap,
    config: ForwarderConfig,
    events: Vec<HecEvent>,
}

impl Forwarder {
    /// Validates the configuration and builds the HTTP client shared by
    /// every delivery from this instance.
    pub fn new(config: ForwarderConfig) -> Result<Self, ForwardError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Splunk {}", config.auth_token)).map_err(|_| {
                ForwardError::InvalidConfig("HEC token is not a valid header value".to_string())
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.flush_timeout))
            .build()
            .map_err(ForwardError::Delivery)?;

        Ok(Forwarder {
            client,
            headers,
            config,
            events: Vec::new(),
        })
    }

    /// Appends one mapped event to the in-memory batch. No I/O; never
    /// fails.
    pub fn record(&mut self, record: &LogEvent, metadata: &BatchMetadata) {
        self.events
            .push(HecEvent::from_record(record, metadata, &self.config));
    }

    /// Number of events buffered for the next flush.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Delivers the buffered batch as one POST to the collector and
    /// returns the completed response.
    ///
    /// The buffer is handed off before the request is issued, so the
    /// batch never survives an attempt: after any outcome — 2xx, non-2xx,
    /// transport error, or an aborted in-flight request — the instance is
    /// empty again and a subsequent invocation cannot resend these
    /// events. Delivery is at-most-once.
    pub async fn flush(&mut self) -> Result<DeliveryResult, ForwardError> {
        if self.events.is_empty() {
            return Ok(DeliveryResult::no_events());
        }

        let batch = std::mem::take(&mut self.events);
        let n_events = batch.len();
        let payload = serde_json::to_vec(&batch)?;
        let url = format!(
            "{}{}",
            self.config.endpoint.trim_end_matches('/'),
            COLLECTOR_EVENT_PATH
        );

        debug!("flushing {n_events} events to the collector");

        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                error!("failed to deliver batch of {n_events} events: {e}");
                ForwardError::Delivery(e)
            })?;

        let status = response.status();
        // Reading the body to completion is part of the delivery; only
        // then is the attempt terminal.
        let body = response.text().await.map_err(ForwardError::Delivery)?;

        debug!(status = status.as_u16(), "collector response");

        Ok(DeliveryResult {
            status_code: status.as_u16(),
            body,
        })
    }
}
