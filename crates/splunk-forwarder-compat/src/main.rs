// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;
use std::io::{self, BufRead};

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use tokio::sync::{Mutex as TokioMutex, OnceCell};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use splunk_hec_forwarder::{decode, DeliveryResult, Forwarder, ForwarderConfig};

/// Transport envelope delivered by the log source: the compressed batch
/// rides base64-encoded under `awslogs.data`.
#[derive(Debug, Deserialize)]
struct Envelope {
    awslogs: AwsLogs,
}

#[derive(Debug, Deserialize)]
struct AwsLogs {
    data: String,
}

/// Process-wide forwarder cache, initialized on first use and never torn
/// down. Reuse across invocations skips rebuilding the HTTP client; it is
/// an optimization only — every invocation is independently correct with
/// a fresh instance. The mutex serializes record/flush pairs so a single
/// delivery is in flight at a time.
static FORWARDER: OnceCell<TokioMutex<Forwarder>> = OnceCell::const_new();

async fn forwarder() -> Result<&'static TokioMutex<Forwarder>> {
    FORWARDER
        .get_or_try_init(|| async {
            let config = resolve_config()?;
            Ok(TokioMutex::new(Forwarder::new(config)?))
        })
        .await
}

/// Resolves the forwarder configuration from the environment.
///
/// The original deployment fetched the collector URL and token through a
/// secrets store; secret management is out of scope here, so both are
/// read directly from the environment.
fn resolve_config() -> Result<ForwarderConfig> {
    let endpoint = env::var("SPLUNK_HEC_URL")
        .map_err(|_| anyhow!("SPLUNK_HEC_URL environment variable is not set"))?;
    let auth_token = env::var("SPLUNK_HEC_TOKEN")
        .map_err(|_| anyhow!("SPLUNK_HEC_TOKEN environment variable is not set"))?;

    let mut config = ForwarderConfig::new(endpoint, auth_token);
    if let Ok(index) = env::var("SPLUNK_INDEX") {
        config.index = index;
    }
    if let Ok(sourcetype) = env::var("SPLUNK_SOURCETYPE") {
        config.sourcetype = sourcetype;
    }
    if let Ok(environment) = env::var("ENVIRONMENT") {
        config.host_label = environment;
    }
    Ok(config)
}

/// Runs one invocation: unwrap the envelope, decode the batch, map every
/// record, deliver.
async fn handle_invocation(envelope: &str) -> Result<DeliveryResult> {
    let envelope: Envelope =
        serde_json::from_str(envelope).context("invalid invocation envelope")?;
    let blob = STANDARD
        .decode(envelope.awslogs.data.as_bytes())
        .context("envelope data is not valid base64")?;

    let batch = decode(&blob)?;
    let count = batch.events.len();

    let mut forwarder = forwarder().await?.lock().await;
    for record in &batch.events {
        forwarder.record(record, &batch.metadata);
    }
    let result = forwarder.flush().await?;

    info!("Successfully sent {count} log events to Splunk");
    Ok(result)
}

#[tokio::main]
pub async fn main() {
    let log_level = env::var("LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Starting splunk forwarder compat shim");

    // One envelope per stdin line, each treated as one invocation. The
    // forwarder instance is shared across them through the process-wide
    // cache, matching the warm-start behavior of the original runtime.
    let stdin = io::stdin();
    let mut failed = false;
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read invocation envelope: {e}");
                failed = true;
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match handle_invocation(&line).await {
            Ok(result) => {
                println!(
                    "{}",
                    serde_json::json!({
                        "statusCode": result.status_code,
                        "body": result.body,
                    })
                );
            }
            Err(e) => {
                error!("Invocation failed: {e:#}");
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serial_test::serial;
    use std::env;

    use super::*;

    fn clear_env() {
        for var in [
            "SPLUNK_HEC_URL",
            "SPLUNK_HEC_TOKEN",
            "SPLUNK_INDEX",
            "SPLUNK_SOURCETYPE",
            "ENVIRONMENT",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_error_if_no_hec_url() {
        clear_env();
        env::set_var("SPLUNK_HEC_TOKEN", "_not_a_real_token_");

        let config = resolve_config();
        assert!(config.is_err());
        assert_eq!(
            config.unwrap_err().to_string(),
            "SPLUNK_HEC_URL environment variable is not set"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_error_if_no_hec_token() {
        clear_env();
        env::set_var("SPLUNK_HEC_URL", "https://splunk.example.com:8088");

        let config = resolve_config();
        assert!(config.is_err());
        assert_eq!(
            config.unwrap_err().to_string(),
            "SPLUNK_HEC_TOKEN environment variable is not set"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_defaults_applied() {
        clear_env();
        env::set_var("SPLUNK_HEC_URL", "https://splunk.example.com:8088");
        env::set_var("SPLUNK_HEC_TOKEN", "_not_a_real_token_");

        let config = resolve_config().unwrap();
        assert_eq!(config.endpoint, "https://splunk.example.com:8088");
        assert_eq!(config.index, "aws_loom");
        assert_eq!(config.sourcetype, "aws:loom:application");
        assert_eq!(
            config.host_label,
            "unknown - refer logstream prefix to classify env names"
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        env::set_var("SPLUNK_HEC_URL", "https://splunk.example.com:8088");
        env::set_var("SPLUNK_HEC_TOKEN", "_not_a_real_token_");
        env::set_var("SPLUNK_INDEX", "custom_index");
        env::set_var("SPLUNK_SOURCETYPE", "custom:sourcetype");
        env::set_var("ENVIRONMENT", "production");

        let config = resolve_config().unwrap();
        assert_eq!(config.index, "custom_index");
        assert_eq!(config.sourcetype, "custom:sourcetype");
        assert_eq!(config.host_label, "production");
        clear_env();
    }

    #[test]
    fn test_envelope_unwraps_base64() {
        let blob = b"compressed bytes";
        let encoded = STANDARD.encode(blob);
        let line = format!(r#"{{"awslogs":{{"data":"{encoded}"}}}}"#);

        let envelope: Envelope = serde_json::from_str(&line).unwrap();
        let decoded = STANDARD.decode(envelope.awslogs.data.as_bytes()).unwrap();

        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_envelope_rejects_missing_awslogs() {
        let result = serde_json::from_str::<Envelope>(r#"{"records":[]}"#);
        assert!(result.is_err());
    }
}
