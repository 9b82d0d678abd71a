//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Network identifier (e.g. mainnet, goerli, development)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "relay-settlement".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "development".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `RS_SERVICE_NAME`: Service name (default: relay-settlement)
    /// - `RS_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `RS_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `RS_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `RS_NETWORK`: Network name (default: development)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("RS_SERVICE_NAME")
                .unwrap_or_else(|_| "relay-settlement".to_string()),

            log_level: env::var("RS_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("RS_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("RS_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            network: env::var("RS_NETWORK").unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Service name qualified with the network, e.g. `relay-settlement-goerli`.
    pub fn full_service_name(&self) -> String {
        format!("{}-{}", self.service_name, self.network)
    }
}
