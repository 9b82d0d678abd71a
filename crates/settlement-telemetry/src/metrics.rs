//! Prometheus metrics for the settlement subsystems.
//!
//! All metrics follow the naming convention: `rs_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PROOF-OF-RELAY METRICS
    // =========================================================================

    /// Acknowledged tickets run through the win check
    pub static ref TICKETS_CHECKED: Counter = Counter::new(
        "rs_por_tickets_checked_total",
        "Total number of acknowledged tickets checked for a win"
    ).expect("metric creation failed");

    /// Tickets that turned out to be winning
    pub static ref TICKETS_WON: Counter = Counter::new(
        "rs_por_tickets_won_total",
        "Total number of winning tickets"
    ).expect("metric creation failed");

    /// Terminal wins that require a new on-chain secret
    pub static ref SECRET_ROTATIONS_SIGNALLED: Counter = Counter::new(
        "rs_por_secret_rotations_signalled_total",
        "Total number of times the committed secret chain was exhausted"
    ).expect("metric creation failed");

    // =========================================================================
    // ACCOUNT METRICS
    // =========================================================================

    /// Transactions handed to the chain client
    pub static ref TRANSACTIONS_SENT: Counter = Counter::new(
        "rs_account_transactions_sent_total",
        "Total number of signed transactions broadcast"
    ).expect("metric creation failed");

    /// Final transaction outcomes
    pub static ref TRANSACTION_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("rs_account_transaction_outcomes_total", "Broadcast outcomes"),
        &["outcome"]  // confirmed, reverted, duplicate, rejected
    ).expect("metric creation failed");

    /// Pending transactions currently tracked by the ledger
    pub static ref PENDING_TRANSACTIONS: Gauge = Gauge::new(
        "rs_account_pending_transactions",
        "Transactions broadcast but not yet confirmed"
    ).expect("metric creation failed");
}

/// Register every settlement metric with the global registry.
///
/// Calling this twice fails with `MetricsInit` (duplicate registration).
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(TICKETS_CHECKED.clone()),
        Box::new(TICKETS_WON.clone()),
        Box::new(SECRET_ROTATIONS_SIGNALLED.clone()),
        Box::new(TRANSACTIONS_SENT.clone()),
        Box::new(TRANSACTION_OUTCOMES.clone()),
        Box::new(PENDING_TRANSACTIONS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
