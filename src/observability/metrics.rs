//! Metrics collection.
//!
//! # Metrics
//! - `deployer_compile_total` (counter): compiler runs by outcome
//! - `deployer_rpc_calls_total` (counter): chain RPC calls by operation, outcome
//! - `deployer_rpc_duration_seconds` (histogram): chain RPC latency by operation
//! - `deployer_deployments_total` (counter): deployments by outcome
//! - `deployer_nonce_resyncs_total` (counter): nonce counters re-read from the node
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; installing a recorder/exporter is the
//!   embedding process's job, so these are no-ops until one exists

use std::time::Instant;

/// Record the outcome of one compiler run.
pub fn record_compile(outcome: &'static str) {
    metrics::counter!("deployer_compile_total", "outcome" => outcome).increment(1);
}

/// Record one chain RPC call.
pub fn record_rpc(operation: &'static str, outcome: &'static str, started: Instant) {
    metrics::counter!(
        "deployer_rpc_calls_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("deployer_rpc_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

/// Record the outcome of a deployment broadcast.
pub fn record_deployment(outcome: &'static str) {
    metrics::counter!("deployer_deployments_total", "outcome" => outcome).increment(1);
}

/// Record a nonce counter being re-read from the node.
pub fn record_nonce_resync() {
    metrics::counter!("deployer_nonce_resyncs_total").increment(1);
}
