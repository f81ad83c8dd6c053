//! Logging for the `proof_tool` binary.

use tracing_subscriber::{prelude::*, util::SubscriberInitExt, EnvFilter};

/// Sends logs to stderr so stdout carries only the JSON report. `RUST_LOG`
/// picks the level, e.g. `RUST_LOG=mpt_proof=trace` to follow each proof
/// node as the verifier walks it.
pub fn init() {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(EnvFilter::from_default_env()))
        .init();
}
