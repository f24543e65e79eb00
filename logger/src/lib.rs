//! `tracing` subscriber setup shared by everything that resolves payment
//! inputs: apps embedding the resolver, and its tests.
//!
//! The resolver crates only emit events; installing a subscriber is left to
//! the final binary (or test) via this crate.

use std::str::FromStr;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::{
    filter::Targets,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

/// HTTP client internals are chatty at DEBUG; keep them at WARN unless
/// `RUST_LOG` says otherwise.
const QUIET_TARGETS: [&str; 3] = ["hyper_util", "reqwest", "rustls"];

/// Install a global `tracing` subscriber printing to stdout.
///
/// + The default level is INFO, with HTTP client internals at WARN.
/// + Override the level or per-module filtering with `RUST_LOG`, e.g.
///   `RUST_LOG=payment_input=debug`. See the syntax here:
///   <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/targets/struct.Targets.html>
///
/// Errors if a global subscriber is already set.
pub fn init() -> anyhow::Result<()> {
    try_init().context("Failed to set up logger")
}

/// Use this to initialize the global logger in tests.
pub fn init_for_testing() {
    // Tests are silent unless asked otherwise.
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    // Multiple tests race to set the global logger; the first one wins.
    let _ = try_init();
}

/// Try to initialize a global logger. Returns an `Err` if another global
/// logger is already set.
pub fn try_init() -> Result<(), TryInitError> {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|rust_log| Targets::from_str(&rust_log).ok())
        .unwrap_or_else(default_targets);

    let stdout_log = tracing_subscriber::fmt::layer()
        .compact()
        .with_level(true)
        .with_target(true)
        .with_ansi(true)
        .with_filter(filter);

    tracing_subscriber::registry().with(stdout_log).try_init()
}

fn default_targets() -> Targets {
    QUIET_TARGETS
        .into_iter()
        .fold(Targets::new().with_default(Level::INFO), |targets, target| {
            targets.with_target(target, Level::WARN)
        })
}
