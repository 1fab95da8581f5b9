//! Tracing subscriber setup.

use std::env;
use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Installs the global subscriber.
///
/// - Filter comes from `RUST_LOG` when set, otherwise from `config.level`
/// - Colour is enabled only when stderr is a terminal
/// - Output goes to stderr so stdout carries only report or JSON output
///
/// Calling it twice is harmless; the second call leaves the first subscriber
/// in place.
pub fn init(config: &LoggingConfig) {
    let filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(&config.level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Subscriber for tests; output is captured by the test harness.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
