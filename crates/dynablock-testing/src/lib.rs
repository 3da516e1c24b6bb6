//! Testing utilities for Dynablock.
//!
//! This crate provides:
//! - A scripted prompt that answers command questions from a queue
//! - A bench bundling storage, a simulated document and the factories
//! - Fixture builders for common families and values

pub mod bench;
pub mod fixtures;
pub mod prompt;

pub use bench::TestBench;
pub use fixtures::{panel_family, rect_values};
pub use prompt::{Answer, ScriptedPrompt};

/// Install a test log subscriber once; later calls are no-ops.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
