//! Pagewatch Service Shell
//!
//! This is the thin application shell that wires the pipeline together and
//! exposes the inbound entry points. Core logic lives in the `crates/`
//! directory.

pub mod commands;
pub mod error;
pub mod state;

pub use error::CommandError;
pub use state::AppState;

/// Initialize tracing subscriber for logging.
///
/// `RUST_LOG` overrides the default `info,pagewatch=debug` filter.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pagewatch=debug"));

    // A subscriber may already be installed by an embedding process
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init();
}
