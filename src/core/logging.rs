//! Diagnostic logging
//!
//! Tracer diagnostics go through `tracing`; the trace output itself is a
//! plain line sink and never passes through here. Verbosity is driven by
//! the usual RUST_LOG environment filter, defaulting to warnings so the
//! trace lines stay readable.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use super::error::{Error, Result};

pub fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()
        .map_err(|e| Error::Logging(format!("failed to initialize logging: {}", e)))
}
