//! Tracing subscriber setup shared by freshfeed binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{Error, Result};

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` is applied to every target.
pub fn init_tracing(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", default_level, e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Internal(format!("Tracing already initialised: {}", e)))
}
