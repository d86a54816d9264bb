use crate::error::AuthError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global fmt subscriber. `RUST_LOG` takes precedence over
/// `level`. Fails if a subscriber is already installed.
pub fn init_tracing(level: &str, pretty: bool) -> Result<(), AuthError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| AuthError::ConfigError(format!("invalid log filter {:?}: {}", level, e)))?;

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true);

    let installed = if pretty {
        builder
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        builder.compact().try_init()
    };

    installed.map_err(|e| AuthError::InternalError(format!("tracing init failed: {}", e)))
}
