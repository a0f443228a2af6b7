use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;

use ibft_config::{LogFormat, LogLevel};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match format {
        LogFormat::Plaintext => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    result.map_err(|e| eyre!("Failed to install the tracing subscriber: {e}"))
}
