use std::path::Path;

use color_eyre::eyre::{bail, Result};
use tracing::{info, warn};

use ibft_config::Config;

/// Write the default configuration to `config_file`.
pub fn run(config_file: &Path, overwrite: bool) -> Result<()> {
    if config_file.exists() {
        if !overwrite {
            bail!(
                "Configuration file already exists at {}, use --overwrite to replace it",
                config_file.display()
            );
        }

        warn!(file = %config_file.display(), "Overwriting configuration file");
    }

    Config::default().save(config_file)?;
    info!(file = %config_file.display(), "Configuration file written");

    Ok(())
}
