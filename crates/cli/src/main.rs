use color_eyre::eyre::Result;
use tracing::{debug, error};

use ibft_config::{load_config, Config};

use crate::args::{Args, Commands};

mod args;
mod cmd;
mod logging;
mod metrics;

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::new();

    match &args.command {
        Commands::Init { overwrite } => {
            let defaults = Config::default();
            init_logging(&args, &defaults)?;
            debug!("Command-line parameters: {args:?}");

            cmd::init::run(&args.config_file(), *overwrite)
        }

        Commands::Start => {
            let config = load_config(args.config_file(), None)?;
            init_logging(&args, &config)?;
            debug!("Command-line parameters: {args:?}");

            let result = cmd::start::run(config).await;

            if let Err(e) = &result {
                error!("Exit with error: {e:#}");
            }

            result
        }
    }
}

fn init_logging(args: &Args, config: &Config) -> Result<()> {
    logging::init(
        args.log_level.unwrap_or(config.logging.log_level),
        args.log_format.unwrap_or(config.logging.log_format),
    )
}
