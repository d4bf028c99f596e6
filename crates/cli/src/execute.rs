use crate::commands::{build, clean, info, resolve, Commands};
use eyre::WrapErr;
use modsmith_config::BuildConfig;
use std::path::Path;

impl Commands {
    pub async fn execute(self, base: &Path, verbose: bool) -> eyre::Result<()> {
        if self == Commands::Version {
            println!("modsmith {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }

        let config = BuildConfig::load(base)
            .wrap_err_with(|| format!("failed to load configuration from {}", base.display()))?;
        match self {
            Commands::Build => build::execute(config, verbose).await,
            Commands::Resolve => resolve::execute(config).await,
            Commands::Info => info::execute(config).await,
            Commands::Clean => clean::execute(config).await,
            Commands::Version => Ok(()),
        }
    }
}
