use crate::commands::{self, Command, CommandContext};
use crate::shutdown;
use noura_availability::components::api::HttpAvailabilityApi;
use noura_availability::components::availability::TimeCodec;
use noura_availability::components::AvailabilitySyncHandle;
use noura_availability::config::Config;
use noura_availability::error::Error;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging(verbose: bool) -> miette::Result<()> {
    let default_filter = if verbose {
        "debug,reqwest=warn,hyper=warn"
    } else {
        "info,reqwest=warn,hyper=warn"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Start the sync actor, run one command and shut down
pub async fn run(command: Command, config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (api, codec) = {
        let config_read = config.read().await;
        rust_i18n::set_locale(&config_read.locale);
        info!("Setting locale to {}", config_read.locale);
        info!("Displaying times in {}", config_read.timezone);

        (
            HttpAvailabilityApi::from_config(&config_read)?,
            TimeCodec::for_today(config_read.time_zone()?),
        )
    };

    let sync = AvailabilitySyncHandle::new(Arc::clone(&config), Arc::new(api));

    // Cancel the running sync between steps on SIGINT/SIGTERM
    let signal_sync = sync.clone();
    let signal_task = tokio::spawn(async move {
        shutdown::handle_signals(signal_sync).await;
    });

    let ctx = CommandContext {
        sync: sync.clone(),
        codec,
    };
    let result = commands::execute(command, &ctx).await;

    signal_task.abort();
    if let Err(e) = sync.shutdown().await {
        error!("Error shutting down sync actor: {:?}", e);
    }

    result.map_err(Into::into)
}
