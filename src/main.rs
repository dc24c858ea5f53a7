#[macro_use]
extern crate rust_i18n;

mod commands;
mod shutdown;
mod startup;

use clap::Parser;
use tracing::info;

// Initialize i18n
i18n!("locales", fallback = "en");

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = commands::Cli::parse();

    // Initialize logging
    startup::init_logging(cli.verbose)?;

    // Commands that never talk to the API skip configuration
    if !cli.command.needs_remote() {
        return commands::execute_offline(cli.command).map_err(Into::into);
    }

    info!("Starting noura-availability");

    // Load configuration
    let config = startup::load_config().await?;

    startup::run(cli.command, config).await
}
