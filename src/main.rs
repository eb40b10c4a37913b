mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dep_indexer=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            paths,
            all,
            resolve_config,
            concurrency,
            format,
        } => {
            cli::scan(
                &cli.cache,
                &paths,
                all,
                resolve_config.as_deref(),
                concurrency,
                &format,
            )
            .await?;
        }
        Commands::Clear => {
            cli::clear_cache(&cli.cache)?;
        }
    }

    Ok(())
}
