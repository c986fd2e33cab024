use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod output;
mod store;

use cli::{Cli, Commands};
use output::OutputFormat;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kbmirror=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let store = store::open_store(&cli.store)?;

    match &cli.command {
        Commands::Exists(args) => commands::account::exists(&store, args, format).await,
        Commands::Create(args) => commands::account::create(&store, args, format).await,
        Commands::Delete(args) => commands::account::delete(&store, args, format).await,
        Commands::Rename(args) => commands::account::rename(&store, args, format).await,
        Commands::Events(args) => commands::events::run(&store, args, format).await,
    }
}
