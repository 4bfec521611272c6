//! gridci CLI entrypoint.

use clap::Parser;

mod commands;
mod handlers;

use commands::Commands;

#[derive(Parser)]
#[command(name = "gridci")]
#[command(author, version, about = "Cross-platform test-matrix orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => handlers::validate(&config)?,
        Commands::Plan { config, event } => handlers::plan(&config, &event.to_event())?,
        Commands::Run {
            config,
            event,
            timeout_seconds,
        } => {
            let status = handlers::run(&config, &event.to_event(), timeout_seconds).await?;
            if let Some(status) = status {
                if !status.is_success() {
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
