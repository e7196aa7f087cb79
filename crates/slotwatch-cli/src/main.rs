mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "slotwatch")]
#[command(about = "Watches the appointment booking calendar for free slots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sweep every target on a fixed cadence until the run limit elapses
    Watch {
        /// Log notifications instead of sending e-mail
        #[arg(long)]
        dry_run: bool,
    },
    /// Run exactly one sweep and print its report
    Sweep {
        /// Log notifications instead of sending e-mail
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the calendar URL of every configured target
    Targets,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = slotwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Watch { dry_run } => run::watch(&config, dry_run).await,
        Commands::Sweep { dry_run } => run::sweep(&config, dry_run).await,
        Commands::Targets => run::print_targets(&config),
    }
}
