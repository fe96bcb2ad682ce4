use crate::maintenance::{run_seed, run_stats, SeedArgs, StatsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use utility_tracker::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Utility Complaint Tracker",
    about = "Serve and administer the municipal power and water complaint tracker",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP and realtime service (default command)
    Serve(ServeArgs),
    /// Write the demo dataset to the configured data file
    Seed(SeedArgs),
    /// Print complaint statistics for the configured data file
    Stats(StatsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Seed(args) => run_seed(args),
        Command::Stats(args) => run_stats(args),
    }
}
