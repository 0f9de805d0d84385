use anyhow::Result;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

mod commands;
mod session;

#[derive(Parser)]
#[command(author, version, about = "Drive an LLM through a stepwise tool loop", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a task through the agent loop
    Run {
        /// The task for the agent to carry out
        task: String,

        /// Model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of steps before the run is aborted
        #[arg(long)]
        max_steps: Option<usize>,
    },
    /// Query the provider's model catalog and print the raw JSON
    Models,
    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            task,
            model,
            max_steps,
        } => commands::run::execute(task, model, max_steps).await,
        Command::Models => commands::models::execute().await,
        Command::Version => commands::version::execute().await,
    }
}
