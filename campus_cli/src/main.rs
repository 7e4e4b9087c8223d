use clap::{Parser, Subcommand};
use tracing::debug;

use crate::{list::ListArgs, status::StatusArgs};

mod list;
mod parsers;
mod scope;
mod status;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a paginated list and print one page of it
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        args: ListArgs,
    },
    /// Activate or deactivate one or more entities
    Status {
        #[command(flatten)]
        args: StatusArgs,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    if let Ok(path) = dotenv {
        debug!("Loaded environment from {:?}", path);
    }

    match cli.command {
        Some(Commands::List { args }) => list::run(args).await?,
        Some(Commands::Status { args }) => status::run(args).await?,
        None => {}
    }

    Ok(())
}
