//! Operator CLI for the library service.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use library_kernel::settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "library-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the HTTP service
    Serve,

    /// Create missing tables and indexes, then exit
    Migrate,

    /// Load sample authors and books, skipping ones already present
    Seed {
        /// JSON array of authors
        #[arg(long, default_value = "data/authors.json")]
        authors: PathBuf,

        /// JSON array of books
        #[arg(long, default_value = "data/books.json")]
        books: PathBuf,
    },

    /// Check that the database is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load library settings")?;
    library_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Commands::Serve => library_app::app::run(settings).await,
        Commands::Migrate => {
            let applied = library_app::app::migrate(&settings).await?;
            println!("applied {applied} schema statements");
            Ok(())
        }
        Commands::Seed { authors, books } => {
            let (authors, books) = library_app::app::seed(&settings, &authors, &books).await?;
            println!(
                "authors: {} created, {} skipped; books: {} created, {} skipped",
                authors.created, authors.skipped, books.created, books.skipped
            );
            Ok(())
        }
        Commands::Ping => {
            library_app::app::ping(&settings).await?;
            println!("database reachable");
            Ok(())
        }
    }
}
