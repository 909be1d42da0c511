//! Sitemapr CLI
//!
//! Serves XML sitemaps for registered content classes.
//!
//! This is the binary entry point. The library functionality is in `lib.rs`.

use clap::Parser;
use color_eyre::eyre::Result;

/// Command-line interface for Sitemapr.
#[derive(Parser)]
#[command(
    name = "sitemapr",
    version,
    about = "XML sitemaps for registered content classes"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sitemapr.toml")]
    config: std::path::PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(clap::Subcommand)]
enum Commands {
    /// Serve the sitemap index and class pages over HTTP
    Serve {
        /// Listen address, overriding server.addr (e.g., 0.0.0.0:8080)
        #[arg(short, long)]
        addr: Option<String>,
    },
    /// Validate configuration, records and class registrations
    Check {
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Write the sitemap documents to a directory
    Export {
        /// Output directory
        #[arg(default_value = "public")]
        output: std::path::PathBuf,
    },
    /// Notify the search engine that the sitemap changed
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    sitemapr::init_tracing(cli.verbose);

    match cli.command {
        Commands::Serve { addr } => {
            sitemapr::cmd::serve::run(&cli.config, addr.as_deref()).await?;
        }
        Commands::Check { strict } => {
            sitemapr::cmd::check::run(&cli.config, strict)?;
        }
        Commands::Export { output } => {
            sitemapr::cmd::export::run(&cli.config, &output)?;
        }
        Commands::Ping => {
            let config = cli.config;
            tokio::task::spawn_blocking(move || sitemapr::cmd::ping::run(&config)).await??;
        }
    }

    Ok(())
}
