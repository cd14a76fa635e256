//! Postwall - runs the feed engine against an in-memory store.

mod demo;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use postwall_config::{init_logging, Config, Paths};

/// Postwall command-line interface.
#[derive(Parser)]
#[command(name = "postwall")]
#[command(about = "Drive the Postwall feed engine against an in-memory store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Defaults to the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to the platform config dir
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the feed, submit posts, and print the resulting state
    Demo(demo::DemoArgs),
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, &paths)?;

    match cli.command {
        Some(Commands::Demo(args)) => demo::run(&config, args).await?,
        None => demo::run(&config, demo::DemoArgs::default()).await?,
        Some(Commands::Config) => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            println!("config file: {}", paths.config_file().display());
            println!("log file: {}", paths.log_file().display());
        }
    }

    Ok(())
}
