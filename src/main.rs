use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use cartlog::config::{CartlogConfig, LoggingConfig};
use cartlog::history::{HistoryQuery, HistoryStore};

#[derive(Parser)]
#[command(
    name = "cartlog",
    about = "Status-change history log for a fleet of named carts",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// TOML configuration file
    #[arg(long, env = "CARTLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the history file
    #[arg(long, env = "PERSISTENT_DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (history API + cart board)
    Serve {
        #[command(flatten)]
        common: CommonArgs,

        /// Listen port
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Directory of static assets
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Print the recorded changes for one cart on one date
    History {
        #[command(flatten)]
        common: CommonArgs,

        /// Cart identifier, e.g. "Cart 4"
        #[arg(long)]
        cart: String,

        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn load_config(common: &CommonArgs) -> Result<CartlogConfig> {
    let (mut config, source) = CartlogConfig::resolve(common.config.as_deref())?;
    if let Some(dir) = &common.data_dir {
        config.storage.persistent_dir = dir.clone();
    }
    init_tracing(&config.logging);
    tracing::debug!(?source, "configuration resolved");
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    // Logs go to stderr so `history --json` output stays clean.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            common,
            port,
            static_dir,
        } => {
            let mut config = load_config(&common)?;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(dir) = static_dir {
                config.server.static_dir = dir;
            }
            tracing::info!(port = config.server.port, "Starting cartlog server");
            cartlog::serve(config).await?;
        }
        Commands::History {
            common,
            cart,
            date,
            json,
        } => {
            let config = load_config(&common)?;
            let (cart, date) = HistoryQuery {
                cart: Some(cart),
                date: Some(date),
            }
            .validate()?;

            let store = HistoryStore::open(config.storage.history_path()).await?;
            let records = store.query(&cart, &date).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else if records.is_empty() {
                println!("No changes recorded for {} on {}.", cart, date);
            } else {
                println!("\n=== {} on {} ===", cart, date);
                for record in &records {
                    println!("{}", record.display_line());
                }
                println!();
            }
        }
    }

    Ok(())
}
