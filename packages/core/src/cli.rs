use clap::{Parser, Subcommand};

/// Ticker Price Worker CLI arguments
#[derive(Debug, Parser)]
#[command(
    name = "ticker-price-worker",
    version,
    about = "Consumes ticker events, records market prices, and serves the latest quote"
)]
pub struct Cli {
    /// SQLite database URL (overrides DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Redis URL (overrides the ENV-derived broker)
    #[arg(long, global = true)]
    pub redis_url: Option<String>,

    /// Pub/Sub channel carrying ticker events
    #[arg(long, global = true)]
    pub channel: Option<String>,

    /// HTTP API port
    #[arg(long)]
    pub port: Option<u16>,

    /// Market data base URL
    #[arg(long)]
    pub market_data_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the subscriber loop and HTTP API (default)
    Serve,

    /// Publish a single ticker event to the configured channel
    Publish {
        /// Ticker symbol, e.g. AAPL
        ticker: String,

        /// Event action carried in the envelope
        #[arg(long, default_value = "add")]
        action: String,

        /// Originating user id
        #[arg(long)]
        user_id: Option<i64>,
    },
}
