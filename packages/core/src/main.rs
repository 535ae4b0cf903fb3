use clap::Parser;
use dotenvy::dotenv;

use ticker_price_worker::cli::{Cli, Command};
use ticker_price_worker::config::Config;
use ticker_price_worker::error::AppError;
use ticker_price_worker::logging::init_logging;
use ticker_price_worker::server;

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let mut config = Config::from_env()
        .map_err(AppError::Config)
        .unwrap_or_else(|err| {
            tracing::error!("{}", err);
            std::process::exit(1);
        });
    config.apply_cli(&cli);

    let result = match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => server::run(config).await,
        Command::Publish {
            ticker,
            action,
            user_id,
        } => server::publish(&config, &ticker, &action, user_id)
            .await
            .map(|_| ()),
    };

    if let Err(err) = result {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}
