use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use sparrow::cli::{exit_code_for, ServerArgs};
use sparrow::config::ServerConfig;
use sparrow::error::EXIT_USAGE;
use sparrow::server::listener;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let args = match ServerArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(exit_code_for(&e));
        }
    };

    let cfg = match ServerConfig::load(args) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if let Err(e) = listener::run(cfg).await {
        error!("{:#}", e);
        return ExitCode::from(EXIT_USAGE);
    }

    ExitCode::SUCCESS
}
