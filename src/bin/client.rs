use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use sparrow::cli::{exit_code_for, ClientArgs};
use sparrow::client;
use sparrow::config::ClientConfig;
use sparrow::error::ClientError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let args = match ClientArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(exit_code_for(&e));
        }
    };

    match fetch(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("client: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn fetch(args: ClientArgs) -> Result<(), ClientError> {
    let config = ClientConfig::load(args)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ClientError::transport("failed to start runtime", e))?;

    runtime.block_on(client::run(&config))?;
    Ok(())
}
