mod bulkload;
mod cmd;
mod config;
mod csv_writer;
mod db;
mod error;
mod graph;
mod schema;
mod search;

use clap::Parser;
use cmd::Cli;

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build the async runtime");

    let result = runtime.block_on(cmd::run(cli));

    if let Err(e) = &result {
        eprintln!("{e}");
    }
    std::process::exit(error::exit_code(&result));
}
