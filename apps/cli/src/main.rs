//! `stagecast` command-line entrypoint.

mod cli;
mod commands;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use stagecast_notify::{Notice, QueueReporter};
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stagecast=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let reporter = Arc::new(QueueReporter::new());

    let result = commands::run(cli, reporter.clone()).await;

    for notice in reporter.drain() {
        print_notice(&notice);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_notice(notice: &Notice) {
    match &notice.detail {
        Some(detail) => eprintln!("error: {} ({detail})", notice.title),
        None => eprintln!("error: {}", notice.title),
    }
}
