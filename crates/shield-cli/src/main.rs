//! CLI entry point (SPEC_FULL.md §2.4), grounded in `assay-cli/src/main.rs`.

mod args;
mod commands;

use clap::Parser;

use args::{Cli, Command};

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = tokio::task::spawn_blocking(move || dispatch(cli)).await.expect("dispatch task panicked");

    if let Err(err) = result {
        eprintln!("fatal: {err:?}");
        std::process::exit(2);
    }
}

fn dispatch(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Run(args) => commands::run(args),
        Command::Once(args) => commands::once(args),
        Command::Validate(args) => commands::validate(args),
    }
}
