// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// DocMorph — local PDF transformations from the command line.
//
// Entry point. Initialises logging, loads the engine config, and dispatches
// the chosen subcommand. Failures are printed in plain language.

mod backends;
mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use docmorph_core::EngineConfig;
use docmorph_core::human_errors::humanize_error;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "DocMorph starting");

    let result = async {
        let config = match &cli.config {
            Some(path) => EngineConfig::load(path)?,
            None => match EngineConfig::default_path() {
                Some(path) => EngineConfig::load_or_default(path)?,
                None => EngineConfig::default(),
            },
        };
        commands::run(&cli, &config).await
    }
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(%err, "command failed");
            let human = humanize_error(&err);
            eprintln!("error: {}", human.message);
            eprintln!("       {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}
