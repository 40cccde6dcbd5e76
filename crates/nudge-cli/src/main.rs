//! Nudge CLI - time and location reminders from the terminal
//!
//! All writes land in the local store first; `nudge sync` reconciles with
//! the configured cloud project when one is available.

mod app;
mod cli;
mod commands;
mod error;
mod triggers;

use std::process::ExitCode;

use clap::Parser;

use crate::app::App;
use crate::cli::{Cli, Commands};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let app = App::open(cli.db_path.as_deref()).await?;

    match cli.command {
        Commands::Add {
            title,
            notes,
            priority,
            category,
            at,
            lat,
            lng,
            radius,
            edge,
            every_time,
        } => {
            commands::add::run_add(
                &app, title, notes, priority, category, at, lat, lng, radius, edge, every_time,
            )
            .await
        }
        Commands::List { all, json } => commands::list::run_list(&app, all, json).await,
        Commands::Done { id } => commands::done::run_done(&app, &id).await,
        Commands::Rm { id } => commands::rm::run_rm(&app, &id).await,
        Commands::Sync => commands::sync::run_sync(&app).await,
        Commands::Status => commands::status::run_status(&app).await,
        Commands::Signin { owner, token } => {
            commands::session::run_signin(&app, &owner, &token).await
        }
        Commands::Signout => commands::session::run_signout(&app).await,
    }
}
