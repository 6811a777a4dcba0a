// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Population leveling daemon (leveld)
//!
//! Watches population objects and keeps each one's worker count drifting
//! toward its target.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod lifecycle;
mod watch;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::signal::unix::{signal, SignalKind};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "leveld", version, about = "Population leveling controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the controller until SIGTERM or SIGINT
    Run(ConfigArgs),
    /// Validate the configuration and print the effective settings
    Check(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to a TOML config file; defaults apply when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => {
            let config = Config::load(args.config.as_deref())?;
            print!("{}", config.render().context("cannot render config")?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(args) => {
            let config = Config::load(args.config.as_deref())?;
            let _log_guard = setup_logging(&config)?;
            run(config).await
        }
    }
}

async fn run(config: Config) -> Result<ExitCode> {
    info!(
        namespace = config.namespace.as_deref().unwrap_or("*"),
        requeue_after = ?config.requeue_after,
        "Starting leveld"
    );

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            eprintln!("Error: {}", e);
            return Ok(ExitCode::from(e.exit_code()));
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let mut poll = tokio::time::interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Startup already polled once
    poll.tick().await;

    info!("Daemon ready");

    loop {
        let deadline = daemon.controller.next_deadline();
        let in_flight = daemon.controller.in_flight();

        tokio::select! {
            Some((target, _)) = daemon.controller.join_next(), if in_flight > 0 => {
                tracing::trace!(population = %target, "pass joined");
            }

            _ = sleep_until(deadline), if deadline.is_some() => {
                daemon.controller.fire_due_timers();
            }

            _ = poll.tick() => {
                daemon.poll().await;
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    daemon.shutdown().await;
    info!("Daemon stopped");
    Ok(ExitCode::SUCCESS)
}

fn sleep_until(deadline: Option<std::time::Instant>) -> tokio::time::Sleep {
    let at = deadline
        .map(tokio::time::Instant::from_std)
        .unwrap_or_else(tokio::time::Instant::now);
    tokio::time::sleep_until(at)
}

fn setup_logging(config: &Config) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(log_file) = &config.log_file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
        return Ok(None);
    };

    let dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let name = log_file
        .file_name()
        .with_context(|| format!("log_file has no file name: {}", log_file.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
        .init();

    Ok(Some(guard))
}
