mod commands;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io,
    sync::{Arc, Mutex},
};

use clap::Parser;
use lootkeeper_core::{
    config::{self, AppConfig},
    FileStorage, LootKeeper,
};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;

    let command = cli.command.unwrap_or(Command::Show);
    let storage = Arc::new(FileStorage::new(config.storage_dir()));
    let mut keeper = LootKeeper::open(storage);

    let stdout = io::stdout();
    commands::run(&mut keeper, &config, command, &mut stdout.lock()).await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;
    let log_path = log_dir.join("lootkeeper.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
