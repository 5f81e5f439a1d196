// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! `shepherdd`: loads a sheep-set configuration file and runs the
//! dispatcher until killed.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "shepherdd", version, about = "Shepherd compute-job dispatcher")]
struct Cli {
    /// Path to the TOML sheep-set configuration file.
    #[arg(long, env = "SHEPHERD_CONFIG")]
    config: PathBuf,
}

/// `RUST_LOG` wins if set; otherwise `DEBUG` (any value) selects the
/// verbose filter, matching the teacher's env-var-driven verbosity knob.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if std::env::var_os("DEBUG").is_some() {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();
    shepherd_daemon::run(cli.config).await?;
    Ok(())
}
