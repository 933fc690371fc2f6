// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # streamformer
//!
//! Command-line interface for the streaming transformer engine.
//!
//! ## Usage
//! ```bash
//! # Stream synthetic chunks through a projected transformer
//! streamformer run --batch 2 --chunks 4 --chunk-len 10
//!
//! # Same, from a TOML configuration file
//! streamformer --config model.toml run
//!
//! # Inspect the resolved configuration and derived projections
//! streamformer inspect
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "streamformer",
    about = "Streaming transformer engine: demo runner and config inspector",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (defaults to a built-in demo
    /// configuration).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream synthetic chunks through a projected transformer.
    Run {
        /// Number of parallel sequences (batch rows).
        #[arg(long, default_value_t = 2)]
        batch: usize,

        /// Number of chunks to stream.
        #[arg(long, default_value_t = 4)]
        chunks: usize,

        /// Time length of each chunk.
        #[arg(long, default_value_t = 10)]
        chunk_len: usize,
    },

    /// Inspect the configuration: shell, unit stack, and projections.
    Inspect,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            batch,
            chunks,
            chunk_len,
        } => commands::run::execute(config, batch, chunks, chunk_len),
        Commands::Inspect => commands::inspect::execute(config),
    }
}
