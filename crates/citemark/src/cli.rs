/*
SPDX-License-Identifier: MPL-2.0
SPDX-FileCopyrightText: © 2023-2026 Bruce D'Arcus
*/

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "citemark")]
#[command(version, about = "Normalize footnote citations across Markdown documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: .citemark.toml or citemark.toml in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Citation registry file, overriding the config
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Length of minted hex identifiers, overriding the config
    #[arg(long, global = true)]
    pub hex_length: Option<usize>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[command(about = "Normalize citations in files or directories")]
    Process {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Report changes without writing documents or the registry
        #[arg(long)]
        dry_run: bool,

        /// Like --dry-run, but exit with an error if any document would change
        #[arg(long)]
        check: bool,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    #[command(about = "List citations in the registry")]
    List {
        #[arg(long, default_value = "table")]
        format: OutputFormat,

        /// Only citations referenced by this document
        #[arg(long)]
        document: Option<String>,
    },

    #[command(about = "Show one citation record")]
    Show { hex_id: String },

    #[command(about = "Generate shell completion scripts")]
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Text,
}
