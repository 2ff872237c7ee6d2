//! CLI for the omir mirror synchronizer.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use omir_core::config;
use std::path::PathBuf;

use commands::{run_status, run_sync, SyncArgs};

/// Top-level CLI for the omir mirror synchronizer.
#[derive(Debug, Parser)]
#[command(name = "omir")]
#[command(about = "omir: incremental mirror for the Obsidian community catalog", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Synchronize every catalog target into the local mirror.
    Sync {
        /// Mirror root directory (default: configured download_root, then ./mirror).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Synchronize up to N targets concurrently (default from config).
        #[arg(long, value_name = "N")]
        jobs: Option<usize>,

        /// Clone/update full repositories instead of fetching discrete raw files.
        #[arg(long)]
        full_mirror: bool,

        /// Read the plugin list from a local JSON file, skipping the catalog repository.
        #[arg(long, value_name = "FILE")]
        plugin_list: Option<PathBuf>,

        /// Read the theme list from a local JSON file, skipping the catalog repository.
        #[arg(long, value_name = "FILE")]
        theme_list: Option<PathBuf>,

        /// Mirror plugins only.
        #[arg(long, conflicts_with = "themes_only")]
        plugins_only: bool,

        /// Mirror themes only.
        #[arg(long)]
        themes_only: bool,
    },

    /// Show the on-disk footprint of every mirrored target.
    Status {
        /// Mirror root directory.
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Sync {
                root,
                jobs,
                full_mirror,
                plugin_list,
                theme_list,
                plugins_only,
                themes_only,
            } => {
                run_sync(
                    &cfg,
                    SyncArgs {
                        root,
                        jobs,
                        full_mirror,
                        plugin_list,
                        theme_list,
                        plugins_only,
                        themes_only,
                    },
                )
                .await?;
            }
            CliCommand::Status { root } => {
                let root = root
                    .or_else(|| cfg.download_root.clone())
                    .unwrap_or_else(|| PathBuf::from("mirror"));
                run_status(&root)?;
            }
        }

        Ok(())
    }
}
