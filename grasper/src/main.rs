//! # Grasper
//!
//! Entry point for the `grasper` binary. See [`grasper::app`] for the
//! subcommands.

use anyhow::Result;
use clap::Parser;
use grasper::app::{self, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .init();
    app::run(&cli)
}
