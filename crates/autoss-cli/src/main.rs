//! autoss frame vectorizer
//!
//! Turns the extracted frames of one camera of one video into per-frame tag
//! vectors and the temporal difference signals between consecutive frames.
//!
//! # Usage
//!
//! ```bash
//! autoss -n VIDEO -c CAMERA -d FRAME_DIR [--config autoss.conf] [--pass all]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. `[autoss]` section of the config file (./autoss.conf)
//! 3. Environment variables (AUTOSS_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use autoss_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await?;
    println!("Done!");
    Ok(())
}
