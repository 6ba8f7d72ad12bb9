//! CLI argument parsing for autoss.
//!
//! CLI flags override every other configuration source.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use autoss_pipeline::Pass;

/// Frame vectorization and temporal differencing
#[derive(Parser, Debug)]
#[command(name = "autoss")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (default ./autoss.conf)
    #[arg(long)]
    pub config: Option<String>,

    /// Log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Video name, the first token of every frame file name
    #[arg(short = 'n', long)]
    pub name: String,

    /// Camera number, the second token of every frame file name
    #[arg(short = 'c', long)]
    pub camerano: u32,

    /// Directory holding `<video>_<camera>_<frame>.jpg` files
    #[arg(short = 'd', long)]
    pub framedir: PathBuf,

    /// Passes to run
    #[arg(long, value_enum, default_value_t = PassArg::All)]
    pub pass: PassArg,

    /// Frames processed at once (overrides `concurrency`)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassArg {
    /// Vectorize frames, then difference them
    All,
    /// Frame vectors only
    Vectorize,
    /// Sequence inputs from existing frame vectors
    Difference,
}

impl From<PassArg> for Pass {
    fn from(arg: PassArg) -> Self {
        match arg {
            PassArg::All => Pass::All,
            PassArg::Vectorize => Pass::Vectorize,
            PassArg::Difference => Pass::Difference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["autoss", "-n", "vid1", "-c", "2", "-d", "/frames"]);
        assert_eq!(cli.name, "vid1");
        assert_eq!(cli.camerano, 2);
        assert_eq!(cli.framedir, PathBuf::from("/frames"));
        assert_eq!(cli.pass, PassArg::All);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "autoss",
            "--config",
            "/etc/autoss.conf",
            "--log-level",
            "DEBUG",
            "--name",
            "vid1",
            "--camerano",
            "1",
            "--framedir",
            "frames",
            "--pass",
            "difference",
            "--concurrency",
            "4",
        ]);
        assert_eq!(cli.config.as_deref(), Some("/etc/autoss.conf"));
        assert_eq!(cli.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(Pass::from(cli.pass), Pass::Difference);
        assert_eq!(cli.concurrency, Some(4));
    }

    #[test]
    fn test_cli_requires_run_parameters() {
        assert!(Cli::try_parse_from(["autoss", "-n", "vid1", "-c", "1"]).is_err());
        assert!(Cli::try_parse_from(["autoss", "-n", "vid1", "-d", "frames"]).is_err());
        assert!(Cli::try_parse_from(["autoss", "-c", "1", "-d", "frames"]).is_err());
    }

    #[test]
    fn test_cli_rejects_non_integer_camera() {
        assert!(Cli::try_parse_from(["autoss", "-n", "vid1", "-c", "x", "-d", "frames"]).is_err());
    }
}
