//! Workshop host provisioner CLI.
//!
//! Reads a CSV roster of lab environments and provisions each one over SSH.
//! `--mode setup` runs every provisioning step unconditionally; `--mode
//! check` verifies each step first and remediates only what is missing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use provisioner::config::load_config;
use provisioner::fleet::run_fleet;
use provisioner::provision::Mode;
use provisioner::roster::load_roster;
use provisioner::session::SshFactory;
use provisioner::{exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "provisioner",
    version,
    about = "Provision workshop lab hosts over SSH"
)]
struct Cli {
    /// `setup` runs every step; `check` verifies first and remediates only
    /// what is missing.
    #[arg(long, value_enum)]
    mode: ModeArg,

    /// Roster CSV listing one lab environment per row.
    #[arg(long, default_value = "workshop.csv")]
    roster: PathBuf,

    /// Optional TOML config; defaults apply when the file is missing.
    #[arg(long, default_value = "provisioner.toml")]
    config: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Setup,
    Check,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Setup => Mode::Setup,
            ModeArg::Check => Mode::Check,
        }
    }
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.config)?;
    let hosts = load_roster(&cli.roster)?;
    let factory = SshFactory::new(cfg.connect_timeout());
    run_fleet(&factory, &hosts, &cfg, cli.mode.into());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check_mode() {
        let cli = Cli::parse_from(["provisioner", "--mode", "check"]);
        assert!(matches!(cli.mode, ModeArg::Check));
    }

    #[test]
    fn parse_setup_mode() {
        let cli = Cli::parse_from(["provisioner", "--mode", "setup"]);
        assert!(matches!(cli.mode, ModeArg::Setup));
    }

    #[test]
    fn unknown_mode_is_a_usage_error() {
        assert!(Cli::try_parse_from(["provisioner", "--mode", "teardown"]).is_err());
    }

    #[test]
    fn mode_is_required() {
        assert!(Cli::try_parse_from(["provisioner"]).is_err());
    }

    #[test]
    fn roster_and_config_have_defaults() {
        let cli = Cli::parse_from(["provisioner", "--mode", "check"]);
        assert_eq!(cli.roster, PathBuf::from("workshop.csv"));
        assert_eq!(cli.config, PathBuf::from("provisioner.toml"));
    }
}
