//! kc2bw - Sync macOS Keychain passwords to Bitwarden.
//!
//! Lists Keychain password items missing from the Bitwarden vault.
//! Nothing is written unless `--write` is given.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use keychain_bw_sync::{BitwardenCli, Config, SecurityKeychain, SyncMode, SyncReport, Synchronizer};

/// Sync macOS Keychain passwords to Bitwarden
#[derive(Parser, Debug)]
#[command(name = "kc2bw")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable writing updates to Bitwarden
    #[arg(long)]
    write: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("keychain_bw_sync={}", log_level).parse()?)
                .add_directive(format!("kc2bw={}", log_level).parse()?),
        )
        .with_target(false)
        .init();

    let config = Config::from_env();
    let synchronizer = Synchronizer::new(SecurityKeychain::new(&config), BitwardenCli::new(&config));

    let mode = SyncMode::from_write_flag(cli.write);
    let report = synchronizer.run(mode);
    print_summary(&report, mode);

    Ok(())
}

fn print_summary(report: &SyncReport, mode: SyncMode) {
    println!();
    if report.aborted {
        println!("{}", "✗ Sync aborted: not logged in to Bitwarden".red());
        return;
    }

    println!(
        "{} {} missing, {} already in Bitwarden",
        "Summary:".bold(),
        report.missing.to_string().yellow(),
        report.already_present.to_string().green()
    );

    if mode.is_dry_run() {
        if report.missing > 0 {
            println!(
                "  {}",
                "Dry run: re-run with --write to create the missing items".dimmed()
            );
        }
    } else {
        println!(
            "  {} created, {} failed",
            report.created.to_string().green(),
            report.failed.to_string().red()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_options() {
        let cli = Cli::try_parse_from(["kc2bw"]).unwrap();
        assert!(!cli.write);
        assert!(!cli.verbose);
        assert_eq!(SyncMode::from_write_flag(cli.write), SyncMode::DryRun);
    }

    #[test]
    fn test_cli_write_option() {
        let cli = Cli::try_parse_from(["kc2bw", "--write"]).unwrap();
        assert_eq!(SyncMode::from_write_flag(cli.write), SyncMode::Write);
    }

    #[test]
    fn test_cli_verbose_option() {
        assert!(Cli::try_parse_from(["kc2bw", "--verbose"]).unwrap().verbose);
        assert!(Cli::try_parse_from(["kc2bw", "-v"]).unwrap().verbose);
    }

    #[test]
    fn test_cli_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["kc2bw", "--delete"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
