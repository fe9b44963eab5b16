//! Buildnis CLI
//!
//! Configures a project for the current host and maps every failure to the
//! documented exit code.

mod cli;
mod error;
mod logging;

use buildnis_check::CommandProbe;
use buildnis_core::{CleanMode, ExitCode, Orchestrator, RunSummary, SystemHost};
use clap::Parser;
use clap::error::ErrorKind;
use colored::Colorize;

use cli::Cli;
use error::{CliError, Result};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Success,
                _ => ExitCode::CommandLine,
            };
            std::process::exit(code.code());
        }
    };

    if let Err(e) = run(&cli) {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code().code());
    }
}

fn run(cli: &Cli) -> Result<()> {
    let guard = logging::init(cli.quiet, cli.verbose, cli.log_file.as_deref())?;
    tracing::debug!(?cli, "Parsed command line");

    let host = SystemHost;
    let probe = CommandProbe::new();
    let result = Orchestrator::new(&host, &probe).run(&cli.run_options());
    drop(guard);

    let summary = result?;
    report(&summary);

    if cli.clean_mode() == CleanMode::DistClean {
        if let Some(path) = &cli.log_file {
            std::fs::remove_file(path).map_err(|source| CliError::LogFile {
                path: path.clone(),
                source,
            })?;
        }
    }
    Ok(())
}

fn report(summary: &RunSummary) {
    if let Some(clean) = &summary.clean {
        println!(
            "{} Removed {} generated files and {} directories",
            "OK".green().bold(),
            clean.removed_files.len(),
            clean.removed_dirs.len()
        );
        for dir in &clean.kept_dirs {
            println!("   {} kept non-empty {}", "!".yellow(), dir);
        }
        return;
    }

    println!(
        "{} Configured for {} in {}",
        "OK".green().bold(),
        summary.host.host_name.cyan(),
        summary.config_dir
    );
    println!(
        "   build tools:  {}/{} verified",
        summary.tools_checked, summary.tools_total
    );
    println!(
        "   dependencies: {}/{} fulfilled",
        summary.dependencies_checked, summary.dependencies_total
    );
    if !summary.placeholders_stable {
        println!(
            "   {} some placeholders did not settle, see the log",
            "!".yellow()
        );
    }
}
