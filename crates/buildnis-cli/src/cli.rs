//! CLI argument parsing using clap derive

use std::path::PathBuf;

use buildnis_core::configure::DEFAULT_CONF_SCRIPTS_DIR;
use buildnis_core::{CleanMode, RunOptions};
use clap::{ArgAction, Parser};

/// Buildnis - configure a C/C++ style project for this host
///
/// Reads the project configuration, discovers and verifies the build tools
/// and dependencies, expands placeholders and writes the generated
/// configuration documents.
#[derive(Parser, Debug)]
#[command(name = "buildnis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project configuration file
    pub project_config_file: PathBuf,

    /// Rediscover build tools and recheck dependencies
    #[arg(long)]
    pub configure: bool,

    /// Build the project after configuring
    #[arg(long)]
    pub build: bool,

    /// Install the project after building
    #[arg(long)]
    pub install: bool,

    /// Delete all generated files
    #[arg(long, conflicts_with = "distclean")]
    pub clean: bool,

    /// Delete all generated files and the log file
    #[arg(long)]
    pub distclean: bool,

    /// Directory for the generated configuration files
    ///
    /// Relative paths are taken from the project directory. The choice is
    /// remembered for later runs.
    #[arg(short = 'o', long, value_name = "DIR")]
    pub generated_conf_dir: Option<PathBuf>,

    /// Directory holding the per-OS configure scripts
    #[arg(long, value_name = "DIR", default_value = DEFAULT_CONF_SCRIPTS_DIR)]
    pub conf_scripts_dir: PathBuf,

    /// Also write the log to FILE
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    pub fn clean_mode(&self) -> CleanMode {
        if self.distclean {
            CleanMode::DistClean
        } else if self.clean {
            CleanMode::Clean
        } else {
            CleanMode::None
        }
    }

    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::new(&self.project_config_file);
        options.configure = self.configure;
        options.build = self.build;
        options.install = self.install;
        options.clean = self.clean_mode();
        options.generated_conf_dir = self.generated_conf_dir.clone();
        options.conf_scripts_dir = self.conf_scripts_dir.clone();
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_project_only() {
        let cli = Cli::parse_from(["buildnis", "project_config.json"]);
        assert_eq!(cli.project_config_file, PathBuf::from("project_config.json"));
        assert_eq!(cli.clean_mode(), CleanMode::None);
        assert_eq!(cli.conf_scripts_dir, PathBuf::from(DEFAULT_CONF_SCRIPTS_DIR));
        assert_eq!(cli.verbose, 0);
        assert!(!cli.configure);
    }

    #[test]
    fn parse_generated_dir_and_configure() {
        let cli = Cli::parse_from(["buildnis", "p.json", "--configure", "-o", "out"]);
        let options = cli.run_options();
        assert!(options.configure);
        assert_eq!(options.generated_conf_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn distclean_wins_clean_mode() {
        let cli = Cli::parse_from(["buildnis", "p.json", "--distclean"]);
        assert_eq!(cli.clean_mode(), CleanMode::DistClean);
    }

    #[test]
    fn clean_and_distclean_conflict() {
        assert!(Cli::try_parse_from(["buildnis", "p.json", "--clean", "--distclean"]).is_err());
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::parse_from(["buildnis", "p.json", "-vvv"]);
        assert_eq!(cli.verbose, 3);
        assert!(Cli::try_parse_from(["buildnis", "p.json", "-v", "-q"]).is_err());
    }

    #[test]
    fn project_file_is_required() {
        assert!(Cli::try_parse_from(["buildnis"]).is_err());
    }
}
