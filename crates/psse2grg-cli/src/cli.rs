use clap::{CommandFactory, Parser, ValueHint};
use std::path::PathBuf;

/// Translate between PSS/E v33 RAW cases and GRG bus-breaker JSON.
///
/// The direction follows the input extension: `.raw` is written to stdout
/// as GRG JSON, `.json` as RAW.
#[derive(Parser, Debug)]
#[command(name = "psse2grg", author, version, about, long_about = None)]
pub struct Cli {
    /// Input file (.raw or .json)
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Name of the starting point mapping
    #[arg(short = 's', long)]
    pub starting_point_mapping: Option<String>,

    /// Name of the switch assignment mapping
    #[arg(short = 'w', long)]
    pub switch_assignment_mapping: Option<String>,

    /// Translate RAW -> GRG -> RAW and report whether the result matches
    #[arg(short = 'i', long)]
    pub idempotent: bool,

    /// Leave optional component subtypes out of the GRG output
    #[arg(long)]
    pub omit_subtypes: bool,

    /// Do not validate generated GRG documents
    #[arg(long)]
    pub skip_validation: bool,

    /// TOML file with translation and logging settings
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Set the logging level (defaults to the config file, then info)
    #[arg(long)]
    pub log_level: Option<tracing::Level>,
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        build_cli_command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["psse2grg", "case.raw", "-s", "sp", "-w", "bk", "-i"]);
        assert_eq!(cli.file, PathBuf::from("case.raw"));
        assert_eq!(cli.starting_point_mapping.as_deref(), Some("sp"));
        assert_eq!(cli.switch_assignment_mapping.as_deref(), Some("bk"));
        assert!(cli.idempotent);
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_log_level() {
        let cli = Cli::parse_from(["psse2grg", "case.json", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Some(tracing::Level::DEBUG));
    }
}
