//! Optional TOML configuration. Command line flags take precedence.

use anyhow::{Context, Result};
use psse2grg_core::TranslationOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cli::Cli;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Psse2GrgConfig {
    #[serde(default)]
    pub translation: TranslationOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Psse2GrgConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config '{}'", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parsing config '{}'", path.display()))
}

impl Psse2GrgConfig {
    /// Config file named by `--config`, or the defaults.
    pub fn for_cli(cli: &Cli) -> Result<Self> {
        match &cli.config {
            Some(path) => load_config(path),
            None => Ok(Self::default()),
        }
    }

    /// Translation options with the flags applied on top.
    pub fn options(&self, cli: &Cli) -> TranslationOptions {
        let mut options = self.translation.clone();
        if let Some(name) = &cli.starting_point_mapping {
            options.starting_point_mapping = name.clone();
        }
        if let Some(name) = &cli.switch_assignment_mapping {
            options.switch_assignment_mapping = name.clone();
        }
        options.omit_subtypes |= cli.omit_subtypes;
        options.skip_validation |= cli.skip_validation;
        options
    }

    pub fn log_level(&self, cli: &Cli) -> Result<tracing::Level> {
        match cli.log_level {
            Some(level) => Ok(level),
            None => self
                .logging
                .level
                .parse()
                .with_context(|| format!("invalid log level '{}'", self.logging.level)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_partial_table() {
        let config: Psse2GrgConfig = toml::from_str(
            r#"
            [translation]
            omit_subtypes = true
            float_precision = 6
            "#,
        )
        .unwrap();
        assert!(config.translation.omit_subtypes);
        assert_eq!(config.translation.float_precision, 6);
        assert_eq!(config.translation.starting_point_mapping, "starting_points");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_flags_override_file() {
        let config: Psse2GrgConfig = toml::from_str(
            r#"
            [translation]
            starting_point_mapping = "from_file"
            switch_assignment_mapping = "breakers_from_file"

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();
        let cli = Cli::parse_from(["psse2grg", "case.raw", "-s", "from_flag"]);
        let options = config.options(&cli);
        assert_eq!(options.starting_point_mapping, "from_flag");
        assert_eq!(options.switch_assignment_mapping, "breakers_from_file");
        assert_eq!(config.log_level(&cli).unwrap(), tracing::Level::WARN);

        let cli = Cli::parse_from(["psse2grg", "case.raw", "--log-level", "trace"]);
        assert_eq!(config.log_level(&cli).unwrap(), tracing::Level::TRACE);
    }

    #[test]
    fn test_bad_level() {
        let mut config = Psse2GrgConfig::default();
        config.logging.level = "loud".to_string();
        let cli = Cli::parse_from(["psse2grg", "case.raw"]);
        assert!(config.log_level(&cli).is_err());
    }
}
