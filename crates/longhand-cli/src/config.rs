//! CLI configuration

use std::path::{Path, PathBuf};

use longhand::CalculatorConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliResult;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - operation log
    Verbose,
    /// Debug - playback and layout log
    Debug,
}

impl Verbosity {
    /// Builds the level from `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default log filter when `RUST_LOG` is unset
    #[must_use]
    pub const fn log_directive(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Calculator settings file
    pub config_file: Option<PathBuf>,
    /// Directory holding the persisted history
    pub data_dir: PathBuf,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            config_file: None,
            data_dir: PathBuf::from(".longhand"),
            log_json: false,
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set the calculator settings file
    #[must_use]
    pub fn with_config_file(mut self, path: Option<PathBuf>) -> Self {
        self.config_file = path;
        self
    }

    /// Set the history directory
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set JSON logging
    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }

    /// Calculator settings: the file if one was given, defaults otherwise
    pub fn calculator_config(&self) -> CliResult<CalculatorConfig> {
        match &self.config_file {
            Some(path) => Ok(CalculatorConfig::load(path)?),
            None => Ok(CalculatorConfig::default()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use longhand::{DivisionMode, SqrtMode};

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 3), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
    }

    #[test]
    fn test_log_directives() {
        assert_eq!(Verbosity::Quiet.log_directive(), "error");
        assert_eq!(Verbosity::Normal.log_directive(), "warn");
        assert!(Verbosity::Debug.is_verbose());
        assert!(Verbosity::Quiet.is_quiet());
    }

    #[test]
    fn test_color_choice() {
        assert!(ColorChoice::Always.should_color());
        assert!(!ColorChoice::Never.should_color());
    }

    #[test]
    fn test_builders() {
        let config = CliConfig::new()
            .with_verbosity(Verbosity::Debug)
            .with_color(ColorChoice::Never)
            .with_data_dir("/tmp/lh")
            .with_log_json(true);
        assert_eq!(config.verbosity, Verbosity::Debug);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/lh"));
        assert!(config.log_json);
    }

    #[test]
    fn test_calculator_config_defaults_without_file() {
        let config = CliConfig::new().calculator_config().unwrap();
        assert_eq!(config, CalculatorConfig::default());
    }

    #[test]
    fn test_calculator_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("longhand.yaml");
        std::fs::write(&path, "sqrt_mode: exact\ndivision_mode: short\n").unwrap();
        let config = CliConfig::new()
            .with_config_file(Some(path))
            .calculator_config()
            .unwrap();
        assert_eq!(config.sqrt_mode, SqrtMode::Exact);
        assert_eq!(config.division_mode, DivisionMode::Short);
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let result = CliConfig::new()
            .with_config_file(Some(PathBuf::from("/nonexistent/longhand.yaml")))
            .calculator_config();
        assert!(result.is_err());
    }
}
