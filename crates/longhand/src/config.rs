//! Calculator configuration
//!
//! Every field has a serde default, so a YAML file only needs the keys it
//! changes:
//!
//! ```yaml
//! sqrt_mode: exact
//! division_mode: short
//! timing:
//!   intermediate_sum_ms: 900
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::ErrorKind;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// File is not valid YAML for this schema
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
    /// Values parse but are inconsistent
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How square roots are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SqrtMode {
    /// Integer roots only; anything else is an error
    Exact,
    /// Real root rounded to four decimals
    #[default]
    Decimal,
}

/// Which long-division layout is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DivisionMode {
    /// Every product and remainder written out
    #[default]
    Extended,
    /// Remainders only, each with the next digit brought down
    Short,
}

impl DivisionMode {
    /// The other mode
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Extended => Self::Short,
            Self::Short => Self::Extended,
        }
    }
}

/// Grid sizing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Smallest cell edge in pixels
    pub min_cell: f64,
    /// Largest cell edge in pixels
    pub max_cell: f64,
    /// Font size as a fraction of the cell edge
    pub font_ratio: f64,
    /// Padding as a fraction of each surface dimension
    pub padding_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_cell: 14.0,
            max_cell: 64.0,
            font_ratio: 0.7,
            padding_ratio: 0.04,
        }
    }
}

/// Animation holds, all in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Column sum stays visible this long before it is retired
    pub intermediate_sum_ms: u64,
    /// Pause after each addition column
    pub carry_ms: u64,
    /// Pause after the operands of a subtraction are drawn
    pub operand_ms: u64,
    /// Pause after borrow arrows are drawn
    pub borrow_arrow_ms: u64,
    /// Hold after striking a minuend digit
    pub strike_ms: u64,
    /// Hold after writing a borrowed value
    pub borrow_digit_ms: u64,
    /// Pause between borrow chains
    pub chain_pause_ms: u64,
    /// Hold after the result rule is drawn
    pub line_ms: u64,
    /// Stagger between result digits
    pub result_digit_ms: u64,
    /// Settle time once a trace is complete
    pub final_settle_ms: u64,
    /// Delay between highlighted elements in the borrow loop
    pub borrow_loop_step_ms: u64,
    /// Rest between borrow loop cycles
    pub borrow_loop_rest_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            intermediate_sum_ms: 1500,
            carry_ms: 500,
            operand_ms: 500,
            borrow_arrow_ms: 800,
            strike_ms: 300,
            borrow_digit_ms: 300,
            chain_pause_ms: 500,
            line_ms: 400,
            result_digit_ms: 80,
            final_settle_ms: 100,
            borrow_loop_step_ms: 200,
            borrow_loop_rest_ms: 3000,
        }
    }
}

impl TimingConfig {
    /// All holds zero
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            intermediate_sum_ms: 0,
            carry_ms: 0,
            operand_ms: 0,
            borrow_arrow_ms: 0,
            strike_ms: 0,
            borrow_digit_ms: 0,
            chain_pause_ms: 0,
            line_ms: 0,
            result_digit_ms: 0,
            final_settle_ms: 0,
            borrow_loop_step_ms: 0,
            borrow_loop_rest_ms: 0,
        }
    }
}

/// History panel settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Most entries kept
    pub capacity: usize,
    /// Key under which the list is persisted
    pub storage_key: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            storage_key: "calculatorHistory".to_string(),
        }
    }
}

/// Default output surface size, used when a front end has no real one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 320.0,
        }
    }
}

/// User-facing text for each error kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorMessages {
    pub invalid_number_format: String,
    pub division_by_zero: String,
    pub zero_dividend: String,
    pub invalid_sqrt_input: String,
    pub negative_sqrt: String,
    pub non_exact_sqrt: String,
    pub invalid_operation: String,
    pub generic_re_execution: String,
}

impl Default for ErrorMessages {
    fn default() -> Self {
        Self {
            invalid_number_format: "That is not a valid number".to_string(),
            division_by_zero: "Division by zero is not defined".to_string(),
            zero_dividend: "Zero divided by any number is zero".to_string(),
            invalid_sqrt_input: "The square root needs a single number".to_string(),
            negative_sqrt: "Negative numbers have no real square root".to_string(),
            non_exact_sqrt: "This number has no exact square root".to_string(),
            invalid_operation: "Invalid operation".to_string(),
            generic_re_execution: "This operation could not be repeated".to_string(),
        }
    }
}

impl ErrorMessages {
    /// Message shown for an error kind
    #[must_use]
    pub fn message(&self, kind: ErrorKind) -> &str {
        match kind {
            ErrorKind::InvalidNumberFormat => &self.invalid_number_format,
            ErrorKind::DivisionByZero => &self.division_by_zero,
            ErrorKind::ZeroDividend => &self.zero_dividend,
            ErrorKind::InvalidSqrtInput => &self.invalid_sqrt_input,
            ErrorKind::NegativeSqrt => &self.negative_sqrt,
            ErrorKind::NonExactSqrt => &self.non_exact_sqrt,
            ErrorKind::InvalidOperation => &self.invalid_operation,
            ErrorKind::GenericReExecutionError => &self.generic_re_execution,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Square root behaviour
    pub sqrt_mode: SqrtMode,
    /// Initial division layout
    pub division_mode: DivisionMode,
    /// Play cues with their holds; `false` renders the settled state at once
    pub animate: bool,
    pub layout: LayoutConfig,
    pub timing: TimingConfig,
    pub history: HistoryConfig,
    pub surface: SurfaceConfig,
    pub messages: ErrorMessages,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            sqrt_mode: SqrtMode::default(),
            division_mode: DivisionMode::default(),
            animate: true,
            layout: LayoutConfig::default(),
            timing: TimingConfig::default(),
            history: HistoryConfig::default(),
            surface: SurfaceConfig::default(),
            messages: ErrorMessages::default(),
        }
    }
}

impl CalculatorConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set square root mode
    #[must_use]
    pub const fn with_sqrt_mode(mut self, mode: SqrtMode) -> Self {
        self.sqrt_mode = mode;
        self
    }

    /// Set division mode
    #[must_use]
    pub const fn with_division_mode(mut self, mode: DivisionMode) -> Self {
        self.division_mode = mode;
        self
    }

    /// Enable or disable animation
    #[must_use]
    pub const fn with_animation(mut self, animate: bool) -> Self {
        self.animate = animate;
        self
    }

    /// Replace timing
    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    /// Parse from YAML text and validate
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = &self.layout;
        if !(layout.min_cell > 0.0 && layout.min_cell <= layout.max_cell) {
            return Err(ConfigError::Invalid(format!(
                "cell bounds must satisfy 0 < min_cell <= max_cell (got {} and {})",
                layout.min_cell, layout.max_cell
            )));
        }
        if !(layout.font_ratio > 0.0 && layout.font_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "font_ratio must be in (0, 1], got {}",
                layout.font_ratio
            )));
        }
        if !(0.0..0.5).contains(&layout.padding_ratio) {
            return Err(ConfigError::Invalid(format!(
                "padding_ratio must be in [0, 0.5), got {}",
                layout.padding_ratio
            )));
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::Invalid(
                "history capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
