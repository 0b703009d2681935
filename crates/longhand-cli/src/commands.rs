//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use longhand::{DivisionMode, SqrtMode};
use std::path::PathBuf;

/// Longhand: long arithmetic worked out step by step in the terminal
#[derive(Parser, Debug)]
#[command(name = "longhand")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Calculator settings file (YAML)
    #[arg(long, global = true, env = "LONGHAND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the history
    #[arg(long, global = true, env = "LONGHAND_DATA_DIR", default_value = ".longhand")]
    pub data_dir: PathBuf,

    /// Log as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Work out an expression such as 945/5 or 100-99
    Calc(CalcArgs),

    /// Prime factorization of a whole number
    Factor(FactorArgs),

    /// Square root of a number
    Sqrt(SqrtArgs),

    /// List or clear the recorded operations
    History(HistoryArgs),

    /// Redraw a recorded operation (0 = most recent)
    Replay(ReplayArgs),
}

/// Options shared by every drawing command
#[derive(Args, Debug, Clone, Default)]
pub struct DrawArgs {
    /// Reveal the steps with their pauses
    #[arg(long)]
    pub animate: bool,

    /// Do not add the operation to the history
    #[arg(long)]
    pub no_record: bool,

    /// Print a JSON report instead of the drawing
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the calc command
#[derive(Parser, Debug)]
pub struct CalcArgs {
    /// Expression, e.g. "12x34"
    pub expr: String,

    /// Long-division layout
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Square root behaviour
    #[arg(long, value_enum)]
    pub sqrt: Option<SqrtArg>,

    #[command(flatten)]
    pub draw: DrawArgs,
}

/// Arguments for the factor command
#[derive(Parser, Debug)]
pub struct FactorArgs {
    /// Whole number to factorize
    pub number: String,

    #[command(flatten)]
    pub draw: DrawArgs,
}

/// Arguments for the sqrt command
#[derive(Parser, Debug)]
pub struct SqrtArgs {
    /// Number to take the root of
    pub number: String,

    /// Square root behaviour
    #[arg(long, value_enum)]
    pub sqrt: Option<SqrtArg>,

    #[command(flatten)]
    pub draw: DrawArgs,
}

/// Arguments for the history command
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    /// Remove every entry
    #[arg(long)]
    pub clear: bool,

    /// Print the stored JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the replay command
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Entry to redraw, 0 = most recent
    pub index: usize,

    /// Reveal the steps with their pauses
    #[arg(long)]
    pub animate: bool,
}

/// Long-division layout argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    /// Products and remainders written out
    Extended,
    /// Remainders only
    Short,
}

impl From<ModeArg> for DivisionMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Extended => Self::Extended,
            ModeArg::Short => Self::Short,
        }
    }
}

/// Square root argument
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqrtArg {
    /// Perfect squares only
    Exact,
    /// Rounded to four decimals
    Decimal,
}

impl From<SqrtArg> for SqrtMode {
    fn from(arg: SqrtArg) -> Self {
        match arg {
            SqrtArg::Exact => Self::Exact,
            SqrtArg::Decimal => Self::Decimal,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("longhand").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_calc_with_options() {
        let cli = parse(&["calc", "945/5", "--mode", "short", "--no-record", "--json"]);
        let Commands::Calc(args) = cli.command else {
            panic!("expected calc");
        };
        assert_eq!(args.expr, "945/5");
        assert_eq!(args.mode, Some(ModeArg::Short));
        assert!(args.draw.no_record);
        assert!(args.draw.json);
        assert!(!args.draw.animate);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["history", "-vv", "--data-dir", "/tmp/x", "--color", "never"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/x"));
        assert!(matches!(cli.color, ColorArg::Never));
    }

    #[test]
    fn test_sqrt_mode_arg() {
        let cli = parse(&["sqrt", "2", "--sqrt", "exact"]);
        let Commands::Sqrt(args) = cli.command else {
            panic!("expected sqrt");
        };
        assert_eq!(SqrtMode::from(args.sqrt.unwrap()), SqrtMode::Exact);
    }

    #[test]
    fn test_replay_index() {
        let cli = parse(&["replay", "3"]);
        assert!(matches!(cli.command, Commands::Replay(ReplayArgs { index: 3, .. })));
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Cli::try_parse_from(["longhand"]).is_err());
    }

    #[test]
    fn test_mode_conversion() {
        assert_eq!(DivisionMode::from(ModeArg::Extended), DivisionMode::Extended);
        assert_eq!(DivisionMode::from(ModeArg::Short), DivisionMode::Short);
    }
}
