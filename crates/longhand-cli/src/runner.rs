//! Command execution
//!
//! Each drawing command builds a [`Session`] over a [`TerminalSurface`] and
//! the on-disk history, runs one operation and prints the settled drawing
//! (or a JSON report).

use longhand::prelude::*;
use serde::Serialize;

use crate::commands::{Commands, DrawArgs, HistoryArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::TerminalSurface;

type TerminalSession = Session<TerminalSurface, MemoryDisplay, FileStore>;

/// Machine-readable outcome of one operation
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub input: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Plain text drawing
    pub drawing: String,
}

/// Runs CLI commands against one configuration
#[derive(Debug, Clone)]
pub struct Runner {
    cli: CliConfig,
    calculator: CalculatorConfig,
}

impl Runner {
    /// Creates a runner, reading the calculator settings file if given
    pub fn new(cli: CliConfig) -> CliResult<Self> {
        let calculator = cli.calculator_config()?;
        Ok(Self { cli, calculator })
    }

    /// Calculator settings in effect
    #[must_use]
    pub const fn calculator(&self) -> &CalculatorConfig {
        &self.calculator
    }

    /// Executes one subcommand
    pub async fn execute(mut self, command: Commands) -> CliResult<()> {
        match command {
            Commands::Calc(args) => {
                if let Some(mode) = args.mode {
                    self.calculator.division_mode = mode.into();
                }
                if let Some(sqrt) = args.sqrt {
                    self.calculator.sqrt_mode = sqrt.into();
                }
                self.draw(&args.expr, &args.draw).await
            }
            Commands::Factor(args) => {
                let input = format!("factores({})", args.number.trim());
                self.draw(&input, &args.draw).await
            }
            Commands::Sqrt(args) => {
                if let Some(sqrt) = args.sqrt {
                    self.calculator.sqrt_mode = sqrt.into();
                }
                let input = format!("√({})", args.number.trim());
                self.draw(&input, &args.draw).await
            }
            Commands::History(args) => self.history(&args),
            Commands::Replay(args) => self.replay(args.index, args.animate).await,
        }
    }

    fn session(&self, animate: bool, live: bool) -> CliResult<TerminalSession> {
        let store = FileStore::open(&self.cli.data_dir)?;
        let surface_size = &self.calculator.surface;
        let surface = TerminalSurface::new(
            surface_size.width,
            surface_size.height,
            self.cli.color.should_color(),
        )
        .with_live(live);
        let config = self.calculator.clone().with_animation(animate);
        Ok(Session::new(config, surface, MemoryDisplay::default(), store))
    }

    async fn draw(&self, input: &str, args: &DrawArgs) -> CliResult<()> {
        let live = args.animate && !args.json && !self.cli.verbosity.is_quiet();
        let mut session = self.session(args.animate, live)?;
        let outcome = session.run(input, !args.no_record).await;
        self.finish(&session, input, outcome, args.json, live)
    }

    async fn replay(&self, index: usize, animate: bool) -> CliResult<()> {
        let live = animate && !self.cli.verbosity.is_quiet();
        let mut session = self.session(animate, live)?;
        let input = session
            .history()
            .get(index)
            .map(|entry| entry.input.clone())
            .ok_or_else(|| {
                CliError::invalid_argument(format!(
                    "no history entry {index} ({} recorded)",
                    session.history().len()
                ))
            })?;
        let outcome = session
            .replay_entry(index)
            .await
            .ok_or_else(|| CliError::invalid_argument(format!("no history entry {index}")))?;
        self.finish(&session, &input, outcome, false, live)
    }

    fn finish(
        &self,
        session: &TerminalSession,
        input: &str,
        outcome: Outcome,
        json: bool,
        live: bool,
    ) -> CliResult<()> {
        let mut surface = lock(session.surface());
        if json {
            let drawing = render_text(&surface.marks());
            let report = match &outcome {
                Outcome::Success { result } => Report {
                    input: input.to_string(),
                    ok: true,
                    result: Some(result.clone()),
                    error: None,
                    message: None,
                    drawing,
                },
                Outcome::Failed { kind, message } => Report {
                    input: input.to_string(),
                    ok: false,
                    result: None,
                    error: Some(*kind),
                    message: Some(message.clone()),
                    drawing,
                },
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if !live && (!self.cli.verbosity.is_quiet() || !outcome.is_success()) {
            surface.present();
        }
        drop(surface);

        if self.cli.verbosity.is_verbose() && !json {
            if let Some(trace) = session.last_trace().filter(|_| outcome.is_success()) {
                eprintln!("{}", step_summary(trace));
            }
        }

        match outcome {
            Outcome::Success { .. } => Ok(()),
            Outcome::Failed { kind, message } => Err(CliError::Calculation { kind, message }),
        }
    }

    fn history(&self, args: &HistoryArgs) -> CliResult<()> {
        let store = FileStore::open(&self.cli.data_dir)?;
        let mut history = History::open(store, &self.calculator.history);
        if args.clear {
            history.clear_all()?;
            if !self.cli.verbosity.is_quiet() {
                println!("History cleared");
            }
            return Ok(());
        }
        if args.json {
            println!("{}", history.to_json()?);
            return Ok(());
        }
        if history.is_empty() {
            if !self.cli.verbosity.is_quiet() {
                println!("No operations recorded");
            }
            return Ok(());
        }
        for (index, entry) in history.iter().enumerate() {
            println!("{index:>2}  {}", entry.display());
        }
        Ok(())
    }
}

/// One-line account of how a drawing was produced
#[must_use]
pub fn step_summary(trace: &StepTrace) -> String {
    format!(
        "{} steps, {} borrow chains, {} ms animated, {}x{} grid",
        trace.cues().len(),
        trace.borrow_chains().len(),
        trace.total_hold_ms(),
        trace.total_cols(),
        trace.total_rows(),
    )
}
