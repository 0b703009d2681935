//! Calculator session: the state a front end drives.
//!
//! A session owns the surfaces, the history and the mode flags that a UI
//! would otherwise keep in globals. Every operation cancels the render that
//! is still running (including its borrow loop) before it draws anything.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{CalculatorConfig, DivisionMode};
use crate::core::evaluator::Evaluator;
use crate::core::history::{AddOutcome, History, HistoryEntry, HistoryStore};
use crate::core::parser::{BinaryOp, Expression};
use crate::core::{CalcError, ErrorKind};
use crate::render::{lock, shared, DisplaySurface, OutputSurface, SharedSurface};
use crate::sequencer::{run_borrow_loop, CancellationSource, Sequencer};
use crate::store::KeyValueStore;
use crate::trace::StepTrace;

/// How an operation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Drawn; `result` is the trace's result text
    Success { result: String },
    /// Rejected; the catalog message is on the surface
    Failed { kind: ErrorKind, message: String },
}

impl Outcome {
    /// Result text of a successful operation
    #[must_use]
    pub fn result(&self) -> Option<&str> {
        match self {
            Self::Success { result } => Some(result.as_str()),
            Self::Failed { .. } => None,
        }
    }

    /// True for [`Outcome::Success`]
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The render currently on screen
struct ActiveRender {
    source: CancellationSource,
    borrow_loop: Option<JoinHandle<()>>,
}

/// Explicit calculator state
pub struct Session<S, D, K> {
    config: CalculatorConfig,
    evaluator: Evaluator,
    sequencer: Sequencer,
    surface: SharedSurface<S>,
    display: D,
    history: History<K>,
    division_mode: DivisionMode,
    last_division: Option<String>,
    active: Option<ActiveRender>,
    highlighted: Option<usize>,
    last_trace: Option<StepTrace>,
}

impl<S, D, K> Session<S, D, K> {
    /// Stops the running render and its borrow loop
    pub fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.source.cancel();
            if let Some(handle) = active.borrow_loop {
                handle.abort();
            }
        }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Shared output surface
    #[must_use]
    pub const fn surface(&self) -> &SharedSurface<S> {
        &self.surface
    }

    /// Expression line
    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// Expression line, for input
    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Recorded operations
    #[must_use]
    pub const fn history(&self) -> &History<K> {
        &self.history
    }

    /// Current long-division layout
    #[must_use]
    pub const fn division_mode(&self) -> DivisionMode {
        self.division_mode
    }

    /// History entry marked as current, if any
    #[must_use]
    pub const fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    /// Trace of the last successful operation
    #[must_use]
    pub const fn last_trace(&self) -> Option<&StepTrace> {
        self.last_trace.as_ref()
    }

    /// True while a borrow loop task is alive
    #[must_use]
    pub fn is_looping(&self) -> bool {
        self.active
            .as_ref()
            .and_then(|a| a.borrow_loop.as_ref())
            .is_some_and(|h| !h.is_finished())
    }
}

impl<S, D, K> Session<S, D, K>
where
    S: OutputSurface + Send + 'static,
    D: DisplaySurface,
    K: KeyValueStore,
{
    /// Creates a session; an unreadable history starts empty
    pub fn new(config: CalculatorConfig, surface: S, display: D, store: K) -> Self {
        let history = History::open(store, &config.history);
        let sequencer = Sequencer::new(config.layout.clone()).with_instant(!config.animate);
        Self {
            evaluator: Evaluator::new(&config),
            sequencer,
            surface: shared(surface),
            display,
            history,
            division_mode: config.division_mode,
            last_division: None,
            active: None,
            highlighted: None,
            last_trace: None,
            config,
        }
    }

    /// Runs the expression on the display and records it
    pub async fn calculate(&mut self) -> Outcome {
        let input = self.display.text();
        self.run(&input, true).await
    }

    /// Runs an expression, recording it when `record` is set
    ///
    /// An input that is already in the history is not recorded again: it is
    /// highlighted and redrawn.
    pub async fn run(&mut self, input: &str, record: bool) -> Outcome {
        self.cancel_active();
        tracing::info!(input, record, mode = ?self.division_mode, "operation started");

        let expr = match Expression::parse(input) {
            Ok(expr) => expr,
            Err(e) => return self.fail(&e),
        };
        let canonical = expr.canonical();
        if record {
            if let Some(index) = self.history.position(&canonical) {
                tracing::info!(input = %canonical, index, "already recorded, replaying");
                self.highlighted = Some(index);
                return self.execute(&expr, canonical, false).await;
            }
        }
        self.execute(&expr, canonical, record).await
    }

    /// Redraws a stored input without recording it, then puts the input
    /// back on the display
    pub async fn replay(&mut self, input: &str) -> Outcome {
        self.cancel_active();
        let outcome = match Expression::parse(input) {
            Ok(expr) => {
                let canonical = expr.canonical();
                self.execute(&expr, canonical, false).await
            }
            Err(e) => {
                tracing::error!(input, error = %e, "history entry cannot be re-executed");
                self.fail(&CalcError::GenericReExecutionError(e.to_string()))
            }
        };
        self.display.set_text(input);
        outcome
    }

    /// Replays the history entry at `index` and highlights it
    pub async fn replay_entry(&mut self, index: usize) -> Option<Outcome> {
        let input = self.history.get(index)?.input.clone();
        self.highlighted = Some(index);
        Some(self.replay(&input).await)
    }

    /// Factorizes the number on the display
    pub async fn factorize(&mut self) -> Outcome {
        let input = format!("factores({})", self.display.text().trim());
        self.run(&input, true).await
    }

    /// Square root of the number on the display
    pub async fn square_root(&mut self) -> Outcome {
        let input = format!("√({})", self.display.text().trim());
        self.run(&input, true).await
    }

    /// Switches the division layout and redraws the last division
    pub async fn set_division_mode(&mut self, mode: DivisionMode) -> Option<Outcome> {
        self.division_mode = mode;
        tracing::info!(?mode, "division mode set");
        let input = self.last_division.clone()?;
        Some(self.run(&input, false).await)
    }

    /// Flips between extended and short division
    pub async fn toggle_division_mode(&mut self) -> Option<Outcome> {
        self.set_division_mode(self.division_mode.toggled()).await
    }

    /// Empties the history
    pub fn clear_history(&mut self) {
        if let Err(e) = self.history.clear_all() {
            tracing::warn!(error = %e, "failed to persist cleared history");
        }
        self.highlighted = None;
        tracing::info!("history cleared");
    }

    async fn execute(&mut self, expr: &Expression, canonical: String, record: bool) -> Outcome {
        let trace = match self.evaluator.evaluate(expr, self.division_mode) {
            Ok(trace) => trace,
            Err(e) => return self.fail(&e),
        };
        if matches!(
            expr,
            Expression::Binary {
                op: BinaryOp::Divide,
                ..
            }
        ) {
            self.last_division = Some(canonical.clone());
        }

        let source = CancellationSource::new();
        let token = source.token();
        let playback = self.sequencer.play(&trace, &self.surface, &token).await;
        let borrow_loop = (playback.completed
            && !playback.loop_marks.is_empty()
            && !self.sequencer.is_instant())
        .then(|| {
            tokio::spawn(run_borrow_loop(
                Arc::clone(&self.surface),
                playback.loop_marks.clone(),
                self.config.timing.clone(),
                token.clone(),
            ))
        });
        self.active = Some(ActiveRender {
            source,
            borrow_loop,
        });

        let result = trace.result().to_string();
        if record && playback.completed {
            let rendered = lock(&self.surface).marks();
            match self
                .history
                .add(HistoryEntry::new(canonical.as_str(), result.as_str(), rendered))
            {
                Ok(AddOutcome::Inserted) => self.highlighted = Some(0),
                Ok(AddOutcome::Duplicate { index }) => self.highlighted = Some(index),
                Err(e) => {
                    tracing::warn!(input = %canonical, error = %e, "failed to persist history");
                    self.highlighted = self.history.position(&canonical);
                }
            }
        }
        tracing::info!(input = %canonical, %result, recorded = record, "operation finished");
        self.last_trace = Some(trace);
        Outcome::Success { result }
    }

    fn fail(&mut self, error: &CalcError) -> Outcome {
        let kind = error.kind();
        let message = self.config.messages.message(kind).to_string();
        lock(&self.surface).show_error(&message);
        tracing::warn!(%error, ?kind, "operation failed");
        Outcome::Failed { kind, message }
    }
}

impl<S, D, K> std::fmt::Debug for Session<S, D, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("division_mode", &self.division_mode)
            .field("last_division", &self.last_division)
            .field("highlighted", &self.highlighted)
            .field("looping", &self.is_looping())
            .finish_non_exhaustive()
    }
}

impl<S, D, K> Drop for Session<S, D, K> {
    fn drop(&mut self) {
        self.cancel_active();
    }
}
