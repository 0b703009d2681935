//! Timed playback of step traces.
//!
//! [`Sequencer::play`] walks a trace's cue script, mutating the surface and
//! sleeping between cues. Every render gets a [`CancellationToken`]; starting
//! a new operation cancels the old token, and playback checks it before each
//! surface mutation so an abandoned render never draws over the new one.
//!
//! ```no_run
//! use longhand::sequencer::CancellationSource;
//!
//! # async fn demo() {
//! let source = CancellationSource::new();
//! let token = source.token();
//! tokio::spawn(async move {
//!     token.cancelled().await;
//! });
//! source.cancel();
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::config::{LayoutConfig, TimingConfig};
use crate::render::{lock, MarkId, OutputSurface, RenderedMark, SharedSurface};
use crate::trace::{Cue, LoopTarget, StepTrace};

struct CancellationInner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Control side of a cancellation signal
///
/// Dropping the source does not cancel; call [`Self::cancel`].
pub struct CancellationSource {
    inner: Arc<CancellationInner>,
}

/// Observing side of a cancellation signal; cheap to clone
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationInner>,
}

impl CancellationSource {
    /// Creates a source with an uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationInner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// A token observing this source
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Signals cancellation and wakes every waiter
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        self.inner.notify.notify_waiters();
    }

    /// True once cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    /// True once the source has been cancelled
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves when the source is cancelled
    pub async fn cancelled(&self) {
        loop {
            // register before checking the flag so a cancel in between is seen
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Sleeps for `duration` unless cancelled first
    ///
    /// Returns `true` if the full duration elapsed without cancellation.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.is_cancelled();
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => !self.is_cancelled(),
            () = self.cancelled() => false,
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Outcome of one playback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Playback {
    /// False when cancelled part way
    pub completed: bool,
    /// Surface handles of the arrows and annotations pulsed by the borrow loop
    pub loop_marks: Vec<MarkId>,
}

/// Plays traces onto a surface
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    layout: LayoutConfig,
    instant: bool,
}

impl Sequencer {
    /// Creates a sequencer that honors cue holds
    #[must_use]
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            layout,
            instant: false,
        }
    }

    /// Skip every hold
    #[must_use]
    pub const fn with_instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }

    /// True when holds are skipped
    #[must_use]
    pub const fn is_instant(&self) -> bool {
        self.instant
    }

    /// Clears the surface and plays the trace's cue script onto it
    pub async fn play<S: OutputSurface>(
        &self,
        trace: &StepTrace,
        surface: &SharedSurface<S>,
        token: &CancellationToken,
    ) -> Playback {
        if token.is_cancelled() {
            return Playback::default();
        }
        let metrics = {
            let mut s = lock(surface);
            s.clear();
            let (width, height) = s.size();
            self.layout
                .compute(trace.total_cols(), trace.total_rows(), width, height)
        };

        let mut ids: HashMap<usize, MarkId> = HashMap::new();
        let mut arrows: HashMap<usize, MarkId> = HashMap::new();
        for (step, cue) in trace.cues().iter().enumerate() {
            if token.is_cancelled() {
                tracing::debug!(step, "playback cancelled");
                return Playback::default();
            }
            match *cue {
                Cue::Show { event, .. } => {
                    if let Some(ev) = trace.events().get(event) {
                        let id = lock(surface).append(RenderedMark::from_event(ev, &metrics));
                        ids.insert(event, id);
                    }
                }
                Cue::Hide { event, .. } => {
                    if let Some(id) = ids.remove(&event) {
                        lock(surface).remove(id);
                    }
                }
                Cue::Strike { event, .. } => {
                    if let Some(&id) = ids.get(&event) {
                        lock(surface).strike(id);
                    }
                }
                Cue::Arrow {
                    arrow,
                    row,
                    from_col,
                    to_col,
                    ..
                } => {
                    let id =
                        lock(surface).append(RenderedMark::arrow(row, from_col, to_col, &metrics));
                    arrows.insert(arrow, id);
                }
                Cue::Pause(_) => {}
            }

            let hold = if self.instant { 0 } else { cue.hold_ms() };
            if hold > 0 {
                tracing::debug!(step, hold, "cue hold");
                if !token.sleep(Duration::from_millis(hold)).await {
                    tracing::debug!(step, "playback cancelled during hold");
                    return Playback::default();
                }
            }
        }

        let loop_marks = trace
            .loop_targets()
            .iter()
            .filter_map(|target| match *target {
                LoopTarget::Event(event) => ids.get(&event).copied(),
                LoopTarget::Arrow(arrow) => arrows.get(&arrow).copied(),
            })
            .collect();
        Playback {
            completed: true,
            loop_marks,
        }
    }
}

/// Pulses the borrow arrows and annotations until cancelled
///
/// Each mark is highlighted in turn, `borrow_loop_step_ms` apart, followed
/// by a `borrow_loop_rest_ms` rest. The loop ends as soon as a mark is no
/// longer on the surface.
pub async fn run_borrow_loop<S: OutputSurface>(
    surface: SharedSurface<S>,
    marks: Vec<MarkId>,
    timing: TimingConfig,
    token: CancellationToken,
) {
    if marks.is_empty() || (timing.borrow_loop_step_ms == 0 && timing.borrow_loop_rest_ms == 0) {
        return;
    }
    let step = Duration::from_millis(timing.borrow_loop_step_ms);
    let rest = Duration::from_millis(timing.borrow_loop_rest_ms);
    let mut rounds: u64 = 0;
    loop {
        for &id in &marks {
            if token.is_cancelled() {
                return;
            }
            if !lock(&surface).highlight(id) {
                tracing::debug!(id, rounds, "borrow loop target gone");
                return;
            }
            if !token.sleep(step).await {
                return;
            }
        }
        rounds += 1;
        if !token.sleep(rest).await {
            return;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::core::parser::Operand;
    use crate::render::{shared, MarkKind, MemorySurface};
    use crate::trace::{subtraction_trace, Role};

    fn borrow_trace(timing: &TimingConfig) -> StepTrace {
        subtraction_trace(
            &Operand::parse("100").unwrap(),
            &Operand::parse("99").unwrap(),
            timing,
        )
        .unwrap()
    }

    // ===== Cancellation tests =====

    #[test]
    fn test_token_observes_source() {
        let source = CancellationSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());
        source.cancel();
        assert!(token.is_cancelled());
        assert!(source.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interrupted_by_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        let sleeper = tokio::spawn(async move { token.sleep(Duration::from_secs(60)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        source.cancel();
        assert!(!sleeper.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_to_completion() {
        let source = CancellationSource::new();
        assert!(source.token().sleep(Duration::from_millis(50)).await);
    }

    // ===== Playback tests =====

    #[tokio::test]
    async fn test_instant_play_draws_settled_state() {
        let trace = borrow_trace(&TimingConfig::default());
        let surface = shared(MemorySurface::default());
        let token = CancellationSource::new().token();
        let playback = Sequencer::default()
            .with_instant(true)
            .play(&trace, &surface, &token)
            .await;
        assert!(playback.completed);

        let kinds: Vec<_> = playback
            .loop_marks
            .iter()
            .map(|&id| lock(&surface).get(id).unwrap().kind)
            .collect();
        assert_eq!(
            kinds,
            [
                MarkKind::Arrow,
                MarkKind::Arrow,
                MarkKind::Cell(Role::Carry),
                MarkKind::Cell(Role::Carry),
                MarkKind::Cell(Role::Carry),
            ]
        );

        let marks = lock(&surface).marks();
        let drawn: Vec<_> = marks.iter().filter(|m| m.kind != MarkKind::Arrow).collect();
        assert_eq!(drawn.len(), trace.settled().len());
        assert_eq!(marks.iter().filter(|m| m.struck).count(), 3);
        assert_eq!(marks.iter().filter(|m| m.kind == MarkKind::Arrow).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_holds_take_their_time() {
        let timing = TimingConfig::default();
        let trace = borrow_trace(&timing);
        let surface = shared(MemorySurface::default());
        let token = CancellationSource::new().token();
        let start = tokio::time::Instant::now();
        let playback = Sequencer::default().play(&trace, &surface, &token).await;
        assert!(playback.completed);
        assert!(start.elapsed() >= Duration::from_millis(trace.total_hold_ms()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_before_next_mutation() {
        let trace = borrow_trace(&TimingConfig::default());
        let surface = shared(MemorySurface::default());
        let source = CancellationSource::new();
        let token = source.token();
        let task_surface = Arc::clone(&surface);
        let handle = tokio::spawn(async move {
            Sequencer::default().play(&trace, &task_surface, &token).await
        });

        tokio::time::sleep(Duration::from_millis(600)).await;
        source.cancel();
        let ops_at_cancel = lock(&surface).operations().len();
        let playback = handle.await.unwrap();

        assert!(!playback.completed);
        assert_eq!(lock(&surface).operations().len(), ops_at_cancel);
    }

    #[tokio::test]
    async fn test_cancelled_token_draws_nothing() {
        let trace = borrow_trace(&TimingConfig::instant());
        let surface = shared(MemorySurface::default());
        let source = CancellationSource::new();
        source.cancel();
        let playback = Sequencer::default()
            .play(&trace, &surface, &source.token())
            .await;
        assert!(!playback.completed);
        assert!(lock(&surface).operations().is_empty());
    }

    // ===== Borrow loop tests =====

    #[tokio::test(start_paused = true)]
    async fn test_borrow_loop_pulses_until_cleared() {
        let timing = TimingConfig::default();
        let trace = borrow_trace(&timing);
        let surface = shared(MemorySurface::default());
        let source = CancellationSource::new();
        let playback = Sequencer::default()
            .with_instant(true)
            .play(&trace, &surface, &source.token())
            .await;

        let handle = tokio::spawn(run_borrow_loop(
            Arc::clone(&surface),
            playback.loop_marks,
            timing,
            source.token(),
        ));
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert!(lock(&surface).highlight_count() >= 6);

        lock(&surface).clear();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_borrow_loop_stops_on_cancel() {
        let timing = TimingConfig::default();
        let trace = borrow_trace(&timing);
        let surface = shared(MemorySurface::default());
        let source = CancellationSource::new();
        let playback = Sequencer::default()
            .with_instant(true)
            .play(&trace, &surface, &source.token())
            .await;
        let handle = tokio::spawn(run_borrow_loop(
            Arc::clone(&surface),
            playback.loop_marks,
            timing,
            source.token(),
        ));
        tokio::time::sleep(Duration::from_millis(250)).await;
        source.cancel();
        handle.await.unwrap();
        let pulses = lock(&surface).highlight_count();
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(lock(&surface).highlight_count(), pulses);
    }

    #[tokio::test]
    async fn test_borrow_loop_without_timing_returns() {
        let surface = shared(MemorySurface::default());
        run_borrow_loop(
            surface,
            vec![1, 2],
            TimingConfig::instant(),
            CancellationSource::new().token(),
        )
        .await;
    }
}
