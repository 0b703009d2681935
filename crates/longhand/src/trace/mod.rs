//! Step traces: the pencil-and-paper record of one calculation.
//!
//! A generator turns operands into a [`StepTrace`]: a list of positioned
//! [`VisualEvent`]s plus a [`Cue`] script that says in which order, and with
//! which pauses, the events appear, disappear or get struck through. The
//! trace is pure data. Playing it onto a surface is the sequencer's job.
//!
//! # Grid conventions
//!
//! - Coordinates are `(row, col)` cells, origin top-left.
//! - A text event occupies `span()` consecutive cells of its row. `Carry`
//!   events are small annotations and always occupy exactly one cell.
//! - `Line` events are edge rules and occupy no cell. A run of `─` lies on
//!   the top edge of its cells; a run of `│` lies on the left edge of
//!   `text.len()` cells going down.
//! - In the settled state no two cell-occupying events share a cell.

pub mod addition;
pub mod division;
pub mod factorization;
pub mod multiplication;
pub mod square_root;
pub mod subtraction;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub use addition::{addition_trace, MAX_ADDENDS};
pub use division::{
    calculate_display_steps, calculate_short_division_steps, division_trace, DivisionPlan,
    DivisionStep, StepKind,
};
pub use factorization::{factorization_trace, prime_factors};
pub use multiplication::multiplication_trace;
pub use square_root::{square_root, square_root_trace};
pub use subtraction::{borrow_chains, resolve_borrows, subtraction_trace};

/// Semantic category of a drawn token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Operand digits: addends, minuend, multiplicand, dividend
    Dividend,
    /// Divisor, and prime factors in a factorization
    Divisor,
    /// Quotient and final results
    Quotient,
    /// Quantities that get subtracted or summed on the way
    Product,
    /// Remainders and intermediate values
    Remainder,
    /// Carry and borrow annotations
    Carry,
    /// Operator glyphs
    Sign,
    /// Rules
    Line,
}

/// One token placed on the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualEvent {
    pub text: String,
    pub row: usize,
    pub col_start: usize,
    pub role: Role,
}

impl VisualEvent {
    /// Creates an event
    #[must_use]
    pub fn new(text: impl Into<String>, row: usize, col_start: usize, role: Role) -> Self {
        Self {
            text: text.into(),
            row,
            col_start,
            role,
        }
    }

    /// Character count of the text
    #[must_use]
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }

    /// Cells taken along the event's direction
    #[must_use]
    pub fn span(&self) -> usize {
        match self.role {
            Role::Carry => 1,
            _ => self.width(),
        }
    }

    /// True for `Line` events
    #[must_use]
    pub fn is_rule(&self) -> bool {
        self.role == Role::Line
    }

    /// True for a downward rule
    #[must_use]
    pub fn is_vertical_rule(&self) -> bool {
        self.is_rule() && self.text.starts_with('│')
    }

    /// Cells this event occupies; rules occupy none
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let span = if self.is_rule() { 0 } else { self.span() };
        (self.col_start..self.col_start + span).map(move |col| (self.row, col))
    }
}

/// One digit rewritten by a borrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowStep {
    /// Position in the padded minuend, most significant first
    pub digit_index: usize,
    /// Value written above the digit
    pub new_value: u8,
}

/// Borrow steps for one deficient column, lender first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BorrowChain {
    pub steps: Vec<BorrowStep>,
}

/// Playback script entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    /// Reveal an event
    Show { event: usize, hold_ms: u64 },
    /// Remove a revealed event
    Hide { event: usize, hold_ms: u64 },
    /// Strike through a revealed event
    Strike { event: usize, hold_ms: u64 },
    /// Draw borrow arrow number `arrow` above `row` between two columns
    Arrow {
        arrow: usize,
        row: usize,
        from_col: usize,
        to_col: usize,
        hold_ms: u64,
    },
    /// Wait
    Pause(u64),
}

impl Cue {
    /// Time to wait after applying this cue
    #[must_use]
    pub const fn hold_ms(&self) -> u64 {
        match *self {
            Self::Show { hold_ms, .. }
            | Self::Hide { hold_ms, .. }
            | Self::Strike { hold_ms, .. }
            | Self::Arrow { hold_ms, .. } => hold_ms,
            Self::Pause(ms) => ms,
        }
    }
}

/// Something the borrow loop pulses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopTarget {
    /// A revealed event
    Event(usize),
    /// A borrow arrow, numbered in draw order
    Arrow(usize),
}

/// An event as it stands once the script has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settled<'a> {
    pub event: &'a VisualEvent,
    pub struck: bool,
}

/// Complete record of one calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepTrace {
    events: Vec<VisualEvent>,
    cues: Vec<Cue>,
    result: String,
    total_rows: usize,
    total_cols: usize,
    borrow_chains: Vec<BorrowChain>,
    loop_targets: Vec<LoopTarget>,
}

impl StepTrace {
    /// All events, in creation order
    #[must_use]
    pub fn events(&self) -> &[VisualEvent] {
        &self.events
    }

    /// Playback script
    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// Final result text
    #[must_use]
    pub fn result(&self) -> &str {
        &self.result
    }

    /// Grid height in cells
    #[must_use]
    pub const fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Grid width in cells
    #[must_use]
    pub const fn total_cols(&self) -> usize {
        self.total_cols
    }

    /// Borrow chains, in the order they were resolved
    #[must_use]
    pub fn borrow_chains(&self) -> &[BorrowChain] {
        &self.borrow_chains
    }

    /// Arrows and annotations pulsed by the repeating borrow loop, each
    /// chain's arrows ahead of its digits
    #[must_use]
    pub fn loop_targets(&self) -> &[LoopTarget] {
        &self.loop_targets
    }

    /// Number of borrow arrows drawn
    #[must_use]
    pub fn arrow_count(&self) -> usize {
        self.cues
            .iter()
            .filter(|c| matches!(c, Cue::Arrow { .. }))
            .count()
    }

    /// Sum of all holds
    #[must_use]
    pub fn total_hold_ms(&self) -> u64 {
        self.cues.iter().map(Cue::hold_ms).sum()
    }

    /// True when the script has no waits
    #[must_use]
    pub fn is_synchronous(&self) -> bool {
        self.total_hold_ms() == 0
    }

    /// Events with the given role, in creation order
    pub fn events_with_role(&self, role: Role) -> impl Iterator<Item = &VisualEvent> {
        self.events.iter().filter(move |e| e.role == role)
    }

    /// State left on the surface after the script has run
    #[must_use]
    pub fn settled(&self) -> Vec<Settled<'_>> {
        let mut order = Vec::new();
        let mut hidden = HashSet::new();
        let mut struck = HashSet::new();
        for cue in &self.cues {
            match *cue {
                Cue::Show { event, .. } => order.push(event),
                Cue::Hide { event, .. } => {
                    hidden.insert(event);
                }
                Cue::Strike { event, .. } => {
                    struck.insert(event);
                }
                Cue::Arrow { .. } | Cue::Pause(_) => {}
            }
        }
        order
            .into_iter()
            .filter(|idx| !hidden.contains(idx))
            .filter_map(|idx| {
                self.events.get(idx).map(|event| Settled {
                    event,
                    struck: struck.contains(&idx),
                })
            })
            .collect()
    }

    /// First cell claimed by two settled events, if any
    #[must_use]
    pub fn find_overlap(&self) -> Option<(usize, usize)> {
        let mut seen = HashSet::new();
        self.settled()
            .iter()
            .flat_map(|s| s.event.cells())
            .find(|cell| !seen.insert(*cell))
    }

    /// Settled text of one row, joined in column order
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        let mut tokens: Vec<&VisualEvent> = self
            .settled()
            .into_iter()
            .map(|s| s.event)
            .filter(|e| e.row == row && !e.is_rule())
            .collect();
        tokens.sort_by_key(|e| e.col_start);
        tokens.iter().map(|e| e.text.as_str()).collect()
    }
}

/// Incremental trace construction
#[derive(Debug)]
pub struct TraceBuilder {
    events: Vec<VisualEvent>,
    cues: Vec<Cue>,
    total_rows: usize,
    total_cols: usize,
    borrow_chains: Vec<BorrowChain>,
    loop_targets: Vec<LoopTarget>,
    arrows: usize,
}

impl TraceBuilder {
    /// Starts a trace on a grid of the given size
    #[must_use]
    pub fn new(total_rows: usize, total_cols: usize) -> Self {
        Self {
            events: Vec::new(),
            cues: Vec::new(),
            total_rows,
            total_cols,
            borrow_chains: Vec::new(),
            loop_targets: Vec::new(),
            arrows: 0,
        }
    }

    /// Adds an event and reveals it
    pub fn show(&mut self, event: VisualEvent, hold_ms: u64) -> usize {
        debug_assert!(event.row < self.total_rows, "row {} outside grid", event.row);
        let idx = self.events.len();
        self.events.push(event);
        self.cues.push(Cue::Show {
            event: idx,
            hold_ms,
        });
        idx
    }

    /// Shorthand for [`Self::show`]
    pub fn show_text(
        &mut self,
        text: impl Into<String>,
        row: usize,
        col: usize,
        role: Role,
        hold_ms: u64,
    ) -> usize {
        self.show(VisualEvent::new(text, row, col, role), hold_ms)
    }

    /// Horizontal rule on the top edge of `row`
    pub fn rule(&mut self, row: usize, col: usize, cells: usize, hold_ms: u64) -> usize {
        self.show_text("─".repeat(cells.max(1)), row, col, Role::Line, hold_ms)
    }

    /// Vertical rule on the left edge of `col`, starting at `row`
    pub fn vertical_rule(&mut self, row: usize, col: usize, cells: usize, hold_ms: u64) -> usize {
        self.show_text("│".repeat(cells.max(1)), row, col, Role::Line, hold_ms)
    }

    /// Retires a revealed event
    pub fn hide(&mut self, event: usize, hold_ms: u64) {
        self.cues.push(Cue::Hide { event, hold_ms });
    }

    /// Strikes through a revealed event
    pub fn strike(&mut self, event: usize, hold_ms: u64) {
        self.cues.push(Cue::Strike { event, hold_ms });
    }

    /// Draws a borrow arrow and returns its number
    pub fn arrow(&mut self, row: usize, from_col: usize, to_col: usize, hold_ms: u64) -> usize {
        let arrow = self.arrows;
        self.arrows += 1;
        self.cues.push(Cue::Arrow {
            arrow,
            row,
            from_col,
            to_col,
            hold_ms,
        });
        arrow
    }

    /// Waits; zero-length pauses are dropped
    pub fn pause(&mut self, ms: u64) {
        if ms > 0 {
            self.cues.push(Cue::Pause(ms));
        }
    }

    /// Includes an event or arrow in the borrow loop
    pub fn mark_looping(&mut self, target: LoopTarget) {
        self.loop_targets.push(target);
    }

    /// Records a resolved borrow chain
    pub fn push_chain(&mut self, chain: BorrowChain) {
        self.borrow_chains.push(chain);
    }

    /// Freezes the trace
    #[must_use]
    pub fn finish(self, result: impl Into<String>) -> StepTrace {
        StepTrace {
            events: self.events,
            cues: self.cues,
            result: result.into(),
            total_rows: self.total_rows,
            total_cols: self.total_cols,
            borrow_chains: self.borrow_chains,
            loop_targets: self.loop_targets,
        }
    }
}

/// Maps positions of a right-aligned digit block to grid columns, leaving
/// one column for the decimal comma when `scale > 0`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DigitColumns {
    first: usize,
    width: usize,
    scale: usize,
}

impl DigitColumns {
    pub(crate) const fn new(first: usize, width: usize, scale: usize) -> Self {
        Self {
            first,
            width,
            scale,
        }
    }

    /// Column of the leftmost digit cell
    pub(crate) const fn first(&self) -> usize {
        self.first
    }

    /// Column of digit `index` (0 = most significant of the block)
    pub(crate) const fn col(&self, index: usize) -> usize {
        let after_comma = self.scale > 0 && index >= self.width - self.scale;
        self.first + index + after_comma as usize
    }

    /// One past the last column of the block
    pub(crate) const fn end(&self) -> usize {
        self.first + self.width + (self.scale > 0) as usize
    }

    /// Shows `digits` right-aligned in the block, one event per digit,
    /// with the comma when the number reaches it. Returns the digit events
    /// indexed by block position.
    pub(crate) fn show_number(
        &self,
        trace: &mut TraceBuilder,
        digits: &str,
        row: usize,
        role: Role,
        hold_ms: u64,
    ) -> HashMap<usize, usize> {
        let len = digits.chars().count();
        debug_assert!(len <= self.width);
        let offset = self.width - len;
        let mut placed = HashMap::with_capacity(len);
        for (k, ch) in digits.chars().enumerate() {
            let index = offset + k;
            if self.scale > 0 && index == self.width - self.scale {
                trace.show_text(",", row, self.col(index) - 1, role, 0);
            }
            placed.insert(index, trace.show_text(ch, row, self.col(index), role, hold_ms));
        }
        placed
    }
}

/// Left-pads a digit string with zeros to at least `scale + 1` digits
pub(crate) fn pad_to_scale(digits: String, scale: usize) -> String {
    left_pad(&digits, scale + 1)
}

/// Left-pads with zeros to `width`
pub(crate) fn left_pad(digits: &str, width: usize) -> String {
    format!("{digits:0>width$}")
}

/// Inserts the decimal comma `scale` digits from the right
pub(crate) fn with_comma(digits: &str, scale: usize) -> String {
    if scale == 0 {
        return digits.to_string();
    }
    let (int, frac) = digits.split_at(digits.len() - scale);
    format!("{int},{frac}")
}

/// Byte digits of an ASCII digit string
pub(crate) fn digit_values(digits: &str) -> Vec<u8> {
    digits.bytes().map(|b| b - b'0').collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ===== VisualEvent tests =====

    #[test]
    fn test_event_span() {
        assert_eq!(VisualEvent::new("12", 0, 3, Role::Product).span(), 2);
        assert_eq!(VisualEvent::new("10", 0, 3, Role::Carry).span(), 1);
        assert_eq!(VisualEvent::new("──", 0, 0, Role::Line).cells().count(), 0);
        assert!(VisualEvent::new("│", 0, 0, Role::Line).is_vertical_rule());
    }

    #[test]
    fn test_event_cells() {
        let cells: Vec<_> = VisualEvent::new("345", 2, 1, Role::Dividend).cells().collect();
        assert_eq!(cells, vec![(2, 1), (2, 2), (2, 3)]);
    }

    // ===== Builder and settled state tests =====

    #[test]
    fn test_settled_drops_hidden_and_marks_struck() {
        let mut b = TraceBuilder::new(2, 3);
        let a = b.show_text("1", 0, 0, Role::Dividend, 0);
        let t = b.show_text("9", 1, 0, Role::Product, 100);
        b.hide(t, 0);
        b.strike(a, 50);
        b.pause(0);
        b.pause(25);
        let trace = b.finish("1");
        let settled = trace.settled();
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].event.text, "1");
        assert!(settled[0].struck);
        assert_eq!(trace.total_hold_ms(), 175);
        assert!(!trace.is_synchronous());
        assert_eq!(trace.cues().len(), 5);
    }

    #[test]
    fn test_find_overlap() {
        let mut b = TraceBuilder::new(1, 4);
        b.show_text("12", 0, 0, Role::Dividend, 0);
        b.show_text("3", 0, 1, Role::Quotient, 0);
        assert_eq!(b.finish("").find_overlap(), Some((0, 1)));
    }

    #[test]
    fn test_rules_never_overlap() {
        let mut b = TraceBuilder::new(1, 4);
        b.show_text("12", 0, 0, Role::Dividend, 0);
        b.rule(0, 0, 4, 0);
        let trace = b.finish("");
        assert_eq!(trace.find_overlap(), None);
        assert!(trace.is_synchronous());
    }

    // ===== Digit column tests =====

    #[test]
    fn test_digit_columns_skip_comma() {
        let cols = DigitColumns::new(1, 4, 2);
        assert_eq!(cols.col(0), 1);
        assert_eq!(cols.col(1), 2);
        assert_eq!(cols.col(2), 4);
        assert_eq!(cols.end(), 6);
    }

    #[test]
    fn test_show_number_places_comma() {
        let cols = DigitColumns::new(0, 3, 2);
        let mut b = TraceBuilder::new(1, cols.end());
        let placed = cols.show_number(&mut b, "125", 0, Role::Quotient, 0);
        let trace = b.finish("1,25");
        assert_eq!(placed.len(), 3);
        assert_eq!(trace.row_text(0), "1,25");
        assert_eq!(trace.find_overlap(), None);
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(pad_to_scale("5".into(), 2), "005");
        assert_eq!(with_comma("005", 2), "0,05");
        assert_eq!(with_comma("42", 0), "42");
        assert_eq!(left_pad("7", 3), "007");
        assert_eq!(digit_values("907"), vec![9, 0, 7]);
    }
}
