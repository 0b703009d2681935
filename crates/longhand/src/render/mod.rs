//! Output surfaces.
//!
//! The sequencer draws [`RenderedMark`]s onto an [`OutputSurface`]: a
//! positioned piece of text, a rule, a borrow arrow or an error message.
//! Front ends implement the trait for their real canvas; [`MemorySurface`]
//! keeps everything in memory and records every mutation, which is what the
//! tests and the terminal front end use.

pub mod extract;
pub mod text;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::layout::LayoutMetrics;
use crate::trace::{Role, VisualEvent};

pub use extract::{extract_result_text, RESULT_PLACEHOLDER};
pub use text::{render_text, TextCell, TextGrid};

/// Handle of a mark on a surface
pub type MarkId = u64;

/// Carry and borrow annotations are drawn smaller than digits
pub const CARRY_FONT_SCALE: f64 = 0.7;

/// Rule thickness relative to the cell size
const RULE_THICKNESS: f64 = 0.06;

/// Pixel rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// What a mark depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkKind {
    /// Text in one or more grid cells
    Cell(Role),
    /// Horizontal or vertical rule
    Rule,
    /// Borrow arrow between two columns
    Arrow,
    /// Whole-surface error text
    ErrorMessage,
}

/// A drawn element, positioned in pixels and on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedMark {
    pub text: String,
    pub kind: MarkKind,
    pub rect: Rect,
    pub font_size: f64,
    pub struck: bool,
    /// Grid row
    pub row: usize,
    /// Grid column of the first cell
    pub col: usize,
    /// Cells covered along the mark's direction
    pub span: usize,
}

impl RenderedMark {
    /// Positions a trace event
    #[must_use]
    pub fn from_event(event: &VisualEvent, metrics: &LayoutMetrics) -> Self {
        let cell = metrics.cell_size;
        let (left, top) = metrics.cell_origin(event.col_start, event.row);
        let span = event.span();
        let thickness = (cell * RULE_THICKNESS).max(1.0);

        let (kind, rect, font_size) = if event.is_vertical_rule() {
            let rect = Rect {
                left: left - thickness / 2.0,
                top,
                width: thickness,
                height: span as f64 * cell,
            };
            (MarkKind::Rule, rect, 0.0)
        } else if event.is_rule() {
            let rect = Rect {
                left,
                top: top - thickness / 2.0,
                width: span as f64 * cell,
                height: thickness,
            };
            (MarkKind::Rule, rect, 0.0)
        } else {
            let font = if event.role == Role::Carry {
                metrics.font_size * CARRY_FONT_SCALE
            } else {
                metrics.font_size
            };
            let rect = Rect {
                left,
                top,
                width: span as f64 * cell,
                height: cell,
            };
            (MarkKind::Cell(event.role), rect, font)
        };

        Self {
            text: event.text.clone(),
            kind,
            rect,
            font_size,
            struck: false,
            row: event.row,
            col: event.col_start,
            span,
        }
    }

    /// Borrow arrow above `row`, pointing from `from_col` to `to_col`
    #[must_use]
    pub fn arrow(row: usize, from_col: usize, to_col: usize, metrics: &LayoutMetrics) -> Self {
        let (lo, hi) = (from_col.min(to_col), from_col.max(to_col));
        let (left, top) = metrics.cell_origin(lo, row);
        let cell = metrics.cell_size;
        Self {
            text: if from_col <= to_col { "→" } else { "←" }.to_string(),
            kind: MarkKind::Arrow,
            rect: Rect {
                left: left + cell / 2.0,
                top: top - cell / 2.0,
                width: (hi - lo) as f64 * cell,
                height: cell / 2.0,
            },
            font_size: metrics.font_size * CARRY_FONT_SCALE,
            struck: false,
            row,
            col: lo,
            span: hi - lo + 1,
        }
    }

    /// Error text filling a surface of the given size
    #[must_use]
    pub fn error(message: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            text: message.into(),
            kind: MarkKind::ErrorMessage,
            rect: Rect {
                left: 0.0,
                top: 0.0,
                width,
                height,
            },
            font_size: (height / 10.0).clamp(12.0, 24.0),
            struck: false,
            row: 0,
            col: 0,
            span: 0,
        }
    }

    /// True for a downward rule
    #[must_use]
    pub fn is_vertical_rule(&self) -> bool {
        self.kind == MarkKind::Rule && self.text.starts_with('│')
    }

    /// Role of a cell mark
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        match self.kind {
            MarkKind::Cell(role) => Some(role),
            _ => None,
        }
    }
}

/// Drawing target for traces
pub trait OutputSurface {
    /// Surface size in pixels
    fn size(&self) -> (f64, f64);

    /// Removes every mark
    fn clear(&mut self);

    /// Adds a mark and returns its handle
    fn append(&mut self, mark: RenderedMark) -> MarkId;

    /// Removes a mark; false if it is gone already
    fn remove(&mut self, id: MarkId) -> bool;

    /// Strikes a mark through; false if it does not exist
    fn strike(&mut self, id: MarkId) -> bool;

    /// Pulses a mark; false if it does not exist
    fn highlight(&mut self, id: MarkId) -> bool;

    /// Marks currently on the surface, in drawing order
    fn marks(&self) -> Vec<RenderedMark>;

    /// Replaces the content with an error message
    fn show_error(&mut self, message: &str) -> MarkId {
        self.clear();
        let (width, height) = self.size();
        self.append(RenderedMark::error(message, width, height))
    }
}

/// The expression input line
pub trait DisplaySurface {
    /// Current text
    fn text(&self) -> String;

    /// Replaces the text
    fn set_text(&mut self, text: &str);
}

/// Surface shared between a session and its playback task
pub type SharedSurface<S> = Arc<Mutex<S>>;

/// Wraps a surface for sharing
pub fn shared<S>(surface: S) -> SharedSurface<S> {
    Arc::new(Mutex::new(surface))
}

/// Locks a shared surface, recovering from poisoning
pub fn lock<S>(surface: &SharedSurface<S>) -> MutexGuard<'_, S> {
    surface.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One recorded surface mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOp {
    Clear,
    Append(MarkId),
    Remove(MarkId),
    Strike(MarkId),
    Highlight(MarkId),
}

/// In-memory output surface
#[derive(Debug, Clone)]
pub struct MemorySurface {
    width: f64,
    height: f64,
    marks: Vec<(MarkId, RenderedMark)>,
    next_id: MarkId,
    operations: Vec<SurfaceOp>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new(480.0, 320.0)
    }
}

impl MemorySurface {
    /// Creates an empty surface of the given pixel size
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            marks: Vec::new(),
            next_id: 1,
            operations: Vec::new(),
        }
    }

    /// Changes the pixel size
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Mark by handle
    #[must_use]
    pub fn get(&self, id: MarkId) -> Option<&RenderedMark> {
        self.marks.iter().find(|(m, _)| *m == id).map(|(_, mark)| mark)
    }

    /// Number of marks on the surface
    #[must_use]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// True when nothing is drawn
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Every mutation since creation
    #[must_use]
    pub fn operations(&self) -> &[SurfaceOp] {
        &self.operations
    }

    /// Number of highlight pulses so far
    #[must_use]
    pub fn highlight_count(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, SurfaceOp::Highlight(_)))
            .count()
    }

    fn position(&self, id: MarkId) -> Option<usize> {
        self.marks.iter().position(|(m, _)| *m == id)
    }
}

impl OutputSurface for MemorySurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.marks.clear();
        self.operations.push(SurfaceOp::Clear);
    }

    fn append(&mut self, mark: RenderedMark) -> MarkId {
        let id = self.next_id;
        self.next_id += 1;
        self.marks.push((id, mark));
        self.operations.push(SurfaceOp::Append(id));
        id
    }

    fn remove(&mut self, id: MarkId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.marks.remove(pos);
        self.operations.push(SurfaceOp::Remove(id));
        true
    }

    fn strike(&mut self, id: MarkId) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.marks[pos].1.struck = true;
        self.operations.push(SurfaceOp::Strike(id));
        true
    }

    fn highlight(&mut self, id: MarkId) -> bool {
        if self.position(id).is_none() {
            return false;
        }
        self.operations.push(SurfaceOp::Highlight(id));
        true
    }

    fn marks(&self) -> Vec<RenderedMark> {
        self.marks.iter().map(|(_, mark)| mark.clone()).collect()
    }
}

/// In-memory expression line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryDisplay {
    text: String,
}

impl MemoryDisplay {
    /// Creates a display showing `text`
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

impl DisplaySurface for MemoryDisplay {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;

    fn metrics() -> LayoutMetrics {
        compute_layout(4, 4, 400.0, 400.0)
    }

    // ===== RenderedMark tests =====

    #[test]
    fn test_cell_mark_geometry() {
        let m = metrics();
        let mark = RenderedMark::from_event(&VisualEvent::new("12", 1, 2, Role::Dividend), &m);
        let (left, top) = m.cell_origin(2, 1);
        assert_eq!(mark.rect.left, left);
        assert_eq!(mark.rect.top, top);
        assert_eq!(mark.rect.width, 2.0 * m.cell_size);
        assert_eq!(mark.font_size, m.font_size);
        assert_eq!(mark.role(), Some(Role::Dividend));
        assert_eq!((mark.row, mark.col, mark.span), (1, 2, 2));
    }

    #[test]
    fn test_carry_is_smaller() {
        let m = metrics();
        let mark = RenderedMark::from_event(&VisualEvent::new("10", 0, 1, Role::Carry), &m);
        assert!(mark.font_size < m.font_size);
        assert_eq!(mark.span, 1);
    }

    #[test]
    fn test_rule_marks() {
        let m = metrics();
        let h = RenderedMark::from_event(&VisualEvent::new("───", 2, 0, Role::Line), &m);
        assert_eq!(h.kind, MarkKind::Rule);
        assert!(!h.is_vertical_rule());
        assert_eq!(h.rect.width, 3.0 * m.cell_size);
        let v = RenderedMark::from_event(&VisualEvent::new("││", 0, 1, Role::Line), &m);
        assert!(v.is_vertical_rule());
        assert_eq!(v.rect.height, 2.0 * m.cell_size);
        assert_eq!(v.role(), None);
    }

    #[test]
    fn test_arrow_mark() {
        let arrow = RenderedMark::arrow(0, 1, 2, &metrics());
        assert_eq!(arrow.text, "→");
        assert_eq!((arrow.col, arrow.span), (1, 2));
        assert_eq!(RenderedMark::arrow(0, 3, 2, &metrics()).text, "←");
    }

    // ===== MemorySurface tests =====

    #[test]
    fn test_memory_surface_mutations() {
        let mut surface = MemorySurface::default();
        let mark = RenderedMark::from_event(&VisualEvent::new("7", 0, 0, Role::Dividend), &metrics());
        let a = surface.append(mark.clone());
        let b = surface.append(mark);
        assert_ne!(a, b);
        assert!(surface.strike(a));
        assert!(surface.get(a).unwrap().struck);
        assert!(surface.highlight(b));
        assert!(surface.remove(b));
        assert!(!surface.remove(b));
        assert!(!surface.highlight(b));
        assert_eq!(surface.len(), 1);
        assert_eq!(surface.highlight_count(), 1);
        surface.clear();
        assert!(surface.is_empty());
        assert_eq!(surface.operations().last(), Some(&SurfaceOp::Clear));
    }

    #[test]
    fn test_show_error_replaces_content() {
        let mut surface = MemorySurface::new(300.0, 200.0);
        surface.append(RenderedMark::arrow(0, 0, 1, &metrics()));
        surface.show_error("Division by zero is not defined");
        let marks = surface.marks();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].kind, MarkKind::ErrorMessage);
        assert_eq!(marks[0].rect.width, 300.0);
    }

    #[test]
    fn test_shared_lock() {
        let surface = shared(MemorySurface::default());
        lock(&surface).append(RenderedMark::error("x", 1.0, 1.0));
        assert_eq!(lock(&surface).len(), 1);
    }

    #[test]
    fn test_memory_display() {
        let mut display = MemoryDisplay::new("12+3");
        assert_eq!(display.text(), "12+3");
        display.set_text("");
        assert_eq!(display.text(), "");
    }
}
