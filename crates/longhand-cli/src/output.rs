//! Terminal output: styled text renderings of the calculator surface

use console::{Style, Term};
use longhand::prelude::*;
use longhand::render::TextGrid;

/// Style of a character drawn by a mark of `kind`
#[must_use]
pub fn style_for(kind: Option<MarkKind>) -> Style {
    match kind {
        Some(MarkKind::Cell(Role::Quotient)) => Style::new().green().bold(),
        Some(MarkKind::Cell(Role::Carry)) => Style::new().cyan(),
        Some(MarkKind::Cell(Role::Product)) => Style::new().yellow(),
        Some(MarkKind::Cell(Role::Remainder)) => Style::new().magenta(),
        Some(MarkKind::Cell(Role::Divisor)) => Style::new().blue(),
        Some(MarkKind::Rule | MarkKind::Arrow) => Style::new().dim(),
        Some(MarkKind::ErrorMessage) => Style::new().red().bold(),
        Some(MarkKind::Cell(_)) | None => Style::new(),
    }
}

/// Renders marks as terminal lines, colored when `color` is set
#[must_use]
pub fn render_lines(marks: &[RenderedMark], color: bool) -> Vec<String> {
    let grid = TextGrid::from_marks(marks);
    if !color {
        return grid.to_plain().lines().map(str::to_string).collect();
    }
    grid.lines()
        .iter()
        .map(|line| {
            let mut out = String::new();
            for cell in line {
                let mut style = style_for(cell.kind).force_styling(true);
                if cell.struck {
                    style = style.strikethrough();
                }
                out.push_str(&style.apply_to(cell.ch).to_string());
            }
            out.trim_end().to_string()
        })
        .collect()
}

/// Output surface that keeps its marks in memory and can draw them on a
/// terminal, optionally after every mutation
#[derive(Debug)]
pub struct TerminalSurface {
    inner: MemorySurface,
    term: Term,
    color: bool,
    live: bool,
    drawn: usize,
}

impl TerminalSurface {
    /// Creates a surface of the given pixel size writing to stdout
    #[must_use]
    pub fn new(width: f64, height: f64, color: bool) -> Self {
        Self {
            inner: MemorySurface::new(width, height),
            term: Term::stdout(),
            color,
            live: false,
            drawn: 0,
        }
    }

    /// Redraw after each mutation; ignored when stdout is not a terminal
    #[must_use]
    pub fn with_live(mut self, live: bool) -> Self {
        self.live = live && self.term.is_term();
        self
    }

    /// True when mutations are drawn as they happen
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }

    /// Current rendering as lines
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        render_lines(&self.inner.marks(), self.color)
    }

    /// Draws the current state, replacing a previous live frame
    pub fn present(&mut self) {
        if self.drawn > 0 {
            let _ = self.term.clear_last_lines(self.drawn);
        }
        let lines = self.lines();
        for line in &lines {
            let _ = self.term.write_line(line);
        }
        self.drawn = lines.len();
    }

    fn refresh(&mut self) {
        if self.live {
            self.present();
        }
    }
}

impl OutputSurface for TerminalSurface {
    fn size(&self) -> (f64, f64) {
        self.inner.size()
    }

    fn clear(&mut self) {
        self.inner.clear();
        self.refresh();
    }

    fn append(&mut self, mark: RenderedMark) -> MarkId {
        let id = self.inner.append(mark);
        self.refresh();
        id
    }

    fn remove(&mut self, id: MarkId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            self.refresh();
        }
        removed
    }

    fn strike(&mut self, id: MarkId) -> bool {
        let struck = self.inner.strike(id);
        if struck {
            self.refresh();
        }
        struck
    }

    // nothing visible changes on a pulse
    fn highlight(&mut self, id: MarkId) -> bool {
        self.inner.highlight(id)
    }

    fn marks(&self) -> Vec<RenderedMark> {
        self.inner.marks()
    }
}
