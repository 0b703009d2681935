//! Plain-text rendering of surface marks.
//!
//! Each grid cell becomes one character. A horizontal rule or a borrow
//! arrow gets a text line of its own, inserted above the row whose top edge
//! it lies on. A vertical rule is drawn in the character of the cell to its
//! right; generators keep that cell empty. Where rules meet they are joined
//! with box-drawing corners.

use std::collections::{BTreeSet, HashMap};

use crate::render::{MarkKind, RenderedMark};

const NORTH: u8 = 1;
const EAST: u8 = 2;
const SOUTH: u8 = 4;
const WEST: u8 = 8;

/// One character of rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextCell {
    pub ch: char,
    /// Kind of the mark that drew the character; `None` for padding
    pub kind: Option<MarkKind>,
    pub struck: bool,
}

impl TextCell {
    const BLANK: Self = Self {
        ch: ' ',
        kind: None,
        struck: false,
    };
}

/// Marks laid out as lines of characters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextGrid {
    lines: Vec<Vec<TextCell>>,
}

/// Grid-to-text line mapping
struct Rows {
    rule_rows: BTreeSet<usize>,
}

impl Rows {
    /// Text line of grid row `row`
    fn y(&self, row: usize) -> usize {
        row + self.rule_rows.range(..=row).count()
    }

    /// Text line of the rule on the top edge of `row`
    fn rule_y(&self, row: usize) -> usize {
        row + self.rule_rows.range(..row).count()
    }
}

fn box_glyph(flags: u8) -> char {
    match flags {
        f if f == NORTH | EAST => '└',
        f if f == NORTH | WEST => '┘',
        f if f == SOUTH | EAST => '┌',
        f if f == SOUTH | WEST => '┐',
        f if f == NORTH | SOUTH | EAST => '├',
        f if f == NORTH | SOUTH | WEST => '┤',
        f if f == EAST | WEST | SOUTH => '┬',
        f if f == EAST | WEST | NORTH => '┴',
        f if f == NORTH | EAST | SOUTH | WEST => '┼',
        f if f & (EAST | WEST) != 0 => '─',
        _ => '│',
    }
}

/// Characters of a cell mark, at most `span` of them
///
/// Numbers that do not fit a single cell (a borrowed `10`) become circled
/// digits; anything else keeps its first `span` characters.
fn fit_to_span(text: &str, span: usize) -> Vec<char> {
    let span = span.max(1);
    if text.chars().count() <= span {
        return text.chars().collect();
    }
    if span == 1 {
        let circled = match text.parse::<u32>() {
            Ok(0) => Some('⓪'),
            Ok(n @ 1..=20) => char::from_u32(0x2460 + n - 1),
            _ => None,
        };
        if let Some(ch) = circled {
            return vec![ch];
        }
    }
    text.chars().take(span).collect()
}

impl TextGrid {
    /// Lays out marks; an error message replaces everything else
    #[must_use]
    pub fn from_marks(marks: &[RenderedMark]) -> Self {
        if let Some(error) = marks.iter().find(|m| m.kind == MarkKind::ErrorMessage) {
            let line = error
                .text
                .chars()
                .map(|ch| TextCell {
                    ch,
                    kind: Some(MarkKind::ErrorMessage),
                    struck: false,
                })
                .collect();
            return Self { lines: vec![line] };
        }

        let rows = Rows {
            rule_rows: marks
                .iter()
                .filter(|m| {
                    m.kind == MarkKind::Arrow || (m.kind == MarkKind::Rule && !m.is_vertical_rule())
                })
                .map(|m| m.row)
                .collect(),
        };

        let mut flags: HashMap<(usize, usize), u8> = HashMap::new();
        let mut cells: HashMap<(usize, usize), TextCell> = HashMap::new();

        for mark in marks.iter().filter(|m| m.kind == MarkKind::Rule && !m.is_vertical_rule()) {
            let line = rows.rule_y(mark.row);
            let start = mark.col;
            let end = mark.col + mark.span.max(1) - 1;
            for x in start..=end {
                let mut f = 0;
                if x > start || start == end {
                    f |= WEST;
                }
                if x < end || start == end {
                    f |= EAST;
                }
                *flags.entry((line, x)).or_default() |= f;
            }
        }

        for mark in marks.iter().filter(|m| m.is_vertical_rule()) {
            let x = mark.col;
            let last_row = mark.row + mark.span.max(1) - 1;
            let mut top = rows.y(mark.row);
            let mut bottom = rows.y(last_row);
            // reach into an adjoining rule line so the corner joins
            if rows.rule_rows.contains(&mark.row) && flags.contains_key(&(rows.rule_y(mark.row), x))
            {
                top = rows.rule_y(mark.row);
            }
            let below = last_row + 1;
            if rows.rule_rows.contains(&below) && flags.contains_key(&(rows.rule_y(below), x)) {
                bottom = rows.rule_y(below);
            }
            for line in top..=bottom {
                let mut f = 0;
                if line > top || top == bottom {
                    f |= NORTH;
                }
                if line < bottom || top == bottom {
                    f |= SOUTH;
                }
                *flags.entry((line, x)).or_default() |= f;
            }
        }

        for (&pos, &f) in &flags {
            cells.insert(
                pos,
                TextCell {
                    ch: box_glyph(f),
                    kind: Some(MarkKind::Rule),
                    struck: false,
                },
            );
        }

        for mark in marks.iter().filter(|m| m.kind == MarkKind::Arrow) {
            let line = rows.rule_y(mark.row);
            let start = mark.col;
            let end = mark.col + mark.span.max(1) - 1;
            let rightward = mark.text != "←";
            for x in start..=end {
                let ch = match (rightward, x == start, x == end) {
                    (true, _, true) => '→',
                    (false, true, _) => '←',
                    _ => '─',
                };
                cells.insert(
                    (line, x),
                    TextCell {
                        ch,
                        kind: Some(MarkKind::Arrow),
                        struck: false,
                    },
                );
            }
        }

        for mark in marks.iter().filter(|m| matches!(m.kind, MarkKind::Cell(_))) {
            let line = rows.y(mark.row);
            for (k, ch) in fit_to_span(&mark.text, mark.span).into_iter().enumerate() {
                cells.insert(
                    (line, mark.col + k),
                    TextCell {
                        ch,
                        kind: Some(mark.kind),
                        struck: mark.struck,
                    },
                );
            }
        }

        let height = cells.keys().map(|(line, _)| line + 1).max().unwrap_or(0);
        let mut lines = vec![Vec::new(); height];
        for ((line, x), cell) in cells {
            let row = &mut lines[line];
            if row.len() <= x {
                row.resize(x + 1, TextCell::BLANK);
            }
            row[x] = cell;
        }
        lines.retain(|line| line.iter().any(|c| c.ch != ' '));
        Self { lines }
    }

    /// Rendered lines, blank ones dropped
    #[must_use]
    pub fn lines(&self) -> &[Vec<TextCell>] {
        &self.lines
    }

    /// Lines joined with `\n`, trailing spaces trimmed
    #[must_use]
    pub fn to_plain(&self) -> String {
        self.lines
            .iter()
            .map(|line| {
                let text: String = line.iter().map(|c| c.ch).collect();
                text.trim_end().to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Plain text of a set of marks
#[must_use]
pub fn render_text(marks: &[RenderedMark]) -> String {
    TextGrid::from_marks(marks).to_plain()
}
