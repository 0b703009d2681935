//! Reads the final result back off a rendered surface.
//!
//! History entries written by older front ends carry only the rendered
//! marks. The result is the lowest row of quotient/product cells, read left
//! to right.

use std::collections::BTreeMap;

use crate::render::{MarkKind, RenderedMark};
use crate::trace::Role;

/// Text returned when nothing on the surface looks like a result
pub const RESULT_PLACEHOLDER: &str = "Result not available";

/// Best-effort result text of a rendered trace
#[must_use]
pub fn extract_result_text(marks: &[RenderedMark]) -> String {
    let mut rows: BTreeMap<i64, Vec<&RenderedMark>> = BTreeMap::new();
    for mark in marks {
        if matches!(mark.kind, MarkKind::Cell(Role::Quotient | Role::Product)) {
            // rounding groups marks whose tops differ by float noise
            let key = mark.rect.top.round() as i64;
            rows.entry(key).or_default().push(mark);
        }
    }

    if let Some((_, mut row)) = rows.pop_last() {
        row.sort_by(|a, b| a.rect.left.total_cmp(&b.rect.left));
        return row.iter().map(|m| m.text.as_str()).collect();
    }

    if let Some(error) = marks.iter().find(|m| m.kind == MarkKind::ErrorMessage) {
        return error.text.clone();
    }
    if let Some(rem) = marks
        .iter()
        .find(|m| m.kind == MarkKind::Cell(Role::Remainder))
    {
        return format!("Remainder: {}", rem.text);
    }
    RESULT_PLACEHOLDER.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layout::compute_layout;
    use crate::trace::VisualEvent;

    fn marks(events: &[(&str, usize, usize, Role)]) -> Vec<RenderedMark> {
        let metrics = compute_layout(6, 6, 480.0, 320.0);
        events
            .iter()
            .map(|(text, row, col, role)| {
                RenderedMark::from_event(&VisualEvent::new(*text, *row, *col, *role), &metrics)
            })
            .collect()
    }

    #[test]
    fn test_lowest_row_left_to_right() {
        let marks = marks(&[
            ("5", 0, 1, Role::Dividend),
            ("8", 2, 2, Role::Quotient),
            ("4", 2, 0, Role::Quotient),
            ("0", 2, 1, Role::Quotient),
            ("36", 1, 0, Role::Product),
        ]);
        assert_eq!(extract_result_text(&marks), "408");
    }

    #[test]
    fn test_falls_back_to_error_text() {
        let mut all = marks(&[("3", 0, 0, Role::Remainder)]);
        all.push(RenderedMark::error("No such thing", 100.0, 100.0));
        assert_eq!(extract_result_text(&all), "No such thing");
    }

    #[test]
    fn test_falls_back_to_remainder() {
        let marks = marks(&[("7", 0, 0, Role::Dividend), ("3", 1, 0, Role::Remainder)]);
        assert_eq!(extract_result_text(&marks), "Remainder: 3");
    }

    #[test]
    fn test_placeholder() {
        assert_eq!(extract_result_text(&[]), RESULT_PLACEHOLDER);
        let only_rules = marks(&[("──", 1, 0, Role::Line)]);
        assert_eq!(extract_result_text(&only_rules), RESULT_PLACEHOLDER);
    }

    #[test]
    fn test_extended_division_shares_row_with_product() {
        // quotient and first product share row 1; the extractor cannot tell
        let marks = marks(&[
            ("6", 1, 1, Role::Product),
            ("3", 1, 4, Role::Quotient),
            ("1", 2, 1, Role::Remainder),
        ]);
        assert_eq!(extract_result_text(&marks), "63");
    }
}
