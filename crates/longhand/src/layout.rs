//! Grid-to-pixel layout.
//!
//! A trace is laid out on an abstract grid of square cells. This module picks
//! the cell size that fits the grid into a surface and centers it.

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// Pixel geometry for one grid on one surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    /// Edge of a square cell
    pub cell_size: f64,
    /// Text size inside a cell
    pub font_size: f64,
    /// Horizontal centering offset inside the padded area
    pub offset_x: f64,
    /// Vertical centering offset inside the padded area
    pub offset_y: f64,
    /// Left padding of the surface
    pub padding_left: f64,
    /// Top padding of the surface
    pub padding_top: f64,
}

impl LayoutMetrics {
    /// Top-left pixel of a cell
    #[must_use]
    pub fn cell_origin(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.padding_left + self.offset_x + col as f64 * self.cell_size,
            self.padding_top + self.offset_y + row as f64 * self.cell_size,
        )
    }
}

/// Computes metrics with the default layout parameters
#[must_use]
pub fn compute_layout(
    grid_cols: usize,
    grid_rows: usize,
    surface_width: f64,
    surface_height: f64,
) -> LayoutMetrics {
    LayoutConfig::default().compute(grid_cols, grid_rows, surface_width, surface_height)
}

fn sanitize(extent: f64) -> f64 {
    if extent.is_finite() {
        extent.max(0.0)
    } else {
        0.0
    }
}

impl LayoutConfig {
    /// Fits a `grid_cols` x `grid_rows` grid into the surface
    #[must_use]
    pub fn compute(
        &self,
        grid_cols: usize,
        grid_rows: usize,
        surface_width: f64,
        surface_height: f64,
    ) -> LayoutMetrics {
        let width = sanitize(surface_width);
        let height = sanitize(surface_height);
        let cols = grid_cols.max(1) as f64;
        let rows = grid_rows.max(1) as f64;

        let padding_left = width * self.padding_ratio;
        let padding_top = height * self.padding_ratio;
        let avail_w = (width - 2.0 * padding_left).max(0.0);
        let avail_h = (height - 2.0 * padding_top).max(0.0);

        let cell_size = (avail_w / cols)
            .min(avail_h / rows)
            .max(self.min_cell)
            .min(self.max_cell);

        let metrics = LayoutMetrics {
            cell_size,
            font_size: cell_size * self.font_ratio,
            offset_x: ((avail_w - cols * cell_size) / 2.0).max(0.0),
            offset_y: ((avail_h - rows * cell_size) / 2.0).max(0.0),
            padding_left,
            padding_top,
        };
        tracing::debug!(grid_cols, grid_rows, cell = metrics.cell_size, "layout computed");
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_narrow_dimension() {
        let m = compute_layout(10, 2, 500.0, 500.0);
        // avail 460 wide: 46 per column beats 230 per row
        assert!((m.cell_size - 46.0).abs() < 1e-9);
        assert!((m.font_size - 46.0 * 0.7).abs() < 1e-9);
        assert!(m.offset_x.abs() < 1e-9);
        assert!((m.offset_y - (460.0 - 92.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamps_to_max() {
        let m = compute_layout(1, 1, 2000.0, 2000.0);
        assert_eq!(m.cell_size, 64.0);
    }

    #[test]
    fn test_clamps_to_min() {
        let m = compute_layout(200, 200, 100.0, 100.0);
        assert_eq!(m.cell_size, 14.0);
        assert_eq!(m.offset_x, 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let m = compute_layout(0, 0, f64::NAN, -5.0);
        assert_eq!(m.cell_size, 14.0);
        assert_eq!(m.padding_left, 0.0);
        assert!(m.offset_x >= 0.0 && m.offset_y >= 0.0);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(
            compute_layout(7, 5, 640.0, 480.0),
            compute_layout(7, 5, 640.0, 480.0)
        );
    }

    #[test]
    fn test_cell_origin() {
        let config = LayoutConfig {
            padding_ratio: 0.0,
            ..LayoutConfig::default()
        };
        let m = config.compute(4, 4, 200.0, 200.0);
        assert_eq!(m.cell_size, 50.0);
        assert_eq!(m.cell_origin(2, 1), (100.0, 50.0));
    }
}
