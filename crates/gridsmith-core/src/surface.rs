//! Mapping between screen pixels and board space.

use crate::grid::Grid;
use kurbo::{Affine, Point, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default on-screen size of one cell in pixels.
pub const DEFAULT_CELL_SIZE: f64 = 48.0;

/// Pan/zoom transform of the editing surface.
///
/// Board space has one unit per cell; `cell_size` is the number of screen
/// pixels per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTransform {
    pub offset: Vec2,
    pub cell_size: f64,
    pub min_cell_size: f64,
    pub max_cell_size: f64,
}

impl Default for SurfaceTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            cell_size: DEFAULT_CELL_SIZE,
            min_cell_size: 4.0,
            max_cell_size: 400.0,
        }
    }
}

impl SurfaceTransform {
    pub fn new(offset: Vec2, cell_size: f64) -> Self {
        Self {
            offset,
            cell_size,
            ..Self::default()
        }
    }

    /// Screen pixels equal board units.
    pub fn identity() -> Self {
        Self::new(Vec2::ZERO, 1.0)
    }

    /// Board-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.cell_size)
    }

    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.cell_size) * Affine::translate(-self.offset)
    }

    pub fn screen_to_board(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn board_to_screen(&self, board_point: Point) -> Point {
        self.transform() * board_point
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping `screen_point` fixed over the same board position.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_size = (self.cell_size * factor).clamp(self.min_cell_size, self.max_cell_size);
        if (new_size - self.cell_size).abs() < f64::EPSILON {
            return;
        }

        let board_point = self.screen_to_board(screen_point);
        self.cell_size = new_size;
        let new_screen = self.board_to_screen(board_point);
        self.offset += screen_point - new_screen;
    }

    /// Fit the grid plus an outside ring into a viewport and center it.
    pub fn fit_grid(&mut self, grid: Grid, ring: i32, viewport: Size, padding: f64) {
        let bounds = grid.surface(ring);
        if bounds.is_zero_area() {
            return;
        }

        let available = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        self.cell_size = (available.width / bounds.width())
            .min(available.height / bounds.height())
            .clamp(self.min_cell_size, self.max_cell_size);

        let center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - center.x * self.cell_size,
            viewport.height / 2.0 - center.y * self.cell_size,
        );
    }
}
