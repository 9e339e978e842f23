//! Shape rules shared by the drawing tools: line growth, connected groups and
//! region translation.

use crate::grid::{Grid, GridCoord};
use serde::{Deserialize, Serialize};

/// How a line reacts when it is dragged over cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineRule {
    /// Allow the line to cross itself.
    pub allow_self_intersection: bool,
    /// With crossings allowed, revisiting one of the last `retract_window`
    /// points before the tip still retracts instead of crossing.
    pub retract_window: usize,
    /// Allow diagonal steps.
    pub diagonal: bool,
}

impl Default for LineRule {
    fn default() -> Self {
        Self {
            allow_self_intersection: false,
            retract_window: 1,
            diagonal: true,
        }
    }
}

/// Outcome of [`grow_line`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStep {
    Appended,
    /// Cut back to the given length.
    Truncated(usize),
    Unchanged,
}

/// Extend `line` toward `point`.
///
/// Revisiting a point retracts the line to it. With self-intersection
/// allowed, only points within the retract window retract; older points are
/// crossed. New points must neighbour the tip.
pub fn grow_line(line: &mut Vec<GridCoord>, point: GridCoord, rule: &LineRule) -> LineStep {
    let Some(&tip) = line.last() else {
        line.push(point);
        return LineStep::Appended;
    };
    if tip == point {
        return LineStep::Unchanged;
    }
    if let Some(index) = line.iter().rposition(|&p| p == point) {
        let retract =
            !rule.allow_self_intersection || index + 1 + rule.retract_window >= line.len();
        if retract {
            line.truncate(index + 1);
            return LineStep::Truncated(index + 1);
        }
    }
    if tip.is_neighbor(point, rule.diagonal) {
        line.push(point);
        LineStep::Appended
    } else {
        LineStep::Unchanged
    }
}

/// Add `cell` to a connected group if it neighbours a member.
///
/// An empty group accepts any cell; members are never added twice.
pub fn add_to_connected_group(group: &mut Vec<GridCoord>, cell: GridCoord, diagonal: bool) -> bool {
    if group.contains(&cell) {
        return false;
    }
    if !group.is_empty() && !group.iter().any(|m| m.is_neighbor(cell, diagonal)) {
        return false;
    }
    group.push(cell);
    true
}

/// True if every cell is reachable from the first through neighbours.
pub fn is_connected(cells: &[GridCoord], diagonal: bool) -> bool {
    let Some(&first) = cells.first() else {
        return true;
    };
    let mut reached = vec![first];
    let mut frontier = vec![first];
    while let Some(cell) = frontier.pop() {
        for &other in cells {
            if !reached.contains(&other) && cell.is_neighbor(other, diagonal) {
                reached.push(other);
                frontier.push(other);
            }
        }
    }
    cells.iter().all(|cell| reached.contains(cell))
}

/// Shift cells by a delta; `None` if any cell would leave the grid.
pub fn translate_cells(
    cells: &[GridCoord],
    d_row: i32,
    d_col: i32,
    grid: Grid,
) -> Option<Vec<GridCoord>> {
    cells
        .iter()
        .map(|cell| {
            let moved = cell.offset(d_row, d_col);
            grid.contains(moved).then_some(moved)
        })
        .collect()
}

/// Inclusive bounding box as `(min, max)`.
pub fn bounding_box(cells: &[GridCoord]) -> Option<(GridCoord, GridCoord)> {
    let first = *cells.first()?;
    Some(cells.iter().fold((first, first), |(min, max), c| {
        (
            GridCoord::new(min.row.min(c.row), min.col.min(c.col)),
            GridCoord::new(max.row.max(c.row), max.col.max(c.col)),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(row: i32, col: i32) -> GridCoord {
        GridCoord::new(row, col)
    }

    fn line(points: &[(i32, i32)]) -> Vec<GridCoord> {
        points.iter().map(|&(r, col)| c(r, col)).collect()
    }

    #[test]
    fn test_append_adjacent() {
        let mut l = line(&[(0, 0)]);
        let rule = LineRule::default();
        assert_eq!(grow_line(&mut l, c(1, 1), &rule), LineStep::Appended);
        assert_eq!(grow_line(&mut l, c(3, 3), &rule), LineStep::Unchanged);
        assert_eq!(grow_line(&mut l, c(1, 1), &rule), LineStep::Unchanged);
        assert_eq!(l, line(&[(0, 0), (1, 1)]));
    }

    #[test]
    fn test_orthogonal_rule() {
        let mut l = line(&[(0, 0)]);
        let rule = LineRule {
            diagonal: false,
            ..LineRule::default()
        };
        assert_eq!(grow_line(&mut l, c(1, 1), &rule), LineStep::Unchanged);
        assert_eq!(grow_line(&mut l, c(1, 0), &rule), LineStep::Appended);
    }

    #[test]
    fn test_revisit_truncates_to_index() {
        let rule = LineRule::default();
        let original = line(&[(0, 0), (0, 1), (0, 2), (1, 2), (1, 1)]);
        for (i, &point) in original.iter().enumerate().take(original.len() - 1) {
            let mut l = original.clone();
            assert_eq!(grow_line(&mut l, point, &rule), LineStep::Truncated(i + 1));
            assert_eq!(l, original[..=i].to_vec());
        }
    }

    #[test]
    fn test_self_intersection_crosses_old_points() {
        let rule = LineRule {
            allow_self_intersection: true,
            ..LineRule::default()
        };
        let mut l = line(&[(0, 1), (1, 1), (1, 2), (0, 2)]);
        // (0, 1) is old and adjacent to the tip: cross it.
        assert_eq!(grow_line(&mut l, c(0, 1), &rule), LineStep::Appended);
        assert_eq!(l.len(), 5);
        // The previous point is within the window: retract.
        assert_eq!(grow_line(&mut l, c(0, 2), &rule), LineStep::Truncated(4));
    }

    #[test]
    fn test_connected_group_is_symmetric() {
        let a = c(2, 2);
        let b = c(2, 3);
        let mut ab = Vec::new();
        assert!(add_to_connected_group(&mut ab, a, false));
        assert!(add_to_connected_group(&mut ab, b, false));
        let mut ba = Vec::new();
        assert!(add_to_connected_group(&mut ba, b, false));
        assert!(add_to_connected_group(&mut ba, a, false));

        let mut group = vec![a];
        assert!(!add_to_connected_group(&mut group, c(3, 3), false));
        assert!(add_to_connected_group(&mut group, c(3, 3), true));
        assert!(!add_to_connected_group(&mut group, a, true));
    }

    #[test]
    fn test_is_connected() {
        assert!(is_connected(&line(&[(0, 0), (0, 1), (1, 1)]), false));
        assert!(!is_connected(&line(&[(0, 0), (1, 1)]), false));
        assert!(is_connected(&line(&[(0, 0), (1, 1)]), true));
        assert!(is_connected(&[], false));
    }

    #[test]
    fn test_translate_rejects_leaving_grid() {
        let grid = Grid::new(4, 4);
        let cells = line(&[(0, 0), (0, 1)]);
        assert_eq!(translate_cells(&cells, 1, 2, grid), Some(line(&[(1, 2), (1, 3)])));
        assert_eq!(translate_cells(&cells, 0, 3, grid), None);
        assert_eq!(translate_cells(&cells, -1, 0, grid), None);
    }

    #[test]
    fn test_bounding_box() {
        let cells = line(&[(2, 1), (0, 3), (1, 2)]);
        assert_eq!(bounding_box(&cells), Some((c(0, 1), c(2, 3))));
        assert_eq!(bounding_box(&[]), None);
    }
}
