//! Lookup helpers over constraint instances.
//!
//! Every scanner visits instances in store order and considers disabled
//! elements too, so editing a disabled constraint still finds it.

use super::{ConstraintRef, ConstraintStore};
use crate::constraint::{Constraint, ConstraintData, ToolId};
use crate::grid::{Direction, GridCoord, HalfCoord};

fn same_cell_set(a: &[GridCoord], b: &[GridCoord]) -> bool {
    a.len() == b.len() && a.iter().all(|cell| b.contains(cell))
}

impl ConstraintStore {
    /// Instances of `tool` matching `predicate`.
    pub fn find_where(
        &self,
        tool: ToolId,
        mut predicate: impl FnMut(&Constraint) -> bool,
    ) -> Vec<ConstraintRef> {
        self.constraints()
            .filter(|(_, constraint)| constraint.tool == tool && predicate(constraint))
            .map(|(target, _)| target)
            .collect()
    }

    /// The first instance of `tool` matching `predicate`.
    pub fn find_first(
        &self,
        tool: ToolId,
        mut predicate: impl FnMut(&Constraint) -> bool,
    ) -> Option<ConstraintRef> {
        self.constraints()
            .find(|(_, constraint)| constraint.tool == tool && predicate(constraint))
            .map(|(target, _)| target)
    }

    /// Instances of `tool` covering `cell`.
    pub fn find_by_cell(&self, tool: ToolId, cell: GridCoord) -> Vec<ConstraintRef> {
        self.find_where(tool, |c| c.data.contains_cell(cell))
    }

    /// The instance of `tool` whose cells are exactly `cells`, in any order.
    pub fn find_by_cells_exact(&self, tool: ToolId, cells: &[GridCoord]) -> Option<ConstraintRef> {
        self.find_first(tool, |c| same_cell_set(&c.data.cells(), cells))
    }

    /// Instances of `tool` covering every cell of `cells`.
    pub fn find_by_cells_subset(&self, tool: ToolId, cells: &[GridCoord]) -> Vec<ConstraintRef> {
        self.find_where(tool, |c| cells.iter().all(|&cell| c.data.contains_cell(cell)))
    }

    /// The instance of `tool` placed at a half-cell coordinate.
    pub fn find_by_coord(&self, tool: ToolId, coord: HalfCoord) -> Option<ConstraintRef> {
        self.find_first(tool, |c| {
            matches!(c.data, ConstraintData::CenterCornerOrEdge { coord: at, .. } if at == coord)
        })
    }

    /// The instance of `tool` at `cell` pointing in `direction`.
    pub fn find_by_direction(
        &self,
        tool: ToolId,
        cell: GridCoord,
        direction: Direction,
    ) -> Option<ConstraintRef> {
        self.find_first(tool, |c| match &c.data {
            ConstraintData::DirectedCell {
                cell: at,
                direction: d,
                ..
            }
            | ConstraintData::OutsideDirection {
                cell: at,
                direction: d,
                ..
            } => *at == cell && *d == direction,
            ConstraintData::DirectionSetCell {
                cell: at,
                directions,
            } => *at == cell && directions.contains(&direction),
            _ => false,
        })
    }

    /// The variable named `name`.
    pub fn find_variable(&self, name: &str) -> Option<ConstraintRef> {
        self.find_first(ToolId::Variable, |c| {
            matches!(&c.data, ConstraintData::Variable { name: n, .. } if n == name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn cell(row: i32, col: i32) -> GridCoord {
        GridCoord::new(row, col)
    }

    fn store() -> ConstraintStore {
        let mut store = ConstraintStore::new();
        store.add_local_constraint(Constraint::new(
            ToolId::KillerCage,
            ConstraintData::Cage {
                cells: vec![cell(0, 0), cell(0, 1), cell(1, 1)],
                value: None,
            },
        ));
        store.add_local_constraint(Constraint::new(
            ToolId::KropkiWhite,
            ConstraintData::Edge {
                cells: [cell(2, 2), cell(2, 3)],
                value: None,
            },
        ));
        store.add_local_constraint(Constraint::new(
            ToolId::CellArrows,
            ConstraintData::DirectionSetCell {
                cell: cell(4, 4),
                directions: BTreeSet::from([Direction::Up, Direction::Left]),
            },
        ));
        store
    }

    #[test]
    fn test_find_by_cell_filters_tool() {
        let store = store();
        assert_eq!(store.find_by_cell(ToolId::KillerCage, cell(1, 1)).len(), 1);
        assert!(store.find_by_cell(ToolId::ExtraRegion, cell(1, 1)).is_empty());
        assert!(store.find_by_cell(ToolId::KillerCage, cell(5, 5)).is_empty());
    }

    #[test]
    fn test_exact_match_ignores_order() {
        let store = store();
        assert!(store
            .find_by_cells_exact(ToolId::KropkiWhite, &[cell(2, 3), cell(2, 2)])
            .is_some());
        assert!(store
            .find_by_cells_exact(ToolId::KropkiWhite, &[cell(2, 2)])
            .is_none());
    }

    #[test]
    fn test_subset_match() {
        let store = store();
        assert_eq!(
            store
                .find_by_cells_subset(ToolId::KillerCage, &[cell(0, 1), cell(1, 1)])
                .len(),
            1
        );
        assert!(store
            .find_by_cells_subset(ToolId::KillerCage, &[cell(0, 1), cell(2, 2)])
            .is_empty());
    }

    #[test]
    fn test_find_by_direction() {
        let store = store();
        assert!(store
            .find_by_direction(ToolId::CellArrows, cell(4, 4), Direction::Left)
            .is_some());
        assert!(store
            .find_by_direction(ToolId::CellArrows, cell(4, 4), Direction::Down)
            .is_none());
    }
}
