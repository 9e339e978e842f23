//! Clone tool: two congruent cell groups that can be dragged around.
//!
//! A new clone is drawn as its first group; on release the second group is
//! placed next to it, trying right, below, left and above in that order.

use super::{
    Intent, ToolContext, ToolEvent, ToolInput, add_to_connected_group, bounding_box,
    translate_cells,
};
use crate::constraint::{Constraint, ConstraintData, ToolId};
use crate::grid::{Grid, GridCoord};
use crate::history::CommandBatch;
use crate::store::{AddConstraint, ConstraintRef, ConstraintStore, UpdateConstraint};

/// Gesture state of a [`CloneTool`].
#[derive(Debug, Default)]
pub enum CloneState {
    #[default]
    Idle,
    /// Drawing the first group of a new clone.
    Growing {
        target: ConstraintRef,
        created_element: bool,
    },
    /// Dragging one group of an existing clone.
    Moving {
        target: ConstraintRef,
        /// True when the second group is being moved.
        second: bool,
        anchor: GridCoord,
        original: Constraint,
    },
    Deleting {
        pending: CommandBatch<ConstraintStore>,
    },
}

#[derive(Debug, Clone)]
pub struct CloneTool {
    pub tool: ToolId,
    diagonal: bool,
}

fn groups(constraint: &Constraint) -> Option<(&Vec<GridCoord>, &Vec<GridCoord>)> {
    match &constraint.data {
        ConstraintData::Clone { cells, cells2, .. } => Some((cells, cells2)),
        _ => None,
    }
}

/// Where the copy of `cells` goes: the first side of its bounding box that
/// keeps every cell inside the grid.
fn place_copy(cells: &[GridCoord], grid: Grid) -> Option<Vec<GridCoord>> {
    let (min, max) = bounding_box(cells)?;
    let height = max.row - min.row + 1;
    let width = max.col - min.col + 1;
    [(0, width), (height, 0), (0, -width), (-height, 0)]
        .into_iter()
        .find_map(|(d_row, d_col)| translate_cells(cells, d_row, d_col, grid))
}

impl CloneTool {
    pub fn new(tool: ToolId, diagonal: bool) -> Self {
        Self { tool, diagonal }
    }

    fn clone_at(&self, store: &ConstraintStore, cell: GridCoord) -> Option<ConstraintRef> {
        store.find_by_cell(self.tool, cell).first().copied()
    }

    /// The first letter no other clone uses.
    fn next_label(&self, store: &ConstraintStore) -> Option<String> {
        let used: Vec<&str> = store
            .constraints()
            .filter(|(_, c)| c.tool == self.tool)
            .filter_map(|(_, c)| c.value())
            .collect();
        ('A'..='Z')
            .map(String::from)
            .find(|label| !used.contains(&label.as_str()))
    }

    fn drag_start(&self, cell: GridCoord, intent: Intent, ctx: &mut ToolContext) -> CloneState {
        if !ctx.grid.contains(cell) {
            return CloneState::Idle;
        }
        let existing = self.clone_at(ctx.store, cell);
        match intent {
            Intent::Delete => {
                let mut pending = CommandBatch::new();
                self.delete_at(&mut pending, ctx, cell);
                return CloneState::Deleting { pending };
            }
            Intent::Select => {
                match existing {
                    Some(target) => ctx.select(target),
                    None => ctx.clear_selection(),
                }
                return CloneState::Idle;
            }
            Intent::Dynamic => {
                let original =
                    existing.and_then(|t| ctx.store.constraint(t).cloned().map(|c| (t, c)));
                if let Some((target, original)) = original {
                    let second =
                        groups(&original).is_some_and(|(_, cells2)| cells2.contains(&cell));
                    ctx.select(target);
                    return CloneState::Moving {
                        target,
                        second,
                        anchor: cell,
                        original,
                    };
                }
            }
            Intent::AddEdit => {}
        }
        let data = ConstraintData::Clone {
            cells: vec![cell],
            cells2: Vec::new(),
            label: None,
        };
        let added = ctx.store.add_local_constraint(Constraint::new(self.tool, data));
        CloneState::Growing {
            target: added.target,
            created_element: added.created_element,
        }
    }

    fn delete_at(
        &self,
        pending: &mut CommandBatch<ConstraintStore>,
        ctx: &mut ToolContext,
        cell: GridCoord,
    ) {
        for target in ctx.store.find_by_cell(self.tool, cell) {
            if let Some(command) = ctx.remove_live(target) {
                pending.push(command);
            }
        }
    }

    fn grow(&self, ctx: &mut ToolContext, target: ConstraintRef, cell: GridCoord) {
        if self.clone_at(ctx.store, cell).is_some_and(|owner| owner != target) {
            return;
        }
        let Some(mut next) = ctx.store.constraint(target).cloned() else {
            return;
        };
        if let ConstraintData::Clone { cells, .. } = &mut next.data {
            if add_to_connected_group(cells, cell, self.diagonal) {
                ctx.store.update_constraint(target, next);
            }
        }
    }

    /// Translate the dragged group by the offset from the anchor. A step that
    /// would push any cell off the grid is ignored.
    fn shift(
        ctx: &mut ToolContext,
        target: ConstraintRef,
        second: bool,
        anchor: GridCoord,
        original: &Constraint,
        cell: GridCoord,
    ) {
        let (d_row, d_col) = anchor.delta_to(cell);
        let mut next = original.clone();
        let ConstraintData::Clone { cells, cells2, .. } = &mut next.data else {
            return;
        };
        let group = if second { cells2 } else { cells };
        let Some(moved) = translate_cells(group, d_row, d_col, ctx.grid) else {
            return;
        };
        *group = moved;
        if ctx.store.constraint(target) != Some(&next) {
            ctx.store.update_constraint(target, next);
        }
    }

    fn finish_new(&self, ctx: &mut ToolContext, target: ConstraintRef, created_element: bool) {
        let Some(mut next) = ctx.store.constraint(target).cloned() else {
            return;
        };
        let label = self.next_label(ctx.store);
        let ConstraintData::Clone { cells, cells2, label: slot } = &mut next.data else {
            return;
        };
        let Some(copy) = place_copy(cells, ctx.grid) else {
            log::debug!("no room for a copy of {} cells", cells.len());
            ctx.store.discard_constraint(target, created_element);
            return;
        };
        *cells2 = copy;
        *slot = label;
        ctx.store.update_constraint(target, next);
        if let Some(command) = AddConstraint::capture(ctx.store, target, created_element) {
            ctx.commit_one(command);
        }
        ctx.select(target);
    }

    pub fn handle(
        &self,
        mut state: CloneState,
        input: &ToolInput,
        ctx: &mut ToolContext,
    ) -> CloneState {
        match input.event {
            ToolEvent::DragStart(hit) => {
                Self::cancel(state, ctx);
                self.drag_start(hit.cell, Intent::from_modifiers(input.modifiers), ctx)
            }
            ToolEvent::Drag(hit) => {
                let cell = hit.cell;
                if !ctx.grid.contains(cell) {
                    return state;
                }
                match &mut state {
                    &mut CloneState::Growing { target, .. } => self.grow(ctx, target, cell),
                    CloneState::Moving {
                        target,
                        second,
                        anchor,
                        original,
                    } => Self::shift(ctx, *target, *second, *anchor, original, cell),
                    CloneState::Deleting { pending } => self.delete_at(pending, ctx, cell),
                    CloneState::Idle => {}
                }
                state
            }
            ToolEvent::DragEnd => {
                match state {
                    CloneState::Idle => {}
                    CloneState::Deleting { pending } => ctx.commit(pending),
                    CloneState::Growing {
                        target,
                        created_element,
                    } => self.finish_new(ctx, target, created_element),
                    CloneState::Moving {
                        target, original, ..
                    } => {
                        let current = ctx.store.constraint(target).cloned();
                        if let Some(current) = current.filter(|c| *c != original) {
                            ctx.commit_one(UpdateConstraint::new(target, original, current));
                        }
                    }
                }
                CloneState::Idle
            }
            ToolEvent::Tap { hit, count } => {
                if count >= 2 {
                    if let Some(target) = self.clone_at(ctx.store, hit.cell) {
                        if let Some(command) = ctx.remove_live(target) {
                            ctx.commit_one(command);
                            ctx.clear_selection();
                        }
                    }
                }
                state
            }
        }
    }

    pub fn cancel(state: CloneState, ctx: &mut ToolContext) {
        match state {
            CloneState::Idle => {}
            CloneState::Deleting { mut pending } => pending.un_execute(ctx.store),
            CloneState::Growing {
                target,
                created_element,
            } => ctx.store.discard_constraint(target, created_element),
            CloneState::Moving {
                target, original, ..
            } => {
                ctx.store.update_constraint(target, original);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::tools::test_support::{Harness, cell_hit, cells};

    fn clone_groups(h: &Harness) -> Vec<(Vec<GridCoord>, Vec<GridCoord>)> {
        h.all()
            .iter()
            .filter_map(|c| groups(c).map(|(a, b)| (a.clone(), b.clone())))
            .collect()
    }

    #[test]
    fn test_copy_placed_to_the_right() {
        let mut h = Harness::new(ToolId::Clone);
        h.drag_cells(&[(0, 0), (0, 1), (1, 1)], Modifiers::NONE);
        assert_eq!(
            clone_groups(&h),
            vec![(cells(&[(0, 0), (0, 1), (1, 1)]), cells(&[(0, 2), (0, 3), (1, 3)]))]
        );
        assert_eq!(h.all()[0].value(), Some("A"));
        assert_eq!(h.history.undo_len(), 1);
    }

    #[test]
    fn test_copy_falls_back_to_other_sides() {
        let mut h = Harness::new(ToolId::Clone);
        h.drag_cells(&[(0, 8)], Modifiers::NONE);
        assert_eq!(clone_groups(&h)[0].1, cells(&[(1, 8)]));

        let grid = Grid::new(1, 2);
        assert_eq!(place_copy(&cells(&[(0, 1)]), grid), Some(cells(&[(0, 0)])));
        assert_eq!(place_copy(&cells(&[(0, 0), (0, 1)]), grid), None);
    }

    #[test]
    fn test_labels_are_unique() {
        let mut h = Harness::new(ToolId::Clone);
        h.drag_cells(&[(0, 0)], Modifiers::NONE);
        h.drag_cells(&[(4, 4)], Modifiers::NONE);
        let labels: Vec<_> = h.all().iter().map(|c| c.value().map(str::to_string)).collect();
        assert_eq!(labels, vec![Some("A".to_string()), Some("B".to_string())]);
    }

    #[test]
    fn test_move_second_group() {
        let mut h = Harness::new(ToolId::Clone);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        // Copy sits at (0, 2), (0, 3); drag it down two rows.
        h.drag_cells(&[(0, 3), (1, 3), (2, 3)], Modifiers::NONE);
        assert_eq!(
            clone_groups(&h),
            vec![(cells(&[(0, 0), (0, 1)]), cells(&[(2, 2), (2, 3)]))]
        );
        h.history.undo(&mut h.store);
        assert_eq!(clone_groups(&h)[0].1, cells(&[(0, 2), (0, 3)]));
    }

    #[test]
    fn test_move_off_grid_is_rejected() {
        let mut h = Harness::new(ToolId::Clone);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        // Moving the first group left would push (0, 0) out.
        h.drag_cells(&[(0, 1), (0, 0), (1, 1)], Modifiers::NONE);
        assert_eq!(clone_groups(&h)[0].0, cells(&[(1, 0), (1, 1)]));
    }

    #[test]
    fn test_double_tap_deletes_clone() {
        let mut h = Harness::new(ToolId::Clone);
        h.drag_cells(&[(3, 3)], Modifiers::NONE);
        h.tap(cell_hit(3, 4), 1);
        assert_eq!(h.all().len(), 1);
        h.tap(cell_hit(3, 4), 2);
        assert!(h.store.is_empty());
    }

    #[test]
    fn test_cancel_move_restores() {
        let mut h = Harness::new(ToolId::Clone);
        h.drag_cells(&[(0, 0)], Modifiers::NONE);
        h.send(ToolEvent::DragStart(cell_hit(0, 0)), Modifiers::NONE);
        h.send(ToolEvent::Drag(cell_hit(5, 5)), Modifiers::NONE);
        h.cancel();
        assert_eq!(clone_groups(&h)[0].0, cells(&[(0, 0)]));
    }
}
