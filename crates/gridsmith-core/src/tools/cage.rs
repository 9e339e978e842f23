//! Cage and extra-region tool.

use super::{Intent, ToolContext, ToolEvent, ToolInput, add_to_connected_group};
use crate::constraint::{Constraint, ConstraintData, ToolId};
use crate::grid::GridCoord;
use crate::history::CommandBatch;
use crate::store::{AddConstraint, ConstraintRef, ConstraintStore, UpdateConstraint};

/// Gesture state of a [`CageTool`].
#[derive(Debug, Default)]
pub enum CageState {
    #[default]
    Idle,
    Growing {
        target: ConstraintRef,
        /// The cage before the gesture; `None` for a new cage.
        original: Option<Constraint>,
        created_element: bool,
    },
    Deleting {
        pending: CommandBatch<ConstraintStore>,
    },
}

#[derive(Debug, Clone)]
pub struct CageTool {
    pub tool: ToolId,
    diagonal: bool,
}

impl CageTool {
    pub fn new(tool: ToolId, diagonal: bool) -> Self {
        Self { tool, diagonal }
    }

    fn cage_at(&self, store: &ConstraintStore, cell: GridCoord) -> Option<ConstraintRef> {
        store.find_by_cell(self.tool, cell).first().copied()
    }

    fn new_cage(&self, ctx: &mut ToolContext, cell: GridCoord) -> CageState {
        let data = ConstraintData::Cage {
            cells: vec![cell],
            value: None,
        };
        let added = ctx.store.add_local_constraint(Constraint::new(self.tool, data));
        CageState::Growing {
            target: added.target,
            original: None,
            created_element: added.created_element,
        }
    }

    /// Add `cell` to the live cage unless another cage already owns it.
    fn grow(&self, ctx: &mut ToolContext, target: ConstraintRef, cell: GridCoord) {
        if self.cage_at(ctx.store, cell).is_some_and(|owner| owner != target) {
            return;
        }
        let Some(mut next) = ctx.store.constraint(target).cloned() else {
            return;
        };
        if let ConstraintData::Cage { cells, .. } = &mut next.data {
            if add_to_connected_group(cells, cell, self.diagonal) {
                ctx.store.update_constraint(target, next);
            }
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

    fn drag_start(&self, cell: GridCoord, intent: Intent, ctx: &mut ToolContext) -> CageState {
        if !ctx.grid.contains(cell) {
            return CageState::Idle;
        }
        match intent {
            Intent::Delete => {
                let mut pending = CommandBatch::new();
                self.delete_at(&mut pending, ctx, cell);
                CageState::Deleting { pending }
            }
            Intent::Select => {
                match self.cage_at(ctx.store, cell) {
                    Some(target) => ctx.select(target),
                    None => ctx.clear_selection(),
                }
                CageState::Idle
            }
            Intent::AddEdit => self.new_cage(ctx, cell),
            Intent::Dynamic => match self.cage_at(ctx.store, cell) {
                Some(target) => {
                    ctx.select(target);
                    CageState::Growing {
                        target,
                        original: ctx.store.constraint(target).cloned(),
                        created_element: false,
                    }
                }
                None => self.new_cage(ctx, cell),
            },
        }
    }

    fn drag_end(state: CageState, ctx: &mut ToolContext) {
        match state {
            CageState::Idle => {}
            CageState::Deleting { pending } => ctx.commit(pending),
            CageState::Growing {
                target,
                original: None,
                created_element,
            } => {
                if let Some(command) = AddConstraint::capture(ctx.store, target, created_element) {
                    ctx.commit_one(command);
                }
                ctx.select(target);
            }
            CageState::Growing {
                target,
                original: Some(original),
                ..
            } => {
                let current = ctx.store.constraint(target).cloned();
                if let Some(current) = current.filter(|c| *c != original) {
                    ctx.commit_one(UpdateConstraint::new(target, original, current));
                }
            }
        }
    }

    pub fn handle(
        &self,
        mut state: CageState,
        input: &ToolInput,
        ctx: &mut ToolContext,
    ) -> CageState {
        match input.event {
            ToolEvent::DragStart(hit) => {
                Self::cancel(state, ctx);
                self.drag_start(hit.cell, Intent::from_modifiers(input.modifiers), ctx)
            }
            ToolEvent::Drag(hit) => {
                if ctx.grid.contains(hit.cell) {
                    match &mut state {
                        &mut CageState::Growing { target, .. } => self.grow(ctx, target, hit.cell),
                        CageState::Deleting { pending } => self.delete_at(pending, ctx, hit.cell),
                        CageState::Idle => {}
                    }
                }
                state
            }
            ToolEvent::DragEnd => {
                Self::drag_end(state, ctx);
                CageState::Idle
            }
            ToolEvent::Tap { hit, count } => {
                // Double tap removes the cage.
                if count >= 2 {
                    if let Some(target) = self.cage_at(ctx.store, hit.cell) {
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

    pub fn cancel(state: CageState, ctx: &mut ToolContext) {
        match state {
            CageState::Idle => {}
            CageState::Deleting { mut pending } => pending.un_execute(ctx.store),
            CageState::Growing {
                target,
                original: None,
                created_element,
            } => ctx.store.discard_constraint(target, created_element),
            CageState::Growing {
                target,
                original: Some(original),
                ..
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

    fn cage_cells(h: &Harness) -> Vec<Vec<GridCoord>> {
        h.all().iter().map(|c| c.data.cells()).collect()
    }

    #[test]
    fn test_drag_builds_connected_cage() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.drag_cells(&[(0, 0), (1, 0), (3, 3), (1, 1)], Modifiers::NONE);
        assert_eq!(cage_cells(&h), vec![cells(&[(0, 0), (1, 0), (1, 1)])]);
        assert_eq!(h.store.len(), 1);
        assert_eq!(h.history.undo_len(), 1);
    }

    #[test]
    fn test_each_cage_has_its_own_element() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        h.drag_cells(&[(5, 5)], Modifiers::NONE);
        assert_eq!(h.store.len(), 2);
    }

    #[test]
    fn test_drag_from_cage_extends_it() {
        let mut h = Harness::new(ToolId::ExtraRegion);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        h.drag_cells(&[(0, 1), (0, 2)], Modifiers::NONE);
        assert_eq!(cage_cells(&h), vec![cells(&[(0, 0), (0, 1), (0, 2)])]);
        h.history.undo(&mut h.store);
        assert_eq!(cage_cells(&h), vec![cells(&[(0, 0), (0, 1)])]);
    }

    #[test]
    fn test_growth_skips_other_cages() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.drag_cells(&[(0, 1)], Modifiers::NONE);
        h.drag_cells(&[(0, 0), (0, 1), (1, 0)], Modifiers::NONE);
        assert_eq!(
            cage_cells(&h),
            vec![cells(&[(0, 1)]), cells(&[(0, 0), (1, 0)])]
        );
    }

    #[test]
    fn test_diagonal_growth_when_enabled() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.handler = crate::tools::ToolHandler::Cage(CageTool::new(ToolId::KillerCage, true));
        h.drag_cells(&[(0, 0), (1, 1)], Modifiers::NONE);
        assert_eq!(cage_cells(&h), vec![cells(&[(0, 0), (1, 1)])]);
    }

    #[test]
    fn test_double_tap_removes_cage() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.drag_cells(&[(2, 2), (2, 3)], Modifiers::NONE);
        h.tap(cell_hit(2, 3), 1);
        assert_eq!(h.all().len(), 1);
        h.tap(cell_hit(2, 3), 2);
        assert!(h.store.is_empty());
        h.history.undo(&mut h.store);
        assert_eq!(h.all().len(), 1);
    }

    #[test]
    fn test_alt_drag_deletes() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.drag_cells(&[(0, 0)], Modifiers::NONE);
        h.drag_cells(&[(0, 2)], Modifiers::NONE);
        h.drag_cells(&[(0, 0), (0, 1), (0, 2)], Modifiers::alt());
        assert!(h.store.is_empty());
        assert_eq!(h.history.undo_len(), 3);
    }

    #[test]
    fn test_ctrl_selects_without_editing() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.drag_cells(&[(0, 0)], Modifiers::NONE);
        h.selection = None;
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::ctrl());
        assert!(h.selection.is_some());
        assert_eq!(cage_cells(&h), vec![cells(&[(0, 0)])]);
    }

    #[test]
    fn test_cancel_restores_cage() {
        let mut h = Harness::new(ToolId::KillerCage);
        h.drag_cells(&[(0, 0)], Modifiers::NONE);
        h.send(ToolEvent::DragStart(cell_hit(0, 0)), Modifiers::NONE);
        h.send(ToolEvent::Drag(cell_hit(0, 1)), Modifiers::NONE);
        h.cancel();
        assert_eq!(cage_cells(&h), vec![cells(&[(0, 0)])]);
    }
}
