//! Arrow tool: a connected bulb with lines rooted in it.

use super::{
    Intent, LineRule, LineStep, ToolContext, ToolEvent, ToolInput, add_to_connected_group,
    grow_line,
};
use crate::constraint::{Constraint, ConstraintData, ToolId};
use crate::geometry::FeatureHit;
use crate::grid::GridCoord;
use crate::history::{Command, CommandBatch};
use crate::store::{AddConstraint, ConstraintRef, ConstraintStore, UpdateConstraint};

#[derive(Debug, Default)]
enum ArrowMode {
    #[default]
    Idle,
    /// Growing a bulb; `original` is `None` for a new arrow.
    EditBulb {
        target: ConstraintRef,
        original: Option<Constraint>,
        created_element: bool,
    },
    /// Drawing line `line` of an existing arrow.
    EditArrows {
        target: ConstraintRef,
        line: usize,
        original: Constraint,
    },
    Deleting {
        pending: CommandBatch<ConstraintStore>,
    },
}

/// Gesture state of an [`ArrowTool`].
#[derive(Debug, Default)]
pub struct ArrowState {
    mode: ArrowMode,
    /// The arrow the last gesture worked on.
    current: Option<ConstraintRef>,
    /// The last press landed on a bulb.
    tap_hit_bulb: bool,
}

#[derive(Debug, Clone)]
pub struct ArrowTool {
    pub tool: ToolId,
    rule: LineRule,
    diagonal_bulb: bool,
}

fn arrow_parts(constraint: &Constraint) -> Option<(&Vec<GridCoord>, &Vec<Vec<GridCoord>>)> {
    match &constraint.data {
        ConstraintData::Arrow { bulb, lines } => Some((bulb, lines)),
        _ => None,
    }
}

impl ArrowTool {
    pub fn new(tool: ToolId, rule: LineRule, diagonal_bulb: bool) -> Self {
        Self {
            tool,
            rule,
            diagonal_bulb,
        }
    }

    fn bulb_at(&self, store: &ConstraintStore, cell: GridCoord) -> Option<ConstraintRef> {
        store.find_first(self.tool, |c| {
            arrow_parts(c).is_some_and(|(bulb, _)| bulb.contains(&cell))
        })
    }

    /// A line point past the root, as `(arrow, line, point index)`.
    fn line_point_at(
        &self,
        store: &ConstraintStore,
        cell: GridCoord,
    ) -> Option<(ConstraintRef, usize, usize)> {
        store
            .constraints()
            .filter(|(_, c)| c.tool == self.tool)
            .find_map(|(target, c)| {
                let (_, lines) = arrow_parts(c)?;
                lines.iter().enumerate().find_map(|(line, points)| {
                    points
                        .iter()
                        .skip(1)
                        .position(|&p| p == cell)
                        .map(|index| (target, line, index + 1))
                })
            })
    }

    /// Apply `edit` to the live arrow, storing it when `edit` reports a change.
    fn edit_live(
        ctx: &mut ToolContext,
        target: ConstraintRef,
        edit: impl FnOnce(&mut Vec<GridCoord>, &mut Vec<Vec<GridCoord>>) -> bool,
    ) {
        let Some(mut next) = ctx.store.constraint(target).cloned() else {
            return;
        };
        let ConstraintData::Arrow { bulb, lines } = &mut next.data else {
            return;
        };
        if edit(bulb, lines) {
            ctx.store.update_constraint(target, next);
        }
    }

    fn new_arrow(&self, ctx: &mut ToolContext, cell: GridCoord) -> ArrowMode {
        let data = ConstraintData::Arrow {
            bulb: vec![cell],
            lines: Vec::new(),
        };
        let added = ctx.store.add_local_constraint(Constraint::new(self.tool, data));
        ArrowMode::EditBulb {
            target: added.target,
            original: None,
            created_element: added.created_element,
        }
    }

    /// Start a new line at a bulb cell.
    fn start_line(ctx: &mut ToolContext, target: ConstraintRef, cell: GridCoord) -> ArrowMode {
        let Some(original) = ctx.store.constraint(target).cloned() else {
            return ArrowMode::Idle;
        };
        let mut line = 0;
        Self::edit_live(ctx, target, |_, lines| {
            lines.push(vec![cell]);
            line = lines.len() - 1;
            true
        });
        ArrowMode::EditArrows {
            target,
            line,
            original,
        }
    }

    /// Cut a line back to `index` as its own undo step, then keep drawing it.
    fn truncate_line(
        ctx: &mut ToolContext,
        target: ConstraintRef,
        line: usize,
        index: usize,
    ) -> ArrowMode {
        let Some(before) = ctx.store.constraint(target).cloned() else {
            return ArrowMode::Idle;
        };
        let mut after = before.clone();
        if let ConstraintData::Arrow { lines, .. } = &mut after.data {
            if let Some(points) = lines.get_mut(line) {
                points.truncate(index + 1);
            }
        }
        if let Some(mut command) = UpdateConstraint::to(ctx.store, target, after.clone()) {
            command.execute(ctx.store);
            ctx.commit_one(command);
        }
        ArrowMode::EditArrows {
            target,
            line,
            original: after,
        }
    }

    fn drag_start(
        &self,
        state: &mut ArrowState,
        hit: &FeatureHit,
        intent: Intent,
        ctx: &mut ToolContext,
    ) -> ArrowMode {
        let cell = hit.cell;
        if !ctx.grid.contains(cell) {
            return ArrowMode::Idle;
        }
        let bulb = self.bulb_at(ctx.store, cell);
        match intent {
            Intent::Delete => {
                let mut pending = CommandBatch::new();
                self.delete_at(&mut pending, ctx, cell);
                return ArrowMode::Deleting { pending };
            }
            Intent::Select => {
                match ctx.store.find_by_cell(self.tool, cell).first() {
                    Some(&target) => ctx.select(target),
                    None => ctx.clear_selection(),
                }
                return ArrowMode::Idle;
            }
            Intent::AddEdit => {
                if let Some(target) = bulb {
                    state.current = Some(target);
                    ctx.select(target);
                    return ArrowMode::EditBulb {
                        target,
                        original: ctx.store.constraint(target).cloned(),
                        created_element: false,
                    };
                }
                return self.new_arrow(ctx, cell);
            }
            Intent::Dynamic => {}
        }

        if let Some(target) = bulb {
            state.current = Some(target);
            state.tap_hit_bulb = true;
            ctx.select(target);
            return Self::start_line(ctx, target, cell);
        }
        if let Some((target, line, index)) = self.line_point_at(ctx.store, cell) {
            state.current = Some(target);
            ctx.select(target);
            return Self::truncate_line(ctx, target, line, index);
        }
        self.new_arrow(ctx, cell)
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

    fn drag(&self, mut mode: ArrowMode, cell: GridCoord, ctx: &mut ToolContext) -> ArrowMode {
        if !ctx.grid.contains(cell) {
            return mode;
        }
        match &mut mode {
            &mut ArrowMode::EditBulb { target, .. } => {
                let diagonal = self.diagonal_bulb;
                Self::edit_live(ctx, target, |bulb, _| {
                    add_to_connected_group(bulb, cell, diagonal)
                });
            }
            &mut ArrowMode::EditArrows { target, line, .. } => {
                let rule = self.rule;
                Self::edit_live(ctx, target, |bulb, lines| {
                    let Some(points) = lines.get_mut(line) else {
                        return false;
                    };
                    if bulb.contains(&cell) && !points.contains(&cell) {
                        // A line that has not left the bulb moves its root.
                        if points.len() == 1 {
                            points[0] = cell;
                            return true;
                        }
                        return false;
                    }
                    grow_line(points, cell, &rule) != LineStep::Unchanged
                });
            }
            ArrowMode::Deleting { pending } => self.delete_at(pending, ctx, cell),
            ArrowMode::Idle => {}
        }
        mode
    }

    fn drag_end(&self, mode: ArrowMode, ctx: &mut ToolContext) {
        match mode {
            ArrowMode::Idle => {}
            ArrowMode::Deleting { pending } => ctx.commit(pending),
            ArrowMode::EditBulb {
                target,
                original: None,
                created_element,
            } => {
                if let Some(command) = AddConstraint::capture(ctx.store, target, created_element) {
                    ctx.commit_one(command);
                }
                ctx.select(target);
            }
            ArrowMode::EditBulb {
                target,
                original: Some(original),
                ..
            } => Self::commit_update(ctx, target, original),
            ArrowMode::EditArrows {
                target,
                line,
                original,
            } => {
                Self::edit_live(ctx, target, |_, lines| {
                    if lines.get(line).is_some_and(|points| points.len() <= 1) {
                        lines.remove(line);
                        return true;
                    }
                    false
                });
                Self::commit_update(ctx, target, original);
            }
        }
    }

    /// Record the difference between `original` and the live arrow.
    fn commit_update(ctx: &mut ToolContext, target: ConstraintRef, original: Constraint) {
        if let Some(current) = ctx.store.constraint(target).cloned() {
            if current != original {
                ctx.commit_one(UpdateConstraint::new(target, original, current));
            }
        }
    }

    pub fn handle(
        &self,
        mut state: ArrowState,
        input: &ToolInput,
        ctx: &mut ToolContext,
    ) -> ArrowState {
        match input.event {
            ToolEvent::DragStart(hit) => {
                Self::cancel_mode(std::mem::take(&mut state.mode), ctx);
                state.tap_hit_bulb = false;
                state.mode =
                    self.drag_start(&mut state, &hit, Intent::from_modifiers(input.modifiers), ctx);
            }
            ToolEvent::Drag(hit) => {
                let mode = std::mem::take(&mut state.mode);
                state.mode = self.drag(mode, hit.cell, ctx);
            }
            ToolEvent::DragEnd => {
                let mode = std::mem::take(&mut state.mode);
                self.drag_end(mode, ctx);
            }
            ToolEvent::Tap { .. } => {
                // A plain tap on a bulb removes the arrow it selected.
                if state.tap_hit_bulb {
                    if let Some(target) = state.current.take() {
                        if let Some(command) = ctx.remove_live(target) {
                            ctx.commit_one(command);
                            ctx.clear_selection();
                        }
                    }
                    state.tap_hit_bulb = false;
                }
            }
        }
        state
    }

    fn cancel_mode(mode: ArrowMode, ctx: &mut ToolContext) {
        match mode {
            ArrowMode::Idle => {}
            ArrowMode::Deleting { mut pending } => pending.un_execute(ctx.store),
            ArrowMode::EditBulb {
                target,
                original: None,
                created_element,
            } => ctx.store.discard_constraint(target, created_element),
            ArrowMode::EditBulb {
                target,
                original: Some(original),
                ..
            }
            | ArrowMode::EditArrows {
                target, original, ..
            } => {
                ctx.store.update_constraint(target, original);
            }
        }
    }

    pub fn cancel(state: ArrowState, ctx: &mut ToolContext) {
        Self::cancel_mode(state.mode, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::tools::test_support::{Harness, cell_hit, cells};

    fn parts(h: &Harness) -> Vec<(Vec<GridCoord>, Vec<Vec<GridCoord>>)> {
        h.all()
            .iter()
            .filter_map(|c| arrow_parts(c).map(|(b, l)| (b.clone(), l.clone())))
            .collect()
    }

    fn with_bulb(bulb: &[(i32, i32)]) -> Harness {
        let mut h = Harness::new(ToolId::Arrow);
        h.drag_cells(bulb, Modifiers::NONE);
        h
    }

    #[test]
    fn test_bulb_without_lines() {
        let h = with_bulb(&[(0, 0), (0, 1)]);
        assert_eq!(parts(&h), vec![(cells(&[(0, 0), (0, 1)]), vec![])]);
        assert_eq!(h.history.undo_len(), 1);
        assert_eq!(h.store.len(), 1);
    }

    #[test]
    fn test_bulb_grows_only_through_neighbours() {
        let h = with_bulb(&[(0, 0), (2, 2), (1, 0)]);
        assert_eq!(parts(&h)[0].0, cells(&[(0, 0), (1, 0)]));
    }

    #[test]
    fn test_line_from_bulb() {
        let mut h = with_bulb(&[(0, 0)]);
        h.drag_cells(&[(0, 0), (1, 1), (2, 2)], Modifiers::NONE);
        assert_eq!(
            parts(&h)[0].1,
            vec![cells(&[(0, 0), (1, 1), (2, 2)])]
        );
        assert_eq!(h.history.undo_len(), 2);
        h.history.undo(&mut h.store);
        assert!(parts(&h)[0].1.is_empty());
    }

    #[test]
    fn test_press_on_bulb_keeps_no_empty_line() {
        let mut h = with_bulb(&[(0, 0)]);
        h.drag_cells(&[(0, 0)], Modifiers::NONE);
        assert!(parts(&h)[0].1.is_empty());
        assert_eq!(h.history.undo_len(), 1);
    }

    #[test]
    fn test_line_root_moves_within_bulb() {
        let mut h = with_bulb(&[(0, 0), (0, 1)]);
        h.drag_cells(&[(0, 0), (0, 1), (1, 2)], Modifiers::NONE);
        assert_eq!(parts(&h)[0].1, vec![cells(&[(0, 1), (1, 2)])]);
    }

    #[test]
    fn test_press_on_line_truncates_with_own_undo_step() {
        let mut h = with_bulb(&[(0, 0)]);
        h.drag_cells(&[(0, 0), (1, 0), (2, 0), (3, 0)], Modifiers::NONE);
        h.drag_cells(&[(2, 0), (2, 1)], Modifiers::NONE);
        assert_eq!(
            parts(&h)[0].1,
            vec![cells(&[(0, 0), (1, 0), (2, 0), (2, 1)])]
        );
        assert_eq!(h.history.undo_len(), 4);

        h.history.undo(&mut h.store);
        assert_eq!(parts(&h)[0].1, vec![cells(&[(0, 0), (1, 0), (2, 0)])]);
        h.history.undo(&mut h.store);
        assert_eq!(
            parts(&h)[0].1,
            vec![cells(&[(0, 0), (1, 0), (2, 0), (3, 0)])]
        );
    }

    #[test]
    fn test_tap_on_bulb_removes_arrow() {
        let mut h = with_bulb(&[(4, 4)]);
        h.tap(cell_hit(4, 4), 1);
        assert!(h.store.is_empty());
        h.history.undo(&mut h.store);
        assert_eq!(parts(&h).len(), 1);
    }

    #[test]
    fn test_shift_expands_existing_bulb() {
        let mut h = with_bulb(&[(0, 0)]);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::shift());
        assert_eq!(parts(&h), vec![(cells(&[(0, 0), (0, 1)]), vec![])]);
        h.history.undo(&mut h.store);
        assert_eq!(parts(&h), vec![(cells(&[(0, 0)]), vec![])]);
    }

    #[test]
    fn test_alt_deletes_touched_arrows() {
        let mut h = with_bulb(&[(0, 0)]);
        h.drag_cells(&[(0, 0), (1, 0)], Modifiers::NONE);
        h.drag_cells(&[(5, 5)], Modifiers::NONE);
        h.drag_cells(&[(1, 0)], Modifiers::alt());
        assert_eq!(parts(&h).len(), 1);
        assert_eq!(h.store.len(), 1);
    }

    #[test]
    fn test_cancel_discards_new_arrow() {
        let mut h = Harness::new(ToolId::Arrow);
        h.send(ToolEvent::DragStart(cell_hit(3, 3)), Modifiers::NONE);
        h.send(ToolEvent::Drag(cell_hit(3, 4)), Modifiers::NONE);
        h.cancel();
        assert!(h.store.is_empty());
    }
}
