//! Line tools over cells or corners.

use super::{Intent, LineRule, LineStep, ToolContext, ToolEvent, ToolInput, grow_line};
use crate::constraint::{Constraint, ConstraintData, ToolId};
use crate::geometry::{Feature, FeatureHit};
use crate::grid::GridCoord;
use crate::history::CommandBatch;
use crate::store::{AddConstraint, ConstraintRef, ConstraintStore, UpdateConstraint};

/// Which grid points a line runs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpace {
    Cells,
    Corners,
}

/// Gesture state of a [`LineTool`].
#[derive(Debug, Default)]
pub enum LineState {
    #[default]
    Idle,
    /// Removing every line the drag touches.
    Deleting {
        pending: CommandBatch<ConstraintStore>,
    },
    /// Pressed inside an existing line: a release deletes it, a drag starts
    /// a new line instead.
    PendingDelete {
        target: ConstraintRef,
        start: GridCoord,
    },
    Drawing {
        target: ConstraintRef,
        /// The line before the gesture; `None` for a new line.
        original: Option<Constraint>,
        created_element: bool,
    },
}

#[derive(Debug, Clone)]
pub struct LineTool {
    pub tool: ToolId,
    space: LineSpace,
    rule: LineRule,
}

impl LineTool {
    pub fn new(tool: ToolId, space: LineSpace, rule: LineRule) -> Self {
        Self { tool, space, rule }
    }

    fn point(&self, hit: &FeatureHit, ctx: &ToolContext) -> Option<GridCoord> {
        match self.space {
            LineSpace::Cells => ctx.grid.contains(hit.cell).then_some(hit.cell),
            LineSpace::Corners => match hit.feature {
                Feature::Corner(corner) if ctx.grid.contains_corner(corner) => Some(corner),
                _ => None,
            },
        }
    }

    fn line_data(&self, points: Vec<GridCoord>) -> ConstraintData {
        match self.space {
            LineSpace::Cells => ConstraintData::Line { cells: points },
            LineSpace::Corners => ConstraintData::CornerLine { corners: points },
        }
    }

    fn lines_through(&self, store: &ConstraintStore, point: GridCoord) -> Vec<ConstraintRef> {
        store.find_where(self.tool, |c| {
            c.data.line_points().is_some_and(|points| points.contains(&point))
        })
    }

    fn line_ending_at(&self, store: &ConstraintStore, point: GridCoord) -> Option<ConstraintRef> {
        store.find_first(self.tool, |c| {
            c.data.line_points().and_then(|points| points.last()) == Some(&point)
        })
    }

    fn start_line(&self, ctx: &mut ToolContext, start: GridCoord) -> LineState {
        let constraint = Constraint::new(self.tool, self.line_data(vec![start]));
        let added = ctx.store.add_local_constraint(constraint);
        LineState::Drawing {
            target: added.target,
            original: None,
            created_element: added.created_element,
        }
    }

    fn delete_through(
        &self,
        pending: &mut CommandBatch<ConstraintStore>,
        ctx: &mut ToolContext,
        point: GridCoord,
    ) {
        for target in self.lines_through(ctx.store, point) {
            if let Some(command) = ctx.remove_live(target) {
                pending.push(command);
            }
        }
    }

    /// Grow the live line toward `point`.
    fn extend(&self, ctx: &mut ToolContext, target: ConstraintRef, point: GridCoord) {
        let Some(mut next) = ctx.store.constraint(target).cloned() else {
            return;
        };
        let Some(points) = next.data.line_points_mut() else {
            return;
        };
        if grow_line(points, point, &self.rule) != LineStep::Unchanged {
            ctx.store.update_constraint(target, next);
        }
    }

    fn drag_start(&self, hit: &FeatureHit, intent: Intent, ctx: &mut ToolContext) -> LineState {
        let Some(point) = self.point(hit, ctx) else {
            return LineState::Idle;
        };
        match intent {
            Intent::Delete => {
                let mut pending = CommandBatch::new();
                self.delete_through(&mut pending, ctx, point);
                LineState::Deleting { pending }
            }
            Intent::Select => {
                match self.lines_through(ctx.store, point).first() {
                    Some(&target) => ctx.select(target),
                    None => ctx.clear_selection(),
                }
                LineState::Idle
            }
            Intent::AddEdit => self.start_line(ctx, point),
            Intent::Dynamic => {
                if let Some(target) = self.line_ending_at(ctx.store, point) {
                    let original = ctx.store.constraint(target).cloned();
                    ctx.select(target);
                    return LineState::Drawing {
                        target,
                        original,
                        created_element: false,
                    };
                }
                match self.lines_through(ctx.store, point).first() {
                    Some(&target) => LineState::PendingDelete {
                        target,
                        start: point,
                    },
                    None => self.start_line(ctx, point),
                }
            }
        }
    }

    fn drag(&self, state: LineState, hit: &FeatureHit, ctx: &mut ToolContext) -> LineState {
        let Some(point) = self.point(hit, ctx) else {
            return state;
        };
        match state {
            LineState::Deleting { mut pending } => {
                self.delete_through(&mut pending, ctx, point);
                LineState::Deleting { pending }
            }
            LineState::PendingDelete { start, .. } => {
                let next = self.start_line(ctx, start);
                if let LineState::Drawing { target, .. } = next {
                    self.extend(ctx, target, point);
                }
                next
            }
            LineState::Drawing {
                target,
                original,
                created_element,
            } => {
                self.extend(ctx, target, point);
                LineState::Drawing {
                    target,
                    original,
                    created_element,
                }
            }
            LineState::Idle => LineState::Idle,
        }
    }

    fn drag_end(&self, state: LineState, ctx: &mut ToolContext) {
        match state {
            LineState::Idle => {}
            LineState::Deleting { pending } => ctx.commit(pending),
            LineState::PendingDelete { target, .. } => {
                if let Some(command) = ctx.remove_live(target) {
                    ctx.commit_one(command);
                }
            }
            LineState::Drawing {
                target,
                original,
                created_element,
            } => {
                let Some(current) = ctx.store.constraint(target).cloned() else {
                    return;
                };
                let len = current.data.line_points().map_or(0, Vec::len);
                match original {
                    None if len <= 1 => ctx.store.discard_constraint(target, created_element),
                    None => {
                        if let Some(command) =
                            AddConstraint::capture(ctx.store, target, created_element)
                        {
                            ctx.commit_one(command);
                        }
                        ctx.select(target);
                    }
                    Some(original) if len <= 1 => {
                        // Collapsed: record as a removal of the original line.
                        ctx.store.update_constraint(target, original);
                        if let Some(command) = ctx.remove_live(target) {
                            ctx.commit_one(command);
                        }
                        ctx.clear_selection();
                    }
                    Some(original) => {
                        if original != current {
                            ctx.commit_one(UpdateConstraint::new(target, original, current));
                        }
                    }
                }
            }
        }
    }

    pub fn handle(&self, state: LineState, input: &ToolInput, ctx: &mut ToolContext) -> LineState {
        match input.event {
            ToolEvent::DragStart(hit) => {
                Self::cancel(state, ctx);
                self.drag_start(&hit, Intent::from_modifiers(input.modifiers), ctx)
            }
            ToolEvent::Drag(hit) => self.drag(state, &hit, ctx),
            ToolEvent::DragEnd => {
                self.drag_end(state, ctx);
                LineState::Idle
            }
            ToolEvent::Tap { .. } => state,
        }
    }

    pub fn cancel(state: LineState, ctx: &mut ToolContext) {
        match state {
            LineState::Idle | LineState::PendingDelete { .. } => {}
            LineState::Deleting { mut pending } => pending.un_execute(ctx.store),
            LineState::Drawing {
                target,
                original,
                created_element,
            } => match original {
                Some(original) => {
                    ctx.store.update_constraint(target, original);
                }
                None => ctx.store.discard_constraint(target, created_element),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;
    use crate::tools::test_support::{Harness, cell_hit, cells, corner_hit};

    fn line_cells(h: &Harness) -> Vec<Vec<GridCoord>> {
        h.all()
            .iter()
            .filter_map(|c| c.data.line_points().cloned())
            .collect()
    }

    #[test]
    fn test_draw_commits_once() {
        let mut h = Harness::new(ToolId::Thermometer);
        h.drag_cells(&[(0, 0), (0, 1), (1, 2)], Modifiers::NONE);
        assert_eq!(line_cells(&h), vec![cells(&[(0, 0), (0, 1), (1, 2)])]);
        assert_eq!(h.history.undo_len(), 1);
        h.history.undo(&mut h.store);
        assert!(h.store.is_empty());
    }

    #[test]
    fn test_single_point_line_is_discarded() {
        let mut h = Harness::new(ToolId::Renban);
        h.drag_cells(&[(4, 4)], Modifiers::NONE);
        assert!(h.store.is_empty());
        assert!(!h.history.can_undo());
    }

    #[test]
    fn test_non_adjacent_drag_is_ignored() {
        let mut h = Harness::new(ToolId::Renban);
        h.drag_cells(&[(0, 0), (0, 2), (0, 1)], Modifiers::NONE);
        assert_eq!(line_cells(&h), vec![cells(&[(0, 0), (0, 1)])]);
    }

    #[test]
    fn test_retract_on_revisit() {
        let mut h = Harness::new(ToolId::Thermometer);
        h.drag_cells(&[(0, 0), (0, 1), (0, 2), (0, 1)], Modifiers::NONE);
        assert_eq!(line_cells(&h), vec![cells(&[(0, 0), (0, 1)])]);
    }

    #[test]
    fn test_whisper_crosses_itself() {
        let mut h = Harness::new(ToolId::Whisper);
        h.drag_cells(&[(0, 1), (1, 1), (1, 2), (0, 2), (0, 1)], Modifiers::NONE);
        assert_eq!(line_cells(&h)[0].len(), 5);
    }

    #[test]
    fn test_extend_from_last_cell() {
        let mut h = Harness::new(ToolId::Palindrome);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        h.drag_cells(&[(0, 1), (0, 2), (0, 3)], Modifiers::NONE);
        assert_eq!(
            line_cells(&h),
            vec![cells(&[(0, 0), (0, 1), (0, 2), (0, 3)])]
        );
        assert_eq!(h.history.undo_len(), 2);
        h.history.undo(&mut h.store);
        assert_eq!(line_cells(&h), vec![cells(&[(0, 0), (0, 1)])]);
    }

    #[test]
    fn test_tap_inside_line_deletes_it() {
        let mut h = Harness::new(ToolId::Thermometer);
        h.drag_cells(&[(0, 0), (0, 1), (0, 2)], Modifiers::NONE);
        h.tap(cell_hit(0, 1), 1);
        assert!(h.store.is_empty());
        h.history.undo(&mut h.store);
        assert_eq!(line_cells(&h).len(), 1);
    }

    #[test]
    fn test_drag_from_inside_line_starts_new_line() {
        let mut h = Harness::new(ToolId::Thermometer);
        h.drag_cells(&[(0, 0), (0, 1), (0, 2)], Modifiers::NONE);
        h.drag_cells(&[(0, 1), (1, 1), (2, 1)], Modifiers::NONE);
        assert_eq!(
            line_cells(&h),
            vec![
                cells(&[(0, 0), (0, 1), (0, 2)]),
                cells(&[(0, 1), (1, 1), (2, 1)])
            ]
        );
    }

    #[test]
    fn test_collapsing_existing_line_removes_it() {
        let mut h = Harness::new(ToolId::Thermometer);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        h.drag_cells(&[(0, 1), (0, 0)], Modifiers::NONE);
        assert!(h.store.is_empty());
        h.history.undo(&mut h.store);
        assert_eq!(line_cells(&h), vec![cells(&[(0, 0), (0, 1)])]);
    }

    #[test]
    fn test_alt_drag_deletes_touched_lines() {
        let mut h = Harness::new(ToolId::Renban);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        h.drag_cells(&[(2, 0), (2, 1)], Modifiers::NONE);
        h.drag_cells(&[(0, 0), (1, 0), (2, 0)], Modifiers::alt());
        assert!(h.store.is_empty());
        assert_eq!(h.history.undo_len(), 3);
        h.history.undo(&mut h.store);
        assert_eq!(line_cells(&h).len(), 2);
    }

    #[test]
    fn test_fence_runs_on_corners() {
        let mut h = Harness::new(ToolId::Fence);
        h.drag(&[corner_hit(0, 0), corner_hit(0, 1), corner_hit(1, 1)], Modifiers::NONE);
        assert!(matches!(
            &h.all()[0].data,
            ConstraintData::CornerLine { corners } if *corners == cells(&[(0, 0), (0, 1), (1, 1)])
        ));
        // Cell hits are not corners.
        h.drag_cells(&[(3, 3), (3, 4)], Modifiers::NONE);
        assert_eq!(h.all().len(), 1);
    }

    #[test]
    fn test_cancel_restores_edited_line() {
        let mut h = Harness::new(ToolId::Thermometer);
        h.drag_cells(&[(0, 0), (0, 1)], Modifiers::NONE);
        h.send(ToolEvent::DragStart(cell_hit(0, 1)), Modifiers::NONE);
        h.send(ToolEvent::Drag(cell_hit(0, 2)), Modifiers::NONE);
        h.cancel();
        assert_eq!(line_cells(&h), vec![cells(&[(0, 0), (0, 1)])]);
        assert_eq!(h.history.undo_len(), 1);
    }
}
