//! Tools that place one item per feature: cell markers, directed cells,
//! edge dots, corner clues, free text and outside clues.
//!
//! The first feature of a drag decides the mode: an empty feature starts
//! adding, an occupied one starts deleting, and every further feature the
//! drag passes applies the same mode.

use super::{Intent, ToolContext, ToolEvent, ToolInput};
use crate::constraint::{Constraint, ConstraintData, OutsideDirections, ToolFamily, ToolId};
use crate::geometry::{Feature, FeatureHit};
use crate::grid::{Direction, EdgeCoord, Grid, GridCoord, HalfCoord, corner_cells};
use crate::history::{Command, CommandBatch};
use crate::store::{AddConstraint, ConstraintRef, ConstraintStore, UpdateConstraint};

/// Where an item would go for a given hit.
#[derive(Debug, Clone, PartialEq)]
enum Placement {
    Cell(GridCoord),
    DirectedCell(GridCoord, Direction),
    Edge(EdgeCoord),
    Corner(Vec<GridCoord>),
    Half(HalfCoord, Option<Direction>),
    Outside(GridCoord, Direction),
}

/// Existing item at a placement.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Probe {
    Absent,
    Present(ConstraintRef),
    /// An item sits on the cell but points elsewhere.
    Differs(ConstraintRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    /// No valid feature seen yet.
    #[default]
    Undecided,
    Add,
    Delete,
    Select,
}

/// Gesture state of a [`BasicTool`].
#[derive(Debug, Default)]
pub struct BasicState {
    mode: Mode,
    intent: Intent,
    /// Changes applied during the drag.
    pending: CommandBatch<ConstraintStore>,
}

#[derive(Debug, Clone)]
pub struct BasicTool {
    pub tool: ToolId,
}

impl BasicTool {
    pub fn new(tool: ToolId) -> Self {
        Self { tool }
    }

    fn placement(&self, hit: &FeatureHit, grid: Grid) -> Option<Placement> {
        match self.tool.family() {
            ToolFamily::Cell => grid.contains(hit.cell).then_some(Placement::Cell(hit.cell)),
            ToolFamily::DirectedCell | ToolFamily::DirectionSetCell => {
                let direction = hit.direction?;
                grid.contains(hit.cell)
                    .then_some(Placement::DirectedCell(hit.cell, direction))
            }
            ToolFamily::Edge => match hit.feature {
                Feature::Edge(edge) if grid.contains_all(&edge.cells()) => {
                    Some(Placement::Edge(edge))
                }
                _ => None,
            },
            ToolFamily::Corner => match hit.feature {
                Feature::Corner(corner) => {
                    let cells = corner_cells(corner);
                    grid.contains_all(&cells)
                        .then(|| Placement::Corner(cells.to_vec()))
                }
                _ => None,
            },
            ToolFamily::CenterCornerOrEdge => {
                let coord = hit.feature.half_coord();
                grid.contains_half(coord)
                    .then_some(Placement::Half(coord, hit.direction))
            }
            ToolFamily::OutsideDirection => self.outside_placement(hit, grid),
            _ => None,
        }
    }

    /// An outside clue needs an off-grid cell whose neighbour in the clue's
    /// direction is inside the grid.
    fn outside_placement(&self, hit: &FeatureHit, grid: Grid) -> Option<Placement> {
        let cell = hit.cell;
        if grid.contains(cell) {
            return None;
        }
        let direction = match self.tool.outside_directions()? {
            OutsideDirections::Orthogonal => grid.inward_direction(cell)?,
            OutsideDirections::Diagonal => hit.direction.filter(|d| d.is_diagonal())?,
        };
        grid.contains(cell.step(direction))
            .then_some(Placement::Outside(cell, direction))
    }

    fn probe(&self, store: &ConstraintStore, placement: &Placement) -> Probe {
        let tool = self.tool;
        let found = match placement {
            Placement::Cell(cell) => store.find_by_cell(tool, *cell).first().copied(),
            Placement::DirectedCell(cell, direction) => {
                if let Some(target) = store.find_by_direction(tool, *cell, *direction) {
                    return Probe::Present(target);
                }
                return store
                    .find_by_cell(tool, *cell)
                    .first()
                    .map_or(Probe::Absent, |&target| Probe::Differs(target));
            }
            Placement::Edge(edge) => store.find_by_cells_exact(tool, &edge.cells()),
            Placement::Corner(cells) => store.find_by_cells_exact(tool, cells),
            Placement::Half(coord, _) => store.find_by_coord(tool, *coord),
            Placement::Outside(cell, direction) => store.find_by_direction(tool, *cell, *direction),
        };
        found.map_or(Probe::Absent, Probe::Present)
    }

    fn new_data(&self, placement: &Placement) -> ConstraintData {
        match placement.clone() {
            Placement::Cell(cell) => ConstraintData::Cell { cell, value: None },
            Placement::DirectedCell(cell, direction) => match self.tool.family() {
                ToolFamily::DirectionSetCell => ConstraintData::DirectionSetCell {
                    cell,
                    directions: [direction].into(),
                },
                _ => ConstraintData::DirectedCell {
                    cell,
                    direction,
                    value: None,
                },
            },
            Placement::Edge(edge) => ConstraintData::Edge {
                cells: edge.cells(),
                value: None,
            },
            Placement::Corner(cells) => ConstraintData::Corner { cells, value: None },
            Placement::Half(coord, direction) => ConstraintData::CenterCornerOrEdge {
                coord,
                direction,
                value: None,
            },
            Placement::Outside(cell, direction) => ConstraintData::OutsideDirection {
                cell,
                direction,
                value: None,
            },
        }
    }

    /// Re-point a directed cell, or add a direction to a direction set.
    fn redirected(existing: &Constraint, direction: Direction) -> Constraint {
        let mut next = existing.clone();
        match &mut next.data {
            ConstraintData::DirectedCell { direction: d, .. } => *d = direction,
            ConstraintData::DirectionSetCell { directions, .. } => {
                directions.insert(direction);
            }
            _ => {}
        }
        next
    }

    fn update_live(
        state: &mut BasicState,
        ctx: &mut ToolContext,
        target: ConstraintRef,
        after: Constraint,
    ) {
        if let Some(mut command) = UpdateConstraint::to(ctx.store, target, after) {
            command.execute(ctx.store);
            state.pending.push(command);
        }
    }

    fn add(
        &self,
        state: &mut BasicState,
        ctx: &mut ToolContext,
        placement: &Placement,
        probe: Probe,
    ) {
        match probe {
            Probe::Absent => {
                let constraint = Constraint::new(self.tool, self.new_data(placement));
                let added = ctx.store.add_local_constraint(constraint);
                if let Some(command) =
                    AddConstraint::capture(ctx.store, added.target, added.created_element)
                {
                    state.pending.push(command);
                }
                ctx.select(added.target);
            }
            Probe::Present(target) => ctx.select(target),
            Probe::Differs(target) => {
                let Placement::DirectedCell(_, direction) = placement else {
                    return;
                };
                if let Some(existing) = ctx.store.constraint(target) {
                    let after = Self::redirected(existing, *direction);
                    Self::update_live(state, ctx, target, after);
                }
                ctx.select(target);
            }
        }
    }

    fn delete(state: &mut BasicState, ctx: &mut ToolContext, placement: &Placement, probe: Probe) {
        let Probe::Present(target) = probe else {
            return;
        };
        // Deleting from a direction set only drops the probed direction.
        if let (Placement::DirectedCell(_, direction), Some(existing)) =
            (placement, ctx.store.constraint(target))
        {
            if let ConstraintData::DirectionSetCell { directions, .. } = &existing.data {
                if directions.len() > 1 {
                    let mut after = existing.clone();
                    if let ConstraintData::DirectionSetCell { directions, .. } = &mut after.data {
                        directions.remove(direction);
                    }
                    Self::update_live(state, ctx, target, after);
                    return;
                }
            }
        }
        if let Some(command) = ctx.remove_live(target) {
            state.pending.push(command);
        }
    }

    fn apply(&self, state: &mut BasicState, hit: &FeatureHit, ctx: &mut ToolContext) {
        let Some(placement) = self.placement(hit, ctx.grid) else {
            return;
        };
        let probe = self.probe(ctx.store, &placement);
        if state.mode == Mode::Undecided {
            state.mode = match state.intent {
                Intent::AddEdit => Mode::Add,
                Intent::Delete => Mode::Delete,
                Intent::Select => Mode::Select,
                Intent::Dynamic => match probe {
                    Probe::Present(_) => Mode::Delete,
                    Probe::Absent | Probe::Differs(_) => Mode::Add,
                },
            };
        }
        match state.mode {
            Mode::Add => self.add(state, ctx, &placement, probe),
            Mode::Delete => Self::delete(state, ctx, &placement, probe),
            Mode::Select => match probe {
                Probe::Present(target) | Probe::Differs(target) => ctx.select(target),
                Probe::Absent => ctx.clear_selection(),
            },
            Mode::Undecided => {}
        }
    }

    pub fn handle(
        &self,
        mut state: BasicState,
        input: &ToolInput,
        ctx: &mut ToolContext,
    ) -> BasicState {
        match input.event {
            ToolEvent::DragStart(hit) => {
                state = BasicState {
                    intent: Intent::from_modifiers(input.modifiers),
                    ..BasicState::default()
                };
                self.apply(&mut state, &hit, ctx);
                state
            }
            ToolEvent::Drag(hit) => {
                self.apply(&mut state, &hit, ctx);
                state
            }
            ToolEvent::DragEnd => {
                ctx.commit(std::mem::take(&mut state.pending));
                BasicState::default()
            }
            ToolEvent::Tap { .. } => state,
        }
    }

    pub fn cancel(mut state: BasicState, ctx: &mut ToolContext) {
        state.pending.un_execute(ctx.store);
    }
}
