//! Tool state machines.
//!
//! A tool consumes feature-level gesture events and edits the store. Edits
//! made during a drag are applied live so the document always shows the
//! shape being drawn; the tool hands the finished change to the editor as a
//! command batch, which is recorded in history without executing it again.
//! Cancelling a gesture reverts everything applied live.

mod arrow;
mod basic;
mod cage;
mod clone_tool;
mod growth;
mod line;

pub use arrow::{ArrowState, ArrowTool};
pub use basic::{BasicState, BasicTool};
pub use cage::{CageState, CageTool};
pub use clone_tool::{CloneState, CloneTool};
pub use growth::{
    LineRule, LineStep, add_to_connected_group, bounding_box, grow_line, is_connected,
    translate_cells,
};
pub use line::{LineSpace, LineState, LineTool};

use crate::config::EditorConfig;
use crate::constraint::{ToolFamily, ToolId};
use crate::geometry::FeatureHit;
use crate::grid::Grid;
use crate::history::{Command, CommandBatch};
use crate::input::Modifiers;
use crate::store::{ConstraintRef, ConstraintStore, RemoveConstraint};
use std::collections::HashMap;

/// Gesture events as seen by a tool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolEvent {
    DragStart(FeatureHit),
    Drag(FeatureHit),
    DragEnd,
    Tap { hit: FeatureHit, count: u32 },
}

/// A tool event together with the modifiers held at the time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolInput {
    pub event: ToolEvent,
    pub modifiers: Modifiers,
}

/// What a gesture does, forced by modifiers or decided by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    /// Add where empty, delete where present.
    #[default]
    Dynamic,
    AddEdit,
    Delete,
    Select,
}

impl Intent {
    /// Alt deletes, Ctrl/Cmd selects, Shift always adds.
    pub fn from_modifiers(modifiers: Modifiers) -> Self {
        if modifiers.alt {
            Intent::Delete
        } else if modifiers.command() {
            Intent::Select
        } else if modifiers.shift {
            Intent::AddEdit
        } else {
            Intent::Dynamic
        }
    }
}

/// Requests a tool makes of the editor.
#[derive(Debug)]
pub enum ToolEffect {
    /// Record an already applied change as one undo unit.
    Commit(CommandBatch<ConstraintStore>),
    Select(ConstraintRef),
    ClearSelection,
}

/// Mutable access for a tool while it handles one event.
pub struct ToolContext<'a> {
    pub store: &'a mut ConstraintStore,
    pub grid: Grid,
    effects: Vec<ToolEffect>,
}

impl<'a> ToolContext<'a> {
    pub fn new(store: &'a mut ConstraintStore, grid: Grid) -> Self {
        Self {
            store,
            grid,
            effects: Vec::new(),
        }
    }

    /// Hand over an applied change. Empty batches are dropped.
    pub fn commit(&mut self, batch: CommandBatch<ConstraintStore>) {
        if !batch.is_empty() {
            self.effects.push(ToolEffect::Commit(batch));
        }
    }

    pub fn commit_one(&mut self, command: impl Command<ConstraintStore> + 'static) {
        self.commit(CommandBatch::single(command));
    }

    pub fn select(&mut self, target: ConstraintRef) {
        self.effects.push(ToolEffect::Select(target));
    }

    pub fn clear_selection(&mut self) {
        self.effects.push(ToolEffect::ClearSelection);
    }

    /// Remove `target` now and return the command that did it.
    pub fn remove_live(&mut self, target: ConstraintRef) -> Option<RemoveConstraint> {
        let mut command = RemoveConstraint::capture(self.store, target)?;
        command.execute(self.store);
        Some(command)
    }

    pub fn into_effects(self) -> Vec<ToolEffect> {
        self.effects
    }
}

/// One tool's behaviour.
#[derive(Debug, Clone)]
pub enum ToolHandler {
    Basic(BasicTool),
    Line(LineTool),
    Arrow(ArrowTool),
    Cage(CageTool),
    Clone(CloneTool),
}

/// In-progress state of a [`ToolHandler`].
#[derive(Debug)]
pub enum ToolState {
    Basic(BasicState),
    Line(LineState),
    Arrow(ArrowState),
    Cage(CageState),
    Clone(CloneState),
}

impl ToolHandler {
    /// The handler for `tool`, or `None` for tools without pointer input.
    pub fn for_tool(tool: ToolId, config: &EditorConfig) -> Option<Self> {
        let handler = match tool.family() {
            ToolFamily::Cell
            | ToolFamily::DirectedCell
            | ToolFamily::DirectionSetCell
            | ToolFamily::Edge
            | ToolFamily::Corner
            | ToolFamily::CenterCornerOrEdge
            | ToolFamily::OutsideDirection => ToolHandler::Basic(BasicTool::new(tool)),
            ToolFamily::Line => ToolHandler::Line(LineTool::new(
                tool,
                LineSpace::Cells,
                config.line_rule(tool),
            )),
            ToolFamily::CornerLine => ToolHandler::Line(LineTool::new(
                tool,
                LineSpace::Corners,
                config.line_rule(tool),
            )),
            ToolFamily::Arrow => ToolHandler::Arrow(ArrowTool::new(
                tool,
                config.line_rule(tool),
                config.cage_diagonal,
            )),
            ToolFamily::Cage => ToolHandler::Cage(CageTool::new(tool, config.cage_diagonal)),
            ToolFamily::Clone => ToolHandler::Clone(CloneTool::new(tool, config.cage_diagonal)),
            ToolFamily::GlobalRules
            | ToolFamily::Flag
            | ToolFamily::ValuedGlobal
            | ToolFamily::Variable => return None,
        };
        Some(handler)
    }

    pub fn tool(&self) -> ToolId {
        match self {
            ToolHandler::Basic(t) => t.tool,
            ToolHandler::Line(t) => t.tool,
            ToolHandler::Arrow(t) => t.tool,
            ToolHandler::Cage(t) => t.tool,
            ToolHandler::Clone(t) => t.tool,
        }
    }

    pub fn initial_state(&self) -> ToolState {
        match self {
            ToolHandler::Basic(_) => ToolState::Basic(BasicState::default()),
            ToolHandler::Line(_) => ToolState::Line(LineState::default()),
            ToolHandler::Arrow(_) => ToolState::Arrow(ArrowState::default()),
            ToolHandler::Cage(_) => ToolState::Cage(CageState::default()),
            ToolHandler::Clone(_) => ToolState::Clone(CloneState::default()),
        }
    }

    /// Advance `state` by one event.
    pub fn handle(&self, state: ToolState, input: &ToolInput, ctx: &mut ToolContext) -> ToolState {
        match (self, state) {
            (ToolHandler::Basic(t), ToolState::Basic(s)) => {
                ToolState::Basic(t.handle(s, input, ctx))
            }
            (ToolHandler::Line(t), ToolState::Line(s)) => ToolState::Line(t.handle(s, input, ctx)),
            (ToolHandler::Arrow(t), ToolState::Arrow(s)) => {
                ToolState::Arrow(t.handle(s, input, ctx))
            }
            (ToolHandler::Cage(t), ToolState::Cage(s)) => ToolState::Cage(t.handle(s, input, ctx)),
            (ToolHandler::Clone(t), ToolState::Clone(s)) => {
                ToolState::Clone(t.handle(s, input, ctx))
            }
            (handler, state) => {
                log::warn!("dropping {state:?} that does not belong to {}", handler.tool());
                handler.handle(handler.initial_state(), input, ctx)
            }
        }
    }

    /// Revert live changes of an unfinished gesture.
    pub fn cancel(&self, state: ToolState, ctx: &mut ToolContext) {
        match state {
            ToolState::Basic(s) => BasicTool::cancel(s, ctx),
            ToolState::Line(s) => LineTool::cancel(s, ctx),
            ToolState::Arrow(s) => ArrowTool::cancel(s, ctx),
            ToolState::Cage(s) => CageTool::cancel(s, ctx),
            ToolState::Clone(s) => CloneTool::cancel(s, ctx),
        }
    }
}

/// Handlers for every interactive tool, built once per editing session.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    handlers: HashMap<ToolId, ToolHandler>,
}

impl ToolRegistry {
    pub fn new(config: &EditorConfig) -> Self {
        let handlers = ToolId::ALL
            .iter()
            .filter_map(|&tool| ToolHandler::for_tool(tool, config).map(|h| (tool, h)))
            .collect();
        Self { handlers }
    }

    pub fn get(&self, tool: ToolId) -> Option<&ToolHandler> {
        self.handlers.get(&tool)
    }

    pub fn contains(&self, tool: ToolId) -> bool {
        self.handlers.contains_key(&tool)
    }
}
