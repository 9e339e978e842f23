//! Editing session: routes pointer and keyboard input to the active tool and
//! records every change in the undo history.

use crate::config::EditorConfig;
use crate::constraint::{
    Constraint, ConstraintData, ShapeStyle, ToolFamily, ToolId, apply_key, is_identifier,
};
use crate::error::{ConfigError, ConfigResult, StoreResult};
use crate::geometry::FeatureHit;
use crate::gesture::{GestureEvent, GestureRecognizer};
use crate::grid::Grid;
use crate::history::{Command, CommandBatch, CommandHistory, HistoryChange};
use crate::input::{KeyEvent, Modifiers, MouseButton, PointerEvent, keys};
use crate::observer::SubscriptionId;
use crate::store::{
    AddConstraint, AddElement, ConstraintRef, ConstraintStore, ConstraintsElement, ElementId,
    MoveElement, RemoveConstraint, RemoveElement, SetElementEnabled, SetNegativeFlag, StoreChange,
    UpdateConstraint,
};
use crate::surface::SurfaceTransform;
use crate::tools::{ToolContext, ToolEffect, ToolEvent, ToolInput, ToolRegistry, ToolState};

/// One editing session over a grid.
pub struct Editor {
    grid: Grid,
    config: EditorConfig,
    store: ConstraintStore,
    history: CommandHistory<ConstraintStore>,
    registry: ToolRegistry,
    current_tool: ToolId,
    /// `None` for tools without pointer input.
    recognizer: Option<GestureRecognizer>,
    tool_state: Option<ToolState>,
    modifiers: Modifiers,
    selection: Option<ConstraintRef>,
    hover: Option<FeatureHit>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("grid", &self.grid)
            .field("tool", &self.current_tool)
            .field("elements", &self.store.len())
            .field("history", &self.history)
            .field("selection", &self.selection)
            .finish()
    }
}

impl Editor {
    pub fn new(grid: Grid, config: EditorConfig) -> ConfigResult<Self> {
        config.validate()?;
        if grid.rows <= 0 || grid.cols <= 0 {
            return Err(ConfigError::Invalid(format!(
                "grid must have at least one cell, got {}x{}",
                grid.rows, grid.cols
            )));
        }
        let mut editor = Self {
            grid,
            registry: ToolRegistry::new(&config),
            history: CommandHistory::new(config.history_limit),
            config,
            store: ConstraintStore::new(),
            current_tool: ToolId::default(),
            recognizer: None,
            tool_state: None,
            modifiers: Modifiers::NONE,
            selection: None,
            hover: None,
        };
        editor.set_tool(ToolId::default());
        Ok(editor)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &ConstraintStore {
        &self.store
    }

    pub fn history(&self) -> &CommandHistory<ConstraintStore> {
        &self.history
    }

    pub fn current_tool(&self) -> ToolId {
        self.current_tool
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn selection(&self) -> Option<ConstraintRef> {
        self.selection
    }

    pub fn selected_constraint(&self) -> Option<&Constraint> {
        self.store.constraint(self.selection?)
    }

    pub fn hover(&self) -> Option<FeatureHit> {
        self.hover
    }

    pub fn subscribe_store(
        &mut self,
        listener: impl FnMut(&StoreChange) + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe_store(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn subscribe_history(
        &mut self,
        listener: impl FnMut(&HistoryChange) + 'static,
    ) -> SubscriptionId {
        self.history.subscribe(listener)
    }

    pub fn unsubscribe_history(&mut self, id: SubscriptionId) -> bool {
        self.history.unsubscribe(id)
    }

    /// Switch tools, reverting any gesture in progress.
    pub fn set_tool(&mut self, tool: ToolId) {
        self.cancel();
        self.current_tool = tool;
        self.recognizer = tool.recognizer().map(|spec| {
            GestureRecognizer::new(spec, &self.config.gesture, &self.config.geometry, self.grid)
        });
        self.tool_state = None;
        self.hover = None;
        log::debug!("tool set to {tool}");
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// True while a press is being tracked.
    pub fn is_gesture_active(&self) -> bool {
        self.recognizer.as_ref().is_some_and(GestureRecognizer::is_down)
    }

    /// Edits recorded outside a gesture are refused while one is running, as
    /// the store holds its uncommitted changes.
    fn gesture_blocks_edit(&self) -> bool {
        let active = self.is_gesture_active();
        if active {
            log::debug!("edit refused during a {} gesture", self.current_tool);
        }
        active
    }

    /// Feed one pointer event. Only the primary button drives tools.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent, transform: &SurfaceTransform) {
        if event.button().is_some_and(|button| button != MouseButton::Left) {
            return;
        }
        let Some(recognizer) = self.recognizer.as_mut() else {
            return;
        };
        let point = transform.screen_to_board(event.position());
        let time_ms = event.time_ms();
        let gestures = match event {
            PointerEvent::Down { .. } => recognizer.pointer_down(point, time_ms),
            PointerEvent::Move { .. } => recognizer.pointer_move(point, time_ms),
            PointerEvent::Up { .. } => recognizer.pointer_up(point, time_ms),
        };
        for gesture in gestures {
            self.dispatch(gesture);
        }
    }

    fn dispatch(&mut self, gesture: GestureEvent) {
        let event = match gesture {
            GestureEvent::Move(hit) => {
                self.hover = Some(hit);
                return;
            }
            GestureEvent::DragStart(hit) => ToolEvent::DragStart(hit),
            GestureEvent::Drag(hit) => ToolEvent::Drag(hit),
            GestureEvent::DragEnd(_) => ToolEvent::DragEnd,
            GestureEvent::Tap { hit, count } => ToolEvent::Tap { hit, count },
        };
        let Some(handler) = self.registry.get(self.current_tool) else {
            return;
        };
        let state = self
            .tool_state
            .take()
            .unwrap_or_else(|| handler.initial_state());
        let input = ToolInput {
            event,
            modifiers: self.modifiers,
        };
        let mut ctx = ToolContext::new(&mut self.store, self.grid);
        let next = handler.handle(state, &input, &mut ctx);
        let effects = ctx.into_effects();
        self.tool_state = Some(next);
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Vec<ToolEffect>) {
        for effect in effects {
            match effect {
                ToolEffect::Commit(batch) => {
                    log::debug!("{} committed {} command(s)", self.current_tool, batch.len());
                    self.history.add_commands(&mut self.store, batch, false);
                }
                ToolEffect::Select(target) => self.selection = Some(target),
                ToolEffect::ClearSelection => self.selection = None,
            }
        }
        self.validate_selection();
    }

    fn validate_selection(&mut self) {
        if self
            .selection
            .is_some_and(|target| self.store.constraint(target).is_none())
        {
            self.selection = None;
        }
    }

    /// Revert the gesture in progress, if any.
    pub fn cancel(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.reset();
        }
        let Some(state) = self.tool_state.take() else {
            return;
        };
        if let Some(handler) = self.registry.get(self.current_tool) {
            let mut ctx = ToolContext::new(&mut self.store, self.grid);
            handler.cancel(state, &mut ctx);
        }
        self.validate_selection();
    }

    pub fn undo(&mut self) -> bool {
        self.cancel();
        let undone = self.history.undo(&mut self.store);
        self.validate_selection();
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.cancel();
        let redone = self.history.redo(&mut self.store);
        self.validate_selection();
        redone
    }

    /// Feed one key event.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        let (key, pressed) = match event {
            KeyEvent::Pressed(key) => (key.as_str(), true),
            KeyEvent::Released(key) => (key.as_str(), false),
        };
        match key {
            keys::SHIFT => self.modifiers.shift = pressed,
            keys::CONTROL => self.modifiers.ctrl = pressed,
            keys::ALT => self.modifiers.alt = pressed,
            keys::META => self.modifiers.meta = pressed,
            _ if !pressed => {}
            keys::ESCAPE => {
                self.cancel();
                self.selection = None;
            }
            keys::DELETE => {
                self.delete_selected();
            }
            _ if self.modifiers.command() => match key {
                "z" | "Z" if self.modifiers.shift => {
                    self.redo();
                }
                "z" | "Z" => {
                    self.undo();
                }
                "y" | "Y" => {
                    self.redo();
                }
                _ => {}
            },
            _ => {
                self.type_key(key);
            }
        }
    }

    /// Apply a keystroke to the selected instance's value.
    fn type_key(&mut self, key: &str) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        let Some(target) = self.selection else {
            return false;
        };
        let Some(constraint) = self.store.constraint(target) else {
            return false;
        };
        let Some(rules) = constraint.tool.value_rules() else {
            return false;
        };
        let Some(value) = apply_key(constraint.value().unwrap_or(""), key, &rules) else {
            return false;
        };
        let after = constraint.with_value(&value);
        self.record_update(target, after)
    }

    /// Remove the selected instance.
    pub fn delete_selected(&mut self) -> bool {
        self.cancel();
        let Some(target) = self.selection.take() else {
            return false;
        };
        match RemoveConstraint::capture(&self.store, target) {
            Some(command) => {
                self.history.add_command(&mut self.store, command, true);
                true
            }
            None => false,
        }
    }

    fn record_update(&mut self, target: ConstraintRef, after: Constraint) -> bool {
        match UpdateConstraint::to(&self.store, target, after) {
            Some(command) => {
                self.history.add_command(&mut self.store, command, true);
                true
            }
            None => false,
        }
    }

    /// Add an instance where its tool keeps instances and record it.
    fn record_add(&mut self, constraint: Constraint) -> Option<ConstraintRef> {
        let added = self.store.add_local_constraint(constraint);
        let command = AddConstraint::capture(&self.store, added.target, added.created_element)?;
        self.history.add_command(&mut self.store, command, false);
        Some(added.target)
    }

    fn record_remove(&mut self, target: ConstraintRef) -> bool {
        match RemoveConstraint::capture(&self.store, target) {
            Some(command) => {
                self.history.add_command(&mut self.store, command, true);
                self.validate_selection();
                true
            }
            None => false,
        }
    }

    /// Turn a global rule on, or off when it is already on.
    pub fn toggle_global_rule(&mut self, flag: ToolId) -> bool {
        let on = self
            .store
            .element_for_tool(ToolId::GlobalRules)
            .and_then(|id| self.store.negative_flag(id, flag))
            == Some(true);
        self.set_negative_flag(ToolId::GlobalRules, flag, (!on).then_some(true))
    }

    /// Set (`Some`) or clear (`None`) a flag on `tool`'s element, creating
    /// the element when needed. Returns false for flags the tool does not
    /// carry and for no-op changes.
    pub fn set_negative_flag(
        &mut self,
        tool: ToolId,
        flag: ToolId,
        value: Option<bool>,
    ) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        if !tool.negative_flags().contains(&flag) {
            return false;
        }
        let mut batch = CommandBatch::new();
        let element = match self.store.element_for_tool(tool) {
            Some(id) => id,
            None if value.is_none() => return false,
            None => {
                let id = self.store.add_element(ConstraintsElement::new(tool));
                let Some(command) = AddElement::capture(&self.store, id) else {
                    return false;
                };
                batch.push(command);
                id
            }
        };
        let previous = self.store.negative_flag(element, flag);
        if previous == value {
            return false;
        }
        let mut command = SetNegativeFlag::new(element, flag, value, previous);
        command.execute(&mut self.store);
        batch.push(command);
        self.history.add_commands(&mut self.store, batch, false);
        log::debug!("{flag} on {tool} set to {value:?}");
        true
    }

    pub fn negative_flag(&self, tool: ToolId, flag: ToolId) -> Option<bool> {
        let id = self.store.element_for_tool(tool)?;
        self.store.negative_flag(id, flag)
    }

    /// Set or clear a valued global such as the maximum digit.
    pub fn set_global_value(&mut self, tool: ToolId, value: Option<&str>) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        if tool.family() != ToolFamily::ValuedGlobal {
            return false;
        }
        let existing = self.store.find_first(tool, |_| true);
        self.upsert_value(existing, value, || {
            Constraint::new(tool, ConstraintData::ValuedGlobal { value: None })
        })
    }

    pub fn global_value(&self, tool: ToolId) -> Option<&str> {
        let target = self.store.find_first(tool, |_| true)?;
        self.store.constraint(target)?.value()
    }

    /// Define or update a variable. Returns false for invalid names or values.
    pub fn set_variable(&mut self, name: &str, value: Option<&str>) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        if !is_identifier(name) {
            return false;
        }
        let existing = self.store.find_variable(name);
        let name = name.to_string();
        self.upsert_value(existing, value.or(Some("")), || {
            Constraint::new(ToolId::Variable, ConstraintData::Variable { name, value: None })
        })
    }

    pub fn remove_variable(&mut self, name: &str) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        match self.store.find_variable(name) {
            Some(target) => self.record_remove(target),
            None => false,
        }
    }

    /// Shared update-or-create logic for value-only instances. An empty or
    /// missing value removes an existing instance unless it is a variable.
    fn upsert_value(
        &mut self,
        existing: Option<ConstraintRef>,
        value: Option<&str>,
        make: impl FnOnce() -> Constraint,
    ) -> bool {
        let template = match existing {
            Some(target) => match self.store.constraint(target) {
                Some(constraint) => constraint.clone(),
                None => return false,
            },
            None => make(),
        };
        let keeps_empty = template.tool == ToolId::Variable;
        let value = value.filter(|v| !v.is_empty() || keeps_empty);
        if let (Some(v), Some(rules)) = (value, template.tool.value_rules()) {
            if !rules.accepts(v) {
                return false;
            }
        }
        match (existing, value) {
            (Some(target), None) => self.record_remove(target),
            (Some(target), Some(v)) => self.record_update(target, template.with_value(v)),
            (None, Some(v)) => self.record_add(template.with_value(v)).is_some(),
            (None, None) => false,
        }
    }

    pub fn move_element_up(&mut self, id: ElementId) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        match self.store.position(id) {
            Some(from) if from > 0 => {
                self.history
                    .add_command(&mut self.store, MoveElement::new(id, from, from - 1), true);
                true
            }
            _ => false,
        }
    }

    pub fn move_element_down(&mut self, id: ElementId) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        match self.store.position(id) {
            Some(from) if from + 1 < self.store.len() => {
                self.history
                    .add_command(&mut self.store, MoveElement::new(id, from, from + 1), true);
                true
            }
            _ => false,
        }
    }

    pub fn set_element_enabled(&mut self, id: ElementId, enabled: bool) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        let Some(element) = self.store.element(id) else {
            return false;
        };
        let previous = !element.disabled;
        if previous == enabled {
            return false;
        }
        self.history.add_command(
            &mut self.store,
            SetElementEnabled::new(id, enabled, previous),
            true,
        );
        true
    }

    pub fn remove_element(&mut self, id: ElementId) -> bool {
        self.cancel();
        let Some(command) = RemoveElement::capture(&self.store, id) else {
            return false;
        };
        self.history.add_command(&mut self.store, command, true);
        self.validate_selection();
        true
    }

    /// Replace or clear an instance's display style.
    pub fn set_shape_override(
        &mut self,
        target: ConstraintRef,
        shape: Option<ShapeStyle>,
    ) -> bool {
        if self.gesture_blocks_edit() {
            return false;
        }
        let Some(constraint) = self.store.constraint(target) else {
            return false;
        };
        let mut after = constraint.clone();
        after.shape = shape;
        self.record_update(target, after)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        self.store.to_json()
    }

    /// Replace the document. History and selection are cleared; on error the
    /// current document is kept.
    pub fn load_json(&mut self, json: &str) -> StoreResult<()> {
        let loaded = ConstraintStore::from_json(json)?;
        self.cancel();
        self.store.replace_content(loaded);
        self.history.clear();
        self.selection = None;
        log::info!("loaded document with {} elements", self.store.len());
        Ok(())
    }
}
