//! Command-based undo/redo.
//!
//! Commands receive the target they act on instead of capturing it, so a
//! history can own its batches while the caller keeps ownership of the
//! target.

use crate::observer::{SubscriptionId, Subscribers};
use std::fmt;

/// A reversible mutation of `T`.
pub trait Command<T>: fmt::Debug {
    fn execute(&mut self, target: &mut T);
    fn un_execute(&mut self, target: &mut T);
}

/// Commands undone and redone as one unit.
pub struct CommandBatch<T> {
    commands: Vec<Box<dyn Command<T>>>,
}

impl<T> Default for CommandBatch<T> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<T> fmt::Debug for CommandBatch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.commands).finish()
    }
}

impl<T> CommandBatch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(command: impl Command<T> + 'static) -> Self {
        let mut batch = Self::new();
        batch.push(command);
        batch
    }

    pub fn push(&mut self, command: impl Command<T> + 'static) {
        self.commands.push(Box::new(command));
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Execute in forward order.
    pub fn execute(&mut self, target: &mut T) {
        for command in &mut self.commands {
            command.execute(target);
        }
    }

    /// Un-execute in reverse order.
    pub fn un_execute(&mut self, target: &mut T) {
        for command in self.commands.iter_mut().rev() {
            command.un_execute(target);
        }
    }
}

/// Notifications sent to history subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryChange {
    Pushed,
    Undone,
    Redone,
    Cleared,
}

/// Undo and redo stacks of command batches.
pub struct CommandHistory<T> {
    undo_stack: Vec<CommandBatch<T>>,
    redo_stack: Vec<CommandBatch<T>>,
    /// Maximum undo depth; the oldest batch is dropped beyond it.
    limit: Option<usize>,
    subscribers: Subscribers<HistoryChange>,
}

impl<T> Default for CommandHistory<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> fmt::Debug for CommandHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHistory")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl<T> CommandHistory<T> {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit,
            subscribers: Subscribers::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&HistoryChange) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Record one command, executing it first when `execute` is set.
    pub fn add_command(
        &mut self,
        target: &mut T,
        command: impl Command<T> + 'static,
        execute: bool,
    ) {
        self.add_commands(target, CommandBatch::single(command), execute);
    }

    /// Record a batch as one undo unit. Empty batches are ignored.
    pub fn add_commands(&mut self, target: &mut T, mut batch: CommandBatch<T>, execute: bool) {
        if batch.is_empty() {
            return;
        }
        if execute {
            batch.execute(target);
        }
        self.undo_stack.push(batch);
        self.redo_stack.clear();
        if let Some(limit) = self.limit {
            let overflow = self.undo_stack.len().saturating_sub(limit);
            self.undo_stack.drain(..overflow);
        }
        self.subscribers.notify(&HistoryChange::Pushed);
    }

    /// Revert the latest batch. Returns false when there is nothing to undo.
    pub fn undo(&mut self, target: &mut T) -> bool {
        let Some(mut batch) = self.undo_stack.pop() else {
            return false;
        };
        batch.un_execute(target);
        self.redo_stack.push(batch);
        self.subscribers.notify(&HistoryChange::Undone);
        true
    }

    /// Re-apply the latest undone batch.
    pub fn redo(&mut self, target: &mut T) -> bool {
        let Some(mut batch) = self.redo_stack.pop() else {
            return false;
        };
        batch.execute(target);
        self.undo_stack.push(batch);
        self.subscribers.notify(&HistoryChange::Redone);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.subscribers.notify(&HistoryChange::Cleared);
    }
}
