//! Reversible store mutations.
//!
//! Tools apply most edits live while a gesture runs and record them at the
//! end; the `capture` constructors build a command from a change that has
//! already been applied, so it can be pushed with `execute = false`.

use super::{ConstraintRef, ConstraintStore, ConstraintsElement, ElementId};
use crate::constraint::{Constraint, ToolId};
use crate::history::Command;

/// An element created alongside an instance, restored at its position.
#[derive(Debug, Clone)]
struct ElementShell {
    index: usize,
    element: ConstraintsElement,
}

/// Add an instance, creating its element when needed.
#[derive(Debug, Clone)]
pub struct AddConstraint {
    target: ConstraintRef,
    constraint: Constraint,
    index: usize,
    created: Option<ElementShell>,
}

impl AddConstraint {
    /// Command for an instance that is already in the store. With
    /// `created_element`, undo also removes its element.
    pub fn capture(
        store: &ConstraintStore,
        target: ConstraintRef,
        created_element: bool,
    ) -> Option<Self> {
        let element = store.element(target.element)?;
        let constraint = element.get(target.id)?.clone();
        let index = element.position(target.id)?;
        let created = if created_element {
            Some(ElementShell {
                index: store.position(target.element)?,
                element: element.shell(),
            })
        } else {
            None
        };
        Some(Self {
            target,
            constraint,
            index,
            created,
        })
    }
}

impl Command<ConstraintStore> for AddConstraint {
    fn execute(&mut self, store: &mut ConstraintStore) {
        if let Some(shell) = &self.created {
            store.insert_element_at(self.target.element, shell.element.clone(), shell.index);
        }
        store.insert_constraint_at(self.target, self.constraint.clone(), self.index);
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        store.remove_constraint(self.target);
        if self.created.is_some() {
            store.remove_element(self.target.element);
        }
    }
}

/// Remove an instance; the element goes with it when nothing else is left
/// in it.
#[derive(Debug, Clone)]
pub struct RemoveConstraint {
    target: ConstraintRef,
    constraint: Constraint,
    index: usize,
    removed_element: Option<ElementShell>,
}

impl RemoveConstraint {
    /// Command that removes `target`, based on the current store state.
    pub fn capture(store: &ConstraintStore, target: ConstraintRef) -> Option<Self> {
        let element = store.element(target.element)?;
        let constraint = element.get(target.id)?.clone();
        let index = element.position(target.id)?;
        let removed_element = (element.len() == 1 && element.negative_flags().is_empty())
            .then(|| {
                store.position(target.element).map(|index| ElementShell {
                    index,
                    element: element.shell(),
                })
            })
            .flatten();
        Some(Self {
            target,
            constraint,
            index,
            removed_element,
        })
    }
}

impl Command<ConstraintStore> for RemoveConstraint {
    fn execute(&mut self, store: &mut ConstraintStore) {
        store.remove_constraint(self.target);
        if self.removed_element.is_some() {
            store.remove_element(self.target.element);
        }
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        if let Some(shell) = &self.removed_element {
            store.insert_element_at(self.target.element, shell.element.clone(), shell.index);
        }
        store.insert_constraint_at(self.target, self.constraint.clone(), self.index);
    }
}

/// Replace an instance's data.
#[derive(Debug, Clone)]
pub struct UpdateConstraint {
    target: ConstraintRef,
    before: Constraint,
    after: Constraint,
}

impl UpdateConstraint {
    pub fn new(target: ConstraintRef, before: Constraint, after: Constraint) -> Self {
        Self {
            target,
            before,
            after,
        }
    }

    /// Command that changes `target` to `after`, or `None` if nothing changes.
    pub fn to(store: &ConstraintStore, target: ConstraintRef, after: Constraint) -> Option<Self> {
        let before = store.constraint(target)?.clone();
        (before != after).then(|| Self::new(target, before, after))
    }
}

impl Command<ConstraintStore> for UpdateConstraint {
    fn execute(&mut self, store: &mut ConstraintStore) {
        store.update_constraint(self.target, self.after.clone());
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        store.update_constraint(self.target, self.before.clone());
    }
}

/// Add a whole element.
#[derive(Debug, Clone)]
pub struct AddElement {
    id: ElementId,
    index: usize,
    element: ConstraintsElement,
}

impl AddElement {
    /// Command for an element that is already in the store.
    pub fn capture(store: &ConstraintStore, id: ElementId) -> Option<Self> {
        Some(Self {
            id,
            index: store.position(id)?,
            element: store.element(id)?.clone(),
        })
    }
}

impl Command<ConstraintStore> for AddElement {
    fn execute(&mut self, store: &mut ConstraintStore) {
        store.insert_element_at(self.id, self.element.clone(), self.index);
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        store.remove_element(self.id);
    }
}

/// Remove a whole element with all of its instances.
#[derive(Debug, Clone)]
pub struct RemoveElement {
    id: ElementId,
    index: usize,
    element: ConstraintsElement,
}

impl RemoveElement {
    pub fn capture(store: &ConstraintStore, id: ElementId) -> Option<Self> {
        Some(Self {
            id,
            index: store.position(id)?,
            element: store.element(id)?.clone(),
        })
    }
}

impl Command<ConstraintStore> for RemoveElement {
    fn execute(&mut self, store: &mut ConstraintStore) {
        store.remove_element(self.id);
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        store.insert_element_at(self.id, self.element.clone(), self.index);
    }
}

/// Move an element within the store order.
#[derive(Debug, Clone, Copy)]
pub struct MoveElement {
    id: ElementId,
    from: usize,
    to: usize,
}

impl MoveElement {
    pub fn new(id: ElementId, from: usize, to: usize) -> Self {
        Self { id, from, to }
    }
}

impl Command<ConstraintStore> for MoveElement {
    fn execute(&mut self, store: &mut ConstraintStore) {
        store.move_to(self.id, self.to);
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        store.move_to(self.id, self.from);
    }
}

/// Enable or disable an element.
#[derive(Debug, Clone, Copy)]
pub struct SetElementEnabled {
    id: ElementId,
    enabled: bool,
    previous: bool,
}

impl SetElementEnabled {
    pub fn new(id: ElementId, enabled: bool, previous: bool) -> Self {
        Self {
            id,
            enabled,
            previous,
        }
    }
}

impl Command<ConstraintStore> for SetElementEnabled {
    fn execute(&mut self, store: &mut ConstraintStore) {
        store.set_enabled(self.id, self.enabled);
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        store.set_enabled(self.id, self.previous);
    }
}

/// Set or clear a negative-constraint flag.
#[derive(Debug, Clone, Copy)]
pub struct SetNegativeFlag {
    id: ElementId,
    flag: ToolId,
    value: Option<bool>,
    previous: Option<bool>,
}

impl SetNegativeFlag {
    pub fn new(id: ElementId, flag: ToolId, value: Option<bool>, previous: Option<bool>) -> Self {
        Self {
            id,
            flag,
            value,
            previous,
        }
    }
}

impl Command<ConstraintStore> for SetNegativeFlag {
    fn execute(&mut self, store: &mut ConstraintStore) {
        store.set_negative_flag(self.id, self.flag, self.value);
    }

    fn un_execute(&mut self, store: &mut ConstraintStore) {
        store.set_negative_flag(self.id, self.flag, self.previous);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintData;
    use crate::grid::GridCoord;
    use crate::history::CommandHistory;

    fn cage(cells: &[(i32, i32)]) -> Constraint {
        Constraint::new(
            ToolId::KillerCage,
            ConstraintData::Cage {
                cells: cells.iter().map(|&(r, c)| GridCoord::new(r, c)).collect(),
                value: None,
            },
        )
    }

    fn given(row: i32) -> Constraint {
        Constraint::new(
            ToolId::Given,
            ConstraintData::Cell {
                cell: GridCoord::new(row, 0),
                value: None,
            },
        )
    }

    #[test]
    fn test_add_undo_redo_restores_ids() {
        let mut store = ConstraintStore::new();
        let mut history = CommandHistory::default();
        let added = store.add_local_constraint(cage(&[(0, 0), (0, 1)]));
        let command = AddConstraint::capture(&store, added.target, added.created_element).unwrap();
        history.add_command(&mut store, command, false);

        history.undo(&mut store);
        assert!(store.is_empty());

        history.redo(&mut store);
        assert_eq!(store.element_ids(), &[added.target.element]);
        assert_eq!(store.constraint(added.target), Some(&cage(&[(0, 0), (0, 1)])));
    }

    #[test]
    fn test_remove_restores_position() {
        let mut store = ConstraintStore::new();
        let targets: Vec<_> = (0..3).map(|r| store.add_local_constraint(given(r)).target).collect();
        let before = store.clone();

        let mut history = CommandHistory::default();
        let command = RemoveConstraint::capture(&store, targets[1]).unwrap();
        history.add_command(&mut store, command, true);
        assert_eq!(store.element(targets[1].element).unwrap().len(), 2);

        history.undo(&mut store);
        assert_eq!(store, before);
    }

    #[test]
    fn test_removing_last_instance_drops_element() {
        let mut store = ConstraintStore::new();
        let first = store.add_element(ConstraintsElement::new(ToolId::Odd));
        let added = store.add_local_constraint(cage(&[(3, 3)]));
        store.add_element(ConstraintsElement::new(ToolId::Even));
        let before = store.clone();

        let mut history = CommandHistory::default();
        let command = RemoveConstraint::capture(&store, added.target).unwrap();
        history.add_command(&mut store, command, true);
        assert_eq!(store.len(), 2);
        assert_eq!(store.element_ids()[0], first);

        history.undo(&mut store);
        assert_eq!(store, before);
    }

    #[test]
    fn test_update_round_trip() {
        let mut store = ConstraintStore::new();
        let added = store.add_local_constraint(given(0));
        assert!(UpdateConstraint::to(&store, added.target, given(0)).is_none());

        let mut history = CommandHistory::default();
        let command = UpdateConstraint::to(&store, added.target, given(4)).unwrap();
        history.add_command(&mut store, command, true);
        assert_eq!(store.constraint(added.target), Some(&given(4)));
        history.undo(&mut store);
        assert_eq!(store.constraint(added.target), Some(&given(0)));
    }

    #[test]
    fn test_element_commands() {
        let mut store = ConstraintStore::new();
        let a = store.add_element(ConstraintsElement::new(ToolId::Given));
        let b = store.add_element(ConstraintsElement::new(ToolId::Odd));
        let mut history = CommandHistory::default();

        history.add_command(&mut store, MoveElement::new(b, 1, 0), true);
        assert_eq!(store.element_ids(), &[b, a]);
        history.add_command(&mut store, SetElementEnabled::new(a, false, true), true);
        history.add_command(
            &mut store,
            SetNegativeFlag::new(a, ToolId::AntiKing, Some(true), None),
            true,
        );
        let remove = RemoveElement::capture(&store, b).unwrap();
        history.add_command(&mut store, remove, true);
        assert_eq!(store.element_ids(), &[a]);

        while history.undo(&mut store) {}
        assert_eq!(store.element_ids(), &[a, b]);
        assert!(!store.element(a).unwrap().disabled);
        assert_eq!(store.negative_flag(a, ToolId::AntiKing), None);
    }
}
