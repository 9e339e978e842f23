//! The constraint store: an ordered collection of constraint elements.

mod commands;
mod element;
mod find;
mod serialize;

pub use commands::{
    AddConstraint, AddElement, MoveElement, RemoveConstraint, RemoveElement, SetElementEnabled,
    SetNegativeFlag, UpdateConstraint,
};
pub use element::{ConstraintId, ConstraintsElement};
pub use serialize::{ConstraintRecord, ElementRecord};

use crate::constraint::{Constraint, ElementPolicy, ToolId};
use crate::observer::{SubscriptionId, Subscribers};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Numeric element id. Ids are never reused within a store.
pub type ElementId = u32;

/// Address of one constraint instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintRef {
    pub element: ElementId,
    pub id: ConstraintId,
}

impl ConstraintRef {
    pub const fn new(element: ElementId, id: ConstraintId) -> Self {
        Self { element, id }
    }
}

/// Result of [`ConstraintStore::add_local_constraint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalAdd {
    pub target: ConstraintRef,
    /// True if a new element was created to hold the instance.
    pub created_element: bool,
}

/// Notifications sent to store subscribers after each mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    ElementAdded(ElementId),
    ElementRemoved(ElementId),
    /// Flags or the enabled state of an element changed.
    ElementChanged(ElementId),
    ElementsReordered,
    ConstraintAdded(ConstraintRef),
    ConstraintUpdated(ConstraintRef),
    ConstraintRemoved(ConstraintRef),
    /// The whole content was replaced.
    Reset,
}

/// Ordered collection of constraint elements.
#[derive(Default)]
pub struct ConstraintStore {
    elements: HashMap<ElementId, ConstraintsElement>,
    /// Render and serialization order of `elements`.
    order: Vec<ElementId>,
    next_id: ElementId,
    subscribers: Subscribers<StoreChange>,
}

impl fmt::Debug for ConstraintStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintStore")
            .field("order", &self.order)
            .field("elements", &self.elements)
            .field("next_id", &self.next_id)
            .finish()
    }
}

/// Compares content and order; subscribers and the id counter are ignored.
impl PartialEq for ConstraintStore {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.elements == other.elements
    }
}

/// Clones content only; the clone starts without subscribers.
impl Clone for ConstraintStore {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            order: self.order.clone(),
            next_id: self.next_id,
            subscribers: Subscribers::new(),
        }
    }
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreChange) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn notify(&mut self, change: StoreChange) {
        self.subscribers.notify(&change);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn element(&self, id: ElementId) -> Option<&ConstraintsElement> {
        self.elements.get(&id)
    }

    /// Elements in store order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &ConstraintsElement)> {
        self.order
            .iter()
            .filter_map(|id| self.elements.get(id).map(|e| (*id, e)))
    }

    pub fn element_ids(&self) -> &[ElementId] {
        &self.order
    }

    pub fn position(&self, id: ElementId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// The first element placed by `tool`.
    pub fn element_for_tool(&self, tool: ToolId) -> Option<ElementId> {
        self.elements()
            .find(|(_, element)| element.tool == tool)
            .map(|(id, _)| id)
    }

    pub fn constraint(&self, target: ConstraintRef) -> Option<&Constraint> {
        self.elements.get(&target.element)?.get(target.id)
    }

    /// All instances in store order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintRef, &Constraint)> {
        self.elements().flat_map(|(element_id, element)| {
            element
                .constraints()
                .map(move |(id, c)| (ConstraintRef::new(element_id, id), c))
        })
    }

    /// Append an element under a fresh id.
    pub fn add_element(&mut self, element: ConstraintsElement) -> ElementId {
        let id = self.next_id;
        let index = self.order.len();
        self.insert_element_at(id, element, index);
        id
    }

    /// Insert an element under a known id at `index`, clamped to the length.
    /// An existing element with that id is replaced in place.
    pub fn insert_element_at(&mut self, id: ElementId, element: ConstraintsElement, index: usize) {
        if self.elements.insert(id, element).is_none() {
            let index = index.min(self.order.len());
            self.order.insert(index, id);
        }
        self.next_id = self.next_id.max(id.saturating_add(1));
        self.notify(StoreChange::ElementAdded(id));
    }

    /// Remove an element, returning its former position.
    pub fn remove_element(&mut self, id: ElementId) -> Option<(usize, ConstraintsElement)> {
        let element = self.elements.remove(&id)?;
        let index = self.position(id)?;
        self.order.remove(index);
        self.notify(StoreChange::ElementRemoved(id));
        Some((index, element))
    }

    /// Append an instance to an existing element.
    pub fn add_constraint(
        &mut self,
        element: ElementId,
        id: ConstraintId,
        constraint: Constraint,
    ) -> bool {
        let index = self.elements.get(&element).map_or(0, ConstraintsElement::len);
        self.insert_constraint_at(ConstraintRef::new(element, id), constraint, index)
    }

    /// Insert an instance at `index` of an existing element.
    pub fn insert_constraint_at(
        &mut self,
        target: ConstraintRef,
        constraint: Constraint,
        index: usize,
    ) -> bool {
        let Some(element) = self.elements.get_mut(&target.element) else {
            return false;
        };
        element.insert_at(target.id, constraint, index);
        self.notify(StoreChange::ConstraintAdded(target));
        true
    }

    /// Add an instance where its tool keeps instances: the tool's shared
    /// element, created on demand, or a fresh element per instance.
    pub fn add_local_constraint(&mut self, constraint: Constraint) -> LocalAdd {
        let tool = constraint.tool;
        let existing = match tool.element_policy() {
            ElementPolicy::Shared => self.element_for_tool(tool),
            ElementPolicy::PerInstance => None,
        };
        let (element, created_element) = match existing {
            Some(id) => (id, false),
            None => (self.add_element(ConstraintsElement::new(tool)), true),
        };
        let target = ConstraintRef::new(element, Uuid::new_v4());
        self.add_constraint(element, target.id, constraint);
        LocalAdd {
            target,
            created_element,
        }
    }

    /// Replace an instance, returning the previous value.
    pub fn update_constraint(
        &mut self,
        target: ConstraintRef,
        constraint: Constraint,
    ) -> Option<Constraint> {
        let previous = self
            .elements
            .get_mut(&target.element)?
            .replace(target.id, constraint)?;
        self.notify(StoreChange::ConstraintUpdated(target));
        Some(previous)
    }

    /// Remove an instance, returning its former position.
    pub fn remove_constraint(&mut self, target: ConstraintRef) -> Option<(usize, Constraint)> {
        let removed = self.elements.get_mut(&target.element)?.remove(target.id)?;
        self.notify(StoreChange::ConstraintRemoved(target));
        Some(removed)
    }

    /// Remove an instance that was never recorded in history, together with
    /// its element when `drop_element` is set and the element is left empty.
    pub fn discard_constraint(&mut self, target: ConstraintRef, drop_element: bool) {
        self.remove_constraint(target);
        let empty = self
            .elements
            .get(&target.element)
            .is_some_and(ConstraintsElement::is_empty);
        if drop_element && empty {
            self.remove_element(target.element);
        }
    }

    /// Move an element one step toward the front of the order.
    pub fn move_up(&mut self, id: ElementId) -> bool {
        match self.position(id) {
            Some(pos) if pos > 0 => self.move_to(id, pos - 1),
            _ => false,
        }
    }

    /// Move an element one step toward the back of the order.
    pub fn move_down(&mut self, id: ElementId) -> bool {
        match self.position(id) {
            Some(pos) if pos + 1 < self.order.len() => self.move_to(id, pos + 1),
            _ => false,
        }
    }

    /// Move an element to `index`, clamped to the valid range.
    pub fn move_to(&mut self, id: ElementId, index: usize) -> bool {
        let Some(pos) = self.position(id) else {
            return false;
        };
        let index = index.min(self.order.len() - 1);
        if pos == index {
            return false;
        }
        self.order.remove(pos);
        self.order.insert(index, id);
        self.notify(StoreChange::ElementsReordered);
        true
    }

    /// Enable or disable an element, returning the previous enabled state.
    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) -> Option<bool> {
        let element = self.elements.get_mut(&id)?;
        let previous = !element.disabled;
        element.disabled = !enabled;
        self.notify(StoreChange::ElementChanged(id));
        Some(previous)
    }

    pub fn negative_flag(&self, id: ElementId, flag: ToolId) -> Option<bool> {
        self.elements.get(&id)?.negative_flag(flag)
    }

    /// Set (`Some`) or clear (`None`) a flag. Returns false when the
    /// element does not exist.
    pub fn set_negative_flag(&mut self, id: ElementId, flag: ToolId, value: Option<bool>) -> bool {
        let Some(element) = self.elements.get_mut(&id) else {
            return false;
        };
        element.set_negative_flag(flag, value);
        self.notify(StoreChange::ElementChanged(id));
        true
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.order.clear();
        self.notify(StoreChange::Reset);
    }

    /// Take over the content of `other`, keeping this store's subscribers.
    pub fn replace_content(&mut self, other: ConstraintStore) {
        self.elements = other.elements;
        self.order = other.order;
        self.next_id = self.next_id.max(other.next_id);
        self.notify(StoreChange::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintData;
    use crate::grid::GridCoord;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn given(row: i32, col: i32) -> Constraint {
        Constraint::new(
            ToolId::Given,
            ConstraintData::Cell {
                cell: GridCoord::new(row, col),
                value: Some("1".into()),
            },
        )
    }

    fn cage(cells: &[(i32, i32)]) -> Constraint {
        Constraint::new(
            ToolId::KillerCage,
            ConstraintData::Cage {
                cells: cells.iter().map(|&(r, c)| GridCoord::new(r, c)).collect(),
                value: None,
            },
        )
    }

    #[test]
    fn test_shared_tools_reuse_element() {
        let mut store = ConstraintStore::new();
        let first = store.add_local_constraint(given(0, 0));
        let second = store.add_local_constraint(given(0, 1));
        assert!(first.created_element);
        assert!(!second.created_element);
        assert_eq!(first.target.element, second.target.element);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_per_instance_tools_get_own_element() {
        let mut store = ConstraintStore::new();
        let a = store.add_local_constraint(cage(&[(0, 0)]));
        let b = store.add_local_constraint(cage(&[(1, 1)]));
        assert!(a.created_element && b.created_element);
        assert_ne!(a.target.element, b.target.element);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_element_ids_are_not_reused() {
        let mut store = ConstraintStore::new();
        let a = store.add_element(ConstraintsElement::new(ToolId::Given));
        store.remove_element(a);
        let b = store.add_element(ConstraintsElement::new(ToolId::Given));
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_and_reinsert_element() {
        let mut store = ConstraintStore::new();
        let ids: Vec<_> = (0..3)
            .map(|_| store.add_element(ConstraintsElement::new(ToolId::Given)))
            .collect();
        let (index, element) = store.remove_element(ids[1]).unwrap();
        store.insert_element_at(ids[1], element, index);
        assert_eq!(store.element_ids(), &ids[..]);
    }

    #[test]
    fn test_reorder() {
        let mut store = ConstraintStore::new();
        let a = store.add_element(ConstraintsElement::new(ToolId::Given));
        let b = store.add_element(ConstraintsElement::new(ToolId::Odd));
        assert!(!store.move_up(a));
        assert!(store.move_up(b));
        assert_eq!(store.element_ids(), &[b, a]);
        assert!(!store.move_down(a));
        assert!(store.move_down(b));
        assert_eq!(store.element_ids(), &[a, b]);
    }

    #[test]
    fn test_update_and_remove_constraint() {
        let mut store = ConstraintStore::new();
        let added = store.add_local_constraint(given(0, 0));
        let previous = store.update_constraint(added.target, given(5, 5)).unwrap();
        assert_eq!(previous, given(0, 0));
        assert_eq!(store.constraint(added.target), Some(&given(5, 5)));

        let (index, removed) = store.remove_constraint(added.target).unwrap();
        assert_eq!(index, 0);
        assert_eq!(removed, given(5, 5));
        assert!(store.constraint(added.target).is_none());
        assert!(store.update_constraint(added.target, given(1, 1)).is_none());
    }

    #[test]
    fn test_discard_drops_new_element() {
        let mut store = ConstraintStore::new();
        let added = store.add_local_constraint(cage(&[(0, 0)]));
        store.discard_constraint(added.target, added.created_element);
        assert!(store.is_empty());
    }

    #[test]
    fn test_flags_and_enabled() {
        let mut store = ConstraintStore::new();
        let id = store.add_element(ConstraintsElement::new(ToolId::GlobalRules));
        assert!(store.set_negative_flag(id, ToolId::AntiKing, Some(true)));
        assert_eq!(store.negative_flag(id, ToolId::AntiKing), Some(true));
        assert!(store.set_negative_flag(id, ToolId::AntiKing, None));
        assert_eq!(store.negative_flag(id, ToolId::AntiKing), None);
        assert!(!store.set_negative_flag(99, ToolId::AntiKing, None));

        assert_eq!(store.set_enabled(id, false), Some(true));
        assert!(store.element(id).unwrap().disabled);
    }

    #[test]
    fn test_subscribers_see_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = ConstraintStore::new();
        let sink = seen.clone();
        store.subscribe(move |change| sink.borrow_mut().push(*change));

        let added = store.add_local_constraint(given(0, 0));
        assert_eq!(
            *seen.borrow(),
            vec![
                StoreChange::ElementAdded(added.target.element),
                StoreChange::ConstraintAdded(added.target),
            ]
        );
    }
}
