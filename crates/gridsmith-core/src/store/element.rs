use crate::constraint::{Constraint, ToolId};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Identifier of a constraint instance within its element.
pub type ConstraintId = Uuid;

/// A group of constraint instances placed by one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintsElement {
    pub tool: ToolId,
    constraints: HashMap<ConstraintId, Constraint>,
    /// Insertion order of `constraints`.
    order: Vec<ConstraintId>,
    negative_flags: BTreeMap<ToolId, bool>,
    pub disabled: bool,
}

impl ConstraintsElement {
    pub fn new(tool: ToolId) -> Self {
        Self {
            tool,
            constraints: HashMap::new(),
            order: Vec::new(),
            negative_flags: BTreeMap::new(),
            disabled: false,
        }
    }

    /// A copy with the same tool and flags but no instances.
    pub fn shell(&self) -> Self {
        Self {
            constraints: HashMap::new(),
            order: Vec::new(),
            ..self.clone()
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: ConstraintId) -> Option<&Constraint> {
        self.constraints.get(&id)
    }

    pub fn contains(&self, id: ConstraintId) -> bool {
        self.constraints.contains_key(&id)
    }

    /// Instances in insertion order.
    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &Constraint)> {
        self.order
            .iter()
            .filter_map(|id| self.constraints.get(id).map(|c| (*id, c)))
    }

    pub fn position(&self, id: ConstraintId) -> Option<usize> {
        self.order.iter().position(|&other| other == id)
    }

    /// Append an instance. An existing instance with the same id is replaced
    /// in place.
    pub fn insert(&mut self, id: ConstraintId, constraint: Constraint) {
        let index = self.order.len();
        self.insert_at(id, constraint, index);
    }

    /// Insert an instance at `index`, clamped to the current length.
    pub fn insert_at(&mut self, id: ConstraintId, constraint: Constraint, index: usize) {
        if self.constraints.insert(id, constraint).is_none() {
            let index = index.min(self.order.len());
            self.order.insert(index, id);
        }
    }

    /// Replace an existing instance, returning the previous one.
    pub fn replace(&mut self, id: ConstraintId, constraint: Constraint) -> Option<Constraint> {
        let slot = self.constraints.get_mut(&id)?;
        Some(std::mem::replace(slot, constraint))
    }

    /// Remove an instance, returning its former position.
    pub fn remove(&mut self, id: ConstraintId) -> Option<(usize, Constraint)> {
        let constraint = self.constraints.remove(&id)?;
        let index = self.position(id)?;
        self.order.remove(index);
        Some((index, constraint))
    }

    pub fn negative_flag(&self, flag: ToolId) -> Option<bool> {
        self.negative_flags.get(&flag).copied()
    }

    /// Set or clear a flag, returning the previous state.
    pub fn set_negative_flag(&mut self, flag: ToolId, value: Option<bool>) -> Option<bool> {
        match value {
            Some(value) => self.negative_flags.insert(flag, value),
            None => self.negative_flags.remove(&flag),
        }
    }

    pub fn negative_flags(&self) -> &BTreeMap<ToolId, bool> {
        &self.negative_flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintData;
    use crate::grid::GridCoord;

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
    fn test_insertion_order_is_kept() {
        let mut element = ConstraintsElement::new(ToolId::Given);
        let ids: Vec<_> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (row, id) in ids.iter().enumerate() {
            element.insert(*id, given(row as i32));
        }
        let order: Vec<_> = element.constraints().map(|(id, _)| id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_remove_and_reinsert_restores_position() {
        let mut element = ConstraintsElement::new(ToolId::Given);
        let ids: Vec<_> = (0..3).map(|_| Uuid::new_v4()).collect();
        for (row, id) in ids.iter().enumerate() {
            element.insert(*id, given(row as i32));
        }
        let (index, constraint) = element.remove(ids[1]).unwrap();
        assert_eq!(index, 1);
        element.insert_at(ids[1], constraint, index);
        let order: Vec<_> = element.constraints().map(|(id, _)| id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_shell_keeps_flags() {
        let mut element = ConstraintsElement::new(ToolId::KropkiWhite);
        element.insert(Uuid::new_v4(), given(0));
        element.set_negative_flag(ToolId::KropkiNegative, Some(true));
        let shell = element.shell();
        assert!(shell.is_empty());
        assert_eq!(shell.negative_flag(ToolId::KropkiNegative), Some(true));
    }
}
