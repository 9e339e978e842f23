//! JSON document format.
//!
//! A document is an array of element records in store order. Coordinates are
//! `"r c"` strings; half-cell coordinates may use `.5` fractions. Field
//! usage per tool family:
//!
//! | family                  | fields                                  |
//! |-------------------------|-----------------------------------------|
//! | cell                    | `cell`, `value`                         |
//! | directed cell           | `cell`, `direction`, `value`            |
//! | direction set cell      | `cell`, `directions`                    |
//! | edge, corner            | `cells`, `value`                        |
//! | line                    | `cells`                                 |
//! | arrow                   | `cells` (bulb), `lines`                 |
//! | cage                    | `cells`, `value`                        |
//! | clone                   | `cells`, `cells2`, `value` (label)      |
//! | corner line             | `coords`                                |
//! | center, corner or edge  | `coords` (one), `direction`, `value`    |
//! | outside clue            | `cell`, `direction`, `value`            |
//! | valued global           | `value`                                 |
//! | variable                | `name`, `value`                         |
//!
//! Unknown tool ids and unknown flag names are skipped with a warning so
//! documents from newer editors still load; malformed data for a known tool
//! is an error.

use super::{ConstraintStore, ConstraintsElement};
use crate::constraint::{Constraint, ConstraintData, ShapeDelta, ShapeStyle, ToolFamily, ToolId};
use crate::error::{StoreError, StoreResult};
use crate::grid::{Direction, GridCoord, HalfCoord};
use crate::tools::is_connected;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

fn is_false(value: &bool) -> bool {
    !*value
}

/// Serialized element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub tool_id: String,
    #[serde(default)]
    pub constraints: Vec<ConstraintRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub negative_constraints: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub disabled: bool,
}

/// Serialized constraint instance. Only the fields its family uses are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells2: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directions: Vec<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeDelta>,
}

fn coords(cells: &[GridCoord]) -> Vec<String> {
    cells.iter().map(ToString::to_string).collect()
}

fn parse_cells(cells: &[String]) -> StoreResult<Vec<GridCoord>> {
    cells
        .iter()
        .map(|s| s.parse::<GridCoord>().map_err(StoreError::from))
        .collect()
}

impl ConstraintRecord {
    pub fn from_constraint(constraint: &Constraint) -> Self {
        let mut record = Self {
            shape: constraint
                .shape
                .map(|shape| shape.diff(&constraint.tool.default_shape()))
                .filter(|delta| !delta.is_empty()),
            ..Self::default()
        };
        match &constraint.data {
            ConstraintData::Cell { cell, value } => {
                record.cell = Some(cell.to_string());
                record.value = value.clone();
            }
            ConstraintData::DirectedCell {
                cell,
                direction,
                value,
            }
            | ConstraintData::OutsideDirection {
                cell,
                direction,
                value,
            } => {
                record.cell = Some(cell.to_string());
                record.direction = Some(*direction);
                record.value = value.clone();
            }
            ConstraintData::DirectionSetCell { cell, directions } => {
                record.cell = Some(cell.to_string());
                record.directions = directions.iter().copied().collect();
            }
            ConstraintData::Edge { cells, value } => {
                record.cells = coords(cells);
                record.value = value.clone();
            }
            ConstraintData::Corner { cells, value } | ConstraintData::Cage { cells, value } => {
                record.cells = coords(cells);
                record.value = value.clone();
            }
            ConstraintData::Line { cells } => record.cells = coords(cells),
            ConstraintData::Arrow { bulb, lines } => {
                record.cells = coords(bulb);
                record.lines = lines.iter().map(|line| coords(line)).collect();
            }
            ConstraintData::Clone {
                cells,
                cells2,
                label,
            } => {
                record.cells = coords(cells);
                record.cells2 = coords(cells2);
                record.value = label.clone();
            }
            ConstraintData::CornerLine { corners } => record.coords = coords(corners),
            ConstraintData::CenterCornerOrEdge {
                coord,
                direction,
                value,
            } => {
                record.coords = vec![coord.to_string()];
                record.direction = *direction;
                record.value = value.clone();
            }
            ConstraintData::ValuedGlobal { value } => record.value = value.clone(),
            ConstraintData::Variable { name, value } => {
                record.name = Some(name.clone());
                record.value = value.clone();
            }
        }
        record
    }

    /// Rebuild a constraint of `tool`; `index` is only used in errors.
    pub fn to_constraint(&self, tool: ToolId, index: usize) -> StoreResult<Constraint> {
        let invalid = |reason: &str| StoreError::Geometry {
            tool,
            index,
            reason: reason.to_string(),
        };
        let cell = || -> StoreResult<GridCoord> {
            self.cell
                .as_deref()
                .ok_or_else(|| invalid("missing `cell`"))?
                .parse::<GridCoord>()
                .map_err(StoreError::from)
        };
        let direction = || self.direction.ok_or_else(|| invalid("missing `direction`"));
        let value = self.value.clone();

        let data = match tool.family() {
            ToolFamily::Cell => ConstraintData::Cell {
                cell: cell()?,
                value,
            },
            ToolFamily::DirectedCell => ConstraintData::DirectedCell {
                cell: cell()?,
                direction: direction()?,
                value,
            },
            ToolFamily::DirectionSetCell => {
                let directions: BTreeSet<Direction> = self.directions.iter().copied().collect();
                if directions.is_empty() {
                    return Err(invalid("no directions"));
                }
                ConstraintData::DirectionSetCell {
                    cell: cell()?,
                    directions,
                }
            }
            ToolFamily::Edge => {
                let cells = parse_cells(&self.cells)?;
                let &[a, b] = cells.as_slice() else {
                    return Err(invalid("an edge needs exactly two cells"));
                };
                if !a.is_orthogonal_neighbor(b) {
                    return Err(invalid("edge cells are not adjacent"));
                }
                ConstraintData::Edge {
                    cells: [a, b],
                    value,
                }
            }
            ToolFamily::Corner => {
                let cells = parse_cells(&self.cells)?;
                let shares_corner = cells
                    .iter()
                    .all(|a| cells.iter().all(|b| a == b || a.is_king_neighbor(*b)));
                if cells.is_empty() || cells.len() > 4 || !shares_corner {
                    return Err(invalid("corner cells must share one corner"));
                }
                ConstraintData::Corner { cells, value }
            }
            ToolFamily::Line => {
                let cells = parse_cells(&self.cells)?;
                check_path(&cells).map_err(&invalid)?;
                ConstraintData::Line { cells }
            }
            ToolFamily::Arrow => {
                let bulb = parse_cells(&self.cells)?;
                if bulb.is_empty() {
                    return Err(invalid("empty bulb"));
                }
                let lines = self
                    .lines
                    .iter()
                    .map(|line| parse_cells(line))
                    .collect::<StoreResult<Vec<_>>>()?;
                for line in &lines {
                    check_path(line).map_err(&invalid)?;
                    if !line.first().is_some_and(|start| bulb.contains(start)) {
                        return Err(invalid("arrow line does not start in the bulb"));
                    }
                }
                ConstraintData::Arrow { bulb, lines }
            }
            ToolFamily::Cage => {
                let cells = parse_cells(&self.cells)?;
                if cells.is_empty() {
                    return Err(invalid("empty cage"));
                }
                // Diagonal growth is a session setting, so only king adjacency
                // is required here.
                if !is_connected(&cells, true) {
                    return Err(invalid("cage cells are not connected"));
                }
                ConstraintData::Cage { cells, value }
            }
            ToolFamily::Clone => {
                let cells = parse_cells(&self.cells)?;
                let cells2 = parse_cells(&self.cells2)?;
                if cells.is_empty() || cells.len() != cells2.len() {
                    return Err(invalid("clone regions differ in size"));
                }
                if !is_connected(&cells, true) || !is_connected(&cells2, true) {
                    return Err(invalid("clone region is not connected"));
                }
                ConstraintData::Clone {
                    cells,
                    cells2,
                    label: value,
                }
            }
            ToolFamily::CornerLine => {
                let corners = parse_cells(&self.coords)?;
                check_path(&corners).map_err(&invalid)?;
                ConstraintData::CornerLine { corners }
            }
            ToolFamily::CenterCornerOrEdge => {
                let [coord] = self.coords.as_slice() else {
                    return Err(invalid("expected exactly one coordinate"));
                };
                ConstraintData::CenterCornerOrEdge {
                    coord: coord.parse::<HalfCoord>()?,
                    direction: self.direction,
                    value,
                }
            }
            ToolFamily::OutsideDirection => ConstraintData::OutsideDirection {
                cell: cell()?,
                direction: direction()?,
                value,
            },
            ToolFamily::ValuedGlobal => ConstraintData::ValuedGlobal { value },
            ToolFamily::Variable => ConstraintData::Variable {
                name: self.name.clone().ok_or_else(|| invalid("missing `name`"))?,
                value,
            },
            ToolFamily::GlobalRules | ToolFamily::Flag => {
                return Err(invalid("tool does not hold constraints"));
            }
        };

        let mut constraint = Constraint::new(tool, data);
        constraint.shape = self
            .shape
            .filter(|delta| !delta.is_empty())
            .map(|delta| ShapeStyle::apply(&tool.default_shape(), &delta));
        Ok(constraint)
    }
}

/// Consecutive points must be neighbours, diagonals included.
fn check_path(points: &[GridCoord]) -> Result<(), &'static str> {
    if points.is_empty() {
        return Err("empty line");
    }
    if points.windows(2).any(|pair| !pair[0].is_king_neighbor(pair[1])) {
        return Err("line points are not adjacent");
    }
    Ok(())
}

impl ElementRecord {
    pub fn from_element(element: &ConstraintsElement) -> Self {
        Self {
            tool_id: element.tool.as_str().to_string(),
            constraints: element
                .constraints()
                .map(|(_, constraint)| ConstraintRecord::from_constraint(constraint))
                .collect(),
            negative_constraints: element
                .negative_flags()
                .iter()
                .map(|(flag, value)| (flag.as_str().to_string(), *value))
                .collect(),
            disabled: element.disabled,
        }
    }

    /// Rebuild the element, or `None` for an unknown tool id.
    pub fn to_element(&self) -> StoreResult<Option<ConstraintsElement>> {
        let Ok(tool) = self.tool_id.parse::<ToolId>() else {
            log::warn!("skipping element with unknown tool id `{}`", self.tool_id);
            return Ok(None);
        };
        let mut element = ConstraintsElement::new(tool);
        element.disabled = self.disabled;
        for (name, value) in &self.negative_constraints {
            match name.parse::<ToolId>() {
                Ok(flag) => {
                    element.set_negative_flag(flag, Some(*value));
                }
                Err(_) => log::warn!("skipping unknown flag `{name}` on `{tool}`"),
            }
        }
        for (index, record) in self.constraints.iter().enumerate() {
            element.insert(Uuid::new_v4(), record.to_constraint(tool, index)?);
        }
        Ok(Some(element))
    }
}

impl ConstraintStore {
    /// Records for every element in store order.
    pub fn serialize(&self) -> Vec<ElementRecord> {
        self.elements()
            .map(|(_, element)| ElementRecord::from_element(element))
            .collect()
    }

    /// Build a store from records. Element ids follow record order.
    pub fn deserialize(records: &[ElementRecord]) -> StoreResult<Self> {
        let mut store = Self::new();
        for record in records {
            if let Some(element) = record.to_element()? {
                store.add_element(element);
            }
        }
        log::debug!("loaded {} constraint elements", store.len());
        Ok(store)
    }

    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.serialize())?)
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        let records: Vec<ElementRecord> = serde_json::from_str(json)?;
        Self::deserialize(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{SerializableColor, ShapeKind};

    fn cell(row: i32, col: i32) -> GridCoord {
        GridCoord::new(row, col)
    }

    fn sample_store() -> ConstraintStore {
        let mut store = ConstraintStore::new();
        store.add_local_constraint(Constraint::new(
            ToolId::Given,
            ConstraintData::Cell {
                cell: cell(0, 0),
                value: Some("5".into()),
            },
        ));
        store.add_local_constraint(Constraint::new(
            ToolId::Arrow,
            ConstraintData::Arrow {
                bulb: vec![cell(1, 1), cell(1, 2)],
                lines: vec![vec![cell(1, 2), cell(2, 3), cell(3, 3)]],
            },
        ));
        store.add_local_constraint(Constraint::new(
            ToolId::Clone,
            ConstraintData::Clone {
                cells: vec![cell(0, 0)],
                cells2: vec![cell(0, 2)],
                label: Some("A".into()),
            },
        ));
        store.add_local_constraint(Constraint::new(
            ToolId::Text,
            ConstraintData::CenterCornerOrEdge {
                coord: HalfCoord::new(1, 2),
                direction: None,
                value: Some("hi".into()),
            },
        ));
        store.add_local_constraint(Constraint::new(
            ToolId::LittleKiller,
            ConstraintData::OutsideDirection {
                cell: cell(-1, -1),
                direction: Direction::DownRight,
                value: Some("45".into()),
            },
        ));
        let mut fence = Constraint::new(
            ToolId::Fence,
            ConstraintData::CornerLine {
                corners: vec![cell(0, 0), cell(0, 1), cell(1, 1)],
            },
        );
        let mut shape = ToolId::Fence.default_shape();
        shape.stroke = SerializableColor::rgb(0, 0, 255);
        fence.shape = Some(shape);
        store.add_local_constraint(fence);

        let rules = store.add_element(ConstraintsElement::new(ToolId::GlobalRules));
        store.set_negative_flag(rules, ToolId::AntiKnight, Some(true));
        store.set_enabled(rules, false);
        store
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let store = sample_store();
        let json = store.to_json().unwrap();
        let loaded = ConstraintStore::from_json(&json).unwrap();
        // Instance ids are regenerated on load, so compare the records.
        assert_eq!(loaded.serialize(), store.serialize());
        assert_eq!(loaded.len(), store.len());
    }

    #[test]
    fn test_field_mapping() {
        let json = sample_store().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let arrow = &value[1]["constraints"][0];
        assert_eq!(arrow["cells"], serde_json::json!(["1 1", "1 2"]));
        assert_eq!(arrow["lines"][0][2], "3 3");
        assert!(arrow.get("value").is_none());

        let clone = &value[2]["constraints"][0];
        assert_eq!(clone["value"], "A");
        assert_eq!(clone["cells2"], serde_json::json!(["0 2"]));

        assert_eq!(value[3]["constraints"][0]["coords"], serde_json::json!(["0.5 1"]));
        assert_eq!(value[4]["constraints"][0]["direction"], "DR");
        assert_eq!(value[6]["negative_constraints"]["anti_knight"], true);
        assert_eq!(value[6]["disabled"], true);
    }

    #[test]
    fn test_shape_is_stored_as_delta() {
        let json = sample_store().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let shape = &value[5]["constraints"][0]["shape"];
        assert!(shape.get("stroke").is_some());
        assert!(shape.get("kind").is_none());
        assert!(value[0]["constraints"][0].get("shape").is_none());

        let loaded = ConstraintStore::from_json(&json).unwrap();
        let (_, fence) = loaded
            .constraints()
            .find(|(_, c)| c.tool == ToolId::Fence)
            .unwrap();
        let shape = fence.shape.unwrap();
        assert_eq!(shape.stroke, SerializableColor::rgb(0, 0, 255));
        assert_eq!(shape.kind, ShapeKind::Line);
    }

    #[test]
    fn test_unknown_tool_and_flag_are_skipped() {
        let json = r#"[
            { "tool_id": "future_tool", "constraints": [ { "cell": "0 0" } ] },
            { "tool_id": "global_rules",
              "negative_constraints": { "future_flag": true, "anti_king": true } },
            { "tool_id": "given", "constraints": [ { "cell": "2 2", "value": "3" } ] }
        ]"#;
        let store = ConstraintStore::from_json(json).unwrap();
        assert_eq!(store.len(), 2);
        let (id, rules) = store.elements().next().unwrap();
        assert_eq!(rules.tool, ToolId::GlobalRules);
        assert_eq!(rules.negative_flags().len(), 1);
        assert_eq!(store.negative_flag(id, ToolId::AntiKing), Some(true));
    }

    #[test]
    fn test_malformed_data_is_an_error() {
        assert!(matches!(
            ConstraintStore::from_json(r#"{ "tool_id": "given" }"#),
            Err(StoreError::Json(_))
        ));
        assert!(matches!(
            ConstraintStore::from_json(
                r#"[ { "tool_id": "given", "constraints": [ { "cell": "x" } ] } ]"#
            ),
            Err(StoreError::Coordinate(_))
        ));
        assert!(matches!(
            ConstraintStore::from_json(
                r#"[ { "tool_id": "kropki_white",
                       "constraints": [ { "cells": ["0 0", "2 2"] } ] } ]"#
            ),
            Err(StoreError::Geometry { tool: ToolId::KropkiWhite, index: 0, .. })
        ));
        assert!(matches!(
            ConstraintStore::from_json(
                r#"[ { "tool_id": "sandwich",
                       "constraints": [ { "cell": "-1 0", "direction": "SW" } ] } ]"#
            ),
            Err(StoreError::Json(_))
        ));
    }

    #[test]
    fn test_regions_must_be_connected() {
        let split_cage = r#"[ { "tool_id": "killer_cage", "constraints": [
            { "cells": ["0 0", "0 3"], "value": "7" }
        ] } ]"#;
        assert!(matches!(
            ConstraintStore::from_json(split_cage),
            Err(StoreError::Geometry { tool: ToolId::KillerCage, .. })
        ));

        let diagonal_cage = r#"[ { "tool_id": "extra_region", "constraints": [
            { "cells": ["0 0", "1 1"] }
        ] } ]"#;
        assert_eq!(ConstraintStore::from_json(diagonal_cage).unwrap().len(), 1);

        let split_clone = r#"[ { "tool_id": "clone", "constraints": [
            { "cells": ["0 0", "0 1"], "cells2": ["4 4", "6 4"] }
        ] } ]"#;
        assert!(matches!(
            ConstraintStore::from_json(split_clone),
            Err(StoreError::Geometry { tool: ToolId::Clone, .. })
        ));
    }

    #[test]
    fn test_arrow_line_must_leave_bulb() {
        let json = r#"[ { "tool_id": "arrow", "constraints": [
            { "cells": ["0 0"], "lines": [["1 1", "2 2"]] }
        ] } ]"#;
        assert!(matches!(
            ConstraintStore::from_json(json),
            Err(StoreError::Geometry { tool: ToolId::Arrow, .. })
        ));
    }
}
