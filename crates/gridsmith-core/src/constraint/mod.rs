//! Constraint instances and their data.

mod style;
mod tool_id;
mod value;

pub use style::{SerializableColor, ShapeDelta, ShapeKind, ShapeStyle};
pub use tool_id::{ElementPolicy, OutsideDirections, ToolFamily, ToolId, UnknownToolError};
pub use value::{ValueCharset, ValueRules, apply_key, is_identifier};

use crate::grid::{Direction, GridCoord, HalfCoord};
use std::collections::BTreeSet;

/// Positional data of a constraint instance, one variant per tool family.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintData {
    Cell {
        cell: GridCoord,
        value: Option<String>,
    },
    DirectedCell {
        cell: GridCoord,
        direction: Direction,
        value: Option<String>,
    },
    DirectionSetCell {
        cell: GridCoord,
        directions: BTreeSet<Direction>,
    },
    Edge {
        cells: [GridCoord; 2],
        value: Option<String>,
    },
    Corner {
        cells: Vec<GridCoord>,
        value: Option<String>,
    },
    Line {
        cells: Vec<GridCoord>,
    },
    Arrow {
        bulb: Vec<GridCoord>,
        lines: Vec<Vec<GridCoord>>,
    },
    Cage {
        cells: Vec<GridCoord>,
        value: Option<String>,
    },
    Clone {
        cells: Vec<GridCoord>,
        cells2: Vec<GridCoord>,
        label: Option<String>,
    },
    CornerLine {
        corners: Vec<GridCoord>,
    },
    CenterCornerOrEdge {
        coord: HalfCoord,
        direction: Option<Direction>,
        value: Option<String>,
    },
    OutsideDirection {
        cell: GridCoord,
        direction: Direction,
        value: Option<String>,
    },
    ValuedGlobal {
        value: Option<String>,
    },
    Variable {
        name: String,
        value: Option<String>,
    },
}

impl ConstraintData {
    pub fn value(&self) -> Option<&str> {
        match self {
            ConstraintData::Cell { value, .. }
            | ConstraintData::DirectedCell { value, .. }
            | ConstraintData::Edge { value, .. }
            | ConstraintData::Corner { value, .. }
            | ConstraintData::Cage { value, .. }
            | ConstraintData::CenterCornerOrEdge { value, .. }
            | ConstraintData::OutsideDirection { value, .. }
            | ConstraintData::ValuedGlobal { value }
            | ConstraintData::Variable { value, .. } => value.as_deref(),
            ConstraintData::Clone { label, .. } => label.as_deref(),
            ConstraintData::DirectionSetCell { .. }
            | ConstraintData::Line { .. }
            | ConstraintData::Arrow { .. }
            | ConstraintData::CornerLine { .. } => None,
        }
    }

    /// Replace the value. Returns false for data without a value slot.
    pub fn set_value(&mut self, new_value: Option<String>) -> bool {
        match self {
            ConstraintData::Cell { value, .. }
            | ConstraintData::DirectedCell { value, .. }
            | ConstraintData::Edge { value, .. }
            | ConstraintData::Corner { value, .. }
            | ConstraintData::Cage { value, .. }
            | ConstraintData::CenterCornerOrEdge { value, .. }
            | ConstraintData::OutsideDirection { value, .. }
            | ConstraintData::ValuedGlobal { value }
            | ConstraintData::Variable { value, .. } => *value = new_value,
            ConstraintData::Clone { label, .. } => *label = new_value,
            _ => return false,
        }
        true
    }

    /// Every cell the constraint covers, including outside cells.
    pub fn cells(&self) -> Vec<GridCoord> {
        match self {
            ConstraintData::Cell { cell, .. }
            | ConstraintData::DirectedCell { cell, .. }
            | ConstraintData::DirectionSetCell { cell, .. }
            | ConstraintData::OutsideDirection { cell, .. } => vec![*cell],
            ConstraintData::Edge { cells, .. } => cells.to_vec(),
            ConstraintData::Corner { cells, .. }
            | ConstraintData::Line { cells }
            | ConstraintData::Cage { cells, .. } => cells.clone(),
            ConstraintData::Arrow { bulb, lines } => {
                let mut cells = bulb.clone();
                for point in lines.iter().flatten() {
                    if !cells.contains(point) {
                        cells.push(*point);
                    }
                }
                cells
            }
            ConstraintData::Clone { cells, cells2, .. } => {
                cells.iter().chain(cells2).copied().collect()
            }
            ConstraintData::CornerLine { .. }
            | ConstraintData::CenterCornerOrEdge { .. }
            | ConstraintData::ValuedGlobal { .. }
            | ConstraintData::Variable { .. } => Vec::new(),
        }
    }

    pub fn contains_cell(&self, cell: GridCoord) -> bool {
        match self {
            ConstraintData::Arrow { bulb, lines } => {
                bulb.contains(&cell) || lines.iter().any(|line| line.contains(&cell))
            }
            ConstraintData::Clone { cells, cells2, .. } => {
                cells.contains(&cell) || cells2.contains(&cell)
            }
            _ => self.cells().contains(&cell),
        }
    }

    /// The points of a cell line or corner line.
    pub fn line_points(&self) -> Option<&Vec<GridCoord>> {
        match self {
            ConstraintData::Line { cells } => Some(cells),
            ConstraintData::CornerLine { corners } => Some(corners),
            _ => None,
        }
    }

    pub fn line_points_mut(&mut self) -> Option<&mut Vec<GridCoord>> {
        match self {
            ConstraintData::Line { cells } => Some(cells),
            ConstraintData::CornerLine { corners } => Some(corners),
            _ => None,
        }
    }
}

/// A constraint instance: which tool placed it, its data and an optional
/// full shape override.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub tool: ToolId,
    pub shape: Option<ShapeStyle>,
    pub data: ConstraintData,
}

impl Constraint {
    pub fn new(tool: ToolId, data: ConstraintData) -> Self {
        Self {
            tool,
            shape: None,
            data,
        }
    }

    /// The override if present, otherwise the tool default.
    pub fn effective_shape(&self) -> ShapeStyle {
        self.shape.unwrap_or_else(|| self.tool.default_shape())
    }

    pub fn value(&self) -> Option<&str> {
        self.data.value()
    }

    /// A copy with a new value; empty values are stored as `None`.
    pub fn with_value(&self, value: &str) -> Self {
        let mut next = self.clone();
        next.data
            .set_value((!value.is_empty()).then(|| value.to_string()));
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_access() {
        let mut data = ConstraintData::Cage {
            cells: vec![GridCoord::new(0, 0)],
            value: None,
        };
        assert_eq!(data.value(), None);
        assert!(data.set_value(Some("15".into())));
        assert_eq!(data.value(), Some("15"));

        let mut line = ConstraintData::Line { cells: Vec::new() };
        assert!(!line.set_value(Some("1".into())));
    }

    #[test]
    fn test_arrow_cells_include_lines() {
        let data = ConstraintData::Arrow {
            bulb: vec![GridCoord::new(0, 0)],
            lines: vec![vec![GridCoord::new(0, 0), GridCoord::new(0, 1)]],
        };
        assert_eq!(data.cells(), vec![GridCoord::new(0, 0), GridCoord::new(0, 1)]);
        assert!(data.contains_cell(GridCoord::new(0, 1)));
        assert!(!data.contains_cell(GridCoord::new(1, 1)));
    }

    #[test]
    fn test_effective_shape() {
        let mut constraint = Constraint::new(
            ToolId::KropkiBlack,
            ConstraintData::Edge {
                cells: [GridCoord::new(0, 0), GridCoord::new(0, 1)],
                value: None,
            },
        );
        assert_eq!(constraint.effective_shape(), ToolId::KropkiBlack.default_shape());
        let custom = ShapeStyle::new(ShapeKind::Square, SerializableColor::black(), 0.1);
        constraint.shape = Some(custom);
        assert_eq!(constraint.effective_shape(), custom);
    }

    #[test]
    fn test_with_empty_value_clears() {
        let constraint = Constraint::new(
            ToolId::Given,
            ConstraintData::Cell {
                cell: GridCoord::new(1, 1),
                value: Some("5".into()),
            },
        );
        assert_eq!(constraint.with_value("").value(), None);
        assert_eq!(constraint.with_value("7").value(), Some("7"));
    }
}
