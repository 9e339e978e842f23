//! Nearest-feature resolution for pointer positions in board space.
//!
//! Each resolver returns the nearest cell, corner or edge together with its
//! distance. When a margin is given, a match only counts if its distance is
//! strictly below the margin; without a margin the nearest feature always
//! matches.

use crate::grid::{Direction, EdgeCoord, GridCoord, HalfCoord};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Distances closer than this are treated as ties.
pub const DISTANCE_EPSILON: f64 = 1e-9;

/// Kind of feature a recognizer resolves pointer positions to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Cell,
    Corner,
    Edge,
    CornerOrEdge,
    CellCornerOrEdge,
}

impl FeatureKind {
    fn includes(self, class: FeatureClass) -> bool {
        match self {
            FeatureKind::Cell => class == FeatureClass::Cell,
            FeatureKind::Corner => class == FeatureClass::Corner,
            FeatureKind::Edge => class == FeatureClass::Edge,
            FeatureKind::CornerOrEdge => class != FeatureClass::Cell,
            FeatureKind::CellCornerOrEdge => true,
        }
    }
}

/// The three feature classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureClass {
    Cell,
    Edge,
    Corner,
}

/// Order in which equidistant features win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeaturePriority(pub [FeatureClass; 3]);

impl Default for FeaturePriority {
    fn default() -> Self {
        Self([FeatureClass::Cell, FeatureClass::Edge, FeatureClass::Corner])
    }
}

impl FeaturePriority {
    fn rank(&self, class: FeatureClass) -> usize {
        self.0
            .iter()
            .position(|&c| c == class)
            .unwrap_or(self.0.len())
    }

    /// True if each class appears exactly once.
    pub fn is_complete(&self) -> bool {
        [FeatureClass::Cell, FeatureClass::Edge, FeatureClass::Corner]
            .iter()
            .all(|class| self.0.iter().filter(|c| *c == class).count() == 1)
    }
}

/// A resolved board feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Cell(GridCoord),
    Corner(GridCoord),
    Edge(EdgeCoord),
}

impl Feature {
    pub fn class(&self) -> FeatureClass {
        match self {
            Feature::Cell(_) => FeatureClass::Cell,
            Feature::Corner(_) => FeatureClass::Corner,
            Feature::Edge(_) => FeatureClass::Edge,
        }
    }

    pub fn half_coord(&self) -> HalfCoord {
        match *self {
            Feature::Cell(cell) => HalfCoord::cell_center(cell),
            Feature::Corner(corner) => HalfCoord::corner(corner),
            Feature::Edge(edge) => HalfCoord::edge(edge),
        }
    }

    pub fn point(&self) -> Point {
        self.half_coord().point()
    }
}

/// Nearest cell to a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellHit {
    pub cell: GridCoord,
    pub distance: f64,
}

/// Nearest corner of the containing cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerHit {
    pub corner: GridCoord,
    /// The cell containing the point.
    pub cell: GridCoord,
    /// Corner index within `cell`: top-right, bottom-right, bottom-left, top-left.
    pub index: u8,
    pub distance: f64,
}

/// Nearest edge of the containing cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    pub edge: EdgeCoord,
    /// The cell containing the point.
    pub cell: GridCoord,
    /// Edge index within `cell`: top, right, bottom, left.
    pub index: u8,
    pub distance: f64,
}

/// Result of a combined feature lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureHit {
    pub feature: Feature,
    /// The cell containing the point.
    pub cell: GridCoord,
    /// Direction from `cell` toward the feature; `None` for cells.
    pub direction: Option<Direction>,
    pub distance: f64,
}

impl FeatureHit {
    /// A centered cell hit at zero distance.
    pub fn cell(cell: GridCoord) -> Self {
        Self {
            feature: Feature::Cell(cell),
            cell,
            direction: None,
            distance: 0.0,
        }
    }
}

fn within(distance: f64, margin: Option<f64>) -> bool {
    margin.map_or(true, |m| distance < m)
}

fn containing_cell(point: Point) -> GridCoord {
    GridCoord::new(point.y.floor() as i32, point.x.floor() as i32)
}

/// Index of the smallest distance; earlier entries win ties.
fn nearest(distances: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, &d) in distances.iter().enumerate() {
        if d < best.1 - DISTANCE_EPSILON {
            best = (i, d);
        }
    }
    best
}

/// The cell containing `point`, measured from its center.
pub fn closest_cell(point: Point, margin: Option<f64>) -> Option<CellHit> {
    let cell = containing_cell(point);
    let distance = point.distance(cell.center());
    within(distance, margin).then_some(CellHit { cell, distance })
}

/// The nearest corner of the cell containing `point`.
pub fn closest_corner(point: Point, margin: Option<f64>) -> Option<CornerHit> {
    let cell = containing_cell(point);
    let corners = [
        cell.offset(0, 1),
        cell.offset(1, 1),
        cell.offset(1, 0),
        cell,
    ];
    let distances = corners.map(|c| point.distance(c.corner_point()));
    let (index, distance) = nearest(&distances);
    within(distance, margin).then_some(CornerHit {
        corner: corners[index],
        cell,
        index: index as u8,
        distance,
    })
}

/// The nearest edge midpoint of the cell containing `point`.
pub fn closest_edge(point: Point, margin: Option<f64>) -> Option<EdgeHit> {
    let cell = containing_cell(point);
    let edges = [0u8, 1, 2, 3].map(|i| EdgeCoord::of_cell(cell, i));
    let distances = edges.map(|e| point.distance(e.midpoint()));
    let (index, distance) = nearest(&distances);
    within(distance, margin).then_some(EdgeHit {
        edge: edges[index],
        cell,
        index: index as u8,
        distance,
    })
}

/// Resolve the nearest feature of the allowed `kind`.
///
/// Candidates within [`DISTANCE_EPSILON`] of each other are decided by
/// `priority`. The margin applies to the winner only.
pub fn closest_cell_feature(
    point: Point,
    kind: FeatureKind,
    margin: Option<f64>,
    priority: &FeaturePriority,
) -> Option<FeatureHit> {
    let mut candidates: Vec<FeatureHit> = Vec::with_capacity(3);

    if kind.includes(FeatureClass::Cell) {
        if let Some(hit) = closest_cell(point, None) {
            candidates.push(FeatureHit {
                feature: Feature::Cell(hit.cell),
                cell: hit.cell,
                direction: None,
                distance: hit.distance,
            });
        }
    }
    if kind.includes(FeatureClass::Edge) {
        if let Some(hit) = closest_edge(point, None) {
            candidates.push(FeatureHit {
                feature: Feature::Edge(hit.edge),
                cell: hit.cell,
                direction: Direction::from_index(hit.index * 2),
                distance: hit.distance,
            });
        }
    }
    if kind.includes(FeatureClass::Corner) {
        if let Some(hit) = closest_corner(point, None) {
            candidates.push(FeatureHit {
                feature: Feature::Corner(hit.corner),
                cell: hit.cell,
                direction: Direction::from_index(hit.index * 2 + 1),
                distance: hit.distance,
            });
        }
    }

    let best = candidates.into_iter().reduce(|best, next| {
        let closer = next.distance < best.distance - DISTANCE_EPSILON;
        let tied = (next.distance - best.distance).abs() <= DISTANCE_EPSILON;
        if closer
            || (tied && priority.rank(next.feature.class()) < priority.rank(best.feature.class()))
        {
            next
        } else {
            best
        }
    })?;

    within(best.distance, margin).then_some(best)
}
