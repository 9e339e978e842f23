//! Grid coordinates, directions and board dimensions.
//!
//! Board space puts one cell at one unit: `x` grows with the column and `y`
//! with the row, so cell `(r, c)` spans `[c, c + 1] x [r, r + 1]` and corner
//! `(r, c)` is the top-left corner of cell `(r, c)`.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A coordinate string that is not of the `"r c"` form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid coordinate `{0}`")]
pub struct ParseCoordError(pub String);

/// Integer `(row, col)` pair addressing a cell or a corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Offset by a row/column delta.
    pub const fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }

    /// The neighbouring coordinate in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (d_row, d_col) = direction.delta();
        self.offset(d_row, d_col)
    }

    /// Row/column delta from `self` to `other`.
    pub const fn delta_to(self, other: GridCoord) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }

    /// True if the two coordinates share a side.
    pub fn is_orthogonal_neighbor(self, other: GridCoord) -> bool {
        let (dr, dc) = self.delta_to(other);
        dr.abs() + dc.abs() == 1
    }

    /// True if the two coordinates share a side or a corner.
    pub fn is_king_neighbor(self, other: GridCoord) -> bool {
        let (dr, dc) = self.delta_to(other);
        self != other && dr.abs() <= 1 && dc.abs() <= 1
    }

    /// Neighbour test with optional diagonal adjacency.
    pub fn is_neighbor(self, other: GridCoord, diagonal: bool) -> bool {
        if diagonal {
            self.is_king_neighbor(other)
        } else {
            self.is_orthogonal_neighbor(other)
        }
    }

    /// Center of the cell at this coordinate.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.col) + 0.5, f64::from(self.row) + 0.5)
    }

    /// Position of the corner at this coordinate.
    pub fn corner_point(self) -> Point {
        Point::new(f64::from(self.col), f64::from(self.row))
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.row, self.col)
    }
}

impl FromStr for GridCoord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(row), Some(col), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParseCoordError(s.to_string()));
        };
        match (row.parse(), col.parse()) {
            (Ok(row), Ok(col)) => Ok(Self::new(row, col)),
            _ => Err(ParseCoordError(s.to_string())),
        }
    }
}

/// A position at half-cell resolution: a cell center, a corner or an edge midpoint.
///
/// Stored doubled, so `(row2, col2) = (2r + 1, 2c + 1)` is the center of cell `(r, c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HalfCoord {
    pub row2: i32,
    pub col2: i32,
}

impl HalfCoord {
    pub const fn new(row2: i32, col2: i32) -> Self {
        Self { row2, col2 }
    }

    pub const fn cell_center(cell: GridCoord) -> Self {
        Self::new(cell.row * 2 + 1, cell.col * 2 + 1)
    }

    pub const fn corner(corner: GridCoord) -> Self {
        Self::new(corner.row * 2, corner.col * 2)
    }

    pub fn edge(edge: EdgeCoord) -> Self {
        let GridCoord { row, col } = edge.cell;
        match edge.side {
            EdgeSide::Top => Self::new(row * 2, col * 2 + 1),
            EdgeSide::Left => Self::new(row * 2 + 1, col * 2),
        }
    }

    /// Board-space position.
    pub fn point(self) -> Point {
        Point::new(f64::from(self.col2) / 2.0, f64::from(self.row2) / 2.0)
    }
}

impl fmt::Display for HalfCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            f64::from(self.row2) / 2.0,
            f64::from(self.col2) / 2.0
        )
    }
}

impl FromStr for HalfCoord {
    type Err = ParseCoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCoordError(s.to_string());
        let mut parts = s.split_whitespace();
        let (Some(row), Some(col), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(err());
        };
        let doubled = |part: &str| -> Option<i32> {
            let value = part.parse::<f64>().ok()? * 2.0;
            (value.is_finite() && value.fract() == 0.0 && value.abs() < f64::from(i32::MAX))
                .then_some(value as i32)
        };
        match (doubled(row), doubled(col)) {
            (Some(row2), Some(col2)) => Ok(Self::new(row2, col2)),
            _ => Err(err()),
        }
    }
}

/// Which side of its cell an edge runs along. Bottom and right edges are
/// stored as the top/left edge of the neighbouring cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeSide {
    Top,
    Left,
}

/// A cell edge in canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeCoord {
    pub cell: GridCoord,
    pub side: EdgeSide,
}

impl EdgeCoord {
    pub const fn new(cell: GridCoord, side: EdgeSide) -> Self {
        Self { cell, side }
    }

    /// Edge `index` of `cell`, numbered top, right, bottom, left.
    pub fn of_cell(cell: GridCoord, index: u8) -> Self {
        match index % 4 {
            0 => Self::new(cell, EdgeSide::Top),
            1 => Self::new(cell.offset(0, 1), EdgeSide::Left),
            2 => Self::new(cell.offset(1, 0), EdgeSide::Top),
            _ => Self::new(cell, EdgeSide::Left),
        }
    }

    /// The edge shared by two orthogonally adjacent cells.
    pub fn between(a: GridCoord, b: GridCoord) -> Option<Self> {
        if !a.is_orthogonal_neighbor(b) {
            return None;
        }
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let side = if first.row == second.row {
            EdgeSide::Left
        } else {
            EdgeSide::Top
        };
        Some(Self::new(second, side))
    }

    /// The two cells on either side, upper/left cell first.
    pub fn cells(self) -> [GridCoord; 2] {
        match self.side {
            EdgeSide::Top => [self.cell.offset(-1, 0), self.cell],
            EdgeSide::Left => [self.cell.offset(0, -1), self.cell],
        }
    }

    /// Midpoint of the edge in board space.
    pub fn midpoint(self) -> Point {
        HalfCoord::edge(self).point()
    }
}

/// The four cells sharing a corner, in row-major order.
pub fn corner_cells(corner: GridCoord) -> [GridCoord; 4] {
    [
        corner.offset(-1, -1),
        corner.offset(-1, 0),
        corner.offset(0, -1),
        corner,
    ]
}

/// One of the eight compass directions, indexed clockwise from up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "U")]
    Up,
    #[serde(rename = "UR")]
    UpRight,
    #[serde(rename = "R")]
    Right,
    #[serde(rename = "DR")]
    DownRight,
    #[serde(rename = "D")]
    Down,
    #[serde(rename = "DL")]
    DownLeft,
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "UL")]
    UpLeft,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::UpRight,
        Direction::Right,
        Direction::DownRight,
        Direction::Down,
        Direction::DownLeft,
        Direction::Left,
        Direction::UpLeft,
    ];

    /// Direction for a rotational index; edges sit on even and corners on odd indices.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Row/column delta of one step.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::UpRight => (-1, 1),
            Direction::Right => (0, 1),
            Direction::DownRight => (1, 1),
            Direction::Down => (1, 0),
            Direction::DownLeft => (1, -1),
            Direction::Left => (0, -1),
            Direction::UpLeft => (-1, -1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }

    pub fn opposite(self) -> Self {
        Self::ALL[usize::from((self.index() + 4) % 8)]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "U",
            Direction::UpRight => "UR",
            Direction::Right => "R",
            Direction::DownRight => "DR",
            Direction::Down => "D",
            Direction::DownLeft => "DL",
            Direction::Left => "L",
            Direction::UpLeft => "UL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dimensions of the puzzle grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    pub rows: i32,
    pub cols: i32,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(9, 9)
    }
}

impl Grid {
    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }

    pub fn contains(self, cell: GridCoord) -> bool {
        (0..self.rows).contains(&cell.row) && (0..self.cols).contains(&cell.col)
    }

    pub fn contains_all(self, cells: &[GridCoord]) -> bool {
        cells.iter().all(|&cell| self.contains(cell))
    }

    pub fn contains_corner(self, corner: GridCoord) -> bool {
        (0..=self.rows).contains(&corner.row) && (0..=self.cols).contains(&corner.col)
    }

    pub fn contains_half(self, coord: HalfCoord) -> bool {
        (0..=self.rows * 2).contains(&coord.row2) && (0..=self.cols * 2).contains(&coord.col2)
    }

    /// True for cells in the ring of `width` cells around the grid.
    pub fn is_outside(self, cell: GridCoord, width: i32) -> bool {
        !self.contains(cell)
            && (-width..self.rows + width).contains(&cell.row)
            && (-width..self.cols + width).contains(&cell.col)
    }

    /// The single orthogonal direction pointing from an outside cell into the
    /// grid, if the cell faces a row or column.
    pub fn inward_direction(self, cell: GridCoord) -> Option<Direction> {
        let row_inside = (0..self.rows).contains(&cell.row);
        let col_inside = (0..self.cols).contains(&cell.col);
        match (row_inside, col_inside) {
            (false, true) if cell.row < 0 => Some(Direction::Down),
            (false, true) => Some(Direction::Up),
            (true, false) if cell.col < 0 => Some(Direction::Right),
            (true, false) => Some(Direction::Left),
            _ => None,
        }
    }

    /// Pointer surface: the grid plus `ring` outside cells on each side.
    pub fn surface(self, ring: i32) -> Rect {
        let ring = f64::from(ring);
        Rect::new(
            -ring,
            -ring,
            f64::from(self.cols) + ring,
            f64::from(self.rows) + ring,
        )
    }
}
