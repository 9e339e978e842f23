//! Gridsmith Core Library
//!
//! Editing engine for logic-grid puzzles: pointer geometry, gesture
//! recognition, constraint tools, the constraint document and its undo history.

pub mod config;
pub mod constraint;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod grid;
pub mod history;
pub mod input;
pub mod observer;
pub mod store;
pub mod surface;
pub mod tools;

pub use config::{EditorConfig, GeometryConfig, GestureConfig};
pub use constraint::{Constraint, ConstraintData, ShapeStyle, ToolFamily, ToolId};
pub use editor::Editor;
pub use error::{ConfigError, ConfigResult, StoreError, StoreResult};
pub use geometry::{Feature, FeatureHit, FeatureKind};
pub use gesture::{GestureEvent, GestureRecognizer};
pub use grid::{Direction, Grid, GridCoord, HalfCoord};
pub use history::{Command, CommandBatch, CommandHistory, HistoryChange};
pub use input::{KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use store::{ConstraintRef, ConstraintStore, ElementId, StoreChange};
pub use surface::SurfaceTransform;
