//! Gesture recognition: turning pointer samples into feature-level drag and
//! tap events.

mod marker;
mod recognizer;

pub use marker::is_valid_line_marker;
pub use recognizer::GestureRecognizer;

use crate::geometry::{FeatureHit, FeatureKind};

/// Events emitted by a [`GestureRecognizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Pointer pressed over a feature.
    DragStart(FeatureHit),
    /// Pointer moved onto a different feature while pressed.
    Drag(FeatureHit),
    /// Pointer released; carries the last accepted feature.
    DragEnd(FeatureHit),
    /// A press and release on one feature, with the running tap count.
    Tap { hit: FeatureHit, count: u32 },
    /// The hovered feature changed.
    Move(FeatureHit),
}

/// How a tool wants pointer positions resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizerSpec {
    pub kind: FeatureKind,
    /// Only accept drag steps to an adjacent lattice point.
    pub pen: bool,
    /// The containing cell is part of the target, so the same corner seen
    /// from two cells counts as two targets.
    pub directional: bool,
}

impl RecognizerSpec {
    pub const fn new(kind: FeatureKind) -> Self {
        Self {
            kind,
            pen: false,
            directional: false,
        }
    }

    pub const fn pen(mut self) -> Self {
        self.pen = true;
        self
    }

    pub const fn directional(mut self) -> Self {
        self.directional = true;
        self
    }

    /// True if two hits address the same target.
    pub fn same_target(&self, a: &FeatureHit, b: &FeatureHit) -> bool {
        a.feature == b.feature && (!self.directional || a.cell == b.cell)
    }
}
