//! Pointer and keyboard events delivered by the host surface.
//!
//! Timestamps are host-supplied milliseconds, so multi-tap timing stays
//! deterministic and independent of the platform clock.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn alt() -> Self {
        Self {
            alt: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
        time_ms: u64,
    },
    Up {
        position: Point,
        button: MouseButton,
        time_ms: u64,
    },
    Move {
        position: Point,
        time_ms: u64,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match *self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position, .. } => position,
        }
    }

    pub fn time_ms(&self) -> u64 {
        match *self {
            PointerEvent::Down { time_ms, .. }
            | PointerEvent::Up { time_ms, .. }
            | PointerEvent::Move { time_ms, .. } => time_ms,
        }
    }

    /// The button for press/release events.
    pub fn button(&self) -> Option<MouseButton> {
        match *self {
            PointerEvent::Down { button, .. } | PointerEvent::Up { button, .. } => Some(button),
            PointerEvent::Move { .. } => None,
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Named keys the editor reacts to.
pub mod keys {
    pub const BACKSPACE: &str = "Backspace";
    pub const DELETE: &str = "Delete";
    pub const ESCAPE: &str = "Escape";
    pub const SHIFT: &str = "Shift";
    pub const CONTROL: &str = "Control";
    pub const ALT: &str = "Alt";
    pub const META: &str = "Meta";
}
