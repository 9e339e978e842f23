//! Visual style of constraint items and per-instance overrides.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Glyph a renderer draws for a constraint item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Circle,
    Square,
    Diamond,
    Dot,
    Line,
    Arrow,
    Outline,
    DashedOutline,
    Fill,
    Text,
}

/// Full style of an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    pub kind: ShapeKind,
    pub stroke: SerializableColor,
    /// `None` means unfilled.
    pub fill: Option<SerializableColor>,
    /// Size relative to one cell.
    pub size: f64,
}

impl ShapeStyle {
    pub const fn new(kind: ShapeKind, stroke: SerializableColor, size: f64) -> Self {
        Self {
            kind,
            stroke,
            fill: None,
            size,
        }
    }

    pub const fn filled(mut self, fill: SerializableColor) -> Self {
        self.fill = Some(fill);
        self
    }

    /// Fields of `self` that differ from `base`.
    pub fn diff(&self, base: &ShapeStyle) -> ShapeDelta {
        ShapeDelta {
            kind: (self.kind != base.kind).then_some(self.kind),
            stroke: (self.stroke != base.stroke).then_some(self.stroke),
            fill: (self.fill != base.fill)
                .then(|| self.fill.unwrap_or(SerializableColor::transparent())),
            size: ((self.size - base.size).abs() > f64::EPSILON).then_some(self.size),
        }
    }

    /// `base` with the fields present in `delta` replaced.
    pub fn apply(base: &ShapeStyle, delta: &ShapeDelta) -> ShapeStyle {
        ShapeStyle {
            kind: delta.kind.unwrap_or(base.kind),
            stroke: delta.stroke.unwrap_or(base.stroke),
            fill: match delta.fill {
                Some(color) if color.is_transparent() => None,
                Some(color) => Some(color),
                None => base.fill,
            },
            size: delta.size.unwrap_or(base.size),
        }
    }
}

/// Partial style stored in the document. An absent field keeps the tool default;
/// a transparent `fill` removes the default fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ShapeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<SerializableColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl ShapeDelta {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.stroke.is_none() && self.fill.is_none() && self.size.is_none()
    }
}
