//! Editor configuration.
//!
//! Every field has a default, so a host can pass a partial JSON document and
//! only override what it needs.

use crate::constraint::ToolId;
use crate::error::{ConfigError, ConfigResult};
use crate::geometry::{FeatureKind, FeaturePriority};
use crate::tools::LineRule;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multi-tap window in milliseconds.
pub const DEFAULT_MULTI_TAP_MS: u64 = 300;
/// Maximum pointer travel between taps of a multi-tap, in cells.
pub const DEFAULT_MULTI_TAP_DISTANCE: f64 = 0.25;

/// Tuning for gesture recognition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub multi_tap_ms: u64,
    pub multi_tap_distance: f64,
    /// Drag margin when resolving cells.
    pub cell_margin: f64,
    pub corner_margin: f64,
    pub edge_margin: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            multi_tap_ms: DEFAULT_MULTI_TAP_MS,
            multi_tap_distance: DEFAULT_MULTI_TAP_DISTANCE,
            cell_margin: 0.4,
            corner_margin: 0.3,
            edge_margin: 0.3,
        }
    }
}

impl GestureConfig {
    /// Drag margin for a feature kind; combined kinds use the widest of
    /// their parts.
    pub fn margin_for(&self, kind: FeatureKind) -> f64 {
        match kind {
            FeatureKind::Cell => self.cell_margin,
            FeatureKind::Corner => self.corner_margin,
            FeatureKind::Edge => self.edge_margin,
            FeatureKind::CornerOrEdge => self.corner_margin.max(self.edge_margin),
            FeatureKind::CellCornerOrEdge => self
                .cell_margin
                .max(self.corner_margin)
                .max(self.edge_margin),
        }
    }
}

/// Tuning for feature resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub priority: FeaturePriority,
    /// Width of the ring of outside cells that accepts pointer input.
    pub outside_ring: i32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            priority: FeaturePriority::default(),
            outside_ring: 1,
        }
    }
}

/// Top-level editor configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub gesture: GestureConfig,
    pub geometry: GeometryConfig,
    /// Maximum number of undo entries; `None` keeps everything.
    pub history_limit: Option<usize>,
    /// Per-tool overrides of line growth rules.
    pub lines: BTreeMap<ToolId, LineRule>,
    /// Let cages and clone regions grow through diagonal neighbours.
    pub cage_diagonal: bool,
}

impl EditorConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let g = &self.gesture;
        for (name, margin) in [
            ("cell_margin", g.cell_margin),
            ("corner_margin", g.corner_margin),
            ("edge_margin", g.edge_margin),
        ] {
            if !(margin.is_finite() && margin > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {margin}"
                )));
            }
        }
        if !(g.multi_tap_distance.is_finite() && g.multi_tap_distance >= 0.0) {
            return Err(ConfigError::Invalid(
                "multi_tap_distance must be non-negative".into(),
            ));
        }
        if !self.geometry.priority.is_complete() {
            return Err(ConfigError::Invalid(
                "priority must list cell, edge and corner once each".into(),
            ));
        }
        if self.geometry.outside_ring < 0 {
            return Err(ConfigError::Invalid("outside_ring must not be negative".into()));
        }
        if self.history_limit == Some(0) {
            return Err(ConfigError::Invalid("history_limit must be at least 1".into()));
        }
        Ok(())
    }

    /// Growth rule for a line tool.
    pub fn line_rule(&self, tool: ToolId) -> LineRule {
        self.lines.get(&tool).copied().unwrap_or_else(|| match tool {
            ToolId::Whisper | ToolId::RegionSum => LineRule {
                allow_self_intersection: true,
                ..LineRule::default()
            },
            _ => LineRule::default(),
        })
    }
}
