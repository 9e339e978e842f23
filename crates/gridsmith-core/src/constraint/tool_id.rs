//! The catalogue of constraint tools.

use super::style::{SerializableColor, ShapeKind, ShapeStyle};
use super::value::ValueRules;
use crate::geometry::FeatureKind;
use crate::gesture::RecognizerSpec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A tool id string that names no known tool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tool id `{0}`")]
pub struct UnknownToolError(pub String);

/// Stable identifier of a constraint tool, as stored in documents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ToolId {
    #[default]
    Given,
    Odd,
    Even,
    SearchNine,
    CellArrows,
    KropkiWhite,
    KropkiBlack,
    Xv,
    EdgeSum,
    EdgeDifference,
    Quadruple,
    CornerSum,
    Thermometer,
    Palindrome,
    Renban,
    Whisper,
    RegionSum,
    Arrow,
    KillerCage,
    ExtraRegion,
    Clone,
    Fence,
    Text,
    LittleKiller,
    Sandwich,
    XSum,
    GlobalRules,
    AntiKnight,
    AntiKing,
    NonConsecutive,
    DiagonalPositive,
    DiagonalNegative,
    KropkiNegative,
    XvNegative,
    MaxDigit,
    MinDigit,
    Variable,
}

/// Data shape shared by a group of tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolFamily {
    /// One value per cell.
    Cell,
    /// A cell plus one direction.
    DirectedCell,
    /// A cell plus a set of directions.
    DirectionSetCell,
    /// Two orthogonally adjacent cells.
    Edge,
    /// The cells around a corner.
    Corner,
    /// A path through cell centers.
    Line,
    /// A bulb with lines leaving it.
    Arrow,
    /// A connected cell group with an optional value.
    Cage,
    /// Two congruent cell groups.
    Clone,
    /// A path along the corner lattice.
    CornerLine,
    /// A cell center, corner or edge midpoint.
    CenterCornerOrEdge,
    /// An outside clue pointing into the grid.
    OutsideDirection,
    /// The host element for boolean global rules.
    GlobalRules,
    /// A boolean stored as a negative-constraint flag.
    Flag,
    /// A single puzzle-wide value.
    ValuedGlobal,
    /// A named value.
    Variable,
}

/// How constraints of a tool are grouped into elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementPolicy {
    /// All instances live in one element per tool.
    Shared,
    /// Every instance gets its own element.
    PerInstance,
}

/// Directions an outside clue may point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutsideDirections {
    Orthogonal,
    Diagonal,
}

const GRAY: SerializableColor = SerializableColor::rgb(120, 120, 120);
const LIGHT_GRAY: SerializableColor = SerializableColor::rgb(200, 200, 200);
const BLUE: SerializableColor = SerializableColor::rgb(40, 110, 220);
const RED: SerializableColor = SerializableColor::rgb(210, 50, 50);
const GREEN: SerializableColor = SerializableColor::rgb(60, 180, 80);
const PURPLE: SerializableColor = SerializableColor::rgb(160, 80, 200);
const ORANGE: SerializableColor = SerializableColor::rgb(240, 150, 40);
const PINK: SerializableColor = SerializableColor::rgb(230, 120, 190);

impl ToolId {
    pub const ALL: [ToolId; 37] = [
        ToolId::Given,
        ToolId::Odd,
        ToolId::Even,
        ToolId::SearchNine,
        ToolId::CellArrows,
        ToolId::KropkiWhite,
        ToolId::KropkiBlack,
        ToolId::Xv,
        ToolId::EdgeSum,
        ToolId::EdgeDifference,
        ToolId::Quadruple,
        ToolId::CornerSum,
        ToolId::Thermometer,
        ToolId::Palindrome,
        ToolId::Renban,
        ToolId::Whisper,
        ToolId::RegionSum,
        ToolId::Arrow,
        ToolId::KillerCage,
        ToolId::ExtraRegion,
        ToolId::Clone,
        ToolId::Fence,
        ToolId::Text,
        ToolId::LittleKiller,
        ToolId::Sandwich,
        ToolId::XSum,
        ToolId::GlobalRules,
        ToolId::AntiKnight,
        ToolId::AntiKing,
        ToolId::NonConsecutive,
        ToolId::DiagonalPositive,
        ToolId::DiagonalNegative,
        ToolId::KropkiNegative,
        ToolId::XvNegative,
        ToolId::MaxDigit,
        ToolId::MinDigit,
        ToolId::Variable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolId::Given => "given",
            ToolId::Odd => "odd",
            ToolId::Even => "even",
            ToolId::SearchNine => "search_nine",
            ToolId::CellArrows => "cell_arrows",
            ToolId::KropkiWhite => "kropki_white",
            ToolId::KropkiBlack => "kropki_black",
            ToolId::Xv => "xv",
            ToolId::EdgeSum => "edge_sum",
            ToolId::EdgeDifference => "edge_difference",
            ToolId::Quadruple => "quadruple",
            ToolId::CornerSum => "corner_sum",
            ToolId::Thermometer => "thermometer",
            ToolId::Palindrome => "palindrome",
            ToolId::Renban => "renban",
            ToolId::Whisper => "whisper",
            ToolId::RegionSum => "region_sum",
            ToolId::Arrow => "arrow",
            ToolId::KillerCage => "killer_cage",
            ToolId::ExtraRegion => "extra_region",
            ToolId::Clone => "clone",
            ToolId::Fence => "fence",
            ToolId::Text => "text",
            ToolId::LittleKiller => "little_killer",
            ToolId::Sandwich => "sandwich",
            ToolId::XSum => "x_sum",
            ToolId::GlobalRules => "global_rules",
            ToolId::AntiKnight => "anti_knight",
            ToolId::AntiKing => "anti_king",
            ToolId::NonConsecutive => "non_consecutive",
            ToolId::DiagonalPositive => "diagonal_positive",
            ToolId::DiagonalNegative => "diagonal_negative",
            ToolId::KropkiNegative => "kropki_negative",
            ToolId::XvNegative => "xv_negative",
            ToolId::MaxDigit => "max_digit",
            ToolId::MinDigit => "min_digit",
            ToolId::Variable => "variable",
        }
    }

    pub fn family(self) -> ToolFamily {
        use ToolId::*;
        match self {
            Given | Odd | Even => ToolFamily::Cell,
            SearchNine => ToolFamily::DirectedCell,
            CellArrows => ToolFamily::DirectionSetCell,
            KropkiWhite | KropkiBlack | Xv | EdgeSum | EdgeDifference => ToolFamily::Edge,
            Quadruple | CornerSum => ToolFamily::Corner,
            Thermometer | Palindrome | Renban | Whisper | RegionSum => ToolFamily::Line,
            Arrow => ToolFamily::Arrow,
            KillerCage | ExtraRegion => ToolFamily::Cage,
            ToolId::Clone => ToolFamily::Clone,
            Fence => ToolFamily::CornerLine,
            Text => ToolFamily::CenterCornerOrEdge,
            LittleKiller | Sandwich | XSum => ToolFamily::OutsideDirection,
            GlobalRules => ToolFamily::GlobalRules,
            AntiKnight | AntiKing | NonConsecutive | DiagonalPositive | DiagonalNegative
            | KropkiNegative | XvNegative => ToolFamily::Flag,
            MaxDigit | MinDigit => ToolFamily::ValuedGlobal,
            Variable => ToolFamily::Variable,
        }
    }

    pub fn element_policy(self) -> ElementPolicy {
        match self.family() {
            ToolFamily::Arrow | ToolFamily::Cage | ToolFamily::Clone => ElementPolicy::PerInstance,
            _ => ElementPolicy::Shared,
        }
    }

    /// How pointer input is resolved for this tool; `None` for tools without
    /// a pointer interaction.
    pub fn recognizer(self) -> Option<RecognizerSpec> {
        let spec = match self.family() {
            ToolFamily::Cell
            | ToolFamily::Line
            | ToolFamily::Arrow
            | ToolFamily::Cage
            | ToolFamily::Clone => RecognizerSpec::new(FeatureKind::Cell),
            ToolFamily::DirectedCell | ToolFamily::DirectionSetCell => {
                RecognizerSpec::new(FeatureKind::CornerOrEdge).directional()
            }
            ToolFamily::Edge => RecognizerSpec::new(FeatureKind::Edge),
            ToolFamily::Corner => RecognizerSpec::new(FeatureKind::Corner),
            ToolFamily::CornerLine => RecognizerSpec::new(FeatureKind::Corner).pen(),
            ToolFamily::CenterCornerOrEdge => RecognizerSpec::new(FeatureKind::CellCornerOrEdge),
            ToolFamily::OutsideDirection => match self.outside_directions() {
                Some(OutsideDirections::Diagonal) => {
                    RecognizerSpec::new(FeatureKind::Corner).directional()
                }
                _ => RecognizerSpec::new(FeatureKind::Cell),
            },
            ToolFamily::GlobalRules
            | ToolFamily::Flag
            | ToolFamily::ValuedGlobal
            | ToolFamily::Variable => return None,
        };
        Some(spec)
    }

    pub fn outside_directions(self) -> Option<OutsideDirections> {
        match self {
            ToolId::LittleKiller => Some(OutsideDirections::Diagonal),
            ToolId::Sandwich | ToolId::XSum => Some(OutsideDirections::Orthogonal),
            _ => None,
        }
    }

    /// Rules for the tool's value; `None` if instances carry no value.
    pub fn value_rules(self) -> Option<ValueRules> {
        use ToolId::*;
        let rules = match self {
            Given => ValueRules::digits(2),
            SearchNine => ValueRules::digits(1),
            Xv => ValueRules::choice(&["X", "V"]),
            EdgeSum | CornerSum | LittleKiller | Sandwich | XSum | MaxDigit | MinDigit => {
                ValueRules::digits(2)
            }
            EdgeDifference => ValueRules::digits(1),
            Quadruple => ValueRules::text(None),
            KillerCage => ValueRules::digits(3).signed().inequality().variables(),
            ToolId::Clone => ValueRules::letters(2),
            Text => ValueRules::text(Some(24)),
            Variable => ValueRules::digits(4).signed(),
            _ => return None,
        };
        Some(rules)
    }

    /// Flags the element of this tool may carry.
    pub fn negative_flags(self) -> &'static [ToolId] {
        match self {
            ToolId::GlobalRules => &[
                ToolId::AntiKnight,
                ToolId::AntiKing,
                ToolId::NonConsecutive,
                ToolId::DiagonalPositive,
                ToolId::DiagonalNegative,
            ],
            ToolId::KropkiWhite | ToolId::KropkiBlack => &[ToolId::KropkiNegative],
            ToolId::Xv => &[ToolId::XvNegative],
            _ => &[],
        }
    }

    pub fn default_shape(self) -> ShapeStyle {
        use ToolId::*;
        let black = SerializableColor::black();
        match self {
            Given | Text | Sandwich | XSum | MaxDigit | MinDigit | Variable => {
                ShapeStyle::new(ShapeKind::Text, black, 0.6)
            }
            Odd => ShapeStyle::new(ShapeKind::Circle, GRAY, 0.8).filled(LIGHT_GRAY),
            Even => ShapeStyle::new(ShapeKind::Square, GRAY, 0.8).filled(LIGHT_GRAY),
            SearchNine | CellArrows | LittleKiller => ShapeStyle::new(ShapeKind::Arrow, black, 0.4),
            KropkiWhite => {
                ShapeStyle::new(ShapeKind::Dot, black, 0.25).filled(SerializableColor::white())
            }
            KropkiBlack => ShapeStyle::new(ShapeKind::Dot, black, 0.25).filled(black),
            Xv | EdgeSum | EdgeDifference => ShapeStyle::new(ShapeKind::Text, black, 0.35),
            Quadruple => {
                ShapeStyle::new(ShapeKind::Circle, black, 0.45).filled(SerializableColor::white())
            }
            CornerSum => ShapeStyle::new(ShapeKind::Text, black, 0.3),
            Thermometer => ShapeStyle::new(ShapeKind::Line, GRAY, 0.3),
            Palindrome => ShapeStyle::new(ShapeKind::Line, GRAY, 0.15),
            Renban => ShapeStyle::new(ShapeKind::Line, PURPLE, 0.25),
            Whisper => ShapeStyle::new(ShapeKind::Line, GREEN, 0.25),
            RegionSum => ShapeStyle::new(ShapeKind::Line, BLUE, 0.15),
            Arrow => ShapeStyle::new(ShapeKind::Arrow, GRAY, 0.1),
            KillerCage => ShapeStyle::new(ShapeKind::DashedOutline, black, 0.05),
            ExtraRegion => ShapeStyle::new(ShapeKind::Fill, LIGHT_GRAY, 1.0).filled(LIGHT_GRAY),
            ToolId::Clone => ShapeStyle::new(ShapeKind::Fill, ORANGE, 1.0).filled(ORANGE),
            Fence => ShapeStyle::new(ShapeKind::Line, RED, 0.08),
            GlobalRules | AntiKnight | AntiKing | NonConsecutive | KropkiNegative
            | XvNegative => ShapeStyle::new(ShapeKind::Text, black, 0.5),
            DiagonalPositive | DiagonalNegative => ShapeStyle::new(ShapeKind::Line, PINK, 0.05),
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = UnknownToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| UnknownToolError(s.to_string()))
    }
}
