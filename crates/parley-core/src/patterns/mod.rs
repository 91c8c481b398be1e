//! The pattern bank: static regex tables for objections and compliance.
//!
//! Pure data. Detection and enforcement logic live in `objections` and
//! `compliance`; this module only defines what to look for and how much
//! each phrasing is worth.
//!
//! Every table is an ordered `Vec`. Order matters: when two entries score
//! the same confidence, the one registered first wins.

use regex::{Regex, RegexBuilder};

use crate::types::{Confidence, ObjectionType};

pub mod compliance;
pub mod objections;

pub use compliance::{
    DisclosureTrigger, ProtectedClassPattern, SteeringGroup, DISCLOSURE_PRESENT,
    DISCLOSURE_TRIGGERS, PROTECTED_CLASS_PATTERNS, STEERING_GROUPS,
};
pub use objections::{EXTENDED_OBJECTION_PATTERNS, LEGACY_OBJECTION_PATTERNS};

/// A regex with a static confidence weight.
///
/// The weight expresses how unambiguous the phrasing is
/// (e.g. "owe more than" = 0.9, "paid $X" = 0.8).
#[derive(Debug, Clone)]
pub struct WeightedPattern {
    pub regex: Regex,
    pub confidence: Confidence,
}

/// All patterns for one objection type.
#[derive(Debug, Clone)]
pub struct ObjectionPatternGroup {
    pub objection_type: ObjectionType,
    pub patterns: Vec<WeightedPattern>,
}

/// An ordered table of objection pattern groups.
pub type ObjectionPatternBank = Vec<ObjectionPatternGroup>;

/// Compile a case-insensitive pattern. Only used to build static tables,
/// so a bad literal fails loudly at first use and in tests.
pub(crate) fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap()
}

pub(crate) fn weighted(pattern: &str, confidence: f64) -> WeightedPattern {
    WeightedPattern {
        regex: ci(pattern),
        confidence: Confidence::new(confidence).unwrap(),
    }
}

pub(crate) fn group(
    objection_type: ObjectionType,
    patterns: Vec<WeightedPattern>,
) -> ObjectionPatternGroup {
    ObjectionPatternGroup {
        objection_type,
        patterns,
    }
}
