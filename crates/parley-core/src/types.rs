//! Core types for objection handling.
//!
//! These records are the data contract between the detector, the graduation
//! tracker, the composer, and whatever sends the final text to the seller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Objection taxonomy
// ============================================================================

/// A typed seller objection.
///
/// The first five variants are the pricing-specific types handled by the
/// pricing engine. The remaining six are the broader categories added by
/// the extended handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionType {
    /// "I can't sell for less than I paid"
    LossAversion,
    /// Fixation on an online estimate or appraisal
    Anchoring,
    /// "My neighbor's house sold for more"
    NeighborComp,
    /// Belief that the market is still rising
    MarketDenial,
    /// Overvaluing renovations and upgrades
    ImprovementOvervalue,
    PricingGeneral,
    TimingNotReady,
    CompetitionShopping,
    TrustCredibility,
    AuthorityDecisionMaker,
    ValueProposition,
}

impl ObjectionType {
    /// The pricing-specific types, in pattern bank order.
    pub const LEGACY: [ObjectionType; 5] = [
        ObjectionType::LossAversion,
        ObjectionType::Anchoring,
        ObjectionType::NeighborComp,
        ObjectionType::MarketDenial,
        ObjectionType::ImprovementOvervalue,
    ];

    /// All types known to the extended handler, in pattern bank order.
    pub const ALL: [ObjectionType; 11] = [
        ObjectionType::LossAversion,
        ObjectionType::Anchoring,
        ObjectionType::NeighborComp,
        ObjectionType::MarketDenial,
        ObjectionType::ImprovementOvervalue,
        ObjectionType::PricingGeneral,
        ObjectionType::TimingNotReady,
        ObjectionType::CompetitionShopping,
        ObjectionType::TrustCredibility,
        ObjectionType::AuthorityDecisionMaker,
        ObjectionType::ValueProposition,
    ];

    /// The coarse category this type belongs to. Total over all variants.
    pub fn category(&self) -> ObjectionCategory {
        match self {
            ObjectionType::LossAversion
            | ObjectionType::Anchoring
            | ObjectionType::NeighborComp
            | ObjectionType::MarketDenial
            | ObjectionType::ImprovementOvervalue
            | ObjectionType::PricingGeneral => ObjectionCategory::Pricing,
            ObjectionType::TimingNotReady => ObjectionCategory::Timing,
            ObjectionType::CompetitionShopping => ObjectionCategory::Competition,
            ObjectionType::TrustCredibility => ObjectionCategory::Trust,
            ObjectionType::AuthorityDecisionMaker => ObjectionCategory::Authority,
            ObjectionType::ValueProposition => ObjectionCategory::Value,
        }
    }

    /// Whether the pricing engine handles this type.
    pub fn is_legacy(&self) -> bool {
        Self::LEGACY.contains(self)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectionType::LossAversion => "loss_aversion",
            ObjectionType::Anchoring => "anchoring",
            ObjectionType::NeighborComp => "neighbor_comp",
            ObjectionType::MarketDenial => "market_denial",
            ObjectionType::ImprovementOvervalue => "improvement_overvalue",
            ObjectionType::PricingGeneral => "pricing_general",
            ObjectionType::TimingNotReady => "timing_not_ready",
            ObjectionType::CompetitionShopping => "competition_shopping",
            ObjectionType::TrustCredibility => "trust_credibility",
            ObjectionType::AuthorityDecisionMaker => "authority_decision_maker",
            ObjectionType::ValueProposition => "value_proposition",
        }
    }
}

impl fmt::Display for ObjectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse grouping of objection types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectionCategory {
    Pricing,
    Timing,
    Competition,
    Trust,
    Authority,
    Value,
}

impl ObjectionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectionCategory::Pricing => "pricing",
            ObjectionCategory::Timing => "timing",
            ObjectionCategory::Competition => "competition",
            ObjectionCategory::Trust => "trust",
            ObjectionCategory::Authority => "authority",
            ObjectionCategory::Value => "value",
        }
    }
}

impl fmt::Display for ObjectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Graduation ladder
// ============================================================================

/// The four-step persuasion ladder, in escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseGraduation {
    Validate,
    Data,
    SocialProof,
    MarketTest,
}

impl ResponseGraduation {
    pub const LEVELS: [ResponseGraduation; 4] = [
        ResponseGraduation::Validate,
        ResponseGraduation::Data,
        ResponseGraduation::SocialProof,
        ResponseGraduation::MarketTest,
    ];

    /// Number of rungs on the ladder.
    pub const COUNT: usize = Self::LEVELS.len();

    /// Zero-based position on the ladder.
    pub fn index(&self) -> usize {
        match self {
            ResponseGraduation::Validate => 0,
            ResponseGraduation::Data => 1,
            ResponseGraduation::SocialProof => 2,
            ResponseGraduation::MarketTest => 3,
        }
    }

    /// Level at `index`, clamped to the top rung.
    pub fn from_index(index: usize) -> Self {
        Self::LEVELS[index.min(Self::COUNT - 1)]
    }

    /// The following rung, or `None` at `MarketTest`.
    pub fn next(&self) -> Option<Self> {
        Self::LEVELS.get(self.index() + 1).copied()
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseGraduation::Validate => "validate",
            ResponseGraduation::Data => "data",
            ResponseGraduation::SocialProof => "social_proof",
            ResponseGraduation::MarketTest => "market_test",
        }
    }
}

impl fmt::Display for ResponseGraduation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Confidence
// ============================================================================

/// A value fell outside its permitted range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field} must be within [{min}, {max}], got {value}")]
pub struct RangeError {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

/// A probability-like weight in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);

    /// Validate and wrap `value`. NaN and out-of-range values are rejected.
    pub fn new(value: f64) -> Result<Self, RangeError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RangeError {
                field: "confidence",
                value,
                min: 0.0,
                max: 1.0,
            })
        }
    }

    /// Clamp `value` into range. NaN becomes zero.
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Confidence {
    type Error = RangeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

// ============================================================================
// Detection and response records
// ============================================================================

/// Result of scanning one inbound message.
///
/// When `detected` is false every other field is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectionDetection {
    pub detected: bool,
    pub objection_type: Option<ObjectionType>,
    pub objection_category: Option<ObjectionCategory>,
    pub confidence: Confidence,
    pub matched_text: String,
}

impl ObjectionDetection {
    /// No objection found.
    pub fn none() -> Self {
        Self {
            detected: false,
            objection_type: None,
            objection_category: None,
            confidence: Confidence::ZERO,
            matched_text: String::new(),
        }
    }

    /// An objection of `objection_type`; the category is derived from it.
    pub fn found(
        objection_type: ObjectionType,
        confidence: Confidence,
        matched_text: impl Into<String>,
    ) -> Self {
        Self {
            detected: true,
            objection_type: Some(objection_type),
            objection_category: Some(objection_type.category()),
            confidence,
            matched_text: matched_text.into(),
        }
    }
}

impl Default for ObjectionDetection {
    fn default() -> Self {
        Self::none()
    }
}

/// A graduated response to a detected objection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectionResponse {
    pub objection_type: ObjectionType,
    pub graduation_level: ResponseGraduation,
    pub response_text: String,
    pub supporting_data: MarketData,
    /// `None` exactly when `graduation_level` is the top rung.
    pub next_graduation: Option<ResponseGraduation>,
    /// Template variant the text was drawn from.
    #[serde(default)]
    pub variant: usize,
}

// ============================================================================
// Market data
// ============================================================================

/// A single market figure used for template interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarketValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for MarketValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketValue::Number(n) => write!(f, "{}", n),
            MarketValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for MarketValue {
    fn from(n: f64) -> Self {
        MarketValue::Number(n)
    }
}

impl From<i64> for MarketValue {
    fn from(n: i64) -> Self {
        MarketValue::Number(n as f64)
    }
}

impl From<&str> for MarketValue {
    fn from(s: &str) -> Self {
        MarketValue::Text(s.to_string())
    }
}

impl From<String> for MarketValue {
    fn from(s: String) -> Self {
        MarketValue::Text(s)
    }
}

/// Named market figures (e.g. `median_price`, `days_on_market`).
///
/// Ordered so serialized output and logs are stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketData(BTreeMap<String, MarketValue>);

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MarketValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MarketValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MarketValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MarketValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<MarketValue>> FromIterator<(K, V)> for MarketData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
