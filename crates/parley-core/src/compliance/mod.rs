//! Outbound compliance enforcement.
//!
//! Every candidate bot message passes through [`ComplianceMiddleware`]
//! before it may reach a customer. The middleware scans for Fair Housing
//! steering and RESPA referral language, tracks disclosure gaps, escalates
//! on per-contact violation history, and supplies a safe fallback when a
//! message is blocked.
//!
//! ## Status Conditions
//!
//! | Status | Condition |
//! |--------|-----------|
//! | **PASSED** | No violations |
//! | **FLAGGED** | Violations present, but none HIGH or CRITICAL and risk < 0.5 |
//! | **BLOCKED** | Any HIGH or CRITICAL violation, or risk >= 0.5 |

use serde::{Deserialize, Serialize};
use std::fmt;

mod middleware;

pub use middleware::{ComplianceMiddleware, BLOCK_RISK_THRESHOLD, CRITICAL_RISK_THRESHOLD};

/// What kind of rule a violation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCategory {
    SchoolSteering,
    SafetySteering,
    FamilialStatusSteering,
    AvailabilitySteering,
    RespaReferral,
    /// Synthesized when a contact's history crosses the escalation threshold.
    ConversationAccumulation,
}

impl ViolationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationCategory::SchoolSteering => "school_steering",
            ViolationCategory::SafetySteering => "safety_steering",
            ViolationCategory::FamilialStatusSteering => "familial_status_steering",
            ViolationCategory::AvailabilitySteering => "availability_steering",
            ViolationCategory::RespaReferral => "respa_referral",
            ViolationCategory::ConversationAccumulation => "conversation_accumulation",
        }
    }
}

impl fmt::Display for ViolationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Violation severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Contribution to the risk score.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Critical => 1.0,
            Severity::High => 0.7,
            Severity::Medium => 0.4,
            Severity::Low => 0.1,
        }
    }
}

/// Final verdict for an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Passed,
    Flagged,
    Blocked,
}

impl ComplianceStatus {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ComplianceStatus::Blocked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Passed => "passed",
            ComplianceStatus::Flagged => "flagged",
            ComplianceStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which bot persona produced the message. Selects the safe fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotMode {
    Seller,
    Buyer,
    Lead,
    #[default]
    General,
}

impl BotMode {
    /// Parse a mode name. Unknown names fall back to `General`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "seller" => BotMode::Seller,
            "buyer" => BotMode::Buyer,
            "lead" => BotMode::Lead,
            _ => BotMode::General,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BotMode::Seller => "seller",
            BotMode::Buyer => "buyer",
            BotMode::Lead => "lead",
            BotMode::General => "general",
        }
    }
}

impl fmt::Display for BotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rule breach found in an outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub category: ViolationCategory,
    pub severity: Severity,
    /// The pattern source that matched (empty for synthesized violations).
    pub pattern: String,
    pub matched_text: String,
    pub explanation: String,
}

/// Outcome of enforcing compliance on one outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub status: ComplianceStatus,
    pub violations: Vec<ComplianceViolation>,
    pub reason: String,
    pub safe_alternative: Option<String>,
    /// Bounded to `[0.0, 1.0]`.
    pub risk_score: f64,
    pub respa_disclosures_needed: Vec<String>,
}

impl ComplianceResult {
    pub fn is_blocked(&self) -> bool {
        self.status.is_blocked()
    }

    /// Highest severity among the violations, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }
}
