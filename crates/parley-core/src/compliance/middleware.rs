//! The compliance middleware: pattern scan, disclosure tracking, and
//! conversation-level escalation.

use std::collections::HashMap;

use super::{BotMode, ComplianceResult, ComplianceStatus, ComplianceViolation, Severity, ViolationCategory};
use crate::config::ComplianceConfig;
use crate::patterns::{DISCLOSURE_PRESENT, DISCLOSURE_TRIGGERS, STEERING_GROUPS};

/// Risk at or above which a message is blocked regardless of severity mix.
pub const CRITICAL_RISK_THRESHOLD: f64 = 0.9;

/// Risk at or above which a message is blocked.
pub const BLOCK_RISK_THRESHOLD: f64 = 0.5;

/// Audits outbound messages and remembers each contact's violations.
///
/// History is a plain map. Callers must serialize turns per contact;
/// different contacts never share an entry.
#[derive(Debug, Default)]
pub struct ComplianceMiddleware {
    config: ComplianceConfig,
    history: HashMap<String, Vec<ComplianceViolation>>,
}

impl ComplianceMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ComplianceConfig) -> Self {
        Self {
            config,
            history: HashMap::new(),
        }
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    /// Enforce compliance on one outbound message.
    ///
    /// An empty `contact_id` disables history tracking for this call.
    /// Once a contact's history reaches the escalation threshold every later
    /// message for it is blocked, clean text and the mode fallback included.
    /// Only [`ComplianceMiddleware::clear_history`] lifts that.
    /// Never fails: a message either matches or it does not.
    pub fn enforce(
        &mut self,
        message: &str,
        contact_id: &str,
        mode: BotMode,
        conversation_context: Option<&[String]>,
    ) -> ComplianceResult {
        let mut violations = scan_violations(message);
        let respa_disclosures_needed = disclosure_gaps(message);

        if !contact_id.is_empty() {
            if let Some(escalation) = self.record_history(contact_id, &violations) {
                violations.push(escalation);
            }
        }

        let risk_score = risk_score(&violations);
        let status = status_for(&violations, risk_score);
        let reason = build_reason(status, &violations);
        let safe_alternative = status
            .is_blocked()
            .then(|| self.config.fallbacks.for_mode(mode).to_string());

        match status {
            ComplianceStatus::Blocked => tracing::warn!(
                contact_id,
                mode = %mode,
                risk_score,
                violations = violations.len(),
                "Outbound message blocked"
            ),
            ComplianceStatus::Flagged => tracing::info!(
                contact_id,
                mode = %mode,
                risk_score,
                violations = violations.len(),
                "Outbound message flagged"
            ),
            ComplianceStatus::Passed => tracing::debug!(
                contact_id,
                context_turns = conversation_context.map(|c| c.len()).unwrap_or(0),
                "Outbound message passed"
            ),
        }

        ComplianceResult {
            status,
            violations,
            reason,
            safe_alternative,
            risk_score,
            respa_disclosures_needed,
        }
    }

    /// Violations recorded so far for `contact_id`.
    pub fn history(&self, contact_id: &str) -> &[ComplianceViolation] {
        self.history
            .get(contact_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Forget a contact's violation history. No-op for unknown contacts.
    pub fn clear_history(&mut self, contact_id: &str) {
        self.history.remove(contact_id);
    }

    /// Append this turn's violations and return the escalation violation
    /// if the cumulative count has reached the threshold.
    fn record_history(
        &mut self,
        contact_id: &str,
        turn: &[ComplianceViolation],
    ) -> Option<ComplianceViolation> {
        let entry = self.history.entry(contact_id.to_string()).or_default();
        entry.extend(turn.iter().cloned());
        let cumulative = entry.len();

        let turn_is_critical = turn.iter().any(|v| v.severity == Severity::Critical);
        if cumulative < self.config.escalation_threshold || turn_is_critical {
            return None;
        }

        tracing::warn!(
            contact_id,
            cumulative,
            threshold = self.config.escalation_threshold,
            "Violation history reached escalation threshold"
        );

        Some(ComplianceViolation {
            category: ViolationCategory::ConversationAccumulation,
            severity: Severity::High,
            pattern: String::new(),
            matched_text: String::new(),
            explanation: format!(
                "{} compliance violations accumulated across this conversation",
                cumulative
            ),
        })
    }
}

/// Scan a message against every steering group. One violation per match.
fn scan_violations(message: &str) -> Vec<ComplianceViolation> {
    let mut violations = Vec::new();

    for group in STEERING_GROUPS.iter() {
        for (explanation, regex) in &group.patterns {
            for m in regex.find_iter(message) {
                tracing::debug!(
                    category = %group.category,
                    start = m.start(),
                    end = m.end(),
                    "Compliance pattern matched"
                );
                violations.push(ComplianceViolation {
                    category: group.category,
                    severity: group.severity,
                    pattern: regex.as_str().to_string(),
                    matched_text: m.as_str().to_string(),
                    explanation: explanation.to_string(),
                });
            }
        }
    }

    violations
}

/// RESPA disclosures the message needs but does not carry.
fn disclosure_gaps(message: &str) -> Vec<String> {
    if DISCLOSURE_PRESENT.is_match(message) {
        return Vec::new();
    }

    DISCLOSURE_TRIGGERS
        .iter()
        .filter(|t| t.regex.is_match(message))
        .map(|t| t.requirement.to_string())
        .collect()
}

/// `min(1.0, sum of severity weights)`.
pub(crate) fn risk_score(violations: &[ComplianceViolation]) -> f64 {
    violations
        .iter()
        .map(|v| v.severity.weight())
        .sum::<f64>()
        .min(1.0)
}

pub(crate) fn status_for(violations: &[ComplianceViolation], risk_score: f64) -> ComplianceStatus {
    if violations.is_empty() {
        return ComplianceStatus::Passed;
    }

    let critical = violations.iter().any(|v| v.severity == Severity::Critical)
        || risk_score >= CRITICAL_RISK_THRESHOLD;
    let high = violations.iter().any(|v| v.severity == Severity::High)
        || risk_score >= BLOCK_RISK_THRESHOLD;

    if critical || high {
        ComplianceStatus::Blocked
    } else {
        ComplianceStatus::Flagged
    }
}

fn build_reason(status: ComplianceStatus, violations: &[ComplianceViolation]) -> String {
    let mut categories: Vec<&str> = Vec::new();
    for v in violations {
        let name = v.category.as_str();
        if !categories.contains(&name) {
            categories.push(name);
        }
    }

    match status {
        ComplianceStatus::Passed => "No compliance violations detected".to_string(),
        ComplianceStatus::Flagged => format!(
            "{} potential violation(s) flagged for review: {}",
            violations.len(),
            categories.join(", ")
        ),
        ComplianceStatus::Blocked => format!(
            "Blocked for {} violation(s): {}",
            violations.len(),
            categories.join(", ")
        ),
    }
}
