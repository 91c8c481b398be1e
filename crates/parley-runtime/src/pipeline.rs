//! Outbound response gate.
//!
//! Every candidate reply passes the deterministic middleware first. Only
//! if the middleware lets it through does the tiered guard look at it.
//! A block at either stage swaps the candidate for the persona's safe
//! fallback and tags the turn for review.

use serde::{Deserialize, Serialize};
use std::fmt;

use parley_core::{BotMode, ComplianceMiddleware, ComplianceResult, ComplianceStatus};

use crate::guard::{AuditVerdict, ComplianceGuard, ContactContext};

/// Tag attached to every blocked turn.
pub const COMPLIANCE_ALERT_TAG: &str = "Compliance-Alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    Send,
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Warning,
    Critical,
}

/// Which stage raised a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSource {
    Middleware,
    Guard,
}

impl fmt::Display for FlagSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagSource::Middleware => f.write_str("middleware"),
            FlagSource::Guard => f.write_str("guard"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFlag {
    pub severity: FlagSeverity,
    pub source: FlagSource,
    pub reason: String,
}

impl ComplianceFlag {
    fn for_status(status: ComplianceStatus, source: FlagSource, reason: &str) -> Option<Self> {
        let severity = match status {
            ComplianceStatus::Passed => return None,
            ComplianceStatus::Flagged => FlagSeverity::Warning,
            ComplianceStatus::Blocked => FlagSeverity::Critical,
        };
        Some(Self {
            severity,
            source,
            reason: reason.to_string(),
        })
    }
}

/// What to actually send for one candidate reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatedResponse {
    pub action: GateAction,
    pub message: String,
    pub tags: Vec<String>,
    pub flags: Vec<ComplianceFlag>,
    pub compliance: ComplianceResult,
    /// `None` when the middleware blocked and the guard never ran.
    pub guard: Option<AuditVerdict>,
}

impl GatedResponse {
    pub fn is_blocked(&self) -> bool {
        self.action == GateAction::Block
    }
}

/// Middleware then guard, for one bot deployment.
#[derive(Debug)]
pub struct ResponseGate {
    middleware: ComplianceMiddleware,
    guard: ComplianceGuard,
}

impl ResponseGate {
    pub fn new(middleware: ComplianceMiddleware, guard: ComplianceGuard) -> Self {
        Self { middleware, guard }
    }

    pub fn middleware(&self) -> &ComplianceMiddleware {
        &self.middleware
    }

    pub fn guard(&self) -> &ComplianceGuard {
        &self.guard
    }

    pub async fn gate(&mut self, candidate: &str, contact_id: &str, mode: BotMode) -> GatedResponse {
        let context = ContactContext::new(contact_id, mode);
        self.gate_in_context(candidate, &context).await
    }

    /// Gate with recent conversation turns available to both stages.
    pub async fn gate_in_context(
        &mut self,
        candidate: &str,
        context: &ContactContext,
    ) -> GatedResponse {
        let contact_id = context.contact_id.as_deref().unwrap_or("");
        let recent = (!context.recent_messages.is_empty()).then(|| context.recent_messages.as_slice());

        let compliance = self
            .middleware
            .enforce(candidate, contact_id, context.mode, recent);

        let mut flags: Vec<ComplianceFlag> =
            ComplianceFlag::for_status(compliance.status, FlagSource::Middleware, &compliance.reason)
                .into_iter()
                .collect();

        let guard = if compliance.is_blocked() {
            None
        } else {
            let verdict = self.guard.audit_message(candidate, Some(context)).await;
            flags.extend(ComplianceFlag::for_status(
                verdict.status,
                FlagSource::Guard,
                &verdict.reason,
            ));
            Some(verdict)
        };

        let blocked = compliance.is_blocked()
            || guard.as_ref().is_some_and(|v| v.status.is_blocked());

        if !blocked {
            return GatedResponse {
                action: GateAction::Send,
                message: candidate.to_string(),
                tags: Vec::new(),
                flags,
                compliance,
                guard,
            };
        }

        let stage = if compliance.is_blocked() {
            FlagSource::Middleware
        } else {
            FlagSource::Guard
        };
        tracing::info!(contact_id, mode = %context.mode, stage = %stage, "Candidate reply replaced with safe fallback");

        let message = compliance.safe_alternative.clone().unwrap_or_else(|| {
            self.middleware
                .config()
                .fallbacks
                .for_mode(context.mode)
                .to_string()
        });

        GatedResponse {
            action: GateAction::Block,
            message,
            tags: vec![COMPLIANCE_ALERT_TAG.to_string()],
            flags,
            compliance,
            guard,
        }
    }
}
