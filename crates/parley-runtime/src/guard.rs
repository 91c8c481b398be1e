//! Compliance guard: a second safety net for outbound messages.
//!
//! | Tier | Check | LLM call |
//! |------|-------|----------|
//! | 0 | Message longer than `max_input_length` characters | never |
//! | 1 | Protected-class keyword patterns | never |
//! | 2 | Cognitive audit by an [`LlmProvider`] | only if tiers 0 and 1 pass |
//!
//! Tier 2 never passes a message it could not actually audit. Provider
//! errors, timeouts, an open circuit, an exhausted budget, and malformed
//! responses all come back as FLAGGED for human review.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use parley_core::patterns::PROTECTED_CLASS_PATTERNS;
use parley_core::{BotMode, ComplianceStatus};

use crate::cache::{AuditCache, AuditKey};
use crate::config::GuardConfig;
use crate::prompts::{build_audit_prompt, AUDIT_RESPONSE_SCHEMA, AUDIT_SYSTEM_PROMPT};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};
use crate::resilience::{AuditBudget, CircuitBreaker, CircuitState, LlmUsage};

/// Characters above which a message is rejected before any other check.
pub const MAX_INPUT_LENGTH: usize = 10_000;

/// Violation reported for oversized input.
pub const INPUT_LENGTH_EXCEEDED: &str = "input_length_exceeded";

static RESPONSE_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Why a cognitive audit could not produce a verdict.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("audit timed out after {0:?}")]
    Timeout(Duration),

    #[error("audit circuit is open")]
    CircuitOpen,

    #[error("audit token budget exhausted")]
    BudgetExhausted,

    #[error("audit response is not JSON: {0}")]
    Unparseable(String),

    #[error("audit response does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),
}

/// Which tier produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditTier {
    InputLimit,
    Pattern,
    Cognitive,
}

/// Outcome of auditing one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditVerdict {
    pub status: ComplianceStatus,
    pub reason: String,
    pub violations: Vec<String>,
    pub tier: AuditTier,
    /// True when the cognitive audit failed and the verdict is the
    /// human-review fallback.
    #[serde(default)]
    pub degraded: bool,
}

impl AuditVerdict {
    fn human_review(error: &GuardError) -> Self {
        Self {
            status: ComplianceStatus::Flagged,
            reason: format!("Cognitive audit unavailable ({}); flagged for human review", error),
            violations: Vec::new(),
            tier: AuditTier::Cognitive,
            degraded: true,
        }
    }
}

/// Who the message is for and what came before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactContext {
    #[serde(default)]
    pub contact_id: Option<String>,
    #[serde(default)]
    pub mode: BotMode,
    /// Recent turns, oldest first.
    #[serde(default)]
    pub recent_messages: Vec<String>,
}

impl ContactContext {
    pub fn new(contact_id: impl Into<String>, mode: BotMode) -> Self {
        Self {
            contact_id: Some(contact_id.into()),
            mode,
            recent_messages: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    status: ComplianceStatus,
    reason: String,
    violations: Vec<String>,
}

/// Tiered outbound message auditor.
pub struct ComplianceGuard {
    provider: Arc<dyn LlmProvider>,
    config: GuardConfig,
    breaker: CircuitBreaker,
    budget: AuditBudget,
    cache: AuditCache,
}

impl ComplianceGuard {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GuardConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            budget: AuditBudget::new(config.token_budget),
            cache: AuditCache::new(config.cache.max_entries, config.cache.ttl),
            provider,
            config,
        }
    }

    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, GuardConfig::default())
    }

    /// Audit one outbound message. Never fails.
    pub async fn audit_message(
        &self,
        message: &str,
        contact_context: Option<&ContactContext>,
    ) -> AuditVerdict {
        let length = message.chars().count();
        if length > self.config.max_input_length {
            tracing::warn!(
                length,
                limit = self.config.max_input_length,
                "Outbound message rejected for length"
            );
            return AuditVerdict {
                status: ComplianceStatus::Blocked,
                reason: format!(
                    "Message length {} exceeds the {} character limit",
                    length, self.config.max_input_length
                ),
                violations: vec![INPUT_LENGTH_EXCEEDED.to_string()],
                tier: AuditTier::InputLimit,
                degraded: false,
            };
        }

        let matched: Vec<String> = PROTECTED_CLASS_PATTERNS
            .iter()
            .filter(|p| p.regex.is_match(message))
            .map(|p| p.description.to_string())
            .collect();
        if !matched.is_empty() {
            tracing::warn!(violations = ?matched, "Protected-class language blocked");
            return AuditVerdict {
                status: ComplianceStatus::Blocked,
                reason: format!("Fair Housing protected-class language: {}", matched.join(", ")),
                violations: matched,
                tier: AuditTier::Pattern,
                degraded: false,
            };
        }

        match self.cognitive_audit(message, contact_context).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, provider = self.provider.name(), "Cognitive audit degraded");
                AuditVerdict::human_review(&e)
            }
        }
    }

    async fn cognitive_audit(
        &self,
        message: &str,
        contact_context: Option<&ContactContext>,
    ) -> Result<AuditVerdict, GuardError> {
        let (mode, recent) = match contact_context {
            Some(ctx) => (ctx.mode, ctx.recent_messages.as_slice()),
            None => (BotMode::General, &[][..]),
        };

        let key = AuditKey::new(message, mode, recent);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Cognitive audit served from cache");
            return Ok(cached);
        }

        if self.breaker.is_open() {
            return Err(GuardError::CircuitOpen);
        }

        let prompt = build_audit_prompt(message, mode, recent);
        let estimated = self.provider.estimate_tokens(AUDIT_SYSTEM_PROMPT)
            + self.provider.estimate_tokens(&prompt)
            + self.config.max_tokens;
        if !self.budget.can_afford(estimated) {
            return Err(GuardError::BudgetExhausted);
        }

        let messages = vec![
            ChatMessage::system(AUDIT_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let completion = CompletionConfig {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: 0.0,
            timeout: self.config.llm_timeout,
        };
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.config.retry_min_delay)
            .with_max_times(self.config.max_retries);

        let call = (|| async { self.provider.complete(messages.clone(), &completion).await })
            .retry(backoff)
            .when(ProviderError::is_transient)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::debug!(error = %err, ?delay, "Retrying cognitive audit");
            });

        let response = match tokio::time::timeout(self.config.llm_timeout, call).await {
            Ok(Ok(response)) => {
                self.breaker.record_success();
                response
            }
            Ok(Err(e)) => {
                self.breaker.record_failure();
                return Err(GuardError::Provider(e));
            }
            Err(_) => {
                self.breaker.record_failure();
                return Err(GuardError::Timeout(self.config.llm_timeout));
            }
        };

        self.budget.record_usage(&response.usage, &response.model);

        let verdict = parse_audit_response(&response.content)?;
        tracing::info!(status = %verdict.status, "Cognitive audit completed");
        self.cache.insert(key, verdict.clone()).await;
        Ok(verdict)
    }

    pub fn usage(&self) -> LlmUsage {
        self.budget.usage()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

impl std::fmt::Debug for ComplianceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplianceGuard")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("breaker", &self.breaker)
            .finish()
    }
}

fn response_validator() -> Result<&'static jsonschema::Validator, GuardError> {
    let result = RESPONSE_SCHEMA.get_or_init(|| {
        let schema: serde_json::Value = serde_json::from_str(AUDIT_RESPONSE_SCHEMA)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;
        jsonschema::options()
            .build(&schema)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| GuardError::SchemaViolation(vec![e.clone()]))
}

/// The outermost `{...}` span, tolerating code fences and prose around it.
fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}

/// Parse an audit response: lenient about framing, strict about content.
pub fn parse_audit_response(content: &str) -> Result<AuditVerdict, GuardError> {
    let json = extract_json_object(content)
        .ok_or_else(|| GuardError::Unparseable("no JSON object in response".to_string()))?;
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| GuardError::Unparseable(e.to_string()))?;

    let errors: Vec<String> = response_validator()?
        .iter_errors(&value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();
    if !errors.is_empty() {
        return Err(GuardError::SchemaViolation(errors));
    }

    let raw: RawVerdict =
        serde_json::from_value(value).map_err(|e| GuardError::Unparseable(e.to_string()))?;

    Ok(AuditVerdict {
        status: raw.status,
        reason: raw.reason,
        violations: raw.violations,
        tier: AuditTier::Cognitive,
        degraded: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, NullProvider, TokenUsage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Scripted = Result<String, ProviderError>;

    /// Replays scripted replies; repeats the last one when the script runs out.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Scripted>>,
        last: Mutex<Option<Scripted>>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                delay: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(VecDeque::new()),
                last: Mutex::new(Some(Ok(passed_json()))),
                delay: Some(delay),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let next = self.script.lock().pop_front();
            let reply = match next {
                Some(reply) => {
                    *self.last.lock() = Some(reply.clone());
                    reply
                }
                None => self
                    .last
                    .lock()
                    .clone()
                    .unwrap_or_else(|| Err(ProviderError::NotConfigured("empty script".into()))),
            };

            reply.map(|content| CompletionResponse {
                content,
                usage: TokenUsage {
                    prompt_tokens: 120,
                    completion_tokens: 30,
                },
                model: config.model.clone(),
                stop_reason: Some("end_turn".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn passed_json() -> String {
        r#"{"status": "passed", "reason": "No protected-class or referral language", "violations": []}"#
            .to_string()
    }

    fn fast_config() -> GuardConfig {
        GuardConfig {
            retry_min_delay: Duration::from_millis(1),
            ..GuardConfig::default()
        }
    }

    fn guard(provider: Arc<ScriptedProvider>) -> ComplianceGuard {
        ComplianceGuard::new(provider, fast_config())
    }

    #[tokio::test]
    async fn test_oversized_input_blocked_without_llm() {
        let provider = ScriptedProvider::new(vec![Ok(passed_json())]);
        let guard = guard(provider.clone());

        let message = "a".repeat(MAX_INPUT_LENGTH + 1);
        let verdict = guard.audit_message(&message, None).await;

        assert_eq!(verdict.status, ComplianceStatus::Blocked);
        assert!(verdict.violations.contains(&INPUT_LENGTH_EXCEEDED.to_string()));
        assert_eq!(verdict.tier, AuditTier::InputLimit);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_input_at_limit_reaches_cognitive_tier() {
        let provider = ScriptedProvider::new(vec![Ok(passed_json())]);
        let guard = guard(provider.clone());

        let verdict = guard.audit_message(&"a".repeat(MAX_INPUT_LENGTH), None).await;

        assert_eq!(verdict.status, ComplianceStatus::Passed);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_protected_class_blocked_without_llm() {
        let provider = ScriptedProvider::new(vec![Ok(passed_json())]);
        let guard = guard(provider.clone());

        let steering = [
            "That's a bad area, I'd look elsewhere",
            "The area is great because of the church community",
            "It's a safe area for you",
            "Buyers of any national origin are welcome",
            "Those people tend to live on the east side",
            "Great for families with children",
        ];

        for message in steering {
            let verdict = guard.audit_message(message, None).await;
            assert_eq!(verdict.status, ComplianceStatus::Blocked, "{message}");
            assert_eq!(verdict.tier, AuditTier::Pattern);
            assert!(!verdict.violations.is_empty());
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_cognitive_tier_can_block() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"status": "blocked", "reason": "References national origin", "violations": ["national origin steering"]}"#
                .to_string(),
        )]);
        let guard = guard(provider.clone());

        let verdict = guard
            .audit_message("That neighborhood has a lot of immigrants moving in", None)
            .await;

        assert_eq!(verdict.status, ComplianceStatus::Blocked);
        assert_eq!(verdict.tier, AuditTier::Cognitive);
        assert_eq!(verdict.violations, vec!["national origin steering"]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_fenced_response_is_accepted() {
        let fenced = format!("Here is my verdict:\n```json\n{}\n```", passed_json());
        let provider = ScriptedProvider::new(vec![Ok(fenced)]);
        let guard = guard(provider);

        let verdict = guard
            .audit_message("Your home could benefit from staging. What price are you thinking?", None)
            .await;

        assert_eq!(verdict.status, ComplianceStatus::Passed);
        assert!(!verdict.degraded);
    }

    #[tokio::test]
    async fn test_unparseable_response_flags_for_review() {
        let provider = ScriptedProvider::new(vec![Ok("Looks fine to me!".to_string())]);
        let guard = guard(provider);

        let verdict = guard.audit_message("What price are you thinking?", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Flagged);
        assert!(verdict.reason.contains("flagged for human review"));
        assert!(verdict.degraded);
    }

    #[tokio::test]
    async fn test_schema_violation_flags_for_review() {
        let provider = ScriptedProvider::new(vec![Ok(
            r#"{"status": "probably_fine", "reason": "ok", "violations": []}"#.to_string(),
        )]);
        let guard = guard(provider);

        let verdict = guard.audit_message("What price are you thinking?", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Flagged);
        assert!(verdict.degraded);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Unauthorized)]);
        let guard = guard(provider.clone());

        let verdict = guard.audit_message("What price are you thinking?", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Flagged);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::RateLimited { retry_after: None }),
            Ok(passed_json()),
        ]);
        let guard = guard(provider.clone());

        let verdict = guard.audit_message("What price are you thinking?", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Passed);
        assert_eq!(provider.calls(), 2);
        assert_eq!(guard.usage().llm_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_flags_for_review() {
        let provider = ScriptedProvider::slow(Duration::from_secs(60));
        let guard = guard(provider);

        let verdict = guard.audit_message("What price are you thinking?", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Flagged);
        assert!(verdict.reason.contains("timed out"));
    }

    #[tokio::test]
    async fn test_open_circuit_skips_provider() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Unauthorized)]);
        let mut config = fast_config();
        config.circuit_breaker.failure_threshold = 1;
        let guard = ComplianceGuard::new(provider.clone(), config);

        guard.audit_message("First message", None).await;
        let verdict = guard.audit_message("Second message", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Flagged);
        assert!(verdict.reason.contains("circuit"));
        assert_eq!(provider.calls(), 1);
        assert!(matches!(guard.circuit_state(), CircuitState::Open { .. }));
    }

    #[tokio::test]
    async fn test_exhausted_budget_skips_provider() {
        let provider = ScriptedProvider::new(vec![Ok(passed_json())]);
        let config = GuardConfig {
            token_budget: 10,
            ..fast_config()
        };
        let guard = ComplianceGuard::new(provider.clone(), config);

        let verdict = guard.audit_message("What price are you thinking?", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Flagged);
        assert!(verdict.reason.contains("budget"));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_message_served_from_cache() {
        let provider = ScriptedProvider::new(vec![Ok(passed_json())]);
        let guard = guard(provider.clone());
        let context = ContactContext::new("c1", BotMode::Seller);

        let first = guard.audit_message("What price are you thinking?", Some(&context)).await;
        let second = guard.audit_message("What price are you thinking?", Some(&context)).await;

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_null_provider_degrades_to_flagged() {
        let guard = ComplianceGuard::with_defaults(Arc::new(NullProvider));
        let verdict = guard.audit_message("What price are you thinking?", None).await;

        assert_eq!(verdict.status, ComplianceStatus::Flagged);
        assert!(verdict.reason.contains("flagged for human review"));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = parse_audit_response(r#"{"status": "passed"}"#).unwrap_err();
        assert!(matches!(err, GuardError::SchemaViolation(_)));
    }

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("x {\"a\": 1} y"), Some("{\"a\": 1}"));
        assert_eq!(extract_json_object("} nothing {"), None);
        assert_eq!(extract_json_object("no braces"), None);
    }
}
