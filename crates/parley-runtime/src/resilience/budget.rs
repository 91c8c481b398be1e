//! Token budget for cognitive audits.
//!
//! Once the budget is spent the guard stops calling the LLM and flags
//! messages for human review instead.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::providers::TokenUsage;

/// A token allowance shared by every audit made through one guard.
pub struct TokenBudget {
    pub max_tokens: u32,
    used: AtomicU32,
}

impl TokenBudget {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            used: AtomicU32::new(0),
        }
    }

    pub fn can_afford(&self, tokens: u32) -> bool {
        self.remaining() >= tokens
    }

    pub fn record(&self, tokens: u32) {
        self.used.fetch_add(tokens, Ordering::SeqCst);
    }

    pub fn remaining(&self) -> u32 {
        self.max_tokens.saturating_sub(self.used.load(Ordering::SeqCst))
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.used.store(0, Ordering::SeqCst);
    }
}

/// Accumulated LLM usage across audits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmUsage {
    pub total_tokens: u32,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub llm_calls: u32,
    /// Estimated cost in USD
    pub estimated_cost: f64,
}

impl LlmUsage {
    pub fn add(&mut self, usage: &TokenUsage, model: &str) {
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.total_tokens += usage.total();
        self.llm_calls += 1;
        self.estimated_cost += Self::estimate_cost(usage, model);
    }

    fn estimate_cost(usage: &TokenUsage, model: &str) -> f64 {
        // USD per million tokens
        let (input_rate, output_rate) = match model {
            m if m.contains("haiku") => (1.0, 5.0),
            m if m.contains("opus") => (5.0, 25.0),
            _ => (3.0, 15.0),
        };

        (usage.prompt_tokens as f64 / 1_000_000.0) * input_rate
            + (usage.completion_tokens as f64 / 1_000_000.0) * output_rate
    }
}

/// Budget plus usage ledger for one guard.
pub struct AuditBudget {
    budget: TokenBudget,
    usage: RwLock<LlmUsage>,
}

impl AuditBudget {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            budget: TokenBudget::new(max_tokens),
            usage: RwLock::new(LlmUsage::default()),
        }
    }

    pub fn can_afford(&self, estimated_tokens: u32) -> bool {
        self.budget.can_afford(estimated_tokens)
    }

    pub fn record_usage(&self, usage: &TokenUsage, model: &str) {
        self.budget.record(usage.total());
        self.usage.write().add(usage, model);
    }

    pub fn usage(&self) -> LlmUsage {
        self.usage.read().clone()
    }

    pub fn remaining(&self) -> u32 {
        self.budget.remaining()
    }

    pub fn reset(&self) {
        self.budget.reset();
        *self.usage.write() = LlmUsage::default();
    }
}

impl std::fmt::Debug for AuditBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditBudget")
            .field("max_tokens", &self.budget.max_tokens)
            .field("used", &self.budget.used())
            .finish()
    }
}
