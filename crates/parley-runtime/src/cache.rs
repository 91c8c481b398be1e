//! Cache of cognitive audit verdicts.
//!
//! Outbound bot text repeats a lot (templates, fallbacks), so identical
//! audits are answered from memory instead of a second LLM call.

use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use parley_core::BotMode;

use crate::guard::AuditVerdict;

/// Cache key for one audit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AuditKey {
    message_hash: u64,
    context_hash: u64,
    mode: BotMode,
}

impl AuditKey {
    pub fn new(message: &str, mode: BotMode, context: &[String]) -> Self {
        Self {
            message_hash: hash_message(message),
            context_hash: hash_context(context),
            mode,
        }
    }
}

/// Verdict cache backed by moka.
pub struct AuditCache {
    cache: Cache<AuditKey, AuditVerdict>,
}

impl AuditCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, key: &AuditKey) -> Option<AuditVerdict> {
        self.cache.get(key).await
    }

    pub async fn insert(&self, key: AuditKey, verdict: AuditVerdict) {
        self.cache.insert(key, verdict).await;
    }
}

impl Default for AuditCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(3600))
    }
}

impl std::fmt::Debug for AuditCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

fn hash_message(message: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    message.hash(&mut hasher);
    hasher.finish()
}

fn hash_context(context: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for item in context {
        item.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::AuditTier;
    use parley_core::ComplianceStatus;

    fn verdict(reason: &str) -> AuditVerdict {
        AuditVerdict {
            status: ComplianceStatus::Passed,
            reason: reason.to_string(),
            violations: vec![],
            tier: AuditTier::Cognitive,
            degraded: false,
        }
    }

    #[tokio::test]
    async fn test_cache_operations() {
        let cache = AuditCache::default();
        let key = AuditKey::new("What price are you hoping for?", BotMode::Seller, &[]);

        assert!(cache.get(&key).await.is_none());

        cache.insert(key.clone(), verdict("clean")).await;

        let cached = cache.get(&key).await.unwrap();
        assert_eq!(cached.reason, "clean");
    }

    #[tokio::test]
    async fn test_mode_and_context_are_part_of_key() {
        let cache = AuditCache::default();
        let message = "What price are you hoping for?";
        cache
            .insert(AuditKey::new(message, BotMode::Seller, &[]), verdict("seller"))
            .await;

        assert!(cache.get(&AuditKey::new(message, BotMode::Buyer, &[])).await.is_none());
        let with_context = AuditKey::new(message, BotMode::Seller, &["earlier turn".to_string()]);
        assert!(cache.get(&with_context).await.is_none());
    }
}
