//! # parley-core
//!
//! Deterministic objection handling and outbound compliance for a seller
//! conversation bot.
//!
//! Inbound, the crate answers:
//! - Is the seller objecting, and to what?
//! - How far up the persuasion ladder is this contact for that objection?
//! - What should the bot say next?
//!
//! Outbound, [`ComplianceMiddleware`] decides whether a candidate reply may
//! be sent at all.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: same input and state, same output
//! 2. **No I/O**: everything is regex and in-memory state
//! 3. **Never fails a conversation**: no public conversation operation
//!    returns an error; misses degrade to "no objection" or a safe fallback
//! 4. **Explicit state**: graduation and violation history live in the
//!    objects you construct, never in globals
//!
//! ## Example
//!
//! ```rust,ignore
//! use parley_core::{BotMode, ComplianceMiddleware, MarketData, ObjectionEngine};
//!
//! let mut engine = ObjectionEngine::pricing();
//! let market = MarketData::new().with("median_price", "$450,000");
//!
//! if let Some(reply) = engine.handle("I can't sell for less than I paid", "c1", Some(&market), 0) {
//!     let mut compliance = ComplianceMiddleware::new();
//!     let verdict = compliance.enforce(&reply.response_text, "c1", BotMode::Seller, None);
//!     let text = verdict.safe_alternative.unwrap_or(reply.response_text);
//!     println!("{}", text);
//! }
//! ```

pub mod compliance;
pub mod config;
pub mod objections;
pub mod patterns;
pub mod types;

pub use compliance::{
    BotMode, ComplianceMiddleware, ComplianceResult, ComplianceStatus, ComplianceViolation,
    Severity, ViolationCategory,
};
pub use config::{ComplianceConfig, ConfigError, ObjectionConfig, ParleyConfig, SafeFallbacks};
pub use objections::{
    GraduationTracker, ObjectionDetector, ObjectionEngine, ResponseComposer,
};
pub use types::{
    Confidence, MarketData, MarketValue, ObjectionCategory, ObjectionDetection,
    ObjectionResponse, ObjectionType, RangeError, ResponseGraduation,
};
