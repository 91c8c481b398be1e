//! # parley-runtime
//!
//! The async side of Parley: everything that may wait on something else.
//!
//! - [`ComplianceGuard`]: three-tier outbound audit (length, protected-class
//!   keywords, LLM review) that never fails and never sends unreviewed text
//!   on error
//! - [`ExtendedObjectionHandler`]: all eleven objection types with per-contact
//!   A/B variants and best-effort event persistence
//! - [`ResponseGate`]: middleware then guard, producing the text to send
//!
//! ## Important
//!
//! `parley-core` stays deterministic and offline. Only this crate talks to
//! an LLM, and only through the [`LlmProvider`] trait.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use parley_core::{BotMode, ComplianceMiddleware};
//! use parley_runtime::{ComplianceGuard, ExtendedObjectionHandler, NullProvider, ResponseGate};
//!
//! let mut handler = ExtendedObjectionHandler::default();
//! let mut gate = ResponseGate::new(
//!     ComplianceMiddleware::new(),
//!     ComplianceGuard::with_defaults(Arc::new(NullProvider)),
//! );
//!
//! if let Some(reply) = handler.handle_message("I'm not ready to sell yet", "c1", None) {
//!     let gated = gate.gate(&reply.response_text, "c1", BotMode::Seller).await;
//!     println!("{}", gated.message);
//! }
//! ```

pub mod cache;
pub mod config;
pub mod events;
pub mod guard;
pub mod handler;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod resilience;

pub use config::{CacheConfig, EventsConfig, GuardConfig, RuntimeConfig, RuntimeConfigError};
pub use events::{
    DispatchStats, EventDispatcher, MemorySink, ObjectionEvent, ObjectionEventSink, SinkError,
};
pub use guard::{
    parse_audit_response, AuditTier, AuditVerdict, ComplianceGuard, ContactContext, GuardError,
    MAX_INPUT_LENGTH,
};
pub use handler::{ExtendedObjectionHandler, HandlerError};
pub use pipeline::{
    ComplianceFlag, FlagSeverity, FlagSource, GateAction, GatedResponse, ResponseGate,
    COMPLIANCE_ALERT_TAG,
};
pub use providers::{LlmProvider, NullProvider, ProviderError};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
