//! Extended objection handler.
//!
//! Wraps the extended [`ObjectionEngine`] with per-contact A/B variant
//! selection, a monitoring event, and best-effort event persistence.
//! Nothing in here can fail a conversation: every internal error degrades
//! to "no objection".

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use thiserror::Error;

use parley_core::{
    MarketData, ObjectionConfig, ObjectionDetection, ObjectionEngine, ObjectionResponse,
};

use crate::events::{DispatchStats, EventDispatcher, ObjectionEvent};

/// Internal failures of the handling path. Logged, never returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("variant_count must be at least 1")]
    NoVariants,
}

/// Objection handling across all eleven objection types.
#[derive(Debug)]
pub struct ExtendedObjectionHandler {
    engine: ObjectionEngine,
    config: ObjectionConfig,
    events: Option<EventDispatcher>,
}

impl ExtendedObjectionHandler {
    pub fn new(config: ObjectionConfig) -> Self {
        Self {
            engine: ObjectionEngine::extended(),
            config,
            events: None,
        }
    }

    /// Persist handled objections through `dispatcher`.
    pub fn with_events(mut self, dispatcher: EventDispatcher) -> Self {
        self.events = Some(dispatcher);
        self
    }

    pub fn config(&self) -> &ObjectionConfig {
        &self.config
    }

    pub fn engine(&self) -> &ObjectionEngine {
        &self.engine
    }

    pub fn detect_objection(&self, message: &str) -> ObjectionDetection {
        self.engine.detect_objection(message)
    }

    /// Stable A/B variant for a contact, `0` if variants are misconfigured.
    pub fn variant_for(&self, contact_id: &str) -> usize {
        select_variant(contact_id, self.config.variant_count).unwrap_or(0)
    }

    /// Detect, respond, record. `None` when there is nothing to say or
    /// anything along the way went wrong.
    pub fn handle_message(
        &mut self,
        message: &str,
        contact_id: &str,
        market_data: Option<&MarketData>,
    ) -> Option<ObjectionResponse> {
        match self.try_handle(message, contact_id, market_data) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(contact_id, error = %e, "Objection handling degraded to no objection");
                None
            }
        }
    }

    pub fn reset_contact(&mut self, contact_id: &str) {
        self.engine.reset_contact(contact_id);
    }

    /// Drain pending events. `None` if no dispatcher was attached.
    pub async fn shutdown(self) -> Option<DispatchStats> {
        match self.events {
            Some(dispatcher) => Some(dispatcher.shutdown().await),
            None => None,
        }
    }

    fn try_handle(
        &mut self,
        message: &str,
        contact_id: &str,
        market_data: Option<&MarketData>,
    ) -> Result<Option<ObjectionResponse>, HandlerError> {
        let detection = self.engine.detect_objection(message);
        if !detection.detected {
            return Ok(None);
        }

        let variant = select_variant(contact_id, self.config.variant_count)?;
        let Some(response) =
            self.engine
                .generate_response(&detection, contact_id, market_data, variant)
        else {
            return Ok(None);
        };

        tracing::info!(
            target: "parley::monitoring",
            event = "objection_handled",
            contact_id,
            objection_type = %response.objection_type,
            category = %response.objection_type.category(),
            confidence = detection.confidence.value(),
            graduation_level = %response.graduation_level,
            variant = response.variant,
        );

        if let Some(events) = &self.events {
            events.dispatch(ObjectionEvent::from_response(
                contact_id,
                detection.confidence,
                &response,
            ));
        }

        Ok(Some(response))
    }
}

impl Default for ExtendedObjectionHandler {
    fn default() -> Self {
        Self::new(ObjectionConfig::default())
    }
}

fn select_variant(contact_id: &str, variant_count: usize) -> Result<usize, HandlerError> {
    if variant_count == 0 {
        return Err(HandlerError::NoVariants);
    }
    let mut hasher = DefaultHasher::new();
    contact_id.hash(&mut hasher);
    Ok((hasher.finish() % variant_count as u64) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EventsConfig;
    use crate::events::MemorySink;
    use parley_core::{ObjectionCategory, ObjectionType, ResponseGraduation};
    use proptest::prelude::*;
    use std::sync::Arc;

    const TIMING: &str = "I'm not ready to sell yet";
    const LOSS: &str = "I can't sell for less than I paid";

    #[test]
    fn test_variant_is_stable_per_contact() {
        let handler = ExtendedObjectionHandler::default();
        let first = handler.variant_for("contact-42");

        for _ in 0..10 {
            assert_eq!(handler.variant_for("contact-42"), first);
        }
        assert!(first < 2);
    }

    #[test]
    fn test_single_variant_always_zero() {
        let handler = ExtendedObjectionHandler::new(ObjectionConfig { variant_count: 1 });
        for id in ["a", "b", "c", "d", "e"] {
            assert_eq!(handler.variant_for(id), 0);
        }
    }

    #[test]
    fn test_both_variants_are_reachable() {
        let handler = ExtendedObjectionHandler::default();
        let seen: std::collections::HashSet<usize> = (0..64)
            .map(|i| handler.variant_for(&format!("contact-{}", i)))
            .collect();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_extended_category_ladder() {
        let mut handler = ExtendedObjectionHandler::default();

        let first = handler.handle_message(TIMING, "c1", None).unwrap();
        assert_eq!(first.objection_type, ObjectionType::TimingNotReady);
        assert_eq!(first.objection_type.category(), ObjectionCategory::Timing);
        assert_eq!(first.graduation_level, ResponseGraduation::Validate);
        assert_eq!(first.variant, handler.variant_for("c1"));

        let second = handler.handle_message(TIMING, "c1", None).unwrap();
        assert_eq!(second.graduation_level, ResponseGraduation::Data);
    }

    #[test]
    fn test_legacy_types_still_handled() {
        let mut handler = ExtendedObjectionHandler::default();
        let response = handler.handle_message(LOSS, "c1", None).unwrap();
        assert_eq!(response.objection_type, ObjectionType::LossAversion);
    }

    #[test]
    fn test_no_objection_is_none() {
        let mut handler = ExtendedObjectionHandler::default();
        assert!(handler
            .handle_message("The kitchen was redone in 2019", "c1", None)
            .is_none());
        assert!(handler.handle_message("", "c1", None).is_none());
    }

    #[test]
    fn test_zero_variants_degrades_to_none() {
        let mut handler = ExtendedObjectionHandler::new(ObjectionConfig { variant_count: 0 });
        assert!(handler.handle_message(TIMING, "c1", None).is_none());
        assert_eq!(handler.variant_for("c1"), 0);
    }

    #[test]
    fn test_reset_contact_restarts_ladder() {
        let mut handler = ExtendedObjectionHandler::default();
        handler.handle_message(TIMING, "c1", None);
        handler.handle_message(TIMING, "c1", None);
        handler.reset_contact("c1");

        let response = handler.handle_message(TIMING, "c1", None).unwrap();
        assert_eq!(response.graduation_level, ResponseGraduation::Validate);
    }

    #[test]
    fn test_select_variant_rejects_zero() {
        assert_eq!(select_variant("c1", 0), Err(HandlerError::NoVariants));
        assert_eq!(select_variant("c1", 1), Ok(0));
    }

    proptest! {
        #[test]
        fn prop_variant_is_in_range_and_stable(contact in ".{0,40}", count in 1usize..16) {
            let first = select_variant(&contact, count).unwrap();
            prop_assert!(first < count);
            prop_assert_eq!(select_variant(&contact, count).unwrap(), first);
        }
    }

    #[tokio::test]
    async fn test_handled_objections_are_recorded() {
        let sink = Arc::new(MemorySink::new());
        let dispatcher = EventDispatcher::spawn(sink.clone(), &EventsConfig::default());
        let mut handler = ExtendedObjectionHandler::default().with_events(dispatcher);
        let market = MarketData::new().with("median_price", "$450,000");

        handler.handle_message(LOSS, "c1", Some(&market));
        handler.handle_message("Sounds good, see you Tuesday", "c1", None);
        handler.handle_message(TIMING, "c2", None);

        let stats = handler.shutdown().await.unwrap();
        assert_eq!(stats.delivered, 2);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].contact_id, "c1");
        assert_eq!(events[0].objection_type, ObjectionType::LossAversion);
        assert_eq!(events[0].category, ObjectionCategory::Pricing);
        assert_eq!(events[0].market_data, market);
        assert!(events[0].confidence.value() > 0.0);
        assert_eq!(events[1].category, ObjectionCategory::Timing);
    }

    #[tokio::test]
    async fn test_shutdown_without_dispatcher() {
        let handler = ExtendedObjectionHandler::default();
        assert!(handler.shutdown().await.is_none());
    }
}
