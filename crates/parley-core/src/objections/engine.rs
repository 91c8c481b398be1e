//! Detection, graduation, and composition wired together.

use super::{GraduationTracker, ObjectionDetector, ResponseComposer};
use crate::types::{MarketData, ObjectionDetection, ObjectionResponse, ResponseGraduation};

/// Owns one graduation state and answers objections against it.
///
/// Construct one per tenant or test; nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct ObjectionEngine {
    detector: ObjectionDetector,
    composer: ResponseComposer,
    tracker: GraduationTracker,
}

impl ObjectionEngine {
    /// The pricing objection engine: five pricing-specific types, one
    /// template per rung.
    pub fn pricing() -> Self {
        Self::new(ObjectionDetector::legacy(), ResponseComposer::pricing())
    }

    /// All eleven types with A/B template variants.
    pub fn extended() -> Self {
        Self::new(ObjectionDetector::extended(), ResponseComposer::extended())
    }

    pub fn new(detector: ObjectionDetector, composer: ResponseComposer) -> Self {
        Self {
            detector,
            composer,
            tracker: GraduationTracker::new(),
        }
    }

    pub fn detect_objection(&self, message: &str) -> ObjectionDetection {
        self.detector.detect(message)
    }

    /// Respond at the contact's current rung, then advance it.
    ///
    /// Returns `None` when nothing was detected or this engine has no
    /// template for the type at that rung. The ladder only moves when a
    /// response is produced.
    pub fn generate_response(
        &mut self,
        detection: &ObjectionDetection,
        contact_id: &str,
        market_data: Option<&MarketData>,
        variant_index: usize,
    ) -> Option<ObjectionResponse> {
        if !detection.detected {
            return None;
        }
        let objection_type = detection.objection_type?;

        let level =
            ResponseGraduation::from_index(self.tracker.graduation_level_for(contact_id, objection_type));
        let variants = self.composer.variant_count(objection_type, level);
        if variants == 0 {
            tracing::debug!(
                contact_id,
                objection_type = %objection_type,
                level = %level,
                "No template for objection, skipping"
            );
            return None;
        }
        let variant = variant_index % variants;

        let response_text = self
            .composer
            .compose(objection_type, level, variant_index, market_data);
        self.tracker.advance(contact_id, objection_type);

        tracing::info!(
            contact_id,
            objection_type = %objection_type,
            level = %level,
            variant,
            "Objection response generated"
        );

        Some(ObjectionResponse {
            objection_type,
            graduation_level: level,
            response_text,
            supporting_data: market_data.cloned().unwrap_or_default(),
            next_graduation: level.next(),
            variant,
        })
    }

    /// Detect and respond in one step.
    pub fn handle(
        &mut self,
        message: &str,
        contact_id: &str,
        market_data: Option<&MarketData>,
        variant_index: usize,
    ) -> Option<ObjectionResponse> {
        let detection = self.detect_objection(message);
        self.generate_response(&detection, contact_id, market_data, variant_index)
    }

    pub fn reset_contact(&mut self, contact_id: &str) {
        self.tracker.reset(contact_id);
    }

    pub fn tracker(&self) -> &GraduationTracker {
        &self.tracker
    }

    pub fn composer(&self) -> &ResponseComposer {
        &self.composer
    }
}

impl Default for ObjectionEngine {
    fn default() -> Self {
        Self::pricing()
    }
}
