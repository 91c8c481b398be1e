//! Objection detection against a static pattern bank.

use crate::patterns::{ObjectionPatternBank, EXTENDED_OBJECTION_PATTERNS, LEGACY_OBJECTION_PATTERNS};
use crate::types::{Confidence, ObjectionDetection, ObjectionType};

/// Classifies an inbound message into at most one objection type.
#[derive(Debug, Clone, Copy)]
pub struct ObjectionDetector {
    bank: &'static ObjectionPatternBank,
}

impl ObjectionDetector {
    /// Detector over the five pricing-specific types.
    pub fn legacy() -> Self {
        Self::with_bank(&LEGACY_OBJECTION_PATTERNS)
    }

    /// Detector over all eleven types.
    pub fn extended() -> Self {
        Self::with_bank(&EXTENDED_OBJECTION_PATTERNS)
    }

    pub fn with_bank(bank: &'static ObjectionPatternBank) -> Self {
        Self { bank }
    }

    pub fn bank(&self) -> &'static ObjectionPatternBank {
        self.bank
    }

    /// Return the single highest-confidence match across the whole bank.
    ///
    /// Ties keep the entry registered first. A message with no match
    /// yields `detected = false`.
    pub fn detect(&self, message: &str) -> ObjectionDetection {
        let mut best: Option<(ObjectionType, Confidence, &str)> = None;

        for group in self.bank.iter() {
            for pattern in &group.patterns {
                let Some(m) = pattern.regex.find(message) else {
                    continue;
                };

                let better = match best {
                    Some((_, confidence, _)) => pattern.confidence > confidence,
                    None => true,
                };
                if better {
                    best = Some((group.objection_type, pattern.confidence, m.as_str()));
                }
            }
        }

        match best {
            Some((objection_type, confidence, matched)) => {
                tracing::debug!(
                    objection_type = %objection_type,
                    confidence = confidence.value(),
                    "Objection detected"
                );
                ObjectionDetection::found(objection_type, confidence, matched)
            }
            None => ObjectionDetection::none(),
        }
    }
}

impl Default for ObjectionDetector {
    fn default() -> Self {
        Self::legacy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ObjectionCategory;

    #[test]
    fn test_no_match_is_empty_detection() {
        let detection = ObjectionDetector::legacy().detect("What time is the showing on Saturday?");
        assert_eq!(detection, ObjectionDetection::none());
        assert!(detection.objection_category.is_none());
        assert!(detection.matched_text.is_empty());
    }

    #[test]
    fn test_loss_aversion_phrase() {
        let detection = ObjectionDetector::legacy().detect("I can't sell for less than I paid");
        assert!(detection.detected);
        assert_eq!(detection.objection_type, Some(ObjectionType::LossAversion));
        assert_eq!(detection.objection_category, Some(ObjectionCategory::Pricing));
        assert_eq!(detection.confidence.value(), 0.9);
        assert_eq!(detection.matched_text, "can't sell for less than I paid");
    }

    #[test]
    fn test_highest_confidence_wins() {
        // Anchoring "appraised at" is 0.7, loss aversion "owe more than" is 0.9
        let detection = ObjectionDetector::legacy()
            .detect("It appraised at 380k last year but we owe more than that");
        assert_eq!(detection.objection_type, Some(ObjectionType::LossAversion));
        assert_eq!(detection.confidence.value(), 0.9);
        assert_eq!(detection.matched_text, "owe more than");
    }

    #[test]
    fn test_lower_weight_type_wins_when_alone() {
        let detection = ObjectionDetector::legacy().detect("It appraised at 380k last year");
        assert_eq!(detection.objection_type, Some(ObjectionType::Anchoring));
        assert_eq!(detection.confidence.value(), 0.7);
    }

    #[test]
    fn test_tie_keeps_first_registered_type() {
        // Both phrasings weigh 0.9; loss aversion is registered before neighbor comp
        let detection = ObjectionDetector::legacy()
            .detect("My neighbor's house sold for 500k and we owe more than that");
        assert_eq!(detection.objection_type, Some(ObjectionType::LossAversion));
    }

    #[test]
    fn test_extended_bank_prefers_legacy_on_tie() {
        let detection = ObjectionDetector::extended()
            .detect("I'm not ready to sell, we owe more than it's worth");
        assert_eq!(detection.objection_type, Some(ObjectionType::LossAversion));
    }

    #[test]
    fn test_extended_categories() {
        let detector = ObjectionDetector::extended();
        let cases = [
            ("Honestly I'm just not ready yet", ObjectionCategory::Timing),
            ("We're talking to other agents too", ObjectionCategory::Competition),
            ("Is this a scam?", ObjectionCategory::Trust),
            ("I need to talk to my wife first", ObjectionCategory::Authority),
            ("Why should I use you instead of listing it myself?", ObjectionCategory::Value),
            ("That offer is way too low", ObjectionCategory::Pricing),
        ];

        for (message, category) in cases {
            let detection = detector.detect(message);
            assert_eq!(detection.objection_category, Some(category), "{message}");
        }
    }

    #[test]
    fn test_legacy_ignores_extended_types() {
        let detection = ObjectionDetector::legacy().detect("Is this a scam?");
        assert!(!detection.detected);
    }
}
