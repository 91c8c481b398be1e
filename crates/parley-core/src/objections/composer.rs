//! Template selection and safe placeholder interpolation.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::templates::{TemplateTable, EXTENDED_TEMPLATES, PRICING_TEMPLATES};
use crate::types::{MarketData, ObjectionType, ResponseGraduation};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// Picks a template variant and fills in market figures.
#[derive(Debug, Clone, Copy)]
pub struct ResponseComposer {
    templates: &'static TemplateTable,
}

impl ResponseComposer {
    pub fn pricing() -> Self {
        Self::with_templates(&PRICING_TEMPLATES)
    }

    pub fn extended() -> Self {
        Self::with_templates(&EXTENDED_TEMPLATES)
    }

    pub fn with_templates(templates: &'static TemplateTable) -> Self {
        Self { templates }
    }

    /// Number of variants for a pair, 0 when no template exists.
    pub fn variant_count(&self, objection_type: ObjectionType, level: ResponseGraduation) -> usize {
        self.templates
            .get(&(objection_type, level))
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Compose the response text.
    ///
    /// `variant_index` wraps modulo the number of variants. Placeholders
    /// missing from `market_data` stay in the text as `{name}`. Returns an
    /// empty string when the pair has no template.
    pub fn compose(
        &self,
        objection_type: ObjectionType,
        level: ResponseGraduation,
        variant_index: usize,
        market_data: Option<&MarketData>,
    ) -> String {
        let Some(variants) = self.templates.get(&(objection_type, level)) else {
            tracing::warn!(
                objection_type = %objection_type,
                level = %level,
                "No response template for objection level"
            );
            return String::new();
        };
        if variants.is_empty() {
            return String::new();
        }

        let template = variants[variant_index % variants.len()];
        match market_data {
            Some(data) => interpolate(template, data).into_owned(),
            None => template.to_string(),
        }
    }
}

/// Replace `{name}` with the matching market value.
///
/// Unknown names are left verbatim, so a partially informed response is
/// still sendable.
pub fn interpolate<'a>(template: &'a str, data: &MarketData) -> Cow<'a, str> {
    PLACEHOLDER.replace_all(template, |caps: &Captures| match data.get(&caps[1]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_interpolate_fills_known_and_keeps_missing() {
        let data = MarketData::new().with("median_price", "$450,000");
        let text = interpolate("Median {median_price}, gap {gap_percent}.", &data);
        assert_eq!(text, "Median $450,000, gap {gap_percent}.");
    }

    #[test]
    fn test_interpolate_renders_numbers() {
        let data = MarketData::new()
            .with("days_on_market", 21_i64)
            .with("list_to_sale_ratio", 0.97);
        let text = interpolate("{days_on_market} days at {list_to_sale_ratio}", &data);
        assert_eq!(text, "21 days at 0.97");
    }

    #[test]
    fn test_interpolate_ignores_non_identifier_braces() {
        let data = MarketData::new().with("x", 1_i64);
        assert_eq!(interpolate("{ x } {1x} {}", &data), "{ x } {1x} {}");
    }

    #[test]
    fn test_data_level_placeholder_safety() {
        let composer = ResponseComposer::pricing();
        let data = MarketData::new()
            .with("median_price", "$450,000")
            .with("neighborhood", "Maple Heights");

        let text = composer.compose(
            ObjectionType::LossAversion,
            ResponseGraduation::Data,
            0,
            Some(&data),
        );

        assert!(text.contains("$450,000"));
        assert!(text.contains("Maple Heights"));
        assert!(text.contains("{gap_percent}"));
        assert!(!text.contains("{median_price}"));
    }

    #[test]
    fn test_without_market_data_keeps_template() {
        let composer = ResponseComposer::pricing();
        let text = composer.compose(ObjectionType::Anchoring, ResponseGraduation::Data, 0, None);
        assert!(text.contains("{median_price}"));
    }

    #[test]
    fn test_variant_wraps() {
        let composer = ResponseComposer::extended();
        let first = composer.compose(ObjectionType::TrustCredibility, ResponseGraduation::Validate, 0, None);
        let second = composer.compose(ObjectionType::TrustCredibility, ResponseGraduation::Validate, 1, None);
        let wrapped = composer.compose(ObjectionType::TrustCredibility, ResponseGraduation::Validate, 2, None);

        assert_ne!(first, second);
        assert_eq!(first, wrapped);
    }

    #[test]
    fn test_missing_template_is_empty() {
        let composer = ResponseComposer::pricing();
        let text = composer.compose(ObjectionType::TimingNotReady, ResponseGraduation::Validate, 0, None);
        assert!(text.is_empty());
        assert_eq!(composer.variant_count(ObjectionType::TimingNotReady, ResponseGraduation::Validate), 0);
    }

    proptest! {
        #[test]
        fn prop_any_variant_index_is_valid(index in any::<usize>()) {
            let composer = ResponseComposer::extended();
            let text = composer.compose(ObjectionType::ValueProposition, ResponseGraduation::MarketTest, index, None);
            prop_assert!(!text.is_empty());
        }
    }
}
