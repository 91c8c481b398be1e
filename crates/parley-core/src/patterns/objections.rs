//! Seller objection phrasings.
//!
//! Objections are short, idiomatic, and enumerable, so a fixed table is
//! auditable and needs no training data. Matching is case-insensitive.

use lazy_static::lazy_static;

use super::{group, weighted, ObjectionPatternBank};
use crate::types::ObjectionType;

lazy_static! {
    /// The five pricing-specific objection types.
    pub static ref LEGACY_OBJECTION_PATTERNS: ObjectionPatternBank = vec![
        group(ObjectionType::LossAversion, vec![
            weighted(r"\b(can'?t|cannot|won'?t|will not|not going to) sell (it )?for less than (what )?(i|we) paid\b", 0.9),
            weighted(r"\bowe more than\b", 0.9),
            weighted(r"\bunderwater\b", 0.85),
            weighted(r"\b(lose|losing|lost) money\b", 0.8),
            weighted(r"\bpaid \$?[\d,.]+\s*(k|m|thousand|million)?\b", 0.8),
            weighted(r"\bless than (what )?(i|we) (paid|bought it for)\b", 0.75),
        ]),
        group(ObjectionType::Anchoring, vec![
            weighted(r"\b(zillow|zestimate|redfin|realtor\.com)\b.*\b(says|said|shows|showed|estimates?|estimated)\b", 0.85),
            weighted(r"\bworth at least \$?[\d,.]+", 0.8),
            weighted(r"\b(my|our) (house|home|place|property) is worth\b", 0.75),
            weighted(r"\bappraised (at|for)\b", 0.7),
            weighted(r"\b(online|internet) (estimate|valuation)\b", 0.7),
        ]),
        group(ObjectionType::NeighborComp, vec![
            weighted(r"\bneighbou?r'?s? (house|home|place) sold for\b", 0.9),
            weighted(r"\b(house|home) (down|up|across) the (street|road|block) (sold|went) for\b", 0.85),
            weighted(r"\b(next door|down the street|on my street) (sold|went) for\b", 0.85),
            weighted(r"\bsimilar (homes?|houses?) (in|on) (my|our|the) (street|neighbou?rhood|area)\b", 0.7),
        ]),
        group(ObjectionType::MarketDenial, vec![
            weighted(r"\bmarket is (still )?(hot|strong|booming|on fire)\b", 0.8),
            weighted(r"\bprices (are|keep) (still )?(going up|rising|climbing)\b", 0.8),
            weighted(r"\b(don'?t|do not) believe (the )?(market|prices?|numbers)\b", 0.75),
            weighted(r"\bhomes? (are|is) (still )?selling (fast|quickly|in days)\b", 0.7),
            weighted(r"\b(buyers?|people) will pay (more|whatever)\b", 0.7),
        ]),
        group(ObjectionType::ImprovementOvervalue, vec![
            weighted(r"\b(put|spent|invested|sunk) \$?[\d,.]+\s*(k|thousand)? (in|into|on) (the )?(house|home|place|renovations?|remodel|upgrades?|improvements?)\b", 0.85),
            weighted(r"\b(upgrades?|renovations?|improvements?) (add|added|are worth|should be worth)\b", 0.8),
            weighted(r"\b(brand )?(new|renovated|remodeled|updated) (kitchen|bathrooms?|roof|floors?|flooring|pool|hvac)\b", 0.75),
        ]),
    ];

    /// The legacy types followed by the six broader categories.
    ///
    /// Specific pricing phrasings come first so they win confidence ties
    /// against the generic pricing group.
    pub static ref EXTENDED_OBJECTION_PATTERNS: ObjectionPatternBank = {
        let mut bank = LEGACY_OBJECTION_PATTERNS.clone();
        bank.extend(vec![
            group(ObjectionType::PricingGeneral, vec![
                weighted(r"\b(price|offer|number) (is|seems) (way )?(too )?(low|high)\b", 0.8),
                weighted(r"\b(low-?ball|too low)\b", 0.75),
                weighted(r"\b(want|need|expect|expecting) (more|a higher price|top dollar)\b", 0.7),
                weighted(r"\bhow much (can|could|would) (i|we) get\b", 0.6),
            ]),
            group(ObjectionType::TimingNotReady, vec![
                weighted(r"\bnot ready (to sell|yet)\b", 0.9),
                weighted(r"\b(need|want) (more )?time to think\b", 0.8),
                weighted(r"\bwait(ing)? (until|till|for) (the )?(market|rates?|prices?|spring|summer|next year)\b", 0.8),
                weighted(r"\b(no|not in a|not in any) rush\b", 0.75),
                weighted(r"\b(next|this coming) (year|spring|summer|fall|winter)\b", 0.7),
            ]),
            group(ObjectionType::CompetitionShopping, vec![
                weighted(r"\b(talking|talked|speaking|spoke|working) (to|with) (other|another|a few|several) (agents?|realtors?|brokers?|investors?|companies)\b", 0.85),
                weighted(r"\b(other|another) (agent|realtor|company|investor|broker) (offered|quoted|said|promised)\b", 0.85),
                weighted(r"\bgetting (other|multiple|more) (offers|quotes|opinions)\b", 0.8),
                weighted(r"\bshop(ping)? (it )?around\b", 0.8),
                weighted(r"\b(opendoor|offerpad|we buy houses)\b", 0.75),
            ]),
            group(ObjectionType::TrustCredibility, vec![
                weighted(r"\b(is this|this is|sounds like|smells like) a scam\b", 0.9),
                weighted(r"\b(don'?t|do not|can'?t) trust\b", 0.85),
                weighted(r"\bhow do (i|we) know (you'?re|you are|this is) (legit|real|legitimate)\b", 0.85),
                weighted(r"\b(never heard of|who are) you\b", 0.7),
                weighted(r"\b(bad|terrible|awful) (experience|reviews?) with\b", 0.7),
            ]),
            group(ObjectionType::AuthorityDecisionMaker, vec![
                weighted(r"\b(talk|check|discuss it|speak) (to|with) my (wife|husband|spouse|partner|family|kids|attorney|lawyer)\b", 0.85),
                weighted(r"\bnot (just |only )?my decision\b", 0.85),
                weighted(r"\b(isn'?t|is not) up to me\b", 0.85),
                weighted(r"\b(my|our) (wife|husband|spouse|partner) (decides|needs to agree|has to agree|has the final say)\b", 0.8),
                weighted(r"\b(co-?owner|joint owners?|probate|power of attorney|the estate)\b", 0.7),
            ]),
            group(ObjectionType::ValueProposition, vec![
                weighted(r"\bwhy (should|would) (i|we) (use|hire|go with|work with|pick) you\b", 0.85),
                weighted(r"\b(commission|fees?) (is|are) (way )?too (high|much)\b", 0.85),
                weighted(r"\bwhat (makes you|do you do) (any )?(different|better)\b", 0.8),
                weighted(r"\b(sell|list) (it )?(myself|on my own|by myself)\b", 0.8),
                weighted(r"\b(fsbo|for sale by owner)\b", 0.8),
                weighted(r"\bwhat'?s in it for me\b", 0.7),
            ]),
        ]);
        bank
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(bank: &ObjectionPatternBank) -> Vec<ObjectionType> {
        bank.iter().map(|g| g.objection_type).collect()
    }

    #[test]
    fn test_legacy_bank_covers_pricing_types_in_order() {
        assert_eq!(types(&LEGACY_OBJECTION_PATTERNS), ObjectionType::LEGACY.to_vec());
        assert!(LEGACY_OBJECTION_PATTERNS.iter().all(|g| !g.patterns.is_empty()));
    }

    #[test]
    fn test_extended_bank_covers_all_types_in_order() {
        assert_eq!(types(&EXTENDED_OBJECTION_PATTERNS), ObjectionType::ALL.to_vec());
        assert!(EXTENDED_OBJECTION_PATTERNS.iter().all(|g| !g.patterns.is_empty()));
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let loss = &LEGACY_OBJECTION_PATTERNS[0];
        assert!(loss.patterns[1].regex.is_match("I OWE MORE THAN the house is worth"));
    }

    #[test]
    fn test_weights_reflect_specificity() {
        let loss = &LEGACY_OBJECTION_PATTERNS[0];
        // "owe more than" is less ambiguous than "paid $X"
        assert!(loss.patterns[1].confidence > loss.patterns[4].confidence);
    }
}
