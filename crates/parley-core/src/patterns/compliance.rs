//! Outbound compliance phrasings: Fair Housing steering, RESPA referral
//! arrangements, disclosure triggers, and protected-class keywords.

use lazy_static::lazy_static;
use regex::Regex;

use super::ci;
use crate::compliance::{Severity, ViolationCategory};

/// One steering or referral group with a fixed severity.
#[derive(Debug, Clone)]
pub struct SteeringGroup {
    pub category: ViolationCategory,
    pub severity: Severity,
    /// `(explanation, pattern)` pairs.
    pub patterns: Vec<(&'static str, Regex)>,
}

/// A phrase that obliges a RESPA disclosure.
#[derive(Debug, Clone)]
pub struct DisclosureTrigger {
    /// The disclosure requirement reported to the caller.
    pub requirement: &'static str,
    pub regex: Regex,
}

/// A Fair Housing protected-class keyword used by the fast first-tier check.
#[derive(Debug, Clone)]
pub struct ProtectedClassPattern {
    pub description: &'static str,
    pub regex: Regex,
}

lazy_static! {
    /// The five outbound pattern groups, in scan order.
    pub static ref STEERING_GROUPS: Vec<SteeringGroup> = vec![
        SteeringGroup {
            category: ViolationCategory::SchoolSteering,
            severity: Severity::Medium,
            patterns: vec![
                ("Characterizes school quality to steer buyers",
                 ci(r"\b(good|great|best|better|top|excellent|bad|poor|worse|failing|terrible) schools?\b")),
                ("Characterizes school quality to steer buyers",
                 ci(r"\bschools? (are|is) (great|excellent|top|better|bad|terrible|failing|not great)\b")),
                ("Ranks school districts as a neighborhood selling point",
                 ci(r"\b(top-rated|highly rated|best|good) school districts?\b")),
            ],
        },
        SteeringGroup {
            category: ViolationCategory::SafetySteering,
            severity: Severity::High,
            patterns: vec![
                ("Characterizes neighborhood safety, a common proxy for demographics",
                 ci(r"\b(safe|safer|safest|dangerous|unsafe|sketchy|rough|bad) (neighbou?rhood|area|part of town|community|streets?)\b")),
                ("References crime levels to steer buyers",
                 ci(r"\b(high|low|no) crime\b")),
                ("References crime levels to steer buyers",
                 ci(r"\bcrime (rate|rates|is|levels?)\b")),
            ],
        },
        SteeringGroup {
            category: ViolationCategory::FamilialStatusSteering,
            severity: Severity::High,
            patterns: vec![
                ("Describes who a home is suited for by household makeup",
                 ci(r"\b(perfect|ideal|great|best) for (young )?(families|couples|singles|retirees|empty nesters)\b")),
                ("Discourages households with children",
                 ci(r"\b(no|not for|not suitable for) (kids|children|families)\b")),
                ("Describes who a home is suited for by household makeup",
                 ci(r"\bfamily[- ]friendly\b")),
            ],
        },
        SteeringGroup {
            category: ViolationCategory::AvailabilitySteering,
            severity: Severity::High,
            patterns: vec![
                ("Suggests a buyer would not fit in or be comfortable",
                 ci(r"\b(you|people like you) (wouldn'?t|won'?t|would not|will not) (fit in|be comfortable|like it there)\b")),
                ("Suggests a buyer would not fit in or be comfortable",
                 ci(r"\b(might|would|will) (be|feel) more comfortable (in|somewhere|elsewhere)\b")),
                ("Misrepresents availability based on who is asking",
                 ci(r"\bnot available (to|for) (you|people like)\b")),
            ],
        },
        SteeringGroup {
            category: ViolationCategory::RespaReferral,
            severity: Severity::Critical,
            patterns: vec![
                ("Offers a kickback for a settlement-service referral",
                 ci(r"\bkick-?backs?\b")),
                ("Conditions a payment or credit on using a specific provider",
                 ci(r"\b(bonus|credit|discount|cash|gift card|rebate) if you (use|go with|choose) (our|my) (lender|title company|title|escrow|inspector|mortgage broker|mortgage company)\b")),
                ("Splits a fee with a settlement-service provider",
                 ci(r"\bsplit (the|my|our) (commission|fee) with (the |your )?(lender|title company|escrow|mortgage broker)\b")),
            ],
        },
    ];

    /// Phrases that require a RESPA disclosure, in report order.
    pub static ref DISCLOSURE_TRIGGERS: Vec<DisclosureTrigger> = vec![
        DisclosureTrigger {
            requirement: "Affiliated Business Arrangement disclosure required for affiliated services",
            regex: ci(r"\baffiliated (lender|title|title company|escrow|company|business|mortgage|services?|partners?)\b"),
        },
        DisclosureTrigger {
            requirement: "Referral fee disclosure required before recommending a settlement provider",
            regex: ci(r"\breferral (fees?|payments?|compensation)\b"),
        },
        DisclosureTrigger {
            requirement: "Settlement cost estimate disclosure required when quoting settlement costs",
            regex: ci(r"\b(settlement|closing) (costs?|fees?|charges)\b"),
        },
    ];

    /// Phrases that count as the disclosure already being present.
    pub static ref DISCLOSURE_PRESENT: Regex = ci(
        r"\b(disclos(e|ed|es|ure|ures)|affiliated business arrangement|you are not required to use|not required to use|free to (choose|shop for))\b"
    );

    /// Protected-class keywords for the fast first-tier guard.
    pub static ref PROTECTED_CLASS_PATTERNS: Vec<ProtectedClassPattern> = vec![
        ProtectedClassPattern {
            description: "race or color reference",
            regex: ci(r"\b(race|racial|skin colou?r|(white|black|hispanic|latino|asian) (neighbou?rhood|area|families|people))\b"),
        },
        ProtectedClassPattern {
            description: "religion reference",
            regex: ci(r"\b(church|mosque|synagogue|christian|muslim|jewish|hindu|religious community)\b"),
        },
        ProtectedClassPattern {
            description: "national origin reference",
            regex: ci(r"\b(national origin|immigrant|foreigner|ethnic|ethnicity)\b"),
        },
        ProtectedClassPattern {
            description: "familial status reference",
            regex: ci(r"\b(families with (kids|children)|no kids|no children|adults only|childless)\b"),
        },
        ProtectedClassPattern {
            description: "disability reference",
            regex: ci(r"\b(handicapped|disabled people|wheelchair users|mental illness|mentally ill)\b"),
        },
        ProtectedClassPattern {
            description: "sex reference",
            regex: ci(r"\b(single (women|men|mothers|fathers)|no (men|women) allowed)\b"),
        },
        ProtectedClassPattern {
            description: "steering language",
            regex: ci(r"\b(bad area|safe area|good area|those people|people like you|wrong side of the tracks)\b"),
        },
    ];
}
