//! Prompts for the cognitive compliance audit.
//!
//! The system prompt is static so providers can cache it; only the
//! candidate message and its context vary per call.

use parley_core::BotMode;

/// System prompt for the second-tier audit.
///
/// The auditor reports what it sees in the message against fixed rules. It
/// does not rewrite the message or judge tone.
pub const AUDIT_SYSTEM_PROMPT: &str = r#"
You are a Fair Housing and RESPA compliance auditor for a real estate messaging assistant.

You review ONE outbound message before it is sent to a consumer.
You do not rewrite the message.
You do not judge tone, style, or sales quality.

## Rules You Enforce
1. Fair Housing Act: no references, direct or coded, to race, color, religion,
   national origin, sex, disability, or familial status
2. No steering: do not characterize neighborhoods by who lives there, school
   quality, safety, or crime as a reason to prefer or avoid an area
3. RESPA: no kickbacks, referral payments, or incentives tied to using a
   specific lender, title company, or other settlement service
4. Affiliated business relationships must be disclosed when recommended

## Verdicts
- "passed": no rule is implicated
- "flagged": a rule may be implicated and a human should review
- "blocked": a rule is clearly violated

## Output Format (JSON only, no prose)
{
  "status": "passed" | "flagged" | "blocked",
  "reason": "one sentence explaining the verdict",
  "violations": ["short description of each implicated rule"]
}

If you are unsure, return "flagged". Never return "passed" to avoid a decision.
"#;

/// JSON Schema every audit response must satisfy.
pub const AUDIT_RESPONSE_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["status", "reason", "violations"],
  "properties": {
    "status": { "enum": ["passed", "flagged", "blocked"] },
    "reason": { "type": "string", "minLength": 1 },
    "violations": { "type": "array", "items": { "type": "string" } }
  }
}"#;

/// User prompt for one audit.
pub fn build_audit_prompt(message: &str, mode: BotMode, context: &[String]) -> String {
    let mut prompt = format!("Bot persona: {}\n\n", mode);

    if !context.is_empty() {
        prompt.push_str("Recent conversation (oldest first):\n");
        for (i, turn) in context.iter().enumerate() {
            prompt.push_str(&format!("[{}] {}\n", i, turn));
        }
        prompt.push('\n');
    }

    prompt.push_str("Message to audit:\n<<<\n");
    prompt.push_str(message);
    prompt.push_str("\n>>>\n\nRespond with the JSON verdict only.");
    prompt
}
