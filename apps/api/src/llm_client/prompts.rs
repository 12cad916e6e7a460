// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

use crate::models::Persona;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// The placeholder ban applied to every generation exchange.
pub const NO_PLACEHOLDER_INSTRUCTION: &str = "\
    CRITICAL RULES:\n\
    1. NEVER use placeholders like \"[Insert Date]\", \"[Company Name]\", or \"Your Name Here\".\n\
    2. USE the Candidate Profile and Background Data provided above to fill out Experience, Skills, and Projects.\n\
    3. If a specific detail (like an exact date) is missing in the background data, infer a reasonable one or use general terms (e.g., \"2020 - Present\") but DO NOT leave it as a placeholder.\n\
    4. Maintain a professional yet innovative tone.";

/// Renders the candidate profile block injected as ground truth into
/// system instructions. The persona is embedded verbatim; the caller is
/// responsible for having validated it first.
pub fn candidate_profile_block(persona: &Persona) -> String {
    format!(
        "CANDIDATE PROFILE (SOURCE OF TRUTH):\n\
         Name: {}\n\
         Email: {}\n\
         Phone: {}\n\
         LinkedIn: {}\n\
         Website: {}\n\
         GitHub: {}\n\n\
         BACKGROUND / EXPERIENCE DATA:\n{}",
        persona.name,
        persona.email,
        persona.phone,
        persona.linkedin,
        persona.website,
        persona.github,
        persona.extra_info,
    )
}
