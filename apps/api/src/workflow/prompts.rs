// All LLM prompt constants for the generation workflow.
// Reuses cross-cutting fragments from llm_client::prompts.

use serde_json::{json, Value};

use crate::llm_client::prompts::{candidate_profile_block, NO_PLACEHOLDER_INSTRUCTION};
use crate::models::Persona;

/// Builds the session-level system instruction: assistant persona, candidate
/// profile as ground truth, placeholder ban. Every one of the six exchanges
/// runs under this instruction.
pub fn workflow_system_instruction(persona: &Persona) -> String {
    format!(
        "You are Ramon, an expert Career Assistant. You are acting on behalf of a candidate named {}.\n\n\
         {}\n\n\
         YOUR GOAL:\n\
         Analyze the provided Job Description (JD) image and generate specific application materials.\n\n\
         {}",
        persona.name,
        candidate_profile_block(persona),
        NO_PLACEHOLDER_INSTRUCTION,
    )
}

/// Step 1 prompt: extract company and summary from the screenshot, generate
/// the structured resume and the formatted resume document. The background
/// data is repeated inline so the resume content cannot drift from it.
pub fn analyze_posting_prompt(persona: &Persona) -> String {
    format!(
        r#"I am sending you a screenshot of a Job Description.

HERE IS MY BACKGROUND DATA AGAIN. USE THIS TO POPULATE THE RESUME CONTENT. DO NOT HALLUCINATE GENERIC INFO:
"""
{extra_info}
"""

TASKS:
1. Extract the Company Name from the image.
2. Write a short 2-sentence summary of the JD.
3. Generate a tailored Resume in JSON format based on my BACKGROUND DATA and this JD.
   * CRITICAL: The JSON 'resume' object MUST start with a 'personalDetails' object containing my real Name, Email, Phone, LinkedIn, Website, and GitHub.
   * CRITICAL: The 'experience' and 'projects' arrays MUST be populated with MY actual information from the background data, tailored to match the JD keywords.
4. Generate a 'resumeDoc' string which is the fully formatted Resume text (Markdown).
   * CRITICAL: The Markdown document MUST start with a clear header containing: {name} | {email} | {phone} | {linkedin} | {website} | {github}
   * CRITICAL: The body of the markdown must contain the same real experience data as the JSON.

Return ONLY a JSON object with this exact structure:
{{
  "companyName": "Extracted Company Name",
  "summary": "JD Summary",
  "resume": {{
    "personalDetails": {{
       "name": "{name}",
       "email": "{email}",
       "phone": "{phone}",
       "linkedin": "{linkedin}",
       "website": "{website}",
       "github": "{github}"
    }},
    "professionalSummary": "tailored summary...",
    "skills": ["skill1", "skill2"],
    "experience": [
      {{ "title": "Real Role Title", "company": "Real Company", "period": "Real Dates", "achievements": ["Real achievement 1", "Real achievement 2"] }}
    ],
    "education": [
      {{ "degree": "Degree Name", "school": "School Name", "year": "Year" }}
    ],
    "projects": [
      {{ "name": "Project Name", "description": "Description", "link": "URL" }}
    ]
  }},
  "resumeDoc": "Full markdown resume content starting with header..."
}}"#,
        extra_info = persona.extra_info,
        name = persona.name,
        email = persona.email,
        phone = persona.phone,
        linkedin = persona.linkedin,
        website = persona.website,
        github = persona.github,
    )
}

/// Step 2: the cover letter rides entirely on session context; the resume
/// from step 1 is never re-transmitted.
pub const COVER_LETTER_PROMPT: &str = "Based on the resume you just generated and the JD, \
    write a compelling Cover Letter. Use my real contact info in the header.";

/// Step 3.
pub const RECRUITER_EMAIL_PROMPT: &str = "Draft a short, punchy email to the Recruiter \
    attaching the application. Sign off with my real name.";

/// Step 4.
pub const HM_EMAIL_PROMPT: &str = "Draft a slightly more technical email to the Hiring Manager \
    focusing on my R&D value. Sign off with my real name.";

/// Step 5. The length bound is enforced by instruction, not code.
pub const DM_PROMPT: &str =
    "Draft a short LinkedIn DM (under 300 chars) to connect with a peer at the company.";

/// Step 6 prompt: the scoring rubric with its fixed point ceilings.
pub const METRICS_PROMPT: &str = r#"Analyze the JD again for the dashboard statistics. Calculate the match percentage based on these EXACT rules:
1. Skills Match: Up to 60 points.
2. Role Similarity: Up to 20 points.
3. Remote Policy: 10 points for Remote, 5 for Hybrid, 0 for Onsite.
4. R&D Focus: Up to 10 points if the role is more R&D/Innovation than standard Dev maintenance.
5. Startup Bonus: 5 points if it looks like a startup.
6. Automation Bonus: 10 points if I can automate parts of the job.

Return JSON only."#;

/// Strict output schema for step 6: constrains the reply to the six numeric
/// sub-scores with their documented ceilings.
pub fn metrics_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "skillsMatch": { "type": "NUMBER", "description": "Score out of 60 based on skills match" },
            "roleSimilarities": { "type": "NUMBER", "description": "Score out of 20 based on previous role similarity" },
            "remotePolicy": { "type": "NUMBER", "description": "10 for Remote, 5 for Hybrid, 0 for Onsite" },
            "rndFocus": { "type": "NUMBER", "description": "Score out of 10. Higher if role is R&D oriented rather than just Dev." },
            "startupBonus": { "type": "NUMBER", "description": "5 if it is a startup, 0 otherwise" },
            "automationBonus": { "type": "NUMBER", "description": "10 if the role involves automation, 0 otherwise" }
        },
        "required": ["skillsMatch", "roleSimilarities", "remotePolicy", "rndFocus", "startupBonus", "automationBonus"]
    })
}
