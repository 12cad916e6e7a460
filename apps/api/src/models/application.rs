//! Application records — the immutable output of a completed workflow run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle status of an application. The workflow always creates records
/// as `Draft`; later transitions come from the status endpoint, never from
/// the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    #[default]
    Draft,
    Applied,
    Interviewing,
    Rejected,
    Offer,
}

/// The six sub-scores plus their sum. `total_score` is always the exact
/// arithmetic sum; the theoretical maximum is 115 and the sum is
/// deliberately not capped at 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetrics {
    /// Max 60.
    pub skills_match: u32,
    /// Max 20.
    pub role_similarities: u32,
    /// 10 for Remote, 5 for Hybrid, 0 for Onsite.
    pub remote_policy: u32,
    /// Max 10.
    pub rnd_focus: u32,
    /// 5 if a startup, 0 otherwise.
    pub startup_bonus: u32,
    /// 10 if the role involves automation, 0 otherwise.
    pub automation_bonus: u32,
    pub total_score: u32,
}

impl MatchMetrics {
    /// Builds metrics from a loosely-typed scoring response. Each missing or
    /// non-numeric field defaults to 0 rather than failing the run; the total
    /// is recomputed here, never trusted from the response.
    pub fn from_response(value: &Value) -> Self {
        let skills_match = score_field(value, "skillsMatch");
        let role_similarities = score_field(value, "roleSimilarities");
        let remote_policy = score_field(value, "remotePolicy");
        let rnd_focus = score_field(value, "rndFocus");
        let startup_bonus = score_field(value, "startupBonus");
        let automation_bonus = score_field(value, "automationBonus");

        MatchMetrics {
            skills_match,
            role_similarities,
            remote_policy,
            rnd_focus,
            startup_bonus,
            automation_bonus,
            total_score: skills_match
                + role_similarities
                + remote_policy
                + rnd_focus
                + startup_bonus
                + automation_bonus,
        }
    }
}

/// Reads one numeric sub-score, defaulting absent or unparseable fields to 0.
/// Accepts integer or float JSON numbers (the schema says NUMBER).
fn score_field(value: &Value, key: &str) -> u32 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .map(|f| f.max(0.0).round() as u32)
        .unwrap_or(0)
}

/// The six generated text blobs, keyed on the wire by camelCase names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactBundle {
    /// Structured resume data, serialized JSON.
    pub resume_json: String,
    /// Formatted resume document (Markdown).
    pub resume_doc: String,
    pub cover_letter: String,
    pub recruiter_email: String,
    pub hm_email: String,
    pub dm_message: String,
}

impl ArtifactBundle {
    pub const KEYS: [&'static str; 6] = [
        "resumeJson",
        "resumeDoc",
        "coverLetter",
        "recruiterEmail",
        "hmEmail",
        "dmMessage",
    ];

    /// Looks up an artifact by its wire key. Unknown keys resolve to `None`,
    /// as do artifacts with empty content; both must surface as a
    /// user-visible not-found at resolution time.
    pub fn get(&self, key: &str) -> Option<&str> {
        let content = match key {
            "resumeJson" => &self.resume_json,
            "resumeDoc" => &self.resume_doc,
            "coverLetter" => &self.cover_letter,
            "recruiterEmail" => &self.recruiter_email,
            "hmEmail" => &self.hm_email,
            "dmMessage" => &self.dm_message,
            _ => return None,
        };
        if content.is_empty() {
            None
        } else {
            Some(content.as_str())
        }
    }
}

/// One completed application. Created exactly once by the workflow on
/// success; immutable afterwards except for `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: Uuid,
    pub company_name: String,
    pub job_summary: String,
    pub date_created: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub metrics: MatchMetrics,
    pub artifacts: ArtifactBundle,
}
