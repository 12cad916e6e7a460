//! Document Generation Workflow — the six-step LLM orchestration core.
//!
//! Flow: open chat session → analyze posting image (resume JSON + doc) →
//!       cover letter → recruiter email → hiring-manager email → DM →
//!       match metrics → assemble ApplicationRecord.
//!
//! One session, six strictly sequential exchanges. Every step after the
//! first consumes context the session accumulated in earlier steps (the
//! cover letter references the resume without re-transmitting it), so the
//! ordering is a hard requirement. The run is modeled as an explicit state
//! machine: a step only executes when the previous one has succeeded, and a
//! failed exchange parks the run in `Failed` permanently.
//!
//! The workflow has no side effects: it returns one fully-formed record or
//! an error, and the caller persists.

pub mod handlers;
pub mod progress;
pub mod prompts;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::llm_client::{
    strip_json_fences, Conversation, ExchangeRequest, GenerationConfig, LlmClient, LlmError, Part,
};
use crate::models::{
    ApplicationRecord, ApplicationStatus, ArtifactBundle, MatchMetrics, Persona,
};
pub use progress::ProcessingStep;

const DEFAULT_COMPANY: &str = "Unknown Company";
const DEFAULT_SUMMARY: &str = "No summary available";
const DEFAULT_RESUME_DOC: &str = "Resume generation failed.";

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("LLM exchange failed at {step:?}: {source}")]
    Exchange {
        step: ProcessingStep,
        #[source]
        source: LlmError,
    },

    #[error("job posting image cannot be read: {0}")]
    UnreadableImage(String),

    #[error("workflow is in state {actual:?}; cannot run {attempted:?}")]
    OutOfOrder {
        attempted: ProcessingStep,
        actual: RunState,
    },
}

/// The job-posting screenshot, validated before any exchange is issued.
#[derive(Debug, Clone)]
pub struct JobImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl JobImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Result<Self, AnalysisError> {
        let mime_type = mime_type.into();
        if data.is_empty() {
            return Err(AnalysisError::UnreadableImage("image data is empty".to_string()));
        }
        if !mime_type.starts_with("image/") {
            return Err(AnalysisError::UnreadableImage(format!(
                "unsupported content type '{mime_type}'"
            )));
        }
        Ok(JobImage { mime_type, data })
    }
}

/// Workflow run states. A step runs only from its exact predecessor state;
/// `Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    ImageAnalyzed,
    CoverLetterDrafted,
    RecruiterEmailDrafted,
    HmEmailDrafted,
    DmDrafted,
    MetricsScored,
    Failed,
}

// ────────────────────────────────────────────────────────────────────────────
// Step 1 response shape
// ────────────────────────────────────────────────────────────────────────────

/// Loosely-typed step 1 response. Every field is optional: missing or
/// unparseable fields are defaulted rather than failing the run.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JobAnalysis {
    company_name: Option<String>,
    summary: Option<String>,
    resume: Option<Value>,
    resume_doc: Option<String>,
}

fn parse_job_analysis(text: &str) -> JobAnalysis {
    serde_json::from_str(strip_json_fences(text)).unwrap_or_else(|e| {
        warn!("Step 1 response was not valid JSON, defaulting all fields: {e}");
        JobAnalysis::default()
    })
}

fn parse_metrics(text: &str) -> MatchMetrics {
    let value: Value = serde_json::from_str(strip_json_fences(text)).unwrap_or_else(|e| {
        warn!("Metrics response was not valid JSON, defaulting all scores: {e}");
        Value::Null
    });
    MatchMetrics::from_response(&value)
}

// ────────────────────────────────────────────────────────────────────────────
// Public entry points
// ────────────────────────────────────────────────────────────────────────────

/// Opens a chat session for the persona and drives the full six-step run.
/// Fails with `AnalysisError` when any exchange fails; persists nothing.
pub async fn process_application<F>(
    llm: &LlmClient,
    image: JobImage,
    persona: &Persona,
    on_progress: F,
) -> Result<ApplicationRecord, AnalysisError>
where
    F: FnMut(ProcessingStep),
{
    let chat = llm.start_chat(prompts::workflow_system_instruction(persona));
    run_workflow(chat, image, persona, on_progress).await
}

/// Drives an already-open conversation through the six steps. Separated from
/// `process_application` so the orchestration is testable against scripted
/// conversations.
pub async fn run_workflow<C, F>(
    chat: C,
    image: JobImage,
    persona: &Persona,
    mut on_progress: F,
) -> Result<ApplicationRecord, AnalysisError>
where
    C: Conversation,
    F: FnMut(ProcessingStep),
{
    let mut run = WorkflowRun::new(chat, persona.clone());

    match run.drive(&image, &mut on_progress).await {
        Ok(record) => {
            on_progress(ProcessingStep::Complete);
            Ok(record)
        }
        Err(e) => {
            on_progress(ProcessingStep::Error);
            Err(e)
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// The run itself
// ────────────────────────────────────────────────────────────────────────────

struct WorkflowRun<C: Conversation> {
    chat: C,
    persona: Persona,
    state: RunState,

    company_name: String,
    job_summary: String,
    resume_json: String,
    resume_doc: String,
    cover_letter: String,
    recruiter_email: String,
    hm_email: String,
    dm_message: String,
    metrics: MatchMetrics,
}

impl<C: Conversation> WorkflowRun<C> {
    fn new(chat: C, persona: Persona) -> Self {
        WorkflowRun {
            chat,
            persona,
            state: RunState::Created,
            company_name: String::new(),
            job_summary: String::new(),
            resume_json: String::new(),
            resume_doc: String::new(),
            cover_letter: String::new(),
            recruiter_email: String::new(),
            hm_email: String::new(),
            dm_message: String::new(),
            metrics: MatchMetrics::default(),
        }
    }

    async fn drive<F>(
        &mut self,
        image: &JobImage,
        on_progress: &mut F,
    ) -> Result<ApplicationRecord, AnalysisError>
    where
        F: FnMut(ProcessingStep),
    {
        on_progress(ProcessingStep::AnalyzingImage);
        self.analyze_posting(image).await?;

        on_progress(ProcessingStep::GeneratingCl);
        self.draft_cover_letter().await?;

        on_progress(ProcessingStep::GeneratingEmails);
        self.draft_recruiter_email().await?;
        self.draft_hm_email().await?;

        on_progress(ProcessingStep::GeneratingDm);
        self.draft_dm().await?;

        on_progress(ProcessingStep::CalculatingMetrics);
        self.score_metrics().await?;

        self.finish()
    }

    /// Verifies the run is in `expected` before a step executes.
    fn require_state(
        &self,
        expected: RunState,
        attempted: ProcessingStep,
    ) -> Result<(), AnalysisError> {
        if self.state != expected {
            return Err(AnalysisError::OutOfOrder {
                attempted,
                actual: self.state,
            });
        }
        Ok(())
    }

    /// One exchange attempt. A transport or service failure is fatal to the
    /// run: the state machine parks in `Failed` and no later step can run.
    async fn exchange(
        &mut self,
        step: ProcessingStep,
        request: ExchangeRequest,
    ) -> Result<String, AnalysisError> {
        match self.chat.exchange(request).await {
            Ok(reply) => Ok(reply),
            Err(source) => {
                self.state = RunState::Failed;
                Err(AnalysisError::Exchange { step, source })
            }
        }
    }

    /// Step 1: screenshot + background → company, summary, resume JSON, resume doc.
    async fn analyze_posting(&mut self, image: &JobImage) -> Result<(), AnalysisError> {
        self.require_state(RunState::Created, ProcessingStep::AnalyzingImage)?;

        let request = ExchangeRequest::parts(vec![
            Part::inline_data(&image.mime_type, &image.data),
            Part::text(prompts::analyze_posting_prompt(&self.persona)),
        ])
        .with_config(GenerationConfig::json());

        let reply = self.exchange(ProcessingStep::AnalyzingImage, request).await?;
        let analysis = parse_job_analysis(&reply);

        self.company_name = analysis
            .company_name
            .unwrap_or_else(|| DEFAULT_COMPANY.to_string());
        self.job_summary = analysis
            .summary
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string());
        self.resume_json = serde_json::to_string_pretty(&analysis.resume.unwrap_or(Value::Null))
            .unwrap_or_else(|_| "null".to_string());
        self.resume_doc = analysis
            .resume_doc
            .unwrap_or_else(|| DEFAULT_RESUME_DOC.to_string());

        info!("Posting analyzed: company={}", self.company_name);
        self.state = RunState::ImageAnalyzed;
        Ok(())
    }

    /// Step 2.
    async fn draft_cover_letter(&mut self) -> Result<(), AnalysisError> {
        self.require_state(RunState::ImageAnalyzed, ProcessingStep::GeneratingCl)?;

        self.cover_letter = self
            .exchange(
                ProcessingStep::GeneratingCl,
                ExchangeRequest::text(prompts::COVER_LETTER_PROMPT),
            )
            .await?;

        self.state = RunState::CoverLetterDrafted;
        Ok(())
    }

    /// Step 3.
    async fn draft_recruiter_email(&mut self) -> Result<(), AnalysisError> {
        self.require_state(RunState::CoverLetterDrafted, ProcessingStep::GeneratingEmails)?;

        self.recruiter_email = self
            .exchange(
                ProcessingStep::GeneratingEmails,
                ExchangeRequest::text(prompts::RECRUITER_EMAIL_PROMPT),
            )
            .await?;

        self.state = RunState::RecruiterEmailDrafted;
        Ok(())
    }

    /// Step 4. Shares the progress event of step 3.
    async fn draft_hm_email(&mut self) -> Result<(), AnalysisError> {
        self.require_state(
            RunState::RecruiterEmailDrafted,
            ProcessingStep::GeneratingEmails,
        )?;

        self.hm_email = self
            .exchange(
                ProcessingStep::GeneratingEmails,
                ExchangeRequest::text(prompts::HM_EMAIL_PROMPT),
            )
            .await?;

        self.state = RunState::HmEmailDrafted;
        Ok(())
    }

    /// Step 5.
    async fn draft_dm(&mut self) -> Result<(), AnalysisError> {
        self.require_state(RunState::HmEmailDrafted, ProcessingStep::GeneratingDm)?;

        self.dm_message = self
            .exchange(
                ProcessingStep::GeneratingDm,
                ExchangeRequest::text(prompts::DM_PROMPT),
            )
            .await?;

        self.state = RunState::DmDrafted;
        Ok(())
    }

    /// Step 6: schema-constrained scoring.
    async fn score_metrics(&mut self) -> Result<(), AnalysisError> {
        self.require_state(RunState::DmDrafted, ProcessingStep::CalculatingMetrics)?;

        let request = ExchangeRequest::text(prompts::METRICS_PROMPT)
            .with_config(GenerationConfig::json_with_schema(prompts::metrics_schema()));

        let reply = self
            .exchange(ProcessingStep::CalculatingMetrics, request)
            .await?;
        self.metrics = parse_metrics(&reply);

        info!("Metrics scored: total={}", self.metrics.total_score);
        self.state = RunState::MetricsScored;
        Ok(())
    }

    /// Assembles the immutable record. Only reachable after all six steps.
    fn finish(&mut self) -> Result<ApplicationRecord, AnalysisError> {
        self.require_state(RunState::MetricsScored, ProcessingStep::Complete)?;

        Ok(ApplicationRecord {
            id: Uuid::new_v4(),
            company_name: std::mem::take(&mut self.company_name),
            job_summary: std::mem::take(&mut self.job_summary),
            date_created: chrono::Utc::now(),
            status: ApplicationStatus::Draft,
            metrics: self.metrics,
            artifacts: ArtifactBundle {
                resume_json: std::mem::take(&mut self.resume_json),
                resume_doc: std::mem::take(&mut self.resume_doc),
                cover_letter: std::mem::take(&mut self.cover_letter),
                recruiter_email: std::mem::take(&mut self.recruiter_email),
                hm_email: std::mem::take(&mut self.hm_email),
                dm_message: std::mem::take(&mut self.dm_message),
            },
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryRecordStore;
    use crate::storage::RecordStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted conversation: pops one canned result per exchange and records
    /// every request it receives.
    struct ScriptedConversation {
        replies: VecDeque<Result<String, LlmError>>,
        requests: Arc<Mutex<Vec<ExchangeRequest>>>,
    }

    impl ScriptedConversation {
        fn new(replies: Vec<Result<String, LlmError>>) -> (Self, Arc<Mutex<Vec<ExchangeRequest>>>) {
            let requests = Arc::new(Mutex::new(Vec::new()));
            (
                ScriptedConversation {
                    replies: replies.into(),
                    requests: requests.clone(),
                },
                requests,
            )
        }
    }

    #[async_trait]
    impl Conversation for ScriptedConversation {
        async fn exchange(&mut self, request: ExchangeRequest) -> Result<String, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.replies.pop_front().expect("conversation script exhausted")
        }
    }

    fn persona() -> Persona {
        Persona {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            ..Default::default()
        }
    }

    fn image() -> JobImage {
        JobImage::new("image/png", vec![1, 2, 3]).unwrap()
    }

    const STEP1_REPLY: &str = r##"{
        "companyName": "Acme",
        "summary": "Rust role. Remote.",
        "resume": {"personalDetails": {"name": "Ada Lovelace"}},
        "resumeDoc": "# Ada Lovelace"
    }"##;

    const METRICS_REPLY: &str = r#"{
        "skillsMatch": 50, "roleSimilarities": 15, "remotePolicy": 10,
        "rndFocus": 8, "startupBonus": 5, "automationBonus": 10
    }"#;

    fn happy_script() -> Vec<Result<String, LlmError>> {
        vec![
            Ok(STEP1_REPLY.to_string()),
            Ok("Dear hiring team,".to_string()),
            Ok("Hi recruiter,".to_string()),
            Ok("Hi hiring manager,".to_string()),
            Ok("Hi! Fellow engineer here.".to_string()),
            Ok(METRICS_REPLY.to_string()),
        ]
    }

    fn api_error() -> LlmError {
        LlmError::Api {
            status: 500,
            message: "upstream failure".to_string(),
        }
    }

    #[tokio::test]
    async fn test_successful_run_assembles_full_record() {
        let (chat, _) = ScriptedConversation::new(happy_script());
        let started = chrono::Utc::now();

        let record = run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();

        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.job_summary, "Rust role. Remote.");
        assert_eq!(record.status, ApplicationStatus::Draft);
        assert!(record.date_created >= started);
        assert!(record.artifacts.resume_json.contains("Ada Lovelace"));
        assert_eq!(record.artifacts.resume_doc, "# Ada Lovelace");
        assert_eq!(record.artifacts.cover_letter, "Dear hiring team,");
        assert_eq!(record.artifacts.recruiter_email, "Hi recruiter,");
        assert_eq!(record.artifacts.hm_email, "Hi hiring manager,");
        assert_eq!(record.artifacts.dm_message, "Hi! Fellow engineer here.");
        assert_eq!(record.metrics.total_score, 98);
    }

    #[tokio::test]
    async fn test_progress_events_fire_in_order() {
        let (chat, _) = ScriptedConversation::new(happy_script());
        let mut steps = Vec::new();

        run_workflow(chat, image(), &persona(), |s| steps.push(s))
            .await
            .unwrap();

        assert_eq!(
            steps,
            vec![
                ProcessingStep::AnalyzingImage,
                ProcessingStep::GeneratingCl,
                ProcessingStep::GeneratingEmails,
                ProcessingStep::GeneratingDm,
                ProcessingStep::CalculatingMetrics,
                ProcessingStep::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_six_exchanges_in_a_successful_run() {
        let (chat, requests) = ScriptedConversation::new(happy_script());
        run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();
        assert_eq!(requests.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_step1_sends_image_part_and_json_mode() {
        let (chat, requests) = ScriptedConversation::new(happy_script());
        run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();

        let requests = requests.lock().unwrap();
        let step1 = &requests[0];
        assert_eq!(step1.parts.len(), 2);
        assert!(matches!(step1.parts[0], Part::InlineData { .. }));
        assert_eq!(
            step1.config.as_ref().unwrap().response_mime_type.as_deref(),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_step6_sends_strict_schema() {
        let (chat, requests) = ScriptedConversation::new(happy_script());
        run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();

        let requests = requests.lock().unwrap();
        let step6 = &requests[5];
        let schema = step6
            .config
            .as_ref()
            .and_then(|c| c.response_schema.as_ref())
            .expect("metrics step must carry a response schema");
        assert!(schema["properties"].get("skillsMatch").is_some());
    }

    #[tokio::test]
    async fn test_intermediate_steps_send_plain_text_only() {
        let (chat, requests) = ScriptedConversation::new(happy_script());
        run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();

        let requests = requests.lock().unwrap();
        for request in &requests[1..5] {
            assert_eq!(request.parts.len(), 1);
            assert!(request.config.is_none());
        }
    }

    #[tokio::test]
    async fn test_failure_at_step_3_is_fatal_and_terminal_state_is_error() {
        let (chat, requests) = ScriptedConversation::new(vec![
            Ok(STEP1_REPLY.to_string()),
            Ok("Dear hiring team,".to_string()),
            Err(api_error()),
        ]);
        let mut steps = Vec::new();

        let result = run_workflow(chat, image(), &persona(), |s| steps.push(s)).await;

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Exchange {
                step: ProcessingStep::GeneratingEmails,
                ..
            }
        ));
        assert_eq!(steps.last(), Some(&ProcessingStep::Error));
        assert!(!steps.contains(&ProcessingStep::Complete));
        // Steps 4-6 never ran.
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_run_persists_nothing() {
        let store = MemoryRecordStore::new();
        let (chat, _) = ScriptedConversation::new(vec![
            Ok(STEP1_REPLY.to_string()),
            Ok("Dear hiring team,".to_string()),
            Err(api_error()),
        ]);

        // The handler persists only a successful result.
        let result = run_workflow(chat, image(), &persona(), |_| {}).await;
        if let Ok(record) = result {
            store.save_application(&record).await.unwrap();
        }

        assert!(store.list_applications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_step1_response_defaults_every_field() {
        let mut script = happy_script();
        script[0] = Ok("I could not read the image, sorry!".to_string());
        let (chat, _) = ScriptedConversation::new(script);

        let record = run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();

        assert_eq!(record.company_name, DEFAULT_COMPANY);
        assert_eq!(record.job_summary, DEFAULT_SUMMARY);
        assert_eq!(record.artifacts.resume_json, "null");
        assert_eq!(record.artifacts.resume_doc, DEFAULT_RESUME_DOC);
    }

    #[tokio::test]
    async fn test_partial_step1_response_defaults_missing_fields_only() {
        let mut script = happy_script();
        script[0] = Ok(r#"{"companyName": "Acme"}"#.to_string());
        let (chat, _) = ScriptedConversation::new(script);

        let record = run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();

        assert_eq!(record.company_name, "Acme");
        assert_eq!(record.job_summary, DEFAULT_SUMMARY);
    }

    #[tokio::test]
    async fn test_fenced_step1_json_is_accepted() {
        let mut script = happy_script();
        script[0] = Ok(format!("```json\n{STEP1_REPLY}\n```"));
        let (chat, _) = ScriptedConversation::new(script);

        let record = run_workflow(chat, image(), &persona(), |_| {}).await.unwrap();
        assert_eq!(record.company_name, "Acme");
    }

    #[tokio::test]
    async fn test_malformed_metrics_response_scores_zero_but_completes() {
        let mut script = happy_script();
        script[5] = Ok("the role scores highly".to_string());
        let (chat, _) = ScriptedConversation::new(script);
        let mut steps = Vec::new();

        let record = run_workflow(chat, image(), &persona(), |s| steps.push(s))
            .await
            .unwrap();

        assert_eq!(record.metrics, MatchMetrics::default());
        assert_eq!(steps.last(), Some(&ProcessingStep::Complete));
    }

    #[tokio::test]
    async fn test_record_ids_are_unique_across_runs() {
        let (chat_a, _) = ScriptedConversation::new(happy_script());
        let (chat_b, _) = ScriptedConversation::new(happy_script());

        let a = run_workflow(chat_a, image(), &persona(), |_| {}).await.unwrap();
        let b = run_workflow(chat_b, image(), &persona(), |_| {}).await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_empty_image_is_rejected_before_any_exchange() {
        let err = JobImage::new("image/png", vec![]).unwrap_err();
        assert!(matches!(err, AnalysisError::UnreadableImage(_)));
    }

    #[test]
    fn test_non_image_mime_type_is_rejected() {
        let err = JobImage::new("application/pdf", vec![1]).unwrap_err();
        assert!(matches!(err, AnalysisError::UnreadableImage(_)));
    }

    #[tokio::test]
    async fn test_step_cannot_run_out_of_order() {
        let (chat, _) = ScriptedConversation::new(happy_script());
        let mut run = WorkflowRun::new(chat, persona());

        // Cover letter before image analysis: the state machine refuses.
        let err = run.draft_cover_letter().await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::OutOfOrder {
                attempted: ProcessingStep::GeneratingCl,
                actual: RunState::Created,
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_run_cannot_be_resumed() {
        let (chat, _) = ScriptedConversation::new(vec![Err(api_error()), Ok("x".to_string())]);
        let mut run = WorkflowRun::new(chat, persona());

        assert!(run.analyze_posting(&image()).await.is_err());
        // The run is parked in Failed; re-driving any step is refused.
        let err = run.draft_cover_letter().await.unwrap_err();
        assert!(matches!(err, AnalysisError::OutOfOrder { actual: RunState::Failed, .. }));
    }
}
