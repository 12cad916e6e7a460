//! Assistant Session — the conversational helper seeded with the user's
//! application history.
//!
//! Initialized lazily, once, on the first chat turn. The full current record
//! list is serialized into the system context; there is no truncation
//! policy, so context cost grows with history size. A failed turn surfaces a
//! fallback message and leaves the session usable; the transcript is only
//! extended on successful exchanges.

pub mod directives;
pub mod handlers;

use tracing::warn;

use crate::llm_client::{Conversation, ExchangeRequest, LlmClient};
use crate::models::{ApplicationRecord, ArtifactBundle};

/// Shown when an exchange fails outright.
const OFFLINE_FALLBACK: &str = "Oops, my brain is offline. Try again later.";
/// Shown when the model returns a blank reply.
const EMPTY_REPLY_FALLBACK: &str = "Sorry, I slipped on a peel and couldn't think of an answer.";

/// Builds the assistant's system context: persona, the serialized record
/// list, and the download-token protocol it must emit.
pub fn assistant_system_instruction(records: &[ApplicationRecord]) -> String {
    let records_json =
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are Nano Banana, the friendly assistant inside AutoCV. You help the user review \
         their job applications and hand back the documents generated for them. Keep replies \
         short and upbeat.\n\n\
         APPLICATION RECORDS (the user's full history, JSON):\n{records_json}\n\n\
         Each application carries six artifacts, keyed: {keys}.\n\n\
         When the user asks for a document, include a download token in your reply with this \
         EXACT shape:\n\
         [[DOWNLOAD|<application id>|<artifact key>|<label>]]\n\
         - <application id> is the record's id field.\n\
         - <artifact key> is one of the six keys above.\n\
         - <label> is a short human-readable name for the file, e.g. \"Cover Letter\".\n\
         Never alter the token shape — the UI turns each token into a download button. Answer \
         questions about applications (company, status, score, dates) from the records above.",
        keys = ArtifactBundle::KEYS.join(", "),
    )
}

/// One lazily-created conversational session shared across chat turns.
pub struct AssistantSession {
    chat: Box<dyn Conversation>,
}

impl AssistantSession {
    /// Opens the session seeded with the current application list.
    pub fn init(llm: &LlmClient, records: &[ApplicationRecord]) -> Self {
        Self::with_conversation(Box::new(
            llm.start_chat(assistant_system_instruction(records)),
        ))
    }

    pub fn with_conversation(chat: Box<dyn Conversation>) -> Self {
        AssistantSession { chat }
    }

    /// One Q&A turn. Never fails: errors and blank replies map to fallback
    /// copy, and the session survives for the next turn either way.
    pub async fn ask(&mut self, message: &str) -> String {
        match self.chat.exchange(ExchangeRequest::text(message)).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => EMPTY_REPLY_FALLBACK.to_string(),
            Err(e) => {
                warn!("Assistant exchange failed: {e}");
                OFFLINE_FALLBACK.to_string()
            }
        }
    }
}
