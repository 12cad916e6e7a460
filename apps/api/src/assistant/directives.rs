//! Directive parser — splits assistant replies into literal text and
//! download directives.
//!
//! The token shape `[[DOWNLOAD|<id>|<key>|<label>]]` is a de facto wire
//! format: the assistant is instructed to emit it verbatim, and the UI turns
//! each directive into a download action. Fields carry no escaping; a label
//! containing `|` or `]]` is undefined behavior inherited from the protocol,
//! not handled here.

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn download_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\[DOWNLOAD\|(.*?)\|(.*?)\|(.*?)\]\]").expect("download token regex")
    })
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// One parsed download token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadDirective {
    pub application_id: String,
    pub artifact_key: String,
    pub label: String,
}

/// A span of an assistant reply: either literal text (verbatim, order
/// preserved) or a directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ReplySegment {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "download")]
    Download(DownloadDirective),
}

/// Scans a reply for download tokens and returns the alternating sequence of
/// literal spans and directives. Text that matches no token passes through
/// untouched.
pub fn parse_reply(text: &str) -> Vec<ReplySegment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in download_re().captures_iter(text) {
        let matched = caps.get(0).expect("capture 0 always present");
        if matched.start() > last {
            segments.push(ReplySegment::Text {
                text: text[last..matched.start()].to_string(),
            });
        }
        segments.push(ReplySegment::Download(DownloadDirective {
            application_id: caps[1].to_string(),
            artifact_key: caps[2].to_string(),
            label: caps[3].to_string(),
        }));
        last = matched.end();
    }

    if last < text.len() {
        segments.push(ReplySegment::Text {
            text: text[last..].to_string(),
        });
    }

    segments
}

/// File extension for an artifact key. Fixed mapping: structured resume data
/// is JSON, the formatted resume document is Markdown, everything else is
/// plain text.
pub fn extension_for(artifact_key: &str) -> &'static str {
    match artifact_key {
        "resumeJson" => "json",
        "resumeDoc" => "md",
        _ => "txt",
    }
}

/// Deterministic download filename: `{companyName}_{label}.{ext}` with
/// whitespace runs in the label collapsed to underscores.
pub fn artifact_filename(company_name: &str, artifact_key: &str, label: &str) -> String {
    let label = whitespace_re().replace_all(label, "_");
    format!("{company_name}_{label}.{}", extension_for(artifact_key))
}
