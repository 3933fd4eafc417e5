use error_stack::{Report, ResultExt};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info, warn};

use issues_core::model::{IssueDraft, Priority};

use crate::{BackendResult, ClassifierBackend, ClassifierBuildError, ClassifyError};

const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
const GEMINI_API_BASE: &str = "GEMINI_API_BASE";
const GEMINI_MODEL: &str = "GEMINI_MODEL";
const CLASSIFIER_TIMEOUT_MS: &str = "CLASSIFIER_TIMEOUT_MS";

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 1_000;
const MAX_REGION_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct RemoteClassifierConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl RemoteClassifierConfig {
    /// Reads the backend configuration from the environment. `None` means
    /// no API key is present and remote classification is disabled.
    pub fn from_env() -> Option<Self> {
        let api_key = match std::env::var(GEMINI_API_KEY) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                info!("{GEMINI_API_KEY} not specified, remote classification disabled");
                return None;
            }
        };

        let timeout_ms = std::env::var(CLASSIFIER_TIMEOUT_MS)
            .ok()
            .and_then(|raw| match raw.parse::<u64>() {
                Ok(ms) => Some(ms),
                Err(_) => {
                    warn!("invalid {CLASSIFIER_TIMEOUT_MS} '{raw}', using default");
                    None
                }
            })
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Some(Self {
            api_base: std::env::var(GEMINI_API_BASE).unwrap_or_else(|_| DEFAULT_API_BASE.into()),
            api_key,
            model: std::env::var(GEMINI_MODEL).unwrap_or_else(|_| DEFAULT_MODEL.into()),
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Gemini-style `generateContent` classification backend. One bounded
/// round-trip per report; every failure mode surfaces as a `ClassifyError`
/// for the fallback wrapper to absorb.
#[derive(Debug, Clone)]
pub struct RemoteClassifier {
    client: reqwest::Client,
    config: RemoteClassifierConfig,
}

impl RemoteClassifier {
    pub fn new(config: RemoteClassifierConfig) -> Result<Self, Report<ClassifierBuildError>> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .change_context(ClassifierBuildError)?;

        Ok(Self { client, config })
    }

    fn generate_content_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        format!("{base}/models/{}:generateContent", self.config.model)
    }
}

impl ClassifierBackend for RemoteClassifier {
    async fn classify(&self, draft: &IssueDraft) -> BackendResult {
        let response = self
            .client
            .post(self.generate_content_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&build_classification_body(draft))
            .send()
            .await
            .change_context(ClassifyError::Backend)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClassifyError::Backend)
                .attach_with(|| format!("backend returned status {status}"));
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .change_context(ClassifyError::Backend)?;

        let raw_label = reply
            .text_content()
            .ok_or(ClassifyError::UnusableLabel)
            .attach("backend reply carried no text candidates")?;

        debug!("classification backend replied '{}'", raw_label.trim());

        parse_label(&raw_label)
            .ok_or(ClassifyError::UnusableLabel)
            .attach_with(|| format!("'{}' is not a priority label", raw_label.trim()))
    }
}

fn build_classification_body(draft: &IssueDraft) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": build_prompt(draft) }],
        }],
        "generationConfig": {
            "temperature": 0.0,
            "maxOutputTokens": 8,
        },
    })
}

fn build_prompt(draft: &IssueDraft) -> String {
    format!(
        "You triage civic issue reports for a municipal tracker.\n\
         Classify the urgency of the report below as exactly one of: low, medium, high.\n\
         Reply with that single word and nothing else.\n\
         If the report text is empty, gibberish, or not about a civic problem, reply low.\n\
         \n\
         Category: {}\n\
         State: {}\n\
         Locality: {}\n\
         Title: {}\n\
         Description: {}",
        draft.category,
        clip(&draft.state, MAX_REGION_CHARS),
        clip(&draft.location, MAX_REGION_CHARS),
        clip(&draft.title, MAX_TITLE_CHARS),
        clip(&draft.description, MAX_DESCRIPTION_CHARS),
    )
}

/// Strips everything that is not a letter, lower-cases the rest, and
/// accepts only an exact label match.
fn parse_label(raw: &str) -> Option<Priority> {
    let normalized = raw
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect::<String>();

    Priority::from_label(&normalized)
}

fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn text_content(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;

        let text = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();

        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}
