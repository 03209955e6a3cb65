use serde::{Deserialize, Serialize};

/// Body of `POST /query`.
///
/// The id is sent under both spellings: `contentId` for the documented
/// contract, `videoId` for backends keyed by video.
#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    #[serde(rename = "contentId")]
    pub content_id: &'a str,
    #[serde(rename = "videoId")]
    pub video_id: &'a str,
    pub query: &'a str,
}

impl<'a> QueryRequest<'a> {
    pub fn new(content_id: &'a str, query: &'a str) -> Self {
        Self { content_id, video_id: content_id, query }
    }
}

/// Reply of `POST /query`: an answer, an error, or (malformed) neither.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// FastAPI-style error body (`{"detail": ...}`), a string or a list of validation errors
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl QueryReply {
    pub fn answer(text: impl Into<String>) -> Self {
        Self { answer: Some(text.into()), ..Self::default() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { error: Some(text.into()), ..Self::default() }
    }

    /// Text to show: the answer, else the backend's error verbatim, else `no_response`.
    /// Empty strings count as missing.
    pub fn into_text(self, no_response: &str) -> String {
        if let Some(answer) = self.answer.filter(|a| !a.is_empty()) {
            return answer;
        }
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return error;
        }
        match self.detail {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Null) | Some(serde_json::Value::String(_)) | None => no_response.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Reply of `GET /check_result`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CheckReply {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub answer: Option<String>,
}

impl CheckReply {
    pub fn found(answer: impl Into<String>) -> Self {
        Self { found: true, answer: Some(answer.into()) }
    }

    pub fn not_found() -> Self {
        Self::default()
    }
}
