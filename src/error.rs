use serde_json::{Map, Value};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DropboxError>;

/// Message and payload extracted from a failed API call.
///
/// `message` is never empty: the lookup in [`normalize_error`] always ends in a
/// caller-supplied fallback literal.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct NormalizedError {
    pub message: String,
    pub status: Option<u16>,
    pub data: Option<Value>,
}

impl NormalizedError {
    /// Tag identifying the error variant, e.g. `invalid_file_extension`.
    ///
    /// Read from `error[".tag"]` first, then from the leading segment of
    /// `error_summary` (`"path/not_found/.."` -> `"path"`).
    pub fn discriminator(&self) -> Option<&str> {
        let data = self.data.as_ref()?;
        if let Some(tag) = data
            .get("error")
            .and_then(|e| e.get(".tag"))
            .and_then(Value::as_str)
        {
            return Some(tag);
        }
        data.get("error_summary")
            .and_then(Value::as_str)
            .and_then(|s| s.split('/').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Error variants the client knows how to compensate for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recoverable {
    InvalidFileExtension,
    SharedLinkAlreadyExists,
}

impl Recoverable {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "invalid_file_extension" => Some(Self::InvalidFileExtension),
            "shared_link_already_exists" => Some(Self::SharedLinkAlreadyExists),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DropboxError {
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error(transparent)]
    Api(NormalizedError),

    #[error("invalid JSON from {endpoint} ({status}): {message}")]
    Parse {
        endpoint: String,
        status: u16,
        message: String,
        body: String,
    },

    #[error("{0}")]
    Input(String),
}

impl DropboxError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => e.status,
            Self::Parse { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            Self::Api(e) => e.data.clone(),
            Self::Parse { body, .. } => Some(wrap_raw(body)),
            _ => None,
        }
    }

    pub fn recoverable(&self) -> Option<Recoverable> {
        match self {
            Self::Api(e) => e.discriminator().and_then(Recoverable::from_tag),
            _ => None,
        }
    }

    /// Machine-readable form used by `--json` error output.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "error": self.to_string(),
            "status": self.status(),
            "data": self.data(),
        })
    }
}

/// Builds a [`NormalizedError`] from a raw response body.
///
/// Message priority, first non-empty wins: `error_summary`,
/// `error_description`, `error.message`, the raw text, then `fallback`.
/// A body that is not JSON is kept as `{"error": raw}`.
pub fn normalize_error(raw: &str, status: Option<u16>, fallback: &str) -> NormalizedError {
    let data = parse_or_wrap(raw);
    let message = [
        data.get("error_summary").and_then(Value::as_str),
        data.get("error_description").and_then(Value::as_str),
        data.get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str),
        Some(raw),
    ]
    .into_iter()
    .flatten()
    .find(|s| !s.trim().is_empty())
    .unwrap_or(fallback)
    .to_string();

    NormalizedError {
        message,
        status,
        data: Some(data),
    }
}

pub(crate) fn parse_or_wrap(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| wrap_raw(raw))
}

fn wrap_raw(raw: &str) -> Value {
    let mut map = Map::new();
    map.insert("error".into(), Value::String(raw.to_string()));
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_summary_wins_over_everything() {
        let body = r#"{
            "error_summary": "path/not_found/..",
            "error_description": "desc",
            "error": {"message": "nested"}
        }"#;
        let e = normalize_error(body, Some(409), "API request failed");
        assert_eq!(e.message, "path/not_found/..");
        assert_eq!(e.status, Some(409));
    }

    #[test]
    fn description_beats_nested_message() {
        let body = r#"{"error_description": "token expired", "error": {"message": "nested"}}"#;
        let e = normalize_error(body, Some(401), "API request failed");
        assert_eq!(e.message, "token expired");
    }

    #[test]
    fn nested_message_used_when_alone() {
        let body = r#"{"error": {"message": "quota exceeded"}}"#;
        let e = normalize_error(body, Some(507), "API request failed");
        assert_eq!(e.message, "quota exceeded");
    }

    #[test]
    fn empty_summary_falls_through() {
        let body = r#"{"error_summary": "", "error": {"message": "nested"}}"#;
        let e = normalize_error(body, Some(400), "API request failed");
        assert_eq!(e.message, "nested");
    }

    #[test]
    fn unparseable_body_is_kept_verbatim() {
        let e = normalize_error("Error in call to API function", Some(400), "API request failed");
        assert_eq!(e.message, "Error in call to API function");
        assert_eq!(
            e.data,
            Some(serde_json::json!({"error": "Error in call to API function"}))
        );
    }

    #[test]
    fn json_without_known_fields_uses_raw_text() {
        let e = normalize_error(r#"{"foo":1}"#, Some(500), "API request failed");
        assert_eq!(e.message, r#"{"foo":1}"#);
    }

    #[test]
    fn empty_body_uses_fallback() {
        let e = normalize_error("", Some(502), "Download failed");
        assert_eq!(e.message, "Download failed");
        assert!(!e.message.is_empty());
    }

    #[test]
    fn discriminator_prefers_tag() {
        let body = r#"{"error_summary": "other/..", "error": {".tag": "invalid_file_extension"}}"#;
        let e = DropboxError::Api(normalize_error(body, Some(409), "Upload failed"));
        assert_eq!(e.recoverable(), Some(Recoverable::InvalidFileExtension));
    }

    #[test]
    fn discriminator_from_summary_prefix() {
        let body = r#"{"error_summary": "shared_link_already_exists/metadata/.."}"#;
        let e = DropboxError::Api(normalize_error(body, Some(409), "API request failed"));
        assert_eq!(e.recoverable(), Some(Recoverable::SharedLinkAlreadyExists));
    }

    #[test]
    fn unknown_discriminator_is_not_recoverable() {
        let body = r#"{"error_summary": "path/not_found/..", "error": {".tag": "path"}}"#;
        let e = DropboxError::Api(normalize_error(body, Some(409), "API request failed"));
        assert_eq!(e.recoverable(), None);
        assert_eq!(e.status(), Some(409));
    }

    #[test]
    fn json_output_carries_status_and_payload() {
        let e = DropboxError::Api(normalize_error(
            r#"{"error_summary": "too_many_requests/"}"#,
            Some(429),
            "API request failed",
        ));
        let out = e.to_json();
        assert_eq!(out["error"], "too_many_requests/");
        assert_eq!(out["status"], 429);
        assert_eq!(out["data"]["error_summary"], "too_many_requests/");
    }

    #[test]
    fn input_error_has_no_status() {
        let e = DropboxError::input("path is required");
        assert_eq!(e.to_string(), "path is required");
        assert_eq!(e.to_json()["status"], Value::Null);
    }
}
