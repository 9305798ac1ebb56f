//! Reduce an API error body to a single message

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorItem {
    Text(String),
    Object {
        detail: Option<String>,
        title: Option<String>,
        message: Option<String>,
    },
}

impl ErrorItem {
    fn into_message(self) -> Option<String> {
        match self {
            ErrorItem::Text(text) => Some(text),
            ErrorItem::Object {
                detail,
                title,
                message,
            } => detail.or(message).or(title),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
    message: Option<String>,
    errors: Option<serde_json::Value>,
}

fn value_message(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .into_iter()
                .filter_map(|item| serde_json::from_value::<ErrorItem>(item).ok())
                .filter_map(ErrorItem::into_message)
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        // Rails-style `{ "field": ["is invalid"] }`
        serde_json::Value::Object(map) => {
            let messages: Vec<String> = map
                .into_iter()
                .filter_map(|(field, v)| value_message(v).map(|m| format!("{} {}", field, m)))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Pick the most useful message out of an error response.
///
/// Falls back to the raw body, then to the status text.
pub fn extract_error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let found = parsed
            .error
            .and_then(value_message)
            .or(parsed.message)
            .or_else(|| parsed.errors.and_then(value_message));
        if let Some(message) = found {
            return message;
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 300 && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }
    format!(
        "Request failed: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )
    .trim_end()
    .to_string()
}
