use serde_json::Value as JSValue;
use tlx_stats::{Session, Subscale, TlxScores};

use crate::tlx::*;

/// A stored result, read tolerantly: the fields may be written in camelCase or in
/// snake_case, and any of them may be missing.
#[derive(PartialEq, Debug, Clone)]
pub struct StoredResult {
    pub id: i64,
    pub version: Option<Version>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// In milliseconds.
    pub duration_ms: Option<f64>,
    pub confirmation_code: Option<String>,
    pub scores: TlxScores,
    pub created_at: Option<String>,
}

fn field<'a>(doc: &'a JSValue, camel: &str, snake: &str) -> Option<&'a JSValue> {
    doc.get(camel)
        .filter(|v| !v.is_null())
        .or_else(|| doc.get(snake))
        .filter(|v| !v.is_null())
}

fn text_field(doc: &JSValue, camel: &str, snake: &str) -> Option<String> {
    match field(doc, camel, snake)? {
        JSValue::String(s) if s.trim().is_empty() => None,
        JSValue::String(s) => Some(s.clone()),
        // Timestamps written by other tools may be epoch milliseconds.
        JSValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl StoredResult {
    pub fn from_document(id: i64, doc: &JSValue) -> StoredResult {
        let version = field(doc, "version", "version")
            .and_then(|v| v.as_str())
            .and_then(Version::from_stored);

        let duration_ms = match field(doc, "duration", "duration") {
            Some(JSValue::Number(n)) => n.as_f64(),
            Some(JSValue::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        let mut scores = TlxScores::default();
        if let Some(tlx) = field(doc, "nasatlx", "nasa_tlx") {
            for subscale in Subscale::ALL {
                // Only numbers count, numeric strings are not scores.
                let value = field(tlx, subscale.name(), subscale.snake_name())
                    .and_then(|v| v.as_f64());
                scores.set(subscale, value);
            }
        }

        StoredResult {
            id,
            version,
            start_time: text_field(doc, "startTime", "start_time"),
            end_time: text_field(doc, "endTime", "end_time"),
            duration_ms,
            confirmation_code: text_field(doc, "confirmationCode", "confirmation_code"),
            scores,
            created_at: text_field(doc, "createdAt", "created_at"),
        }
    }

    /// All six scores are numbers, the duration is positive and both timestamps are
    /// present.
    pub fn is_valid(&self) -> bool {
        self.scores.complete().is_some()
            && self.duration_ms.map(|d| d > 0.0).unwrap_or(false)
            && self.start_time.is_some()
            && self.end_time.is_some()
    }

    pub fn session(&self) -> Session {
        Session {
            duration_ms: self.duration_ms.unwrap_or(0.0),
            scores: self.scores,
        }
    }
}
