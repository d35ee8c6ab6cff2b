//! Parsing of recognition result artifacts.
//!
//! The artifact schema is owned by the recognition service:
//! `results.transcripts[0].transcript` carries the text and
//! `results.items[*].alternatives[0].confidence` a string-encoded score per item.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("artifact is not a JSON object")]
    NotAnObject,

    #[error("artifact has no 'results' container")]
    MissingResults,
}

/// Text and quality figures extracted from a result artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTranscript {
    pub text: String,
    pub word_count: u32,
    /// Mean top-alternative confidence over items that carry one; 0 if none do.
    pub average_confidence: f64,
}

/// Parses a raw recognition result document.
///
/// Only a missing `results` container is an error. A missing transcript
/// yields empty text and items without a usable confidence are skipped.
pub fn parse(artifact: &Value) -> Result<ParsedTranscript, ParseError> {
    let document = artifact.as_object().ok_or(ParseError::NotAnObject)?;
    let results = document
        .get("results")
        .and_then(Value::as_object)
        .ok_or(ParseError::MissingResults)?;

    let text = results
        .get("transcripts")
        .and_then(Value::as_array)
        .and_then(|transcripts| transcripts.first())
        .and_then(|first| first.get("transcript"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let confidences: Vec<f64> = results
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(item_confidence).collect())
        .unwrap_or_default();

    let average_confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    Ok(ParsedTranscript {
        word_count: count_words(&text),
        text,
        average_confidence,
    })
}

/// Number of whitespace-delimited tokens.
pub fn count_words(text: &str) -> u32 {
    u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX)
}

fn item_confidence(item: &Value) -> Option<f64> {
    let raw = item
        .get("alternatives")?
        .as_array()?
        .first()?
        .get("confidence")?;

    let value = match raw {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };

    value.is_finite().then_some(value)
}
