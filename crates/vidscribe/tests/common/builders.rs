//! Builders for recognition result artifacts.

#![allow(dead_code)]

use serde_json::{json, Value};

/// Builds a result document in the recognition service's schema.
pub struct ArtifactBuilder {
    job_name: String,
    transcript: Option<String>,
    items: Vec<Value>,
}

impl ArtifactBuilder {
    pub fn new() -> Self {
        Self {
            job_name: "transcribe_test".to_string(),
            transcript: None,
            items: vec![],
        }
    }

    pub fn transcript(mut self, text: &str) -> Self {
        self.transcript = Some(text.to_string());
        self
    }

    /// A pronunciation item with one scored alternative.
    pub fn word(mut self, content: &str, confidence: &str) -> Self {
        self.items.push(json!({
            "type": "pronunciation",
            "alternatives": [{ "confidence": confidence, "content": content }]
        }));
        self
    }

    /// An item without any `alternatives`, like punctuation.
    pub fn punctuation(mut self, content: &str) -> Self {
        self.items.push(json!({ "type": "punctuation", "content": content }));
        self
    }

    pub fn build(self) -> Value {
        let transcripts = match self.transcript {
            Some(text) => json!([{ "transcript": text }]),
            None => json!([]),
        };
        json!({
            "jobName": self.job_name,
            "status": "COMPLETED",
            "results": {
                "transcripts": transcripts,
                "items": self.items
            }
        })
    }
}

/// The two-word document used across tests: average confidence 0.85.
pub fn hello_world_artifact() -> Value {
    ArtifactBuilder::new()
        .transcript("hello world")
        .word("hello", "0.90")
        .word("world", "0.80")
        .build()
}

/// A document missing the `results` container.
pub fn artifact_without_results() -> Value {
    json!({ "jobName": "transcribe_test", "status": "COMPLETED" })
}
