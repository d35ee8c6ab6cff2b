//! Caller options and the settings derived from them for the recognition service.

use serde::{Deserialize, Serialize};

/// Upper bound on alternative transcripts requested per job.
pub const MAX_ALTERNATIVES: u32 = 3;

/// Speaker count used when speaker labelling is enabled without an explicit maximum.
pub const DEFAULT_MAX_SPEAKERS: u32 = 2;

/// Options a caller supplies when starting a transcription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionOptions {
    #[serde(default)]
    pub speaker_labels: bool,
    #[serde(default)]
    pub max_speakers: Option<u32>,
    #[serde(default = "default_true")]
    pub automatic_punctuation: bool,
    #[serde(default = "default_alternatives")]
    pub alternatives: u32,
}

fn default_true() -> bool {
    true
}

fn default_alternatives() -> u32 {
    MAX_ALTERNATIVES
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            speaker_labels: false,
            max_speakers: None,
            automatic_punctuation: true,
            alternatives: MAX_ALTERNATIVES,
        }
    }
}

/// Settings forwarded verbatim to the recognition service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionSettings {
    pub show_speaker_labels: bool,
    /// Only present when speaker labelling is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speaker_labels: Option<u32>,
    pub automatic_punctuation: bool,
    pub show_alternatives: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_alternatives: Option<u32>,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        RecognitionSettings::from(&TranscriptionOptions::default())
    }
}

impl From<&TranscriptionOptions> for RecognitionSettings {
    fn from(options: &TranscriptionOptions) -> Self {
        let max_speaker_labels = options
            .speaker_labels
            .then(|| options.max_speakers.unwrap_or(DEFAULT_MAX_SPEAKERS));
        let alternatives = options.alternatives.min(MAX_ALTERNATIVES);

        Self {
            show_speaker_labels: options.speaker_labels,
            max_speaker_labels,
            automatic_punctuation: options.automatic_punctuation,
            show_alternatives: alternatives > 1,
            max_alternatives: (alternatives > 1).then_some(alternatives),
        }
    }
}

impl RecognitionSettings {
    /// Rebuilds caller options from stored settings, used when retrying a job.
    pub fn to_options(&self) -> TranscriptionOptions {
        TranscriptionOptions {
            speaker_labels: self.show_speaker_labels,
            max_speakers: self.max_speaker_labels,
            automatic_punctuation: self.automatic_punctuation,
            alternatives: self.max_alternatives.unwrap_or(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RecognitionSettings::default();
        assert!(!settings.show_speaker_labels);
        assert_eq!(settings.max_speaker_labels, None);
        assert!(settings.automatic_punctuation);
        assert!(settings.show_alternatives);
        assert_eq!(settings.max_alternatives, Some(MAX_ALTERNATIVES));
    }

    #[test]
    fn test_speaker_count_only_sent_when_enabled() {
        let options = TranscriptionOptions {
            speaker_labels: false,
            max_speakers: Some(5),
            ..Default::default()
        };
        assert_eq!(RecognitionSettings::from(&options).max_speaker_labels, None);

        let options = TranscriptionOptions {
            speaker_labels: true,
            max_speakers: Some(5),
            ..Default::default()
        };
        assert_eq!(
            RecognitionSettings::from(&options).max_speaker_labels,
            Some(5)
        );

        let options = TranscriptionOptions {
            speaker_labels: true,
            ..Default::default()
        };
        assert_eq!(
            RecognitionSettings::from(&options).max_speaker_labels,
            Some(DEFAULT_MAX_SPEAKERS)
        );
    }

    #[test]
    fn test_alternatives_are_capped() {
        let options = TranscriptionOptions {
            alternatives: 10,
            ..Default::default()
        };
        assert_eq!(RecognitionSettings::from(&options).max_alternatives, Some(3));

        let options = TranscriptionOptions {
            alternatives: 1,
            ..Default::default()
        };
        let settings = RecognitionSettings::from(&options);
        assert!(!settings.show_alternatives);
        assert_eq!(settings.max_alternatives, None);
    }

    #[test]
    fn test_settings_round_trip_to_options() {
        let options = TranscriptionOptions {
            speaker_labels: true,
            max_speakers: Some(4),
            automatic_punctuation: false,
            alternatives: 2,
        };
        let settings = RecognitionSettings::from(&options);
        assert_eq!(settings.to_options(), options);
    }
}
