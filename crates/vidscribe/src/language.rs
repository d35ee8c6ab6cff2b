//! Mapping from application language names to recognition language codes.

use std::sync::LazyLock;

use regex::Regex;

static RE_LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,3}-[A-Z]{2}$").unwrap());

/// Code used when a language cannot be resolved.
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";

const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("english", "en-US"),
    ("spanish", "es-ES"),
    ("french", "fr-FR"),
    ("german", "de-DE"),
    ("italian", "it-IT"),
    ("portuguese", "pt-BR"),
    ("russian", "ru-RU"),
    ("chinese", "zh-CN"),
    ("japanese", "ja-JP"),
    ("arabic", "ar-SA"),
];

/// Resolves an application language name or a language code.
///
/// Names are matched case-insensitively; values already shaped like a
/// code (`xx-YY`) pass through. Anything else falls back to
/// [`DEFAULT_LANGUAGE_CODE`].
pub fn resolve_language_code(language: &str) -> String {
    let trimmed = language.trim();
    let lowered = trimmed.to_lowercase();

    if let Some((_, code)) = LANGUAGE_CODES.iter().find(|(name, _)| *name == lowered) {
        return (*code).to_string();
    }

    if RE_LANGUAGE_CODE.is_match(trimmed) {
        return trimmed.to_string();
    }

    log::warn!(
        "Unknown language '{}', falling back to {}",
        language,
        DEFAULT_LANGUAGE_CODE
    );
    DEFAULT_LANGUAGE_CODE.to_string()
}

/// Application language names with a known code.
pub fn supported_languages() -> Vec<&'static str> {
    LANGUAGE_CODES.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_map_to_codes() {
        assert_eq!(resolve_language_code("english"), "en-US");
        assert_eq!(resolve_language_code("Spanish"), "es-ES");
        assert_eq!(resolve_language_code(" japanese "), "ja-JP");
    }

    #[test]
    fn test_codes_pass_through() {
        assert_eq!(resolve_language_code("pt-PT"), "pt-PT");
        assert_eq!(resolve_language_code("en-GB"), "en-GB");
    }

    #[test]
    fn test_unknown_falls_back_to_default() {
        assert_eq!(resolve_language_code("klingon"), DEFAULT_LANGUAGE_CODE);
        assert_eq!(resolve_language_code(""), DEFAULT_LANGUAGE_CODE);
    }

    #[test]
    fn test_supported_languages() {
        let languages = supported_languages();
        assert_eq!(languages.len(), 10);
        assert!(languages.contains(&"arabic"));
    }
}
