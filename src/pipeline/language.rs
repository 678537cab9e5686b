//! Human-readable names for detected language codes

/// Map an ISO 639-1 code to a human-readable language name.
///
/// Unknown codes fall back to the upper-cased code so the status message
/// still carries something recognizable.
#[must_use]
pub fn language_name(code: &str) -> String {
    let name = match code.trim().to_ascii_lowercase().as_str() {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "nl" => "Dutch",
        "ru" => "Russian",
        "uk" => "Ukrainian",
        "pl" => "Polish",
        "cs" => "Czech",
        "ro" => "Romanian",
        "hu" => "Hungarian",
        "el" => "Greek",
        "sv" => "Swedish",
        "da" => "Danish",
        "fi" => "Finnish",
        "no" => "Norwegian",
        "tr" => "Turkish",
        "ar" => "Arabic",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "id" => "Indonesian",
        "vi" => "Vietnamese",
        "th" => "Thai",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        _ => return code.to_uppercase(),
    };

    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_resolve_to_names() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("es"), "Spanish");
        assert_eq!(language_name("zh"), "Chinese");
    }

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        assert_eq!(language_name("ES"), "Spanish");
        assert_eq!(language_name(" de "), "German");
    }

    #[test]
    fn unknown_codes_fall_back_to_uppercase() {
        assert_eq!(language_name("xx"), "XX");
        assert_eq!(language_name("tlh"), "TLH");
    }
}
