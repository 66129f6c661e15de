//! Display names for the language codes the services can return or target.
//!
//! Codes are ISO-639-1 (plus the `zh-TW` variant) and cover the translation
//! service's supported set.  Unknown codes are passed through without a
//! display name rather than rejected.

/// Language code → English display name, sorted by code.
const LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("bn", "Bengali"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("gu", "Gujarati"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("ml", "Malayalam"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pa", "Punjabi"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tl", "Filipino"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese (Simplified)"),
    ("zh-TW", "Chinese (Traditional)"),
];

/// Look up the display name for a language code.
///
/// ```
/// use voice_emotion::services::language_name;
///
/// assert_eq!(language_name("de"), Some("German"));
/// assert_eq!(language_name("xx"), None);
/// ```
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|i| LANGUAGES[i].1)
}

/// All supported `(code, name)` pairs, sorted by code.
pub fn supported_languages() -> &'static [(&'static str, &'static str)] {
    LANGUAGES
}
