// Organization-name normalization.
//
// Four tables are maintained by different people, so the same organization
// shows up as "Institución X", " institucion x" or "INSTITUCIÓN X".
// `normalize_match` folds those into one join key; `normalize_display` only
// trims and is the form shown to users.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Join-key form: trimmed, lowercased, with diacritics removed.
///
/// Never use the result for display.
pub fn normalize_match(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

/// Display form: surrounding whitespace removed, case and accents preserved.
pub fn normalize_display(s: &str) -> String {
    s.trim().to_string()
}
