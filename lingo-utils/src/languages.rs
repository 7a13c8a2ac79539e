/// Languages learners can speak or study.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "English", "Hausa", "Yoruba", "Igbo", "French", "Spanish", "Arabic", "Swahili",
];

/// Canonical spelling of a supported language, matched case-insensitively.
pub fn normalize_language(raw: &str) -> Option<&'static str> {
    let needle = raw.trim();
    if needle.is_empty() {
        return None;
    }

    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|language| language.eq_ignore_ascii_case(needle))
}

/// Normalize a list, dropping duplicates while keeping first-seen order.
/// Returns the first unsupported entry as the error.
pub fn normalize_language_list(raw: &[String]) -> Result<Vec<&'static str>, String> {
    let mut languages = Vec::with_capacity(raw.len());
    for entry in raw {
        let Some(language) = normalize_language(entry) else {
            return Err(entry.trim().to_owned());
        };
        if !languages.contains(&language) {
            languages.push(language);
        }
    }

    Ok(languages)
}
