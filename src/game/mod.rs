//! Game logic: submission sanitization and round resolution

pub mod resolver;

/// Maximum length of a submitted word. Longer submissions are clipped,
/// never rejected.
pub const MAX_WORD_LEN: usize = 32;

/// Maximum length of a display name
pub const MAX_NAME_LEN: usize = 24;

/// Trim and clip a submitted word. Returns `None` for words that are empty
/// after trimming; those submissions are ignored upstream.
pub fn sanitize_word(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(clip(trimmed, MAX_WORD_LEN))
}

/// Trim and clip a display name. Empty names fall back to a generated
/// label upstream.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(clip(trimmed, MAX_NAME_LEN))
}

/// The comparison key for consensus detection. Display always uses the raw
/// word; only equality checks use this.
pub fn normalize(word: &str) -> String {
    word.trim().to_lowercase()
}

fn clip(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_word_trims() {
        assert_eq!(sanitize_word("  apple  "), Some("apple".to_string()));
    }

    #[test]
    fn test_sanitize_word_empty() {
        assert_eq!(sanitize_word(""), None);
        assert_eq!(sanitize_word("   \t\n"), None);
    }

    #[test]
    fn test_sanitize_word_clips_not_rejects() {
        let long = "a".repeat(100);
        let word = sanitize_word(&long).unwrap();
        assert_eq!(word.len(), MAX_WORD_LEN);
    }

    #[test]
    fn test_sanitize_word_clips_on_char_boundary() {
        let long = "ü".repeat(40);
        let word = sanitize_word(&long).unwrap();
        assert_eq!(word.chars().count(), MAX_WORD_LEN);
    }

    #[test]
    fn test_sanitize_word_preserves_case() {
        assert_eq!(sanitize_word("Apple"), Some("Apple".to_string()));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("  Alice "), Some("Alice".to_string()));
        assert_eq!(sanitize_name("  "), None);
        let long = "x".repeat(50);
        assert_eq!(sanitize_name(&long).unwrap().len(), MAX_NAME_LEN);
    }

    #[test]
    fn test_normalize_trim_and_lowercase() {
        assert_eq!(normalize(" Apple "), "apple");
        assert_eq!(normalize("APPLE"), normalize("apple"));
        assert_ne!(normalize("apples"), normalize("apple"));
    }
}
