use crate::text::fold;

/// Collection name variants (English and Arabic) -> upstream edition slug.
/// Order matters for free-text detection: the first key found in a query wins.
pub const COLLECTION_ALIASES: &[(&str, &str)] = &[
    ("bukhari", "ara-bukhari"),
    ("sahih_bukhari", "ara-bukhari"),
    ("البخاري", "ara-bukhari"),
    ("muslim", "ara-muslim"),
    ("sahih_muslim", "ara-muslim"),
    ("مسلم", "ara-muslim"),
    ("tirmidhi", "ara-tirmidhi"),
    ("الترمذي", "ara-tirmidhi"),
    ("abudawud", "ara-abudawud"),
    ("abu_dawood", "ara-abudawud"),
    ("أبو داود", "ara-abudawud"),
    ("nasai", "ara-nasai"),
    ("النسائي", "ara-nasai"),
    ("ibnmajah", "ara-ibnmajah"),
    ("ibn_majah", "ara-ibnmajah"),
    ("ابن ماجه", "ara-ibnmajah"),
    ("malik", "ara-malik"),
    ("مالك", "ara-malik"),
    ("ahmad", "ara-ahmad"),
    ("أحمد", "ara-ahmad"),
];

/// Editions fanned out to for topic searches.
pub const TOPIC_SEARCH_EDITIONS: [&str; 7] = [
    "ara-bukhari",
    "ara-muslim",
    "ara-abudawud",
    "ara-tirmidhi",
    "ara-nasai",
    "ara-ibnmajah",
    "ara-malik",
];

/// Resolve an explicit collection identifier. Unknown identifiers are used verbatim.
pub fn resolve_collection(identifier: &str) -> String {
    let key = identifier.trim().to_lowercase();
    COLLECTION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, slug)| slug.to_string())
        .unwrap_or_else(|| identifier.trim().to_string())
}

/// Find a collection named inside a free-text query. Aliases match whole
/// words only, multi-word aliases as consecutive words.
pub fn detect_collection(query: &str) -> Option<&'static str> {
    let words = tokenize(query);
    COLLECTION_ALIASES
        .iter()
        .find(|(alias, _)| {
            let alias_words = tokenize(alias);
            !alias_words.is_empty()
                && words
                    .windows(alias_words.len())
                    .any(|window| window == alias_words.as_slice())
        })
        .map(|(_, slug)| *slug)
}

fn tokenize(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_aliases() {
        assert_eq!(resolve_collection("bukhari"), "ara-bukhari");
        assert_eq!(resolve_collection("Sahih_Muslim"), "ara-muslim");
        assert_eq!(resolve_collection("الترمذي"), "ara-tirmidhi");
        assert_eq!(resolve_collection(" abu_dawood "), "ara-abudawud");
    }

    #[test]
    fn test_resolve_unknown_is_verbatim() {
        assert_eq!(resolve_collection("eng-bukhari"), "eng-bukhari");
    }

    #[test]
    fn test_detect_collection_in_query() {
        assert_eq!(detect_collection("Sahih Bukhari hadiths"), Some("ara-bukhari"));
        assert_eq!(detect_collection("ibn majah"), Some("ara-ibnmajah"));
        assert_eq!(detect_collection("أحاديث صحيح البخاري"), Some("ara-bukhari"));
        assert_eq!(detect_collection("الصلاة"), None);
        assert_eq!(detect_collection("patience"), None);
    }

    #[test]
    fn test_detect_collection_needs_whole_words() {
        assert_eq!(detect_collection("حقوق المسلمين"), None);
        assert_eq!(detect_collection("المسلم من سلم المسلمون من لسانه"), None);
        assert_eq!(detect_collection("muslims and charity"), None);
        assert_eq!(detect_collection("الممالك"), None);
        assert_eq!(detect_collection("صحيح مسلم"), Some("ara-muslim"));
        assert_eq!(detect_collection("Muslim, book of faith"), Some("ara-muslim"));
    }

    #[test]
    fn test_detect_multi_word_aliases() {
        assert_eq!(detect_collection("سنن أبو داود"), Some("ara-abudawud"));
        assert_eq!(detect_collection("abu dawood on prayer"), Some("ara-abudawud"));
        assert_eq!(detect_collection("sahih_bukhari"), Some("ara-bukhari"));
        // Both words are needed, in order
        assert_eq!(detect_collection("داود أبو"), None);
        assert_eq!(detect_collection("ibn"), None);
    }

    #[test]
    fn test_topic_editions_are_aliased() {
        for slug in TOPIC_SEARCH_EDITIONS {
            assert!(COLLECTION_ALIASES.iter().any(|(_, s)| *s == slug));
        }
    }
}
