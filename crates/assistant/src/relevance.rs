//! Heuristic gate deciding whether a chat message is about the hadith being discussed.
//!
//! Three stages, first match wins:
//! 1. a deny-list of obviously off-topic messages (arithmetic, greetings, jokes, ...)
//! 2. an allow-list of "explain / clarify" trigger words in Arabic and English
//! 3. for hadith text with religious context, word overlap with the hadith or a
//!    question of at least three words

use regex::Regex;
use std::sync::LazyLock;

static BLOCKED_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(\d+\s*[+\-*/]\s*\d+)$",
        r"^tell\s+(me\s+)?a\s+joke",
        r"^(weather|temperature|climate)",
        r"^(football|soccer|sports match|game result)",
        r"^(recipe|cooking|food|restaurant|drink)",
        r"^(movie|film|actor|actress|hollywood|cinema)",
        r"^(password|login|hack|malware|virus)",
        r"^(love (you|me)|marry|girlfriend|boyfriend|dating)",
        r"^(random|blah|yapping|nonsense|stupid)",
        r"^(hello|hi|how are you|good morning|good night)$",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).expect("blocked pattern is valid"))
    .collect()
});

static WORD_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-()،.]+").expect("separator pattern is valid"));

const ALLOWED_TERMS: &[&str] = &[
    "اشرح", "شرح", "وضح", "بين", "أوضح", "اشرح لي", "شرح أكثر", "اشرح أكثر",
    "فسر", "تفسير", "معنى", "ما معنى", "كيف", "لماذا", "هل", "ما", "من", "أين",
    "explain", "clarify", "understand", "more", "please", "tell us", "elaborate",
    "عليك", "يمكنك", "هل يمكنك", "فضلاً", "أكثر", "قليلا",
];

const RELIGIOUS_CONTEXT: &[&str] = &[
    "حديث", "نبي", "رسول", "سنة", "إسلام", "دين", "شريف", "معنى", "تفسير",
];

const STOP_WORDS: &[&str] = &[
    "في", "من", "عن", "إن", "هو", "هي", "هم", "و", "ل", "ال", "أن", "إلى",
];

/// Words shorter than this (in characters) are ignored when comparing.
const MIN_WORD_CHARS: usize = 3;

pub fn is_question_relevant(question: &str, hadith_text: &str) -> bool {
    let question = question.trim().to_lowercase();
    let hadith = hadith_text.to_lowercase();

    if BLOCKED_PATTERNS.iter().any(|p| p.is_match(&question)) {
        return false;
    }

    if ALLOWED_TERMS.iter().any(|term| question.contains(term)) {
        return true;
    }

    if !RELIGIOUS_CONTEXT.iter().any(|k| hadith.contains(k)) {
        return false;
    }

    let hadith_words: Vec<&str> = words(&hadith)
        .filter(|w| !STOP_WORDS.contains(w))
        .collect();
    let question_words: Vec<&str> = words(&question).collect();

    let overlaps = question_words.iter().any(|qw| {
        hadith_words
            .iter()
            .any(|hw| hw == qw || hw.contains(qw) || qw.contains(hw))
    });

    overlaps || question_words.len() >= 3
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD_SEPARATORS
        .split(text)
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
}
