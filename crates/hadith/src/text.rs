//! Text helpers shared by search and the AI endpoints.

/// Trim, cap at `max_chars` characters and strip NUL bytes.
pub fn sanitize(input: &str, max_chars: usize) -> String {
    input
        .trim()
        .chars()
        .take(max_chars)
        .filter(|c| *c != '\0')
        .collect()
}

/// Arabic harakat, Quranic annotation marks and tatweel.
fn is_diacritic(c: char) -> bool {
    matches!(c,
        '\u{0610}'..='\u{061A}'
        | '\u{064B}'..='\u{065F}'
        | '\u{0670}'
        | '\u{0640}'
        | '\u{06D6}'..='\u{06ED}')
}

pub fn strip_diacritics(text: &str) -> String {
    text.chars().filter(|c| !is_diacritic(*c)).collect()
}

/// Lowercase and strip diacritics so that vocalised and plain text compare equal.
pub fn fold(text: &str) -> String {
    strip_diacritics(text).to_lowercase()
}

/// Parse the leading integer of a hadith number the way a lenient `parseInt` would.
/// Anything without leading digits is 0.
pub fn leading_number(value: &str) -> u64 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
