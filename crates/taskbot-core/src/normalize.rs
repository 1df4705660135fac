//! Text normalization and approximate matching.
//!
//! Normalized text is case-folded, diacritic-stripped, mention-stripped and
//! whitespace-collapsed. It is what task bodies and quoted replies are
//! compared on.

/// Lowercase base letter followed by every accented form that folds onto it.
const FOLD_TABLE: &[(char, &str)] = &[
    ('a', "àáảãạăằắẳẵặâầấẩẫậäåāą"),
    ('e', "èéẻẽẹêềếểễệëēę"),
    ('i', "ìíỉĩịïîī"),
    ('o', "òóỏõọôồốổỗộơờớởỡợöøō"),
    ('u', "ùúủũụưừứửữựûüū"),
    ('y', "ỳýỷỹỵÿ"),
    ('d', "đ"),
    ('c', "ç"),
    ('n', "ñ"),
];

/// Phrases that, on their own, mean "done". Stored in normalized form.
const COMPLETION_PHRASES: &[&str] = &[
    "ok",
    "oke",
    "okay",
    "okie",
    "oki",
    "okela",
    "done",
    "xong",
    "da xong",
    "xong roi",
    "lam xong",
    "da lam xong",
    "hoan thanh",
    "da hoan thanh",
    "xu ly xong",
    "da xu ly",
    "da xu ly xong",
    "da sua",
    "sua xong",
    "da sua xong",
    "da fix",
    "fix xong",
    "fixed",
    "resolved",
    "finished",
    "completed",
    "ok xong",
    "ok done",
];

/// Courtesy particles that may trail a completion phrase ("xong rồi nhé ạ").
const TRAILING_PARTICLES: &[&str] = &[
    "a", "ah", "nhe", "nha", "nhen", "nghe", "roi", "r", "anh", "chi", "em", "sep",
];

const COMPLETION_EMOJI: &[&str] = &["👍", "👌", "✅", "✔", "✔️"];

/// Normalize a message body for comparison.
///
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(fold)
        .filter(|token| !token.is_empty() && !token.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase and strip diacritics. Combining marks (decomposed input) are dropped.
pub fn fold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if is_combining_mark(c) {
            continue;
        }
        out.push(fold_char(c));
    }
    out
}

fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c;
    }
    FOLD_TABLE
        .iter()
        .find(|(_, variants)| variants.contains(c))
        .map_or(c, |(base, _)| *base)
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

/// Symmetric containment test on normalized text.
///
/// Two texts match when equal or when either contains the other. Empty
/// input never matches.
pub fn fuzzy_match(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(b) || b.contains(a)
}

/// Whether the message is a slash command (`/tasks`, `/done 5`, ...).
pub fn is_command(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

/// Whether the message, on its own, says "done".
pub fn is_completion_utterance(text: &str) -> bool {
    let normalized = normalize(text);
    if COMPLETION_EMOJI.contains(&normalized.as_str()) {
        return true;
    }

    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut end = words.len();
    while end > 1 && TRAILING_PARTICLES.contains(&words[end - 1]) {
        end -= 1;
    }
    let phrase = words[..end].join(" ");
    COMPLETION_PHRASES.contains(&phrase.as_str())
}

/// `@mention` handles in order of appearance, without the `@` and trailing punctuation.
pub fn extract_mentions(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| token.strip_prefix('@'))
        .map(|handle| handle.trim_end_matches(|c: char| !c.is_alphanumeric()))
        .filter(|handle| !handle.is_empty())
        .map(str::to_string)
        .collect()
}

/// Character count, which is what length limits are expressed in.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
