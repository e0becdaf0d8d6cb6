//! Comparison keys for names and titles.
//!
//! Keys fold case with the caller's locale and drop diacritics, so that
//! "Émile Zola" and "emile zola" compare equal. Raw strings are left alone;
//! callers still use them to decide which spelling to keep.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::locale::Locale;

const NAME_PARTICLES: &[&str] = &[
    "van", "von", "de", "der", "den", "du", "la", "le", "di", "da", "del", "della", "ten", "ter",
];

const NAME_SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv"];

/// Separator between the family and given parts of an author key.
const KEY_SEPARATOR: char = '\u{1f}';

/// Locale-aware comparison key for a name or title.
pub fn normalize(text: &str, locale: &Locale) -> String {
    let lowered = locale.to_lowercase(text);
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;

    for ch in lowered.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }

    out
}

/// Composite key used for author equality.
pub fn author_key(family_name: &str, given_names: &str, locale: &Locale) -> String {
    let mut key = normalize(family_name, locale);
    key.push(KEY_SEPARATOR);
    key.push_str(&normalize(given_names, locale));
    key
}

/// Splits a display name into `(family, given)`.
///
/// Accepts both "Family, Given" and "Given Family". Particles such as "van"
/// or "de" stay with the family name, as do generational suffixes.
pub fn split_author_name(text: &str) -> (String, String) {
    let text = text.trim();
    if text.is_empty() {
        return (String::new(), String::new());
    }

    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    if parts.len() >= 2 && !parts[0].is_empty() {
        // "John Smith, Jr." is given-first with a trailing suffix.
        if parts.len() == 2 && is_suffix(parts[1]) {
            let (family, given) = split_given_first(parts[0]);
            return (format!("{family} {}", parts[1]), given);
        }
        let given = parts[1..]
            .iter()
            .filter(|p| !p.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ");
        return (parts[0].to_string(), given);
    }

    split_given_first(text)
}

fn split_given_first(text: &str) -> (String, String) {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() <= 1 {
        return (tokens.concat(), String::new());
    }

    let suffix = if tokens.len() > 2 && tokens.last().is_some_and(|t| is_suffix(t)) {
        tokens.pop()
    } else {
        None
    };

    let mut family_start = tokens.len() - 1;
    while family_start > 1 && is_particle(tokens[family_start - 1]) {
        family_start -= 1;
    }

    let mut family = tokens[family_start..].join(" ");
    if let Some(suffix) = suffix {
        family.push(' ');
        family.push_str(suffix);
    }
    let given = tokens[..family_start].join(" ");
    (family, given)
}

fn is_particle(token: &str) -> bool {
    NAME_PARTICLES.contains(&token.to_lowercase().as_str())
}

fn is_suffix(token: &str) -> bool {
    NAME_SUFFIXES.contains(&token.to_lowercase().as_str())
}

/// `text` with all combining marks removed, in decomposed form.
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Number of combining marks in `text` once decomposed.
pub fn diacritic_weight(text: &str) -> usize {
    text.nfd().filter(|c| is_combining_mark(*c)).count()
}

/// True when `a` and `b` are different strings that only differ by accents.
pub fn differs_only_by_diacritics(a: &str, b: &str) -> bool {
    a.nfc().ne(b.nfc()) && strip_diacritics(a) == strip_diacritics(b)
}

/// Whether an incoming spelling should leave the resident one untouched:
/// the resident carries the accents the incoming variant is missing.
pub fn keeps_resident_spelling(resident: &str, incoming: &str) -> bool {
    differs_only_by_diacritics(resident, incoming)
        && diacritic_weight(resident) > diacritic_weight(incoming)
}
