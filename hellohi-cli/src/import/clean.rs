//! Text cleanup for exported CSV lines
//!
//! Source exports mix Cyrillic/Greek look-alike letters, typographic
//! punctuation, HTML fragments and entities into otherwise plain Dutch
//! address data. [`clean`] folds all of that back to plain text.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

/// Look-alike characters and their replacement, in priority order
const CHAR_TABLE: &[(&str, &str)] = &[
    // === Letters ===
    ("∂άαáàâãªä", "a"),
    ("∆лДΛдАÁÀÂÃÄ", "A"),
    ("ЂЪЬБъь", "b"),
    ("βвВ", "B"),
    ("çς©с", "c"),
    ("ÇС", "C"),
    ("δ", "d"),
    ("éèêëέεе℮ёєэЭ", "e"),
    ("ÉÈÊË€ξЄЕ∑", "E"),
    ("₣", "F"),
    ("НнЊњ", "H"),
    ("ђћЋ", "h"),
    ("ÍÌÎÏ", "I"),
    ("íìîïιίϊі", "i"),
    ("Јј", "j"),
    ("ΚЌК", "K"),
    ("ќк", "k"),
    ("ℓ∟", "l"),
    ("Мм", "M"),
    ("ñηήπⁿ", "n"),
    ("Ñ∏пПИЙийΝЛ", "N"),
    ("óòôõºöοФσόо", "o"),
    ("ÓÒÔÕÖθΩО", "O"),
    ("ρφрРф", "p"),
    ("®яЯ", "R"),
    ("ГЃгѓ", "r"),
    ("Ѕ", "S"),
    ("ѕ", "s"),
    ("Тт", "T"),
    ("τ†‡", "t"),
    ("úùûüџμΰµυϋύ", "u"),
    ("√", "v"),
    ("ÚÙÛÜЏЦц", "U"),
    ("Ψψωώẅẃẁщш", "w"),
    ("ẀẄẂШЩ", "W"),
    ("ΧχЖХж", "x"),
    ("ỲΫ¥", "Y"),
    ("ỳγўЎУуч", "y"),
    ("ζ", "Z"),
    // === Punctuation ===
    ("‚", ","),
    ("`‛′’‘", "'"),
    ("″“”«»„", "\""),
    ("—–―−‾⌐─↔→←", "-"),
    ("\u{00A0}\u{2007}\u{2009}\u{202F}", " "),
    ("…", "..."),
    ("≠", "!="),
    ("≤", "<="),
    ("≥", ">="),
    ("‗≈≡", "="),
    // === Symbols ===
    ("℅", "c/o"),
    ("₧", "Pts"),
    ("™", "tm"),
    ("№", "No"),
    ("Ч", "4"),
    ("‰", "%"),
    ("∙•", "*"),
    ("‹", "<"),
    ("›", ">"),
    ("‼", "!!"),
    ("⁄∕", "/"),
    ("⅞", "7/8"),
    ("⅝", "5/8"),
    ("⅜", "3/8"),
    ("⅛", "1/8"),
    ("Љљ", "Ab"),
    ("Юю", "IO"),
    ("ﬁﬂ", "fi"),
    ("зЗ", "3"),
    ("£", "(pounds)"),
    ("₤", "(lira)"),
    ("↨↕↓↑│", "|"),
    ("∞∩∫⌂⌠⌡", ""),
];

/// Multi-character sequences replaced before the per-character pass
const SEQUENCE_TABLE: &[(&str, &str)] = &[("ыЫ", "bl")];

/// Named entities and their plain-text replacement
const ENTITY_TABLE: &[(&str, &str)] = &[
    ("amp", "&"),
    ("lt", "<"),
    ("gt", ">"),
    ("quot", "\""),
    ("apos", "'"),
    ("nbsp", " "),
    ("hellip", "..."),
    ("ndash", "-"),
    ("mdash", "-"),
    ("tilde", "~"),
    ("lsquo", "'"),
    ("rsquo", "'"),
    ("sbquo", "'"),
    ("lsaquo", "'"),
    ("rsaquo", "'"),
    ("ldquo", "\""),
    ("rdquo", "\""),
    ("bdquo", "\""),
    ("bull", "*"),
    ("dagger", "+"),
    ("Dagger", "#"),
    ("trade", "tm"),
    ("euro", "euro"),
    ("fnof", "f"),
    ("OElig", "OE"),
    ("oelig", "oe"),
    ("Scaron", "S"),
    ("scaron", "s"),
    ("Yuml", "Y"),
];

static CHAR_MAP: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for (chars, replacement) in CHAR_TABLE {
        for c in chars.chars() {
            // First listing wins for characters that appear twice
            map.entry(c).or_insert(*replacement);
        }
    }
    map
});

static ENTITY_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ENTITY_TABLE.iter().copied().collect());

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

static ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);").unwrap());

/// Fold look-alike characters to ASCII, decode entities and strip HTML tags
///
/// Entities are decoded before tags are stripped, so escaped markup such as
/// `&lt;b&gt;` is removed too. A second decoding pass resolves entities that
/// were themselves escaped (`&amp;amp;`).
pub fn clean(text: &str) -> String {
    let folded = transliterate(text);
    let decoded = decode_entities(&folded);
    let stripped = TAG_RE.replace_all(&decoded, "");
    decode_entities(&stripped)
}

/// Replace every character found in the look-alike table
pub fn transliterate(text: &str) -> String {
    let mut text = text.to_string();
    for (sequence, replacement) in SEQUENCE_TABLE {
        if text.contains(sequence) {
            text = text.replace(sequence, replacement);
        }
    }

    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match CHAR_MAP.get(&c) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(c),
        }
    }
    out
}

/// Decode named and numeric entities; unknown entities are left as-is
pub fn decode_entities(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let decoded = match body.strip_prefix('#') {
                Some(number) => decode_numeric(number).map(|c| match CHAR_MAP.get(&c) {
                    Some(replacement) => replacement.to_string(),
                    None => c.to_string(),
                }),
                None => ENTITY_MAP.get(body).map(|s| s.to_string()),
            };
            decoded.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_numeric(number: &str) -> Option<char> {
    let code = match number.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => number.parse::<u32>().ok()?,
    };
    char::from_u32(code)
}
