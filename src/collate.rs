/// Locale-style string collation
///
/// Report columns are compared the way a Korean-locale user expects rather
/// than by raw code units. Strings are canonically decomposed (NFD) and
/// compared in levels:
///
/// 1. primary: script group, then base characters, case folded, combining
///    marks removed
/// 2. secondary: case folded with marks (accents)
/// 3. tertiary: case, lowercase first
/// 4. raw code points, so the order is total
///
/// Script groups follow the Korean locale: spaces and punctuation, then
/// digits, then Hangul, then Han, then every other script (Latin included).
/// Hangul syllables decompose into conjoining jamo in initial/medial/final
/// order, which keeps Korean alphabetical order (`가 < 나 < 다`).
///
/// # Examples
///
/// ```
/// use program_report::collate::compare;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare("가", "나"), Ordering::Less);
/// assert_eq!(compare("apple", "Banana"), Ordering::Less);
/// assert_eq!(compare("a", "A"), Ordering::Less);
/// assert_eq!(compare("AI 강좌", "그림책"), Ordering::Greater);
/// ```

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Precomputed sort key for one string. Comparing keys is equivalent to
/// calling [`compare`] on the source strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    primary: Vec<(Script, char)>,
    secondary: Vec<char>,
    tertiary: Vec<bool>,
    raw: String,
}

impl CollationKey {
    pub fn new(text: &str) -> Self {
        let decomposed: Vec<char> = text.nfd().collect();

        let secondary: Vec<char> = decomposed
            .iter()
            .flat_map(|c| c.to_lowercase())
            .collect();
        let primary: Vec<(Script, char)> = secondary
            .iter()
            .copied()
            .filter(|c| !is_combining_mark(*c))
            .map(|c| (Script::of(c), c))
            .collect();
        let tertiary: Vec<bool> = decomposed.iter().map(|c| c.is_uppercase()).collect();

        CollationKey {
            primary,
            secondary,
            tertiary,
            raw: text.to_string(),
        }
    }
}

/// Primary-level script groups in Korean collation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Script {
    Symbol,
    Digit,
    Hangul,
    Han,
    Other,
}

impl Script {
    fn of(c: char) -> Self {
        match c {
            '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{A960}'..='\u{A97F}'
            | '\u{AC00}'..='\u{D7A3}'
            | '\u{D7B0}'..='\u{D7FF}' => Script::Hangul,
            '\u{2E80}'..='\u{2FDF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{4E00}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{3134F}' => Script::Han,
            c if c.is_numeric() => Script::Digit,
            c if c.is_alphabetic() => Script::Other,
            _ => Script::Symbol,
        }
    }
}

/// Compare two strings with the report collation.
pub fn compare(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    CollationKey::new(a).cmp(&CollationKey::new(b))
}
