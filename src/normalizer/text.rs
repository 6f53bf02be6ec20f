use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::utils::collapse_whitespace;

lazy_static! {
    static ref DASHES: Regex = Regex::new(r"[\u{2010}-\u{2015}\u{2212}]").expect("valid dash regex");

    static ref ORDINAL_SUFFIXES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(\d+)-й\b").expect("valid ordinal regex"), "${1} й"),
        (Regex::new(r"(\d+)-я(\s|$)").expect("valid ordinal regex"), "${1} я${2}"),
        (Regex::new(r"(\d+)-е\b").expect("valid ordinal regex"), "${1} е"),
        (Regex::new(r"(\d+)-го\b").expect("valid ordinal regex"), "${1} го"),
        (Regex::new(r"(\d+)-му\b").expect("valid ordinal regex"), "${1} му"),
    ];

    static ref COMMA: Regex = Regex::new(r",\s*").expect("valid comma regex");

    // Dots closing a token; dots inside a token ("п.г.т") are kept.
    static ref TRAILING_DOTS: Regex = Regex::new(r"\.+(\s|$)").expect("valid dot regex");

    static ref PUNCTUATION: Regex = Regex::new(r"[^\w\s\-/.]").expect("valid punctuation regex");
}

/// Canonicalizes a raw address fragment: NFC, lower case, `ё` folded to `е`,
/// ordinal suffixes split off, punctuation other than `-`, `/` and inner dots removed.
pub fn normalize_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let mut text: String = raw.nfc().collect::<String>().to_lowercase().replace('ё', "е");
    text = DASHES.replace_all(&text, "-").into_owned();

    for (pattern, replacement) in ORDINAL_SUFFIXES.iter() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }

    text = COMMA.replace_all(&text, " ").into_owned();
    text = TRAILING_DOTS.replace_all(&text, " ${1}").into_owned();
    text = PUNCTUATION.replace_all(&text, " ").into_owned();
    text = TRAILING_DOTS.replace_all(&text, " ${1}").into_owned();

    collapse_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   \t"), "");
        assert_eq!(normalize_text("!!!"), "");
    }

    #[test]
    fn test_case_and_yo_folding() {
        assert_eq!(normalize_text("Савёловский ВОКЗАЛ"), "савеловский вокзал");
    }

    #[test]
    fn test_nfc_composes_decomposed_yo() {
        // "е" followed by a combining diaeresis
        let decomposed = "Е\u{0308}лки";
        assert_eq!(normalize_text(decomposed), "елки");
    }

    #[test]
    fn test_ordinal_split() {
        assert_eq!(normalize_text("3-й Новомихалковский пр-д"), "3 й новомихалковский пр-д");
        assert_eq!(normalize_text("1-я Тверская-Ямская"), "1 я тверская-ямская");
        assert_eq!(normalize_text("2-го Интернационала"), "2 го интернационала");
    }

    #[test]
    fn test_ordinal_keeps_adjective_endings() {
        // "-ямская" is not an ordinal suffix
        assert_eq!(normalize_text("5-ямская"), "5-ямская");
    }

    #[test]
    fn test_commas_and_trailing_dots() {
        assert_eq!(normalize_text("ул. Тверская, 1к1с1"), "ул тверская 1к1с1");
        assert_eq!(normalize_text("Варшавское ш., 37с5"), "варшавское ш 37с5");
    }

    #[test]
    fn test_inner_dots_kept() {
        assert_eq!(normalize_text("п.г.т. Малаховка"), "п.г.т малаховка");
    }

    #[test]
    fn test_punctuation_stripped_but_slash_and_hyphen_kept() {
        assert_eq!(normalize_text("д. 16а/1 (корп. 2)"), "д 16а/1 корп 2");
        assert_eq!(normalize_text("пр-кт «Мира»"), "пр-кт мира");
    }

    #[test]
    fn test_unicode_dashes() {
        assert_eq!(normalize_text("65–й километр"), "65 й километр");
    }

    #[test]
    fn test_idempotent() {
        for raw in ["ул. Тверская, 1к1с1", "МКАД, 65-й километр, вл2А", "п.г.т. Малаховка"] {
            let once = normalize_text(raw);
            assert_eq!(normalize_text(&once), once);
        }
    }
}
