use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::utils::collapse_whitespace;


/// Region flags recognised from literal mentions in the query. Declaration order is precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegionHint {
    Moscow,
    Balashikha,
    MoscowRegion,
    LeningradRegion,
    Yekaterinburg,
    Sverdlovsk,
}

lazy_static! {
    static ref HINT_PATTERNS: Vec<(RegionHint, Regex)> = RegionHint::iter()
        .map(|hint| {
            let pattern = match hint {
                RegionHint::Moscow => r"\bмосква\b",
                RegionHint::Balashikha => r"\bбалашиха\b",
                RegionHint::MoscowRegion => r"\bмосковская\s+обл(?:асть)?\b",
                RegionHint::LeningradRegion => r"\bленинградская\s+обл(?:асть)?\b",
                RegionHint::Yekaterinburg => r"\bекатеринбург\b",
                RegionHint::Sverdlovsk => r"\bсвердловск\w*",
            };
            (hint, Regex::new(pattern).expect("valid region hint regex"))
        })
        .collect();

    static ref CAPITAL: Regex = Regex::new(r"(?:\b(?:г|город)\s+)?\bмосква\b").expect("valid capital regex");
}

impl RegionHint {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn region_code(&self) -> &'static str {
        match self {
            RegionHint::Moscow => "77",
            RegionHint::Balashikha | RegionHint::MoscowRegion => "50",
            RegionHint::LeningradRegion => "47",
            RegionHint::Yekaterinburg | RegionHint::Sverdlovsk => "66",
        }
    }

    /// Unambiguous hints become a hard region filter; the rest only boost.
    pub fn is_strict(&self) -> bool {
        !matches!(self, RegionHint::Sverdlovsk)
    }

    /// Settlement name to reward in the full name when the hint is a city inside a region.
    pub fn city_name(&self) -> Option<&'static str> {
        match self {
            RegionHint::Balashikha => Some("балашиха"),
            RegionHint::Yekaterinburg => Some("екатеринбург"),
            _ => None,
        }
    }
}

/// Hints present in already normalized text, in precedence order.
pub fn detect_region_hints(normalized: &str) -> Vec<RegionHint> {
    HINT_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(normalized))
        .map(|(hint, _)| *hint)
        .collect()
}

/// Removes the capital's name (with an optional "г"/"город" prefix). Keeps the input when
/// nothing else would remain.
pub fn strip_capital(normalized: &str) -> String {
    let stripped = collapse_whitespace(&CAPITAL.replace_all(normalized, " "));
    if stripped.is_empty() {
        normalized.to_string()
    } else {
        stripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::text::normalize_text;

    #[test]
    fn test_detects_moscow() {
        let hints = detect_region_hints(&normalize_text("Москва, ул. Тверская 1"));
        assert_eq!(hints, vec![RegionHint::Moscow]);
        assert_eq!(hints[0].region_code(), "77");
        assert!(hints[0].is_strict());
    }

    #[test]
    fn test_precedence_order() {
        let hints = detect_region_hints(&normalize_text("Московская область, Балашиха, ул Советская"));
        assert_eq!(hints, vec![RegionHint::Balashikha, RegionHint::MoscowRegion]);
    }

    #[test]
    fn test_sverdlovsk_is_soft() {
        let hints = detect_region_hints(&normalize_text("Свердловская обл., Ревда"));
        assert_eq!(hints, vec![RegionHint::Sverdlovsk]);
        assert!(!hints[0].is_strict());
    }

    #[test]
    fn test_no_partial_matches() {
        assert!(detect_region_hints("москворечье ул").is_empty());
        assert!(detect_region_hints("").is_empty());
    }

    #[test]
    fn test_strip_capital() {
        assert_eq!(strip_capital("г москва ул тверская 1"), "ул тверская 1");
        assert_eq!(strip_capital("москва тверская"), "тверская");
        assert_eq!(strip_capital("москва"), "москва");
        assert_eq!(strip_capital("москворечье ул"), "москворечье ул");
    }

    #[test]
    fn test_hint_names() {
        assert_eq!(RegionHint::MoscowRegion.as_str(), "moscow_region");
    }
}
