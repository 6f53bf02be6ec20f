use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use strum::IntoStaticStr;

use crate::normalizer::aliases::AliasTable;
use crate::utils::collapse_whitespace;

// Streets whose proper name starts with a number.
pub const NAMED_NUMBER_STREETS: &[&str] = &[
    "8 марта", "1 мая", "9 января", "7 ноября", "3 декабря", "5 августа",
    "2 апреля", "6 марта", "4 июля", "10 октября", "12 декабря", "15 марта",
    "20 лет октября", "25 лет октября", "30 лет победы", "40 лет победы",
    "50 лет октября", "60 лет октября", "70 лет октября", "100 лет октября",
];

const KORPUS_ALIAS: &str = r"(?:корпус|корп|кор|к)";
const STROENIE_ALIAS: &str = r"(?:строение|стр|с|владение|влад|вл)";
const HOUSE_ALIAS: &str = r"(?:дом|д)";
const NUMBER: &str = r"\d+[а-я]?";

lazy_static! {
    static ref NAMED_STREET: Regex = {
        let names = NAMED_NUMBER_STREETS
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?:^|\s)({})(?:\s|$)", names)).expect("valid named street regex")
    };

    static ref COMPACT: Regex =
        Regex::new(r"(\d)\s*(корпус|корп|кор|строение|стр|владение|влад|вл|к|с)\s*(\d)").expect("valid compact regex");

    static ref LETTER_DIGIT: Regex = Regex::new(r"([а-я])(\d+)(\s|$)").expect("valid letter-digit regex");

    static ref SLASH_COMPOUND: Regex = Regex::new(r"(\d+[а-я]?)\s*/\s*(\d+)").expect("valid slash regex");

    static ref KM_BEFORE: Regex =
        Regex::new(r"\b(\d+)\s*-?\s*(?:й\s+)?(?:км|километр[а-я]*)\b").expect("valid km regex");

    static ref KM_AFTER: Regex =
        Regex::new(r"\b(?:км|километр[а-я]*)\s*(\d+)\b").expect("valid km regex");

    static ref PRIMARY_KS: Regex = Regex::new(&format!(
        r"\b(?:{h}\s*)?(?P<house>{n}(?:/{n})?)\b(?:\s*{k}\s*(?P<korpus>{n})\b)?(?:\s*{s}\s*(?P<stroenie>{n})\b)?",
        h = HOUSE_ALIAS, n = NUMBER, k = KORPUS_ALIAS, s = STROENIE_ALIAS,
    ))
    .expect("valid house regex");

    static ref PRIMARY_SK: Regex = Regex::new(&format!(
        r"\b(?:{h}\s*)?(?P<house>{n}(?:/{n})?)\b(?:\s*{s}\s*(?P<stroenie>{n})\b)?(?:\s*{k}\s*(?P<korpus>{n})\b)?",
        h = HOUSE_ALIAS, n = NUMBER, k = KORPUS_ALIAS, s = STROENIE_ALIAS,
    ))
    .expect("valid house regex");

    static ref QUALIFIER_BEFORE: Regex =
        Regex::new(r"(?:^|\s)(?:корпус|корп|кор|к|строение|стр|с|владение|влад|вл)\s*$").expect("valid qualifier regex");

    static ref ORDINAL_AFTER: Regex = Regex::new(r"^\s+(?:й|я|е|го|му)(?:\s|$)").expect("valid ordinal regex");

    static ref VLADENIE: Regex =
        Regex::new(&format!(r"(?:^|\s)(?:владение|влад|вл)\s*({})\b", NUMBER)).expect("valid vladenie regex");

    static ref LONE_STROENIE: Regex =
        Regex::new(&format!(r"(?:^|\s)(?:строение|стр|с)\s*({})\b", NUMBER)).expect("valid stroenie regex");

    static ref LONE_KORPUS: Regex =
        Regex::new(&format!(r"(?:^|\s){}\s*({})\b", KORPUS_ALIAS, NUMBER)).expect("valid korpus regex");

    static ref STANDARD_EXTRACTOR: HouseNumberExtractor = HouseNumberExtractor::new(AliasTable::standard());
}

// Words that may follow "<type> <number>" when the number really is a house.
const HOUSE_CONTINUATIONS: &[&str] = &[
    "к", "корп", "корпус", "кор", "с", "стр", "строение", "вл", "влад", "владение", "д", "дом",
];


/// Which rule decided the extraction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExtractionRule {
    NoHouse,
    NamedStreet,
    OrdinalStreet,
    TypeBeforeNumber,
    Primary,
    Vladenie,
    LoneStroenie,
    LoneKorpus,
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HouseExtraction {
    pub body_text: String,
    pub house_number: Option<String>,
    pub korpus: Option<String>,
    pub stroenie: Option<String>,
    pub has_house: bool,
    pub kilometer: Option<u32>,
    pub rule: ExtractionRule,
}

impl HouseExtraction {
    fn body_only(body: &str, rule: ExtractionRule) -> Self {
        Self {
            body_text: collapse_whitespace(body),
            house_number: None,
            korpus: None,
            stroenie: None,
            has_house: false,
            kilometer: None,
            rule,
        }
    }
}


pub struct HouseNumberExtractor {
    ordinal_street: Regex,
    type_before_number: Regex,
}

impl HouseNumberExtractor {
    pub fn new(table: &AliasTable) -> Self {
        let types = table.street_type_alternation();
        Self {
            ordinal_street: Regex::new(&format!(
                r"\b\d+\s*(?:й|я|е)\s+[\w-]+\s+(?:{})(?:\s|$)",
                types
            ))
            .expect("valid ordinal street regex"),
            type_before_number: Regex::new(&format!(
                r"(?:^|\s)(?:{})\s+(\d+[а-я]?)\s+([\w./-]+)",
                types
            ))
            .expect("valid type guard regex"),
        }
    }

    pub fn standard() -> &'static HouseNumberExtractor {
        &STANDARD_EXTRACTOR
    }

    /// Splits normalized text into the address body and house components.
    /// Expects output of `normalize_text`, before alias resolution.
    pub fn extract(&self, text: &str) -> HouseExtraction {
        let text = fold_latin_qualifiers(&collapse_whitespace(text));
        let kilometer = detect_kilometer(&text);

        let mut extraction = self.extract_guarded(&text);
        extraction.kilometer = kilometer;
        extraction
    }

    fn extract_guarded(&self, text: &str) -> HouseExtraction {
        if text.is_empty() {
            return HouseExtraction::body_only("", ExtractionRule::NoHouse);
        }

        if let Some(name) = NAMED_STREET.captures_iter(text).last().and_then(|c| c.get(1)) {
            return extract_after(text, name.end(), ExtractionRule::NamedStreet);
        }

        // The ordinal belongs to the street name; a trailing number is not trusted either.
        if self.ordinal_street.is_match(text) {
            return HouseExtraction::body_only(text, ExtractionRule::OrdinalStreet);
        }

        let prepared = prepare(text);
        let masked = mask_kilometers(&prepared);

        if let Some(caps) = self.type_before_number.captures(&masked) {
            let next = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            if !HOUSE_CONTINUATIONS.contains(&next) {
                return HouseExtraction::body_only(&prepared, ExtractionRule::TypeBeforeNumber);
            }
        }

        extract_components(&prepared, &masked)
    }
}

/// Shorthand for `HouseNumberExtractor::standard().extract(text)`.
pub fn extract_house(text: &str) -> HouseExtraction {
    HouseNumberExtractor::standard().extract(text)
}

// Latin "k"/"c" typed next to digits ("1k2c3").
fn fold_latin_qualifiers(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            if token.chars().any(|c| c.is_ascii_digit()) {
                token.replace('k', "к").replace('c', "с")
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// Protected prefix stays in the body; only the tail is searched for a house.
fn extract_after(text: &str, split: usize, rule: ExtractionRule) -> HouseExtraction {
    let (head, tail) = text.split_at(split);
    let prepared_tail = prepare(tail);
    let masked_tail = mask_kilometers(&prepared_tail);
    let tail_extraction = extract_components(&prepared_tail, &masked_tail);

    HouseExtraction {
        body_text: collapse_whitespace(&format!("{} {}", head, tail_extraction.body_text)),
        rule,
        ..tail_extraction
    }
}

fn prepare(text: &str) -> String {
    let mut prepared = text.to_string();
    for _ in 0..4 {
        let next = COMPACT.replace_all(&prepared, "${1} ${2} ${3}").into_owned();
        if next == prepared {
            break;
        }
        prepared = next;
    }

    prepared = LETTER_DIGIT.replace_all(&prepared, "${1} ${2}${3}").into_owned();
    prepared = SLASH_COMPOUND.replace_all(&prepared, "${1}/${2}").into_owned();
    collapse_whitespace(&prepared)
}

fn detect_kilometer(text: &str) -> Option<u32> {
    KM_BEFORE
        .captures(text)
        .or_else(|| KM_AFTER.captures(text))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

// Digits of kilometer markers become '#', keeping byte offsets aligned with the input.
fn mask_kilometers(text: &str) -> String {
    let mask = |caps: &Captures| caps[0].replace(|c: char| c.is_ascii_digit(), "#");
    let masked = KM_BEFORE.replace_all(text, mask).into_owned();
    KM_AFTER.replace_all(&masked, mask).into_owned()
}

fn remove_span(text: &str, start: usize, end: usize) -> String {
    collapse_whitespace(&format!("{} {}", &text[..start], &text[end..]))
}

fn extract_components(prepared: &str, masked: &str) -> HouseExtraction {
    let mut best: Option<Captures> = None;
    for pattern in [&*PRIMARY_KS, &*PRIMARY_SK] {
        for caps in pattern.captures_iter(masked) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            if QUALIFIER_BEFORE.is_match(&masked[..whole.start()])
                || ORDINAL_AFTER.is_match(&masked[whole.end()..])
            {
                continue;
            }

            let better = match best.as_ref().and_then(|b| b.get(0)) {
                Some(current) => (whole.end(), whole.len()) > (current.end(), current.len()),
                None => true,
            };
            if better {
                best = Some(caps);
            }
        }
    }

    if let Some(caps) = best {
        if let Some(whole) = caps.get(0) {
            let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());
            return HouseExtraction {
                body_text: remove_span(prepared, whole.start(), whole.end()),
                house_number: group("house"),
                korpus: group("korpus"),
                stroenie: group("stroenie"),
                has_house: true,
                kilometer: None,
                rule: ExtractionRule::Primary,
            };
        }
    }

    let fallbacks: [(&Regex, ExtractionRule); 3] = [
        (&*VLADENIE, ExtractionRule::Vladenie),
        (&*LONE_STROENIE, ExtractionRule::LoneStroenie),
        (&*LONE_KORPUS, ExtractionRule::LoneKorpus),
    ];
    for (pattern, rule) in fallbacks {
        if let Some(caps) = pattern.captures_iter(masked).last() {
            if let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) {
                let value = Some(value.as_str().to_string());
                let (korpus, stroenie) = match rule {
                    ExtractionRule::LoneKorpus => (value, None),
                    _ => (None, value),
                };
                return HouseExtraction {
                    body_text: remove_span(prepared, whole.start(), whole.end()),
                    house_number: None,
                    korpus,
                    stroenie,
                    has_house: true,
                    kilometer: None,
                    rule,
                };
            }
        }
    }

    HouseExtraction::body_only(prepared, ExtractionRule::NoHouse)
}
