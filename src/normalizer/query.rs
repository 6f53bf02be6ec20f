use serde::Serialize;
use tracing::debug;

use super::aliases::{AliasResolver, AliasTable};
use super::house::{ExtractionRule, HouseNumberExtractor};
use super::region::{detect_region_hints, strip_capital, RegionHint};
use super::text::normalize_text;


/// Everything the planner knows about one raw query. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedQuery {
    pub original: String,
    pub normalized_full: String,
    pub body_text: String,
    pub typed_body: String,
    pub house_number: Option<String>,
    pub korpus: Option<String>,
    pub stroenie: Option<String>,
    pub has_house: bool,
    pub kilometer: Option<u32>,
    pub region_hints: Vec<RegionHint>,
    pub extraction_rule: ExtractionRule,
}

impl NormalizedQuery {
    pub fn empty(original: &str) -> Self {
        Self {
            original: original.to_string(),
            normalized_full: String::new(),
            body_text: String::new(),
            typed_body: String::new(),
            house_number: None,
            korpus: None,
            stroenie: None,
            has_house: false,
            kilometer: None,
            region_hints: Vec::new(),
            extraction_rule: ExtractionRule::NoHouse,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_full.is_empty() && self.body_text.is_empty()
    }

    /// Body text, or the full normalized text when the query was nothing but a house number.
    pub fn search_text(&self) -> &str {
        if self.body_text.is_empty() {
            &self.normalized_full
        } else {
            &self.body_text
        }
    }

    /// `"<body> дом N к K с S"`, the shape house entries take in the full-name field.
    pub fn expanded_phrase(&self) -> Option<String> {
        let house = self.house_number.as_ref()?;
        let mut phrase = format!("{} дом {}", self.body_text, house);
        if let Some(korpus) = &self.korpus {
            phrase.push_str(&format!(" к {}", korpus));
        }
        if let Some(stroenie) = &self.stroenie {
            phrase.push_str(&format!(" с {}", stroenie));
        }
        Some(phrase.trim().to_string())
    }

    pub fn primary_region(&self) -> Option<RegionHint> {
        self.region_hints.first().copied()
    }

    pub fn has_house_components(&self) -> bool {
        self.house_number.is_some() || self.korpus.is_some() || self.stroenie.is_some()
    }

    pub fn body_tokens(&self) -> Vec<&str> {
        self.body_text.split_whitespace().collect()
    }
}


pub struct QueryNormalizer<'a> {
    table: &'a AliasTable,
    extractor: &'a HouseNumberExtractor,
}

impl<'a> QueryNormalizer<'a> {
    pub fn new(table: &'a AliasTable, extractor: &'a HouseNumberExtractor) -> Self {
        Self { table, extractor }
    }

    pub fn standard() -> QueryNormalizer<'static> {
        QueryNormalizer::new(AliasTable::standard(), HouseNumberExtractor::standard())
    }

    pub fn normalize(&self, raw: &str) -> NormalizedQuery {
        let normalized = normalize_text(raw);
        if normalized.is_empty() {
            return NormalizedQuery::empty(raw);
        }

        let region_hints = detect_region_hints(&normalized);
        let searchable = strip_capital(&normalized);
        let extraction = self.extractor.extract(&searchable);

        let resolver = AliasResolver::new(self.table);
        let normalized_full = resolver.resolve(&normalized);
        let typed_body = resolver.resolve(&normalize_text(&extraction.body_text));
        let body_text = move_street_type_to_tail(&typed_body, self.table).unwrap_or_else(|| typed_body.clone());

        debug!(
            "Normalized '{}': body='{}', house={:?}, korpus={:?}, stroenie={:?}, rule={:?}",
            raw, body_text, extraction.house_number, extraction.korpus, extraction.stroenie, extraction.rule
        );

        NormalizedQuery {
            original: raw.to_string(),
            normalized_full,
            body_text,
            typed_body,
            house_number: extraction.house_number,
            korpus: extraction.korpus,
            stroenie: extraction.stroenie,
            has_house: extraction.has_house,
            kilometer: extraction.kilometer,
            region_hints,
            extraction_rule: extraction.rule,
        }
    }
}

pub fn normalize_query(raw: &str) -> NormalizedQuery {
    QueryNormalizer::standard().normalize(raw)
}

/// Moves the first canonical street type to the end: `пл савеловского вокзала` →
/// `савеловского вокзала пл`. `None` when there is no type or it already ends the text.
pub fn move_street_type_to_tail(text: &str, table: &AliasTable) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let idx = tokens.iter().position(|t| table.is_street_canonical(t))?;
    if idx == tokens.len() - 1 {
        return None;
    }

    let mut reordered: Vec<&str> = Vec::with_capacity(tokens.len());
    reordered.extend_from_slice(&tokens[..idx]);
    reordered.extend_from_slice(&tokens[idx + 1..]);
    reordered.push(tokens[idx]);
    Some(reordered.join(" "))
}
