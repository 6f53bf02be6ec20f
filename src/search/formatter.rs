use std::collections::HashSet;

use tracing::debug;

use super::models::AddressHit;
use crate::backend::RawHit;
use crate::normalizer::AliasTable;

/// City-level type tokens of stored names; street and administrative types come from the alias table.
const CITY_TYPE_TOKENS: &[&str] = &["г", "мо"];

/// Settlement types whose segment keeps its own name even when it repeats the previous one.
const SETTLEMENT_TYPES: &[&str] = &["рп", "п", "с", "д", "ст", "х", "кв-л", "мкр", "тер"];


/// Turns raw backend hits into address records with a cleaned display name.
pub struct ResultFormatter<'a> {
    table: &'a AliasTable,
}

impl<'a> ResultFormatter<'a> {
    pub fn new(table: &'a AliasTable) -> Self {
        Self { table }
    }

    pub fn standard() -> ResultFormatter<'static> {
        ResultFormatter::new(AliasTable::standard())
    }

    pub fn format(&self, hits: Vec<RawHit>) -> Vec<AddressHit> {
        let formatted: Vec<AddressHit> = hits
            .into_iter()
            .map(|hit| {
                let mut address = AddressHit::from_raw(hit);
                address.full_name = self.beautify_full_name(&address.full_name);
                address
            })
            .collect();
        debug!("Formatted {} hits", formatted.len());
        formatted
    }

    fn is_type_token(&self, word: &str) -> bool {
        let folded = word.replace('ё', "е");
        CITY_TYPE_TOKENS.contains(&word)
            || self.table.is_street_canonical(&folded)
            || self.table.is_administrative(&folded)
    }

    /// Drops a segment's leading word when the previous segment already named it, e.g.
    /// `балашиха г, балашиха ленина ул` → `балашиха г, ленина ул`. A segment whose second word
    /// is a type keeps its name; a segment that would end up empty or a bare type is kept whole.
    pub fn beautify_full_name(&self, full_name: &str) -> String {
        let parts: Vec<&str> = full_name.split(',').map(str::trim).collect();
        if parts.len() <= 1 {
            return full_name.trim().to_string();
        }

        let mut cleaned: Vec<String> = Vec::with_capacity(parts.len());
        let mut previous_words: HashSet<String> = HashSet::new();

        for (idx, part) in parts.iter().enumerate() {
            let words: Vec<&str> = part.split_whitespace().collect();
            let mut kept: &[&str] = &words;

            if idx > 0 {
                if let Some(first) = words.first() {
                    let names_itself = words
                        .get(1)
                        .is_some_and(|w| self.is_type_token(w) || SETTLEMENT_TYPES.contains(w));
                    if previous_words.contains(*first) && !names_itself {
                        kept = &words[1..];
                    }
                }
            }

            let mut segment = kept.join(" ");
            if segment.is_empty() || self.is_type_token(&segment) {
                segment = words.join(" ");
            }

            previous_words = segment
                .split_whitespace()
                .filter(|w| !self.is_type_token(w))
                .map(str::to_string)
                .collect();
            cleaned.push(segment);
        }

        cleaned.retain(|s| !s.is_empty());
        cleaned.join(", ")
    }
}
