use serde::Serialize;
use tracing::{debug, trace};

use super::table::{AliasEntry, AliasTable};

// Upper bound on rounds; tokens written by one round may form a surface for the next.
const MAX_ROUNDS: usize = 4;


#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Raw(String),
    Resolved(String),
    Consumed,
}


#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAlias {
    pub surface: String,
    pub canonical: String,
}


#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub text: String,
    pub applied: Vec<AppliedAlias>,
}


pub struct AliasResolver<'a> {
    table: &'a AliasTable,
}

impl<'a> AliasResolver<'a> {
    pub fn new(table: &'a AliasTable) -> Self {
        Self { table }
    }

    pub fn resolve(&self, text: &str) -> String {
        self.resolve_detailed(text).text
    }

    /// Rewrites type tokens to canonical form. Rounds repeat until the text stops changing,
    /// so the output is a fixed point of this function.
    pub fn resolve_detailed(&self, text: &str) -> Resolution {
        let mut resolution = self.resolve_round(text);
        for _ in 1..MAX_ROUNDS {
            let next = self.resolve_round(&resolution.text);
            if next.text == resolution.text {
                return resolution;
            }
            for alias in next.applied {
                record(&mut resolution.applied, &alias.surface, &alias.canonical);
            }
            resolution.text = next.text;
        }

        debug!("Alias resolution did not settle after {} rounds: '{}'", MAX_ROUNDS, resolution.text);
        resolution
    }

    fn resolve_round(&self, text: &str) -> Resolution {
        let text = text.trim();
        if text.is_empty() {
            return Resolution::default();
        }

        if let Some(canonical) = self.table.phrase_rules().first_match(text) {
            let mut applied = Vec::new();
            record(&mut applied, text, canonical);
            return Resolution {
                text: canonical.to_string(),
                applied,
            };
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let reserved = self.reserved_tokens(&tokens);
        let mut applied = Vec::new();

        let mut slots: Vec<Slot> = tokens
            .iter()
            .zip(reserved.iter())
            .map(|(token, reservation)| {
                if reservation.is_none() {
                    if let Some(canonical) = self.table.token_rules().first_match(token) {
                        record(&mut applied, token, canonical);
                        return Slot::Resolved(canonical.to_string());
                    }
                }
                Slot::Raw(token.to_string())
            })
            .collect();

        // Street types first. A street token inside another category's multi-token
        // surface ("ж/д пл") is left for that surface.
        for entry in self.table.multi_token_pass(true) {
            if apply_entry(&mut slots, entry) {
                record(&mut applied, &entry.surface, entry.canonical);
            }
        }
        self.apply_single(&mut slots, true, |idx| reserved[idx] == Some(false), &mut applied);

        for entry in self.table.multi_token_pass(false) {
            if apply_entry(&mut slots, entry) {
                record(&mut applied, &entry.surface, entry.canonical);
            }
        }
        self.apply_single(&mut slots, false, |_| false, &mut applied);

        let text = slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Raw(s) | Slot::Resolved(s) => Some(s),
                Slot::Consumed => None,
            })
            .collect::<Vec<_>>()
            .join(" ");

        trace!("Aliases resolved: {} substitutions -> '{}'", applied.len(), text);
        Resolution { text, applied }
    }

    // Tokens inside a multi-token surface ("с пос", "ж/д ст") are kept away from token rules.
    // `Some(true)` marks a street-type surface, `Some(false)` any other category.
    fn reserved_tokens(&self, tokens: &[&str]) -> Vec<Option<bool>> {
        let mut reserved = vec![None; tokens.len()];
        for entry in self.table.multi_token_entries() {
            let parts = &entry.parts;
            if parts.len() > tokens.len() {
                continue;
            }
            for start in 0..=tokens.len() - parts.len() {
                let window = &tokens[start..start + parts.len()];
                if window.iter().zip(parts.iter()).all(|(token, part)| *token == part.as_str()) {
                    for slot in reserved[start..start + parts.len()].iter_mut() {
                        if *slot != Some(false) {
                            *slot = Some(entry.is_street_type());
                        }
                    }
                }
            }
        }
        reserved
    }

    fn apply_single(
        &self,
        slots: &mut [Slot],
        street: bool,
        skip: impl Fn(usize) -> bool,
        applied: &mut Vec<AppliedAlias>,
    ) {
        for (idx, slot) in slots.iter_mut().enumerate() {
            let Slot::Raw(token) = slot else { continue };
            if skip(idx) {
                continue;
            }
            if let Some(entry) = self.table.single_token_alias(street, token) {
                record(applied, &entry.surface, entry.canonical);
                *slot = Slot::Resolved(entry.canonical.to_string());
            }
        }
    }
}

fn apply_entry(slots: &mut [Slot], entry: &AliasEntry) -> bool {
    let width = entry.parts.len();
    if width == 0 || width > slots.len() {
        return false;
    }

    let mut fired = false;
    let mut i = 0;
    while i + width <= slots.len() {
        let matches = slots[i..i + width].iter().zip(entry.parts.iter()).all(|(slot, part)| match slot {
            Slot::Raw(s) => s == part,
            _ => false,
        });

        if matches {
            slots[i] = Slot::Resolved(entry.canonical.to_string());
            for slot in slots[i + 1..i + width].iter_mut() {
                *slot = Slot::Consumed;
            }
            fired = true;
            i += width;
        } else {
            i += 1;
        }
    }

    fired
}

// Identity rewrites are not substitutions.
fn record(applied: &mut Vec<AppliedAlias>, surface: &str, canonical: &str) {
    if surface == canonical {
        return;
    }
    if !applied.iter().any(|a| a.surface == surface && a.canonical == canonical) {
        applied.push(AppliedAlias {
            surface: surface.to_string(),
            canonical: canonical.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::text::normalize_text;

    fn resolve(raw: &str) -> String {
        AliasResolver::new(AliasTable::standard()).resolve(&normalize_text(raw))
    }

    #[test]
    fn test_street_types() {
        assert_eq!(resolve("улица Тверская"), "ул тверская");
        assert_eq!(resolve("Проспект Мира"), "пр-кт мира");
        assert_eq!(resolve("Чистопрудный бульвар"), "чистопрудный б-р");
        assert_eq!(resolve("Варшавское шоссе"), "варшавское ш");
        assert_eq!(resolve("пр. д Серебрякова"), "пр-д серебрякова");
    }

    #[test]
    fn test_whole_phrase_rules() {
        assert_eq!(resolve("железнодорожная станция"), "ж/д ст");
        assert_eq!(resolve("ж/д платформа"), "ж/д пл");
        assert_eq!(resolve("Муниципальный округ"), "м/о");
    }

    #[test]
    fn test_multi_token_surface_in_context() {
        assert_eq!(resolve("железнодорожная станция Подлипки"), "ж/д ст подлипки");
        assert_eq!(resolve("жилой массив Северный"), "ж/м северный");
    }

    #[test]
    fn test_single_letter_adjectives() {
        assert_eq!(resolve("б Тульская"), "большая тульская");
        assert_eq!(resolve("М. Бронная"), "малая бронная");
        assert_eq!(resolve("с Калитниковская"), "средняя калитниковская");
    }

    #[test]
    fn test_s_before_pos_is_settlement_unit() {
        assert_eq!(resolve("с пос Рязановское"), "с/пос рязановское");
        assert_eq!(resolve("с.пос. Рязановское"), "с/пос рязановское");
    }

    #[test]
    fn test_railway_station_token_not_broken_by_adjective_rule() {
        assert_eq!(resolve("ж/д ст Лось"), "ж/д ст лось");
        assert_eq!(resolve("станция Лось"), "ж/д ст лось");
    }

    #[test]
    fn test_settlements_and_admin_units() {
        assert_eq!(resolve("п.г.т. Малаховка"), "пгт малаховка");
        assert_eq!(resolve("деревня Ивановка"), "д ивановка");
        assert_eq!(resolve("село Ям"), "село ям");
        assert_eq!(resolve("городское поселение Кокошкино"), "г/п кокошкино");
        assert_eq!(resolve("вн.тер.г. Тропарево-Никулино"), "вн/тер-г тропарево-никулино");
    }

    #[test]
    fn test_no_partial_word_replacement() {
        assert_eq!(resolve("Тверская-Ямская"), "тверская-ямская");
        assert_eq!(resolve("улицкая"), "улицкая");
        assert_eq!(resolve("Шоссейная"), "шоссейная");
    }

    #[test]
    fn test_unknown_tokens_unchanged() {
        assert_eq!(resolve("абвгд эюя"), "абвгд эюя");
        assert_eq!(resolve(""), "");
    }

    #[test]
    fn test_territory_partnership_survives_second_pass() {
        assert_eq!(resolve("в/г снт Березка"), "тер снт березка");
        assert_eq!(resolve("тер. СНТ Березка"), "тер снт березка");
        assert_eq!(resolve("военный городок дачное некоммерческое партнерство"), "тер днп");
    }

    #[test]
    fn test_street_type_inside_railway_surface() {
        assert_eq!(resolve("ж/д пл Перловская"), "ж/д пл перловская");
        assert_eq!(resolve("пл Перловская"), "пл перловская");
    }

    #[test]
    fn test_idempotent_for_every_surface_pair() {
        let table = AliasTable::standard();
        let resolver = AliasResolver::new(table);
        let mut surfaces: Vec<&str> = table.entries().iter().map(|e| e.surface.as_str()).collect();
        surfaces.sort_unstable();
        surfaces.dedup();

        let mut failures = Vec::new();
        for first in &surfaces {
            for second in &surfaces {
                let once = resolver.resolve(&normalize_text(&format!("{} {}", first, second)));
                let twice = resolver.resolve(&once);
                if once != twice {
                    failures.push(format!("'{} {}' -> '{}' -> '{}'", first, second, once, twice));
                }
            }
        }
        assert!(failures.is_empty(), "{} pairs not idempotent: {:?}", failures.len(), &failures[..failures.len().min(10)]);
    }

    #[test]
    fn test_idempotent_on_addresses() {
        let resolver = AliasResolver::new(AliasTable::standard());
        let inputs = [
            "ул. Тверская",
            "пл. Савёловского Вокзала",
            "с пос Рязановское",
            "ж д станция Лось",
            "б Тульская улица",
            "кп курортный Репино",
            "курортный поселок Репино с",
            "внутригородская территория г. Щербинка",
            "бульвар в",
        ];
        for raw in inputs {
            let once = resolver.resolve(&normalize_text(raw));
            assert_eq!(resolver.resolve(&once), once, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_applied_aliases_are_recorded() {
        let resolver = AliasResolver::new(AliasTable::standard());
        let resolution = resolver.resolve_detailed("улица тверская");
        assert_eq!(
            resolution.applied,
            vec![AppliedAlias {
                surface: "улица".to_string(),
                canonical: "ул".to_string()
            }]
        );
    }
}
