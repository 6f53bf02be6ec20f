use crate::normalizer::{AliasTable, NormalizedQuery};
use crate::search::plan::builder::PlanBuilder;
use crate::search::plan::query::{ClauseTag, Field, Operator, Query};

const NAME_AND_FULL: &[Field] = &[Field::NameNorm, Field::FullNorm];

// Type values administrative entities carry in the index.
const ADMIN_TYPES: &[&str] = &["р-н", "вн/тер-г", "вн.тер.г.", "м/о"];

// Spellings an administrative unit is substituted with when generating variants.
const ADMIN_SUBSTITUTES: &[&str] = &["район", "р-н", "вн/тер-г", "м/о"];

const ADMIN_WORDS: &[&str] = &["округ", "округа", "административный"];

// Region-level units never narrow a query down to administrative entities.
const REGION_LEVEL_TYPES: &[&str] = &["обл", "край", "респ", "ао", "аобл"];


fn is_admin_token(token: &str, table: &AliasTable) -> bool {
    ADMIN_WORDS.contains(&token)
        || ADMIN_SUBSTITUTES.contains(&token)
        || (table.is_administrative(token) && !REGION_LEVEL_TYPES.contains(&token))
}

/// Districts and municipal units: substitution variants, type boosts and, without a house,
/// a filter down to administrative entities.
pub fn admin_units(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let table = builder.table();
    let tokens = query.body_tokens();
    let admin_tokens: Vec<&str> = tokens.iter().copied().filter(|t| is_admin_token(t, table)).collect();
    if admin_tokens.is_empty() {
        return;
    }

    let reduced: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !admin_tokens.contains(t) && *t != "г" && *t != "город")
        .collect();
    if !reduced.is_empty() {
        let reduced = reduced.join(" ");
        builder.should(2.0, ClauseTag::Text, Query::multi_match(NAME_AND_FULL, reduced.as_str(), Operator::And, false));
        builder.should(1.0, ClauseTag::Text, Query::multi_match(NAME_AND_FULL, reduced, Operator::Or, true));
    }

    for substitute in ADMIN_SUBSTITUTES {
        let variant = tokens
            .iter()
            .map(|t| if ADMIN_SUBSTITUTES.contains(t) { *substitute } else { *t })
            .collect::<Vec<_>>()
            .join(" ");
        builder.should(5.0, ClauseTag::Text, Query::phrase(Field::FullNorm, variant));
    }

    let mut types: Vec<String> = ADMIN_TYPES.iter().map(|t| t.to_string()).collect();
    for token in &admin_tokens {
        if table.is_administrative(token) && !types.iter().any(|t| t == token) {
            types.push(token.to_string());
        }
    }

    builder.should(300.0, ClauseTag::AdminType, Query::terms(Field::TypeNorm, types.clone()));
    builder.should(
        400.0,
        ClauseTag::AdminType,
        Query::all_of(vec![Query::level("city"), Query::terms(Field::TypeNorm, types.clone())]),
    );
    if query.house_number.is_none() {
        builder.filter(ClauseTag::AdminType, Query::terms(Field::TypeNorm, types));
    }
}

/// One- and two-word queries without a house most likely name a city or a district.
pub fn short_query(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let text = query.search_text();
    if query.house_number.is_some() || text.split_whitespace().count() > 2 {
        return;
    }

    builder.should(8.0, ClauseTag::Boost, Query::level("city"));
    builder.should(
        20.0,
        ClauseTag::Boost,
        Query::all_of(vec![Query::level("city"), Query::phrase(Field::NameNorm, text)]),
    );
    builder.should(2.0, ClauseTag::Boost, Query::level("region"));
    builder.should(3.0, ClauseTag::Boost, Query::term(Field::TypeNorm, "вн/тер-г"));
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_query;
    use crate::search::plan::query::QueryPlan;

    fn run(contributor: fn(&NormalizedQuery, &mut PlanBuilder<'_>), raw: &str) -> QueryPlan {
        let mut builder = PlanBuilder::new(AliasTable::standard());
        contributor(&normalize_query(raw), &mut builder);
        builder.finish()
    }

    #[test]
    fn test_district_query_filters_to_admin_types() {
        let plan = run(admin_units, "Тверской район");
        assert!(plan.has_filter(ClauseTag::AdminType));
        assert!(plan.shoulds().any(|c| c.weight == 400.0));
        assert!(plan.shoulds().any(|c| matches!(
            &c.query,
            Query::Phrase { text, .. } if text == "тверской вн/тер-г"
        )));
    }

    #[test]
    fn test_admin_with_house_only_boosts() {
        let plan = run(admin_units, "Тверской район, д 5");
        assert!(!plan.has_filter(ClauseTag::AdminType));
        assert!(plan.shoulds().any(|c| c.weight == 300.0));
    }

    #[test]
    fn test_region_level_unit_is_not_admin() {
        assert!(run(admin_units, "Тульская область").is_empty());
        assert!(run(admin_units, "ул Ленина").is_empty());
    }

    #[test]
    fn test_short_query_boosts_city() {
        let plan = run(short_query, "Балашиха");
        assert!(plan.shoulds().any(|c| c.weight == 8.0));
        assert!(plan.shoulds().any(|c| c.weight == 20.0));
    }

    #[test]
    fn test_short_query_skipped_with_house_or_long_text() {
        assert!(run(short_query, "ул Ленина 5").is_empty());
        assert!(run(short_query, "проспект мира северное чертаново").is_empty());
    }
}
