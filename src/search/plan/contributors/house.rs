use crate::normalizer::NormalizedQuery;
use crate::search::plan::builder::PlanBuilder;
use crate::search::plan::query::{BoolQuery, ClauseTag, Field, Query};
use crate::search::plan::variants::{
    combined_korpus_variants, korpus_variants, street_phrase as extract_street_phrase, street_phrase_variants,
    stroenie_in_korpus_variants, stroenie_variants,
};


/// `N` itself or a slash sibling `N/*`.
pub fn house_number_filter(house: &str) -> Query {
    Query::any_of(vec![
        Query::term(Field::HouseNumber, house),
        Query::wildcard(Field::HouseNumber, format!("{}/*", house)),
    ])
}

/// Korpus/stroenie constraint for the primary plan, accepting either storage convention.
pub fn qualifier_filter(korpus: Option<&str>, stroenie: Option<&str>) -> Option<Query> {
    match (korpus, stroenie) {
        (Some(k), Some(s)) => Some(Query::any_of(vec![
            Query::terms(Field::Korpus, combined_korpus_variants(k, s)),
            Query::all_of(vec![
                Query::terms(Field::Korpus, korpus_variants(k)),
                Query::terms(Field::Stroenie, stroenie_variants(s)),
            ]),
        ])),
        (Some(k), None) => Some(Query::terms(Field::Korpus, korpus_variants(k))),
        (None, Some(s)) => Some(stroenie_filter(s)),
        (None, None) => None,
    }
}

/// Korpus constraint that also tolerates stroenie spellings in the korpus field.
pub fn tolerant_korpus_filter(korpus: &str) -> Query {
    Query::any_of(vec![
        Query::terms(Field::Korpus, korpus_variants(korpus)),
        Query::terms(Field::Korpus, stroenie_variants(korpus)),
    ])
}

/// Stroenie stored as stroenie, or written into the korpus field.
pub fn stroenie_filter(stroenie: &str) -> Query {
    Query::any_of(vec![
        Query::terms(Field::Stroenie, stroenie_variants(stroenie)),
        Query::terms(Field::Korpus, stroenie_variants(stroenie)),
        Query::terms(Field::Korpus, stroenie_in_korpus_variants(stroenie)),
    ])
}

/// Structural house constraints: level, house-number class, korpus/stroenie.
pub fn house_filters(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    if !query.has_house_components() {
        return;
    }

    builder.filter(ClauseTag::Level, Query::level("house"));
    if let Some(house) = &query.house_number {
        builder.filter(ClauseTag::HouseNumber, house_number_filter(house));
    }
    if let Some(qualifier) = qualifier_filter(query.korpus.as_deref(), query.stroenie.as_deref()) {
        builder.filter(ClauseTag::HouseQualifier, qualifier);
    }
}

/// Keeps results on the street the query names: `"<name> <type>"` phrases and spellings.
pub fn street_phrase(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let table = builder.table();
    let Some(phrase) = extract_street_phrase(&query.typed_body, table) else {
        return;
    };

    for variant in street_phrase_variants(&phrase, table) {
        builder.should(
            30.0,
            ClauseTag::Text,
            Query::any_of(vec![
                Query::phrase(Field::FullNorm, variant.as_str()),
                Query::phrase(Field::NameNorm, variant),
            ]),
        );
    }
    builder.should(
        80.0,
        ClauseTag::Text,
        Query::all_of(vec![Query::level("house"), Query::phrase(Field::NameNorm, phrase)]),
    );
}

/// Exact and near house matches ranked against each other.
pub fn house_combinations(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let Some(house) = query.house_number.as_deref() else {
        return;
    };
    let text = query.search_text();
    let street = || Query::match_all_words(Field::FullNorm, text);

    let mut combo = vec![Query::term(Field::HouseNumber, house)];
    if let Some(korpus) = &query.korpus {
        combo.push(Query::terms(Field::Korpus, korpus_variants(korpus)));
    }
    if let Some(stroenie) = &query.stroenie {
        combo.push(Query::terms(Field::Stroenie, stroenie_variants(stroenie)));
    }
    combo.push(street());
    builder.should(50.0, ClauseTag::HouseNumber, Query::all_of(combo));
    builder.should(65.0, ClauseTag::HouseNumber, Query::all_of(vec![Query::level("house"), street()]));

    if query.korpus.is_none() && query.stroenie.is_none() {
        let exact = BoolQuery {
            must: vec![Query::term(Field::HouseNumber, house), street()],
            ..BoolQuery::default()
        }
        .with_must_not(Query::exists(Field::Stroenie))
        .with_must_not(Query::exists(Field::Korpus));
        builder.should(100.0, ClauseTag::HouseNumber, exact.into_query());
    }

    if let Some(stroenie) = &query.stroenie {
        let variants = stroenie_variants(stroenie);
        builder.should(
            60.0,
            ClauseTag::HouseNumber,
            Query::all_of(vec![
                Query::term(Field::HouseNumber, house),
                Query::terms(Field::Korpus, variants.clone()),
                street(),
            ]),
        );
        builder.should(
            60.0,
            ClauseTag::HouseNumber,
            Query::all_of(vec![
                Query::term(Field::HouseNumber, house),
                Query::terms(Field::Stroenie, variants),
                street(),
            ]),
        );
        builder.should(
            70.0,
            ClauseTag::HouseNumber,
            Query::all_of(vec![
                Query::phrase(Field::FullNorm, format!("дом {} стр {}", house, stroenie)),
                street(),
            ]),
        );
    }

    builder.should(
        35.0,
        ClauseTag::HouseNumber,
        Query::all_of(vec![Query::level("house"), Query::phrase(Field::FullNorm, text)]),
    );
    builder.should(30.0, ClauseTag::HouseNumber, Query::wildcard(Field::HouseNumber, format!("{}/*", house)));

    if let Some((base, _)) = house.split_once('/') {
        builder.should(25.0, ClauseTag::HouseNumber, Query::wildcard(Field::HouseNumber, format!("{}*", base)));
        builder.should(20.0, ClauseTag::HouseNumber, Query::term(Field::HouseNumber, base));
    }

    builder.should(40.0, ClauseTag::Text, Query::phrase(Field::FullNorm, query.normalized_full.as_str()));
}

/// Building-type and spelling boosts for a stroenie.
pub fn stroenie_boosts(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let Some(stroenie) = &query.stroenie else {
        return;
    };
    builder.should(15.0, ClauseTag::Boost, Query::term(Field::HouseType, "строение"));
    builder.should(25.0, ClauseTag::Boost, Query::phrase(Field::FullNorm, format!("стр {}", stroenie)));
    builder.should(30.0, ClauseTag::Boost, Query::phrase(Field::FullNorm, format!("с{}", stroenie)));
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{normalize_query, AliasTable};
    use crate::search::plan::query::QueryPlan;

    fn run(contributor: fn(&NormalizedQuery, &mut PlanBuilder<'_>), raw: &str) -> QueryPlan {
        let mut builder = PlanBuilder::new(AliasTable::standard());
        contributor(&normalize_query(raw), &mut builder);
        builder.finish()
    }

    #[test]
    fn test_no_house_no_filters() {
        assert!(run(house_filters, "ул Тверская").is_empty());
    }

    #[test]
    fn test_full_house_filters() {
        let plan = run(house_filters, "ул. Тверская, 1к1с1");
        assert!(plan.has_filter(ClauseTag::Level));
        assert!(plan.has_filter(ClauseTag::HouseNumber));
        assert!(plan.has_filter(ClauseTag::HouseQualifier));
        assert_eq!(plan.shoulds().count(), 0);
    }

    #[test]
    fn test_lone_vladenie_filters_without_house_number() {
        let plan = run(house_filters, "МКАД, 65-й километр, вл2А");
        assert!(plan.has_filter(ClauseTag::Level));
        assert!(!plan.has_filter(ClauseTag::HouseNumber));
        assert!(plan.has_filter(ClauseTag::HouseQualifier));
    }

    #[test]
    fn test_stroenie_filter_accepts_korpus_field() {
        match stroenie_filter("5") {
            Query::Bool(b) => {
                assert_eq!(b.should.len(), 3);
                assert!(matches!(&b.should[1], Query::Terms { field: Field::Korpus, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_qualifier_filter_both_conventions() {
        match qualifier_filter(Some("1"), Some("2")) {
            Some(Query::Bool(b)) => {
                assert_eq!(b.should.len(), 2);
                assert_eq!(b.minimum_should_match, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(qualifier_filter(None, None).is_none());
    }

    #[test]
    fn test_street_phrase_variants_are_should() {
        let plan = run(street_phrase, "ул. Тверская, 7");
        assert!(plan.shoulds().filter(|c| c.weight == 30.0).count() >= 2);
        assert!(plan.shoulds().any(|c| c.weight == 80.0));
        assert_eq!(plan.filters().count(), 0);
    }

    #[test]
    fn test_exact_house_bonus_only_without_qualifiers() {
        let plan = run(house_combinations, "ул. Тверская, 7");
        assert!(plan.shoulds().any(|c| c.weight == 100.0));

        let plan = run(house_combinations, "ул. Тверская, 7к2");
        assert!(plan.shoulds().all(|c| c.weight != 100.0));
    }

    #[test]
    fn test_slash_house_siblings() {
        let plan = run(house_combinations, "ул Ленина 16а/1");
        assert!(plan.shoulds().any(|c| matches!(
            &c.query,
            Query::Term { field: Field::HouseNumber, value } if value == "16а"
        )));
        assert!(plan.shoulds().any(|c| c.weight == 25.0));
    }

    #[test]
    fn test_stroenie_combinations() {
        let plan = run(house_combinations, "Варшавское ш., 37с5");
        assert_eq!(plan.shoulds().filter(|c| c.weight == 60.0).count(), 2);
        assert!(plan.shoulds().any(|c| c.weight == 70.0));
    }

    #[test]
    fn test_stroenie_boosts() {
        assert!(run(stroenie_boosts, "ул Ленина 5").is_empty());
        let plan = run(stroenie_boosts, "Варшавское ш., 37с5");
        assert!(plan.shoulds().any(|c| matches!(
            &c.query,
            Query::Phrase { text, .. } if text == "с5"
        )));
    }
}
