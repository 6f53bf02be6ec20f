use crate::normalizer::{NormalizedQuery, RegionHint};
use crate::search::plan::builder::PlanBuilder;
use crate::search::plan::query::{ClauseTag, Field, Query};

const DISTRICT_WORDS: &[&str] = &["административный", "округа", "округ"];


fn in_region(code: &str) -> Query {
    Query::term(Field::RegionCode, code)
}

/// One region strategy, picked by hint precedence. Strict hints filter; the rest only boost.
pub fn region(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let Some(hint) = query.primary_region() else {
        return;
    };
    let code = hint.region_code();

    if !hint.is_strict() {
        builder.should(40.0, ClauseTag::Region, in_region(code));
        return;
    }

    builder.filter(ClauseTag::Region, in_region(code));
    builder.should(100.0, ClauseTag::Region, in_region(code));

    let text = query.search_text();
    let tokens = query.body_tokens();
    match hint {
        RegionHint::Moscow => {
            builder.should(
                50.0,
                ClauseTag::Region,
                Query::all_of(vec![in_region(code), Query::term(Field::TypeNorm, "вн/тер-г")]),
            );
            if tokens.iter().any(|t| DISTRICT_WORDS.contains(t)) {
                builder.should(50.0, ClauseTag::Text, Query::phrase(Field::FullNorm, text));
            }
        }
        RegionHint::Balashikha => {
            builder.should(50.0, ClauseTag::Region, Query::all_of(vec![in_region(code), Query::level("city")]));
            if let Some(city) = hint.city_name() {
                builder.should(200.0, ClauseTag::Region, Query::phrase(Field::FullNorm, city));
                builder.should(
                    150.0,
                    ClauseTag::Region,
                    Query::all_of(vec![
                        Query::phrase(Field::FullNorm, city),
                        Query::terms(Field::Level, ["street", "settlement"]),
                    ]),
                );
            }
        }
        RegionHint::MoscowRegion => {
            builder.should(50.0, ClauseTag::Region, Query::all_of(vec![in_region(code), Query::level("city")]));
        }
        RegionHint::LeningradRegion => {
            builder.should(50.0, ClauseTag::Region, Query::all_of(vec![in_region(code), Query::level("city")]));
            let hierarchical = tokens
                .iter()
                .any(|t| *t == "гп" || *t == "пос" || t.starts_with("г/"));
            if hierarchical {
                builder.should(50.0, ClauseTag::Text, Query::phrase(Field::FullNorm, text));
                builder.should(40.0, ClauseTag::Text, Query::phrase(Field::NameNorm, text));
            }
        }
        RegionHint::Yekaterinburg | RegionHint::Sverdlovsk => {}
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::{normalize_query, AliasTable};
    use crate::search::plan::query::QueryPlan;

    fn run(raw: &str) -> QueryPlan {
        let mut builder = PlanBuilder::new(AliasTable::standard());
        region(&normalize_query(raw), &mut builder);
        builder.finish()
    }

    fn region_filter(plan: &QueryPlan) -> Option<String> {
        plan.filters().find_map(|c| match &c.query {
            Query::Term { field: Field::RegionCode, value } => Some(value.clone()),
            _ => None,
        })
    }

    #[test]
    fn test_no_hint_no_clauses() {
        assert!(run("ул Тверская 7").is_empty());
    }

    #[test]
    fn test_moscow_strict_filter() {
        let plan = run("г. Москва, ул. Тверская, д. 7");
        assert_eq!(region_filter(&plan).as_deref(), Some("77"));
        assert!(plan.shoulds().any(|c| c.weight == 100.0));
    }

    #[test]
    fn test_moscow_wins_over_region() {
        let plan = run("Москва, Московская область");
        assert_eq!(region_filter(&plan).as_deref(), Some("77"));
        assert_eq!(plan.filters().count(), 1);
    }

    #[test]
    fn test_balashikha_city_boosts() {
        let plan = run("Балашиха, ул Ленина");
        assert_eq!(region_filter(&plan).as_deref(), Some("50"));
        assert!(plan.shoulds().any(|c| c.weight == 200.0));
        assert!(plan.shoulds().any(|c| c.weight == 150.0));
    }

    #[test]
    fn test_leningrad_hierarchy_phrase() {
        let plan = run("Ленинградская область, Токсовское гп, Токсово гп");
        assert_eq!(region_filter(&plan).as_deref(), Some("47"));
        assert!(plan.shoulds().any(|c| c.weight == 40.0 && matches!(c.query, Query::Phrase { field: Field::NameNorm, .. })));
    }

    #[test]
    fn test_sverdlovsk_is_soft() {
        let plan = run("Свердловская обл, г Березовский");
        assert_eq!(region_filter(&plan), None);
        assert_eq!(plan.shoulds().count(), 1);
        assert_eq!(plan.clauses[0].weight, 40.0);
    }
}
