use crate::normalizer::{ExtractionRule, NormalizedQuery};
use crate::search::plan::builder::PlanBuilder;
use crate::search::plan::query::{ClauseTag, Field, Query};

const RING_ROADS: &[&str] = &["мкад", "кад"];


fn type_is(type_norm: &str) -> Query {
    Query::term(Field::TypeNorm, type_norm)
}

fn type_with_name(type_norm: &str, text: &str) -> Query {
    Query::all_of(vec![type_is(type_norm), Query::phrase(Field::NameNorm, text)])
}

/// Boosts for street and settlement types the query names explicitly.
pub fn type_boosts(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let tokens = query.body_tokens();
    let has = |token: &str| tokens.contains(&token);
    let text = query.search_text();

    if has("пл") || tokens.iter().any(|t| t.contains("вокзал")) {
        builder.should(35.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["пл"]));
        builder.should(50.0, ClauseTag::Boost, type_with_name("пл", text));
        builder.should(45.0, ClauseTag::Text, Query::phrase(Field::NameNorm, text));
    }
    if has("ш") {
        builder.should(35.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["ш"]));
        builder.should(45.0, ClauseTag::Boost, type_with_name("ш", text));
        builder.should(40.0, ClauseTag::Text, Query::phrase(Field::NameNorm, text));
    }
    if has("снт") {
        builder.should(12.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["снт", "тер"]));
    }
    if has("пр-кт") {
        builder.should(20.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["пр-кт"]));
        builder.should(35.0, ClauseTag::Boost, type_with_name("пр-кт", text));
    }
    if has("пос") {
        builder.should(25.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["пос"]));
        builder.should(40.0, ClauseTag::Boost, type_with_name("пос", text));
        builder.should(35.0, ClauseTag::Text, Query::phrase(Field::NameNorm, text));
    }
    if has("рп") {
        builder.should(6.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["рп"]));
    }
    if has("д") {
        builder.should(3.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["д"]));
    }
    if has("село") {
        builder.should(3.0, ClauseTag::Boost, Query::terms(Field::TypeNorm, ["с"]));
    }
}

/// Ring-road addresses: road name, ownership entries and the kilometer marker.
pub fn ring_road(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let on_ring_road = query.body_tokens().iter().any(|t| RING_ROADS.contains(t));
    if !on_ring_road {
        return;
    }

    let vladenie = query.extraction_rule == ExtractionRule::Vladenie
        || query.normalized_full.split_whitespace().any(|t| t.contains("вл"));

    builder.should(20.0, ClauseTag::Boost, Query::phrase(Field::NameNorm, "мкад"));
    if vladenie {
        builder.should(
            30.0,
            ClauseTag::Boost,
            Query::all_of(vec![
                Query::phrase(Field::NameNorm, "мкад"),
                Query::term(Field::HouseType, "владение"),
            ]),
        );
        builder.should(10.0, ClauseTag::Boost, Query::term(Field::HouseType, "владение"));
    }
    if let Some(km) = query.kilometer {
        let km = i64::from(km);
        builder.should(20.0, ClauseTag::Boost, Query::term(Field::RoadKm, km.to_string()));
        builder.should(8.0, ClauseTag::Boost, Query::range(Field::RoadKm, km - 1, km + 1));
    }
    builder.should(15.0, ClauseTag::Boost, Query::phrase(Field::FullNorm, "мкад"));
}
