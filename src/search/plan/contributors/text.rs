use crate::normalizer::{move_street_type_to_tail, NormalizedQuery};
use crate::search::plan::builder::PlanBuilder;
use crate::search::plan::query::{ClauseTag, Field, Operator, Query};
use crate::search::plan::variants::{abbreviation_variants, morph_variant, yo_variants};

const NAME_AND_FULL: &[Field] = &[Field::NameNorm, Field::FullNorm];


/// Name phrase, fuzzy name, exact name and the always-present lenient full-text clause.
pub fn core_text(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let text = query.search_text();
    if text.is_empty() {
        return;
    }

    builder.should(20.0, ClauseTag::Text, Query::phrase(Field::NameNorm, text));
    builder.should(10.0, ClauseTag::Text, Query::match_fuzzy(Field::NameNorm, text));
    builder.should(25.0, ClauseTag::Text, Query::phrase(Field::NameExact, text));
    builder.should(1.5, ClauseTag::Text, Query::match_all_words(Field::FullNorm, text));
    builder.should(2.0, ClauseTag::Text, Query::multi_match(NAME_AND_FULL, text, Operator::And, false));
    builder.should(1.0, ClauseTag::Text, Query::multi_match(NAME_AND_FULL, text, Operator::Or, true));
}

/// `ул большая дмитровка`: the name without its leading type, and with its words swapped.
pub fn type_position(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let tokens: Vec<&str> = query.typed_body.split_whitespace().collect();
    let Some(first) = tokens.first() else {
        return;
    };
    if !builder.table().is_street_canonical(first) || tokens.len() < 2 {
        return;
    }

    let name_tokens = &tokens[1..];
    let name = name_tokens.join(" ");
    builder.should(15.0, ClauseTag::Text, Query::phrase(Field::NameNorm, name.as_str()));
    builder.should(12.0, ClauseTag::Text, Query::phrase(Field::FullNorm, name.as_str()));

    match name_tokens.len() {
        2 => {
            let swapped = format!("{} {}", name_tokens[1], name_tokens[0]);
            builder.should(18.0, ClauseTag::Text, Query::phrase(Field::NameNorm, swapped.as_str()));
            builder.should(15.0, ClauseTag::Text, Query::phrase(Field::FullNorm, swapped));
        }
        n if n > 2 => {
            let mut swapped = name_tokens.to_vec();
            swapped.swap(0, n - 1);
            let swapped = swapped.join(" ");
            builder.should(16.0, ClauseTag::Text, Query::phrase(Field::NameNorm, swapped.as_str()));
            builder.should(13.0, ClauseTag::Text, Query::phrase(Field::FullNorm, swapped));
        }
        _ => {}
    }
}

/// Phrases over the full name: whole normalized input, body, type-at-tail and е/ё spellings.
pub fn full_phrase(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    if query.normalized_full.is_empty() {
        return;
    }
    let table = builder.table();
    let body = query.typed_body.as_str();

    builder.should(15.0, ClauseTag::Text, Query::phrase(Field::FullNorm, query.normalized_full.as_str()));
    if body.is_empty() {
        return;
    }
    builder.should(12.0, ClauseTag::Text, Query::phrase(Field::FullNorm, body));

    if let Some(tail) = move_street_type_to_tail(body, table) {
        builder.should(8.0, ClauseTag::Text, Query::phrase(Field::FullNorm, tail.as_str()));
        builder.should(18.0, ClauseTag::Text, Query::phrase(Field::NameNorm, tail));
    }
    if let Some(tail) = move_street_type_to_tail(&query.normalized_full, table) {
        builder.should(9.0, ClauseTag::Text, Query::phrase(Field::FullNorm, tail));
    }

    for variant in yo_variants(body).into_iter().skip(1) {
        builder.should(10.0, ClauseTag::Text, Query::phrase(Field::FullNorm, variant.as_str()));
        if let Some(tail) = move_street_type_to_tail(&variant, table) {
            builder.should(8.5, ClauseTag::Text, Query::phrase(Field::FullNorm, tail.as_str()));
            builder.should(15.0, ClauseTag::Text, Query::phrase(Field::NameNorm, tail));
        }
    }
}

/// `большая` ↔ `б`, `пром` ↔ `промышленная` and similar adjective spellings.
pub fn abbreviation_round_trip(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let table = builder.table();
    for variant in abbreviation_variants(&query.typed_body, table) {
        builder.should(8.0, ClauseTag::Text, Query::phrase(Field::NameNorm, variant.as_str()));
        builder.should(6.0, ClauseTag::Text, Query::phrase(Field::FullNorm, variant.as_str()));
        if let Some(tail) = move_street_type_to_tail(&variant, table) {
            builder.should(7.0, ClauseTag::Text, Query::phrase(Field::NameNorm, tail.as_str()));
            builder.should(5.0, ClauseTag::Text, Query::phrase(Field::FullNorm, tail));
        }
    }
}

/// Street entries containing every word in any order, with and without a leading adjective.
pub fn token_coverage(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let table = builder.table();
    let tokens = query.body_tokens();
    if tokens.len() < 2 {
        return;
    }

    let name_tokens: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !table.is_street_canonical(t))
        .collect();

    if name_tokens.is_empty() {
        return;
    }
    let (name_weight, full_weight) = if name_tokens.len() >= 2 { (4.0, 3.0) } else { (3.0, 2.0) };
    builder.should(name_weight, ClauseTag::Text, street_with_every_word(Field::NameNorm, &name_tokens));
    builder.should(full_weight, ClauseTag::Text, street_with_every_word(Field::FullNorm, &name_tokens));

    for keyword in name_tokens.iter().filter(|t| table.is_name_adjective(t)) {
        let rest: Vec<&str> = name_tokens.iter().copied().filter(|t| t != keyword).collect();
        if rest.is_empty() {
            continue;
        }
        builder.should(6.0, ClauseTag::Text, street_with_every_word(Field::NameNorm, &rest));
        builder.should(5.0, ClauseTag::Text, street_with_every_word(Field::FullNorm, &rest));
    }
}

fn street_with_every_word(field: Field, words: &[&str]) -> Query {
    let mut must = vec![Query::level("street")];
    must.extend(words.iter().map(|w| Query::Match {
        field,
        text: w.to_string(),
        operator: Operator::Or,
        fuzzy: false,
    }));
    Query::all_of(must)
}

/// `"<body> дом N к K с S"` with a little slop, as house entries spell their full name.
pub fn expanded_phrase(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let Some(phrase) = query.expanded_phrase() else {
        return;
    };
    builder.should(9.0, ClauseTag::Text, Query::phrase_slop(Field::FullNorm, phrase.as_str(), 4));

    let typed = expanded_with(&query.typed_body, query);
    if let Some(tail) = move_street_type_to_tail(&typed, builder.table()) {
        builder.should(9.5, ClauseTag::Text, Query::phrase_slop(Field::FullNorm, tail, 5));
    }
}

fn expanded_with(body: &str, query: &NormalizedQuery) -> String {
    let mut phrase = body.to_string();
    if let Some(house) = &query.house_number {
        phrase.push_str(&format!(" дом {}", house));
    }
    if let Some(korpus) = &query.korpus {
        phrase.push_str(&format!(" к {}", korpus));
    }
    if let Some(stroenie) = &query.stroenie {
        phrase.push_str(&format!(" с {}", stroenie));
    }
    phrase.trim().to_string()
}

/// Nominative rewrite of genitive names: `савеловского` → `савеловский`.
pub fn morph_variants(query: &NormalizedQuery, builder: &mut PlanBuilder<'_>) {
    let Some(variant) = morph_variant(query.search_text()) else {
        return;
    };
    builder.should(1.4, ClauseTag::Text, Query::multi_match(NAME_AND_FULL, variant.as_str(), Operator::And, false));
    builder.should(2.0, ClauseTag::Text, Query::phrase(Field::FullNorm, variant));
}
