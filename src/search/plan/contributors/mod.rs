mod admin;
mod boosts;
mod house;
mod region;
mod text;

pub use admin::{admin_units, short_query};
pub use boosts::{ring_road, type_boosts};
pub use house::{
    house_combinations, house_filters, house_number_filter, qualifier_filter, street_phrase, stroenie_boosts,
    stroenie_filter, tolerant_korpus_filter,
};
pub use region::region;
pub use text::{
    abbreviation_round_trip, core_text, expanded_phrase, full_phrase, morph_variants, token_coverage, type_position,
};

use super::builder::Contributor;


/// Default pipeline, in execution order.
pub const STANDARD_CONTRIBUTORS: &[(&str, Contributor)] = &[
    ("core_text", core_text),
    ("type_position", type_position),
    ("full_phrase", full_phrase),
    ("abbreviation_round_trip", abbreviation_round_trip),
    ("token_coverage", token_coverage),
    ("expanded_phrase", expanded_phrase),
    ("short_query", short_query),
    ("admin_units", admin_units),
    ("region", region),
    ("house_filters", house_filters),
    ("street_phrase", street_phrase),
    ("house_combinations", house_combinations),
    ("type_boosts", type_boosts),
    ("ring_road", ring_road),
    ("stroenie_boosts", stroenie_boosts),
    ("morph_variants", morph_variants),
];
