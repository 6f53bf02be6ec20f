pub mod aliases;
pub mod house;
pub mod query;
pub mod region;
pub mod text;

pub use aliases::{resolve_aliases, AliasResolver, AliasTable};
pub use house::{extract_house, ExtractionRule, HouseExtraction, HouseNumberExtractor};
pub use query::{move_street_type_to_tail, normalize_query, NormalizedQuery, QueryNormalizer};
pub use region::RegionHint;
pub use text::normalize_text;
