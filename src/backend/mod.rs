mod elastic;
#[cfg(test)]
pub(crate) mod memory;

pub use elastic::{render_plan, ElasticBackend};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::error::BackendError;
use crate::search::{GeoPoint, QueryPlan};


/// Executes query plans against an address index. Implementations block; async callers
/// off-load them to the blocking pool.
pub trait SearchBackend: Send + Sync {
    fn execute(&self, plan: &QueryPlan, limit: usize) -> Result<Vec<RawHit>, BackendError>;

    fn name(&self) -> &str;
}


/// One document as returned by the backend, before formatting.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawHit {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_score", default)]
    pub score: Option<f32>,
    #[serde(rename = "_source", default)]
    pub source: AddressDocument,
}


/// Stored address entry. Numeric-looking fields arrive as strings or numbers depending on the
/// indexer, so they are read leniently.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AddressDocument {
    pub level: Option<String>,
    pub name_norm: Option<String>,
    pub name_exact: Option<String>,
    pub full_norm: Option<String>,
    pub type_norm: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub region_code: Option<String>,
    #[serde(deserialize_with = "lenient_geo")]
    pub geo: Option<GeoPoint>,
    #[serde(deserialize_with = "string_or_number")]
    pub house_number: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub korpus: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub stroenie: Option<String>,
    pub house_type: Option<String>,
    #[serde(deserialize_with = "number_or_string")]
    pub road_km: Option<i64>,
    pub street_guid: Option<String>,
    pub settlement_guid: Option<String>,
    pub city_guid: Option<String>,
    pub name_lem: Option<String>,
}

/// Fields requested from the index for every hit.
pub const SOURCE_FIELDS: &[&str] = &[
    "level",
    "name_norm",
    "name_exact",
    "full_norm",
    "type_norm",
    "region_code",
    "geo",
    "house_number",
    "korpus",
    "stroenie",
    "house_type",
    "road_km",
    "street_guid",
    "settlement_guid",
    "city_guid",
    "name_lem",
];

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_or_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_geo<'de, D>(deserializer: D) -> Result<Option<GeoPoint>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let coordinate = |key: &str| match value.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(match (coordinate("lat"), coordinate("lon")) {
        (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
        _ => None,
    })
}
