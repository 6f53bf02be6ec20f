use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::backend::RawHit;


#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}


/// Registry level of a hit; settlements are reported as cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HierarchyLevel {
    Region,
    City,
    Street,
    House,
    Other,
}

impl HierarchyLevel {
    pub fn from_index(level: &str) -> Self {
        match level {
            "region" => Self::Region,
            "city" | "settlement" => Self::City,
            "street" => Self::Street,
            "house" => Self::House,
            _ => Self::Other,
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressHit {
    pub id: String,
    pub level: HierarchyLevel,
    pub name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub korpus: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroenie: Option<String>,

    /// Building kind tag (владение, строение, сооружение, литера).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_km: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_guid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_guid: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_norm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_norm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_norm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_lem: Option<String>,
}

impl AddressHit {
    /// Maps a raw hit as stored; `full_name` is the raw `full_norm` until the formatter runs.
    pub fn from_raw(hit: RawHit) -> Self {
        let doc = hit.source;
        let level = HierarchyLevel::from_index(doc.level.as_deref().unwrap_or_default());
        let name = doc
            .name_exact
            .clone()
            .or_else(|| doc.name_norm.clone())
            .unwrap_or_default();

        Self {
            id: hit.id,
            level,
            name,
            full_name: doc.full_norm.clone().unwrap_or_default(),
            region_code: doc.region_code,
            geo: doc.geo,
            score: hit.score,
            house_number: doc.house_number,
            korpus: doc.korpus,
            stroenie: doc.stroenie,
            house_type: doc.house_type,
            road_km: doc.road_km,
            street_guid: doc.street_guid,
            settlement_guid: doc.settlement_guid,
            city_guid: doc.city_guid,
            name_norm: doc.name_norm,
            full_norm: doc.full_norm,
            type_norm: doc.type_norm,
            name_lem: doc.name_lem,
        }
    }
}


/// One search answer as printed by the diagnostics tool.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub normalized_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    pub total: usize,
    pub results: Vec<AddressHit>,
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AddressDocument;

    #[test]
    fn test_level_mapping() {
        assert_eq!(HierarchyLevel::from_index("settlement"), HierarchyLevel::City);
        assert_eq!(HierarchyLevel::from_index("house"), HierarchyLevel::House);
        assert_eq!(HierarchyLevel::from_index("stead"), HierarchyLevel::Other);
        assert_eq!(HierarchyLevel::Street.to_string(), "street");
    }

    #[test]
    fn test_from_raw_prefers_exact_name() {
        let hit = AddressHit::from_raw(RawHit {
            id: "1".to_string(),
            score: Some(4.0),
            source: AddressDocument {
                level: Some("street".to_string()),
                name_norm: Some("тверская".to_string()),
                name_exact: Some("Тверская".to_string()),
                full_norm: Some("москва г, тверская ул".to_string()),
                ..AddressDocument::default()
            },
        });

        assert_eq!(hit.level, HierarchyLevel::Street);
        assert_eq!(hit.name, "Тверская");
        assert_eq!(hit.full_name, "москва г, тверская ул");
        assert_eq!(hit.score, Some(4.0));
    }

    #[test]
    fn test_from_raw_without_source() {
        let hit = AddressHit::from_raw(RawHit {
            id: "2".to_string(),
            score: None,
            source: AddressDocument::default(),
        });
        assert_eq!(hit.level, HierarchyLevel::Other);
        assert!(hit.name.is_empty());
        assert!(hit.full_name.is_empty());
    }
}
