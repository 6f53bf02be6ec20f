pub mod fallback;
pub mod formatter;
pub mod models;
pub mod plan;
pub mod service;


pub use fallback::{CascadeOutcome, CascadeStep, FallbackCascade, HouseConstraints, Resolution};
pub use formatter::ResultFormatter;
pub use models::{AddressHit, GeoPoint, HierarchyLevel, SearchResponse};
pub use plan::{
    BoolQuery, Clause, ClauseRole, ClauseTag, Contributor, Field, Operator, PlanBuilder, Query, QueryPlan,
    QueryPlanBuilder,
};
pub use service::{AddressSearchService, AddressSearcher};
