pub mod backend;
pub mod core;
pub mod normalizer;
pub mod regression;
pub mod search;
pub mod utils;

pub use utils::{collapse_whitespace, safe_truncate_ellipsis};


pub use backend::{ElasticBackend, RawHit, SearchBackend};
pub use crate::core::config::FiasConfig;
pub use crate::core::error::{BackendError, FiasError, Result};
pub use normalizer::{normalize_query, NormalizedQuery, RegionHint};
pub use regression::{RegressionCase, RegressionReport, RegressionRunner};
pub use search::{AddressHit, AddressSearchService, QueryPlan, QueryPlanBuilder};


pub const DEFAULT_ES_PORT: u16 = 9200;


pub const DEFAULT_ES_INDEX: &str = "gar_addresses";


pub const DEFAULT_SEARCH_LIMIT: usize = 10;


pub const MAX_SEARCH_LIMIT: usize = 100;
