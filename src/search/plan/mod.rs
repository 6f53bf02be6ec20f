mod builder;
pub mod contributors;
mod query;
pub mod variants;

pub use builder::{Contributor, PlanBuilder, QueryPlanBuilder};
pub use query::{BoolQuery, Clause, ClauseRole, ClauseTag, Field, Operator, Query, QueryPlan};
