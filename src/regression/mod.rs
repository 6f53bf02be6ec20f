pub mod models;
pub mod runner;

pub use models::{CaseError, CaseResult, RegressionCase, RegressionReport};
pub use runner::RegressionRunner;
