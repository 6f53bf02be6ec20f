pub mod config;
pub mod error;

pub use config::FiasConfig;
pub use error::{BackendError, FiasError, Result};
