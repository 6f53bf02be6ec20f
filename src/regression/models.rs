use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::core::error::Result;


/// A query and the full name its first hit must carry; no expectation means no hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionCase {
    #[serde(default)]
    pub id: String,
    pub query: String,
    #[serde(default, alias = "expected_answer")]
    pub expected: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CaseFile {
    Wrapped { tests: Vec<RegressionCase> },
    Plain(Vec<RegressionCase>),
}

impl RegressionCase {
    pub fn new(id: impl Into<String>, query: impl Into<String>, expected: Option<&str>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            expected: expected.map(str::to_string),
        }
    }

    /// Accepts a bare array or `{"tests": [...]}`. Cases without an id are numbered.
    pub fn parse_all(json: &str) -> Result<Vec<RegressionCase>> {
        let mut cases = match serde_json::from_str(json)? {
            CaseFile::Wrapped { tests } => tests,
            CaseFile::Plain(cases) => cases,
        };
        for (idx, case) in cases.iter_mut().enumerate() {
            if case.id.is_empty() {
                case.id = (idx + 1).to_string();
            }
        }
        Ok(cases)
    }

    pub fn load_all(path: impl AsRef<Path>) -> Result<Vec<RegressionCase>> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| crate::FiasError::Config(format!("cannot read {}: {}", path.as_ref().display(), e)))?;
        Self::parse_all(&json)
    }

    pub fn expects_nothing(&self) -> bool {
        self.expected.as_deref().is_none_or(|e| e.trim().is_empty())
    }

    pub fn is_satisfied_by(&self, actual: &str) -> bool {
        match self.expected.as_deref() {
            Some(expected) if !expected.trim().is_empty() => actual.trim() == expected.trim(),
            _ => actual.trim().is_empty(),
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CaseError {
    Timeout,
    Search,
    Panicked,
}


#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub id: String,
    pub query: String,
    pub expected: Option<String>,
    pub actual: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CaseError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub elapsed_ms: u64,
}

impl CaseResult {
    pub fn judged(case: RegressionCase, actual: String, elapsed_ms: u64) -> Self {
        Self {
            is_correct: case.is_satisfied_by(&actual),
            id: case.id,
            query: case.query,
            expected: case.expected,
            actual,
            error: None,
            error_message: None,
            elapsed_ms,
        }
    }

    /// Sentinel record for a case that produced no answer.
    pub fn failed(case: RegressionCase, error: CaseError, message: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            id: case.id,
            query: case.query,
            expected: case.expected,
            actual: String::new(),
            is_correct: false,
            error: Some(error),
            error_message: Some(message.into()),
            elapsed_ms,
        }
    }
}


#[derive(Debug, Clone, Serialize)]
pub struct RegressionReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub timeouts: usize,
    pub accuracy: f64,
    pub results: Vec<CaseResult>,
}

impl RegressionReport {
    pub fn new(started_at: DateTime<Utc>, results: Vec<CaseResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.is_correct).count();
        let timeouts = results.iter().filter(|r| r.error == Some(CaseError::Timeout)).count();
        Self {
            started_at,
            finished_at: Utc::now(),
            total,
            passed,
            failed: total - passed,
            timeouts,
            accuracy: if total == 0 { 0.0 } else { passed as f64 / total as f64 },
            results,
        }
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.results.iter().filter(|r| !r.is_correct)
    }
}
