use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::{RawHit, SearchBackend, SOURCE_FIELDS};
use crate::core::config::FiasConfig;
use crate::core::error::{BackendError, Result};
use crate::search::{Clause, Query, QueryPlan};
use crate::utils::safe_truncate_ellipsis;

const INITIAL_RETRY_DELAY_MS: u64 = 100;

const MAX_RETRY_DELAY_MS: u64 = 2000;

const LOGGED_BODY_CHARS: usize = 2000;


#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}


/// Elasticsearch `_search` over the configured address index.
pub struct ElasticBackend {
    client: Client,
    search_url: Url,
    username: Option<String>,
    password: Option<String>,
    max_retries: u32,
}

impl ElasticBackend {
    /// Builds a blocking client. Call outside of an async context.
    pub fn new(config: &FiasConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        let search_url = config.search_url()?;

        info!("ElasticBackend created for {}", search_url);

        Ok(Self {
            client,
            search_url,
            username: config.es_username.clone(),
            password: config.es_password.clone(),
            max_retries: config.es_max_retries.max(1),
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    fn send(&self, body: &Value) -> std::result::Result<Vec<RawHit>, BackendError> {
        let mut request = self.client.post(self.search_url.clone()).json(body);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(BackendError::status(status.as_u16(), safe_truncate_ellipsis(&text, 500)));
        }

        let parsed: SearchResponse = response
            .json()
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(parsed.hits.hits)
    }
}

impl SearchBackend for ElasticBackend {
    fn execute(&self, plan: &QueryPlan, limit: usize) -> std::result::Result<Vec<RawHit>, BackendError> {
        let body = render_plan(plan, limit);
        debug!("ES query: {}", safe_truncate_ellipsis(&body.to_string(), LOGGED_BODY_CHARS));

        let mut delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS);
        let mut attempt = 1;
        loop {
            match self.send(&body) {
                Ok(hits) => {
                    debug!("ES returned {} hits (attempt {})", hits.len(), attempt);
                    return Ok(hits);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    warn!("ES request failed (attempt {}), retrying: {}", attempt, e);
                    std::thread::sleep(delay);
                    delay = (delay * 2).min(Duration::from_millis(MAX_RETRY_DELAY_MS));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        "elasticsearch"
    }
}


/// Renders a plan as an Elasticsearch request body.
pub fn render_plan(plan: &QueryPlan, limit: usize) -> Value {
    let render_role = |clauses: Vec<&Clause>, scored: bool| -> Vec<Value> {
        clauses
            .into_iter()
            .map(|c| render_query(&c.query, scored.then_some(c.weight)))
            .collect()
    };

    let mut bool_query = Map::new();
    let musts = render_role(plan.musts().collect(), true);
    let shoulds = render_role(plan.shoulds().collect(), true);
    let filters = render_role(plan.filters().collect(), false);

    if !musts.is_empty() {
        bool_query.insert("must".into(), Value::Array(musts));
    }
    if !filters.is_empty() {
        bool_query.insert("filter".into(), Value::Array(filters));
    }
    if !shoulds.is_empty() {
        bool_query.insert("should".into(), Value::Array(shoulds));
        bool_query.insert("minimum_should_match".into(), json!(plan.minimum_should_match));
    }

    json!({
        "size": limit,
        "query": {"bool": Value::Object(bool_query)},
        "_source": SOURCE_FIELDS,
    })
}

/// Text queries take the boost directly; predicates get a constant score so term frequency
/// never leaks into the ranking.
fn render_query(query: &Query, boost: Option<f32>) -> Value {
    match query {
        Query::Phrase { field, text, slop } => {
            let mut params = Map::new();
            params.insert("query".into(), json!(text));
            if *slop > 0 {
                params.insert("slop".into(), json!(slop));
            }
            insert_boost(&mut params, boost);
            json!({"match_phrase": {field.as_str(): params}})
        }
        Query::Match { field, text, operator, fuzzy } => {
            let mut params = Map::new();
            params.insert("query".into(), json!(text));
            params.insert("operator".into(), json!(operator.as_str()));
            if *fuzzy {
                params.insert("fuzziness".into(), json!("AUTO"));
            }
            insert_boost(&mut params, boost);
            json!({"match": {field.as_str(): params}})
        }
        Query::MultiMatch { fields, text, operator, fuzzy } => {
            let mut params = Map::new();
            params.insert("query".into(), json!(text));
            params.insert("fields".into(), json!(fields.iter().map(|f| f.as_str()).collect::<Vec<_>>()));
            params.insert("type".into(), json!("best_fields"));
            params.insert("operator".into(), json!(operator.as_str()));
            if *fuzzy {
                params.insert("fuzziness".into(), json!("AUTO"));
            }
            insert_boost(&mut params, boost);
            json!({ "multi_match": params })
        }
        _ => {
            let predicate = render_predicate(query);
            match boost {
                Some(boost) => json!({"constant_score": {"filter": predicate, "boost": boost}}),
                None => predicate,
            }
        }
    }
}

fn render_predicate(query: &Query) -> Value {
    match query {
        Query::Term { field, value } => json!({"term": {field.as_str(): value}}),
        Query::Terms { field, values } => json!({"terms": {field.as_str(): values}}),
        Query::Wildcard { field, pattern } => json!({"wildcard": {field.as_str(): {"value": pattern}}}),
        Query::Range { field, gte, lte } => json!({"range": {field.as_str(): {"gte": gte, "lte": lte}}}),
        Query::Exists { field } => json!({"exists": {"field": field.as_str()}}),
        Query::Bool(b) => {
            let render_all = |queries: &[Query]| -> Vec<Value> { queries.iter().map(|q| render_query(q, None)).collect() };
            let mut body = Map::new();
            for (key, queries) in [("must", &b.must), ("should", &b.should), ("filter", &b.filter), ("must_not", &b.must_not)] {
                if !queries.is_empty() {
                    body.insert(key.into(), Value::Array(render_all(queries.as_slice())));
                }
            }
            if !b.should.is_empty() && b.minimum_should_match > 0 {
                body.insert("minimum_should_match".into(), json!(b.minimum_should_match));
            }
            json!({ "bool": body })
        }
        Query::Phrase { .. } | Query::Match { .. } | Query::MultiMatch { .. } => render_query(query, None),
    }
}

fn insert_boost(params: &mut Map<String, Value>, boost: Option<f32>) {
    if let Some(boost) = boost {
        params.insert("boost".into(), json!(boost));
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_query;
    use crate::search::{ClauseRole, ClauseTag, Field, QueryPlanBuilder};

    fn clause(role: ClauseRole, weight: f32, query: Query) -> Clause {
        Clause {
            role,
            weight,
            tag: ClauseTag::Text,
            origin: "test",
            query,
        }
    }

    #[test]
    fn test_backend_creation() {
        let backend = ElasticBackend::new(&FiasConfig::default()).unwrap();
        assert_eq!(backend.search_url().as_str(), "http://localhost:9200/gar_addresses/_search");
        assert_eq!(backend.name(), "elasticsearch");
    }

    #[test]
    fn test_render_phrase_with_boost_and_slop() {
        let rendered = render_query(&Query::phrase_slop(Field::FullNorm, "тверская ул дом 7", 4), Some(9.0));
        assert_eq!(rendered["match_phrase"]["full_norm"]["query"], "тверская ул дом 7");
        assert_eq!(rendered["match_phrase"]["full_norm"]["slop"], 4);
        assert_eq!(rendered["match_phrase"]["full_norm"]["boost"], 9.0);
    }

    #[test]
    fn test_render_boosted_predicate_as_constant_score() {
        let rendered = render_query(&Query::term(Field::RegionCode, "77"), Some(100.0));
        assert_eq!(rendered["constant_score"]["boost"], 100.0);
        assert_eq!(rendered["constant_score"]["filter"]["term"]["region_code"], "77");
    }

    #[test]
    fn test_render_fuzzy_match() {
        let rendered = render_query(&Query::match_fuzzy(Field::NameNorm, "тверская"), None);
        assert_eq!(rendered["match"]["name_norm"]["fuzziness"], "AUTO");
        assert_eq!(rendered["match"]["name_norm"]["operator"], "or");
        assert!(rendered["match"]["name_norm"].get("boost").is_none());
    }

    #[test]
    fn test_render_plan_sections() {
        let mut plan = QueryPlan::default();
        plan.push(clause(ClauseRole::Filter, 1.0, Query::level("house")));
        plan.push(clause(ClauseRole::Should, 20.0, Query::phrase(Field::NameNorm, "тверская")));

        let body = render_plan(&plan, 10);
        assert_eq!(body["size"], 10);
        assert_eq!(body["query"]["bool"]["filter"][0]["term"]["level"], "house");
        assert_eq!(body["query"]["bool"]["should"][0]["match_phrase"]["name_norm"]["boost"], 20.0);
        assert_eq!(body["query"]["bool"]["minimum_should_match"], 1);
        assert!(body["query"]["bool"].get("must").is_none());
        assert_eq!(body["_source"].as_array().map(|a| a.len()), Some(SOURCE_FIELDS.len()));
    }

    #[test]
    fn test_render_plan_without_shoulds_omits_minimum() {
        let mut plan = QueryPlan::default();
        plan.push(clause(ClauseRole::Filter, 1.0, Query::level("house")));
        let body = render_plan(&plan, 5);
        assert!(body["query"]["bool"].get("minimum_should_match").is_none());
    }

    #[test]
    fn test_render_nested_bool_with_must_not() {
        let plan = QueryPlanBuilder::standard().build(&normalize_query("ул. Тверская, 7"));
        let body = render_plan(&plan, 10);
        let text = body.to_string();
        assert!(text.contains("must_not"));
        assert!(text.contains("\"wildcard\""));
    }
}
