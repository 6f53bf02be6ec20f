use serde::Serialize;
use strum::{Display, IntoStaticStr};
use tracing::{debug, info, warn};

use super::plan::contributors::{house_number_filter, qualifier_filter, stroenie_filter, tolerant_korpus_filter};
use super::plan::{Clause, ClauseRole, ClauseTag, Field, Query, QueryPlan};
use crate::backend::{RawHit, SearchBackend};
use crate::normalizer::NormalizedQuery;


/// Relaxation steps, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CascadeStep {
    DropStroenie,
    DropKorpus,
    DropHouseNumber,
    DropAllHouseFilters,
    BroadenRegion,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Primary,
    Step(CascadeStep),
    Exhausted,
}


#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub hits: Vec<RawHit>,
    pub resolved_by: Resolution,
    /// Plans executed, the primary one included.
    pub attempts: usize,
}


/// House components a cascade state still requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HouseConstraints {
    pub house_number: Option<String>,
    pub korpus: Option<String>,
    pub stroenie: Option<String>,
}

impl HouseConstraints {
    pub fn of(query: &NormalizedQuery) -> Self {
        Self {
            house_number: query.house_number.clone(),
            korpus: query.korpus.clone(),
            stroenie: query.stroenie.clone(),
        }
    }

    fn filters(&self) -> Vec<(ClauseTag, Query)> {
        let mut filters = Vec::new();
        if let Some(house) = &self.house_number {
            filters.push((ClauseTag::HouseNumber, house_number_filter(house)));
        }
        let qualifier = match (self.korpus.as_deref(), self.stroenie.as_deref()) {
            (Some(k), None) => Some(tolerant_korpus_filter(k)),
            (None, Some(s)) => Some(stroenie_filter(s)),
            (k, s) => qualifier_filter(k, s),
        };
        if let Some(qualifier) = qualifier {
            filters.push((ClauseTag::HouseQualifier, qualifier));
        }
        filters
    }
}


/// Re-executes progressively looser plans until one returns hits.
pub struct FallbackCascade<'a> {
    backend: &'a dyn SearchBackend,
}

impl<'a> FallbackCascade<'a> {
    pub fn new(backend: &'a dyn SearchBackend) -> Self {
        Self { backend }
    }

    /// House relaxation states for the query, skipping ones that repeat the previous constraints.
    pub fn house_steps(query: &NormalizedQuery) -> Vec<(CascadeStep, HouseConstraints)> {
        if !query.has_house_components() {
            return Vec::new();
        }

        let full = HouseConstraints::of(query);
        let mut candidates = Vec::new();
        if full.stroenie.is_some() {
            candidates.push((CascadeStep::DropStroenie, HouseConstraints { stroenie: None, ..full.clone() }));
        }
        if full.korpus.is_some() {
            candidates.push((CascadeStep::DropKorpus, HouseConstraints { korpus: None, ..full.clone() }));
        }
        if full.house_number.is_some() {
            candidates.push((CascadeStep::DropHouseNumber, HouseConstraints { house_number: None, ..full.clone() }));
        }
        candidates.push((CascadeStep::DropAllHouseFilters, HouseConstraints::default()));

        let mut steps: Vec<(CascadeStep, HouseConstraints)> = Vec::new();
        let mut previous = full;
        for (step, constraints) in candidates {
            if constraints == previous {
                continue;
            }
            previous = constraints.clone();
            steps.push((step, constraints));
        }
        steps
    }

    /// Primary plan with the house filters rebuilt from `constraints`. Level and region filters
    /// and every scored clause are kept.
    pub fn relaxed_plan(primary: &QueryPlan, constraints: &HouseConstraints) -> QueryPlan {
        let mut plan = primary.without_filters(&[ClauseTag::HouseNumber, ClauseTag::HouseQualifier]);
        if !plan.has_filter(ClauseTag::Level) {
            plan.push(filter_clause(ClauseTag::Level, Query::level("house")));
        }
        for (tag, query) in constraints.filters() {
            plan.push(filter_clause(tag, query));
        }
        plan
    }

    /// Drops every filter and favours streets and cities over deeper levels.
    pub fn broadened_plan(query: &NormalizedQuery, primary: &QueryPlan) -> QueryPlan {
        let mut plan = QueryPlan {
            clauses: primary.clauses.iter().filter(|c| !c.is_filter()).cloned().collect(),
            minimum_should_match: primary.minimum_should_match,
        };
        plan.push(boost_clause(5.0, ClauseTag::Level, Query::level("street")));
        plan.push(boost_clause(2.0, ClauseTag::Level, Query::level("city")));
        if let Some(house) = &query.house_number {
            let base = house.split('/').next().unwrap_or(house);
            plan.push(boost_clause(
                10.0,
                ClauseTag::HouseNumber,
                Query::wildcard(Field::HouseNumber, format!("{}*", base)),
            ));
        }
        plan
    }

    pub fn run(&self, query: &NormalizedQuery, primary: &QueryPlan, limit: usize) -> CascadeOutcome {
        let mut attempts = 1;
        let hits = self.execute(primary, limit);
        if !hits.is_empty() {
            return CascadeOutcome { hits, resolved_by: Resolution::Primary, attempts };
        }

        for (step, constraints) in Self::house_steps(query) {
            attempts += 1;
            info!("No hits for '{}', trying {}", query.original, step);
            let hits = self.execute(&Self::relaxed_plan(primary, &constraints), limit);
            if !hits.is_empty() {
                debug!("{} returned {} hits", step, hits.len());
                return CascadeOutcome { hits, resolved_by: Resolution::Step(step), attempts };
            }
        }

        attempts += 1;
        info!("No hits for '{}', trying {}", query.original, CascadeStep::BroadenRegion);
        let hits = self.execute(&Self::broadened_plan(query, primary), limit);
        if !hits.is_empty() {
            return CascadeOutcome {
                hits,
                resolved_by: Resolution::Step(CascadeStep::BroadenRegion),
                attempts,
            };
        }

        info!("Cascade exhausted for '{}' after {} attempts", query.original, attempts);
        CascadeOutcome { hits: Vec::new(), resolved_by: Resolution::Exhausted, attempts }
    }

    fn execute(&self, plan: &QueryPlan, limit: usize) -> Vec<RawHit> {
        match self.backend.execute(plan, limit) {
            Ok(hits) => hits,
            Err(e) => {
                warn!("{} backend failed, treating as no hits: {}", self.backend.name(), e);
                Vec::new()
            }
        }
    }
}

fn filter_clause(tag: ClauseTag, query: Query) -> Clause {
    Clause { role: ClauseRole::Filter, weight: 1.0, tag, origin: "fallback", query }
}

fn boost_clause(weight: f32, tag: ClauseTag, query: Query) -> Clause {
    Clause { role: ClauseRole::Should, weight, tag, origin: "fallback", query }
}
