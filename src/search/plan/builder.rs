use tracing::debug;

use super::contributors::STANDARD_CONTRIBUTORS;
use super::query::{Clause, ClauseRole, ClauseTag, Query, QueryPlan};
use crate::normalizer::{AliasTable, NormalizedQuery};


/// One independent step of plan construction.
pub type Contributor = fn(&NormalizedQuery, &mut PlanBuilder<'_>);


/// Clause accumulator handed to each contributor in turn.
pub struct PlanBuilder<'a> {
    table: &'a AliasTable,
    origin: &'static str,
    plan: QueryPlan,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(table: &'a AliasTable) -> Self {
        Self {
            table,
            origin: "",
            plan: QueryPlan::default(),
        }
    }

    pub fn table(&self) -> &'a AliasTable {
        self.table
    }

    pub fn set_origin(&mut self, origin: &'static str) {
        self.origin = origin;
    }

    /// Ranking clause. Repeating an existing should clause keeps the higher weight.
    pub fn should(&mut self, weight: f32, tag: ClauseTag, query: Query) {
        if weight.is_nan() || weight <= 0.0 {
            debug!("Dropping non-positive weight {} from {}", weight, self.origin);
            return;
        }

        if let Some(existing) = self
            .plan
            .clauses
            .iter_mut()
            .find(|c| c.role == ClauseRole::Should && c.query == query)
        {
            if weight > existing.weight {
                existing.weight = weight;
                existing.tag = tag;
                existing.origin = self.origin;
            }
            return;
        }

        self.push(ClauseRole::Should, weight, tag, query);
    }

    /// Necessary condition that does not score.
    pub fn filter(&mut self, tag: ClauseTag, query: Query) {
        if self.plan.filters().any(|c| c.query == query) {
            return;
        }
        self.push(ClauseRole::Filter, 1.0, tag, query);
    }

    /// Necessary condition that also scores.
    pub fn must(&mut self, weight: f32, tag: ClauseTag, query: Query) {
        self.push(ClauseRole::Must, weight.max(f32::MIN_POSITIVE), tag, query);
    }

    pub fn has_filter(&self, tag: ClauseTag) -> bool {
        self.plan.has_filter(tag)
    }

    fn push(&mut self, role: ClauseRole, weight: f32, tag: ClauseTag, query: Query) {
        self.plan.push(Clause {
            role,
            weight,
            tag,
            origin: self.origin,
            query,
        });
    }

    pub fn finish(self) -> QueryPlan {
        self.plan
    }
}


/// Builds a [`QueryPlan`] by running a fixed pipeline of contributors over a normalized query.
pub struct QueryPlanBuilder<'a> {
    table: &'a AliasTable,
    contributors: Vec<(&'static str, Contributor)>,
}

impl<'a> QueryPlanBuilder<'a> {
    pub fn new(table: &'a AliasTable) -> Self {
        Self::with_contributors(table, STANDARD_CONTRIBUTORS.to_vec())
    }

    pub fn with_contributors(table: &'a AliasTable, contributors: Vec<(&'static str, Contributor)>) -> Self {
        Self { table, contributors }
    }

    pub fn standard() -> QueryPlanBuilder<'static> {
        QueryPlanBuilder::new(AliasTable::standard())
    }

    pub fn contributor_names(&self) -> Vec<&'static str> {
        self.contributors.iter().map(|(name, _)| *name).collect()
    }

    pub fn build(&self, query: &NormalizedQuery) -> QueryPlan {
        let mut builder = PlanBuilder::new(self.table);
        if query.is_empty() {
            return builder.finish();
        }

        for (name, contribute) in &self.contributors {
            builder.set_origin(*name);
            contribute(query, &mut builder);
        }

        let plan = builder.finish();
        debug!(
            "Built plan for '{}': {} clauses ({} filters, {} should)",
            query.original,
            plan.len(),
            plan.filters().count(),
            plan.shoulds().count()
        );
        plan
    }
}
