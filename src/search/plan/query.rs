use serde::Serialize;
use strum::IntoStaticStr;


/// Indexed document fields the planner can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Level,
    NameNorm,
    NameExact,
    FullNorm,
    TypeNorm,
    RegionCode,
    HouseNumber,
    Korpus,
    Stroenie,
    HouseType,
    RoadKm,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}


/// Backend-neutral query tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    Phrase {
        field: Field,
        text: String,
        slop: u32,
    },
    Match {
        field: Field,
        text: String,
        operator: Operator,
        fuzzy: bool,
    },
    MultiMatch {
        fields: Vec<Field>,
        text: String,
        operator: Operator,
        fuzzy: bool,
    },
    Term {
        field: Field,
        value: String,
    },
    Terms {
        field: Field,
        values: Vec<String>,
    },
    Wildcard {
        field: Field,
        pattern: String,
    },
    Range {
        field: Field,
        gte: i64,
        lte: i64,
    },
    Exists {
        field: Field,
    },
    Bool(BoolQuery),
}

impl Query {
    pub fn phrase(field: Field, text: impl Into<String>) -> Self {
        Query::Phrase { field, text: text.into(), slop: 0 }
    }

    pub fn phrase_slop(field: Field, text: impl Into<String>, slop: u32) -> Self {
        Query::Phrase { field, text: text.into(), slop }
    }

    pub fn match_all_words(field: Field, text: impl Into<String>) -> Self {
        Query::Match { field, text: text.into(), operator: Operator::And, fuzzy: false }
    }

    pub fn match_fuzzy(field: Field, text: impl Into<String>) -> Self {
        Query::Match { field, text: text.into(), operator: Operator::Or, fuzzy: true }
    }

    pub fn multi_match(fields: &[Field], text: impl Into<String>, operator: Operator, fuzzy: bool) -> Self {
        Query::MultiMatch { fields: fields.to_vec(), text: text.into(), operator, fuzzy }
    }

    pub fn term(field: Field, value: impl Into<String>) -> Self {
        Query::Term { field, value: value.into() }
    }

    pub fn terms<I, S>(field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Terms { field, values: values.into_iter().map(Into::into).collect() }
    }

    pub fn wildcard(field: Field, pattern: impl Into<String>) -> Self {
        Query::Wildcard { field, pattern: pattern.into() }
    }

    pub fn range(field: Field, gte: i64, lte: i64) -> Self {
        Query::Range { field, gte, lte }
    }

    pub fn exists(field: Field) -> Self {
        Query::Exists { field }
    }

    pub fn level(level: &str) -> Self {
        Query::term(Field::Level, level)
    }

    /// Every query must match.
    pub fn all_of(queries: Vec<Query>) -> Self {
        Query::Bool(BoolQuery { must: queries, ..BoolQuery::default() })
    }

    /// At least one query must match.
    pub fn any_of(queries: Vec<Query>) -> Self {
        Query::Bool(BoolQuery { should: queries, minimum_should_match: 1, ..BoolQuery::default() })
    }

    /// Full-text queries carry relevance; the rest behave as yes/no predicates.
    pub fn is_scored_text(&self) -> bool {
        matches!(self, Query::Phrase { .. } | Query::Match { .. } | Query::MultiMatch { .. })
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Query>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
    pub minimum_should_match: u32,
}

impl BoolQuery {
    pub fn with_must_not(mut self, query: Query) -> Self {
        self.must_not.push(query);
        self
    }

    pub fn into_query(self) -> Query {
        Query::Bool(self)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClauseRole {
    Must,
    Should,
    Filter,
}


/// What a clause constrains; the fallback cascade rewrites clauses by tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ClauseTag {
    Text,
    Level,
    Region,
    HouseNumber,
    HouseQualifier,
    AdminType,
    Boost,
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clause {
    pub role: ClauseRole,
    pub weight: f32,
    pub tag: ClauseTag,
    /// Name of the contributor that produced the clause.
    pub origin: &'static str,
    pub query: Query,
}

impl Clause {
    pub fn is_filter(&self) -> bool {
        self.role == ClauseRole::Filter
    }

    pub fn is_should(&self) -> bool {
        self.role == ClauseRole::Should
    }
}


/// Ordered, weighted clause list handed to a search backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub clauses: Vec<Clause>,
    pub minimum_should_match: u32,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self {
            clauses: Vec::new(),
            minimum_should_match: 1,
        }
    }
}

impl QueryPlan {
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses_with_role(&self, role: ClauseRole) -> impl Iterator<Item = &Clause> {
        self.clauses.iter().filter(move |c| c.role == role)
    }

    pub fn musts(&self) -> impl Iterator<Item = &Clause> {
        self.clauses_with_role(ClauseRole::Must)
    }

    pub fn shoulds(&self) -> impl Iterator<Item = &Clause> {
        self.clauses_with_role(ClauseRole::Should)
    }

    pub fn filters(&self) -> impl Iterator<Item = &Clause> {
        self.clauses_with_role(ClauseRole::Filter)
    }

    pub fn has_filter(&self, tag: ClauseTag) -> bool {
        self.filters().any(|c| c.tag == tag)
    }

    pub fn from_origin<'a>(&'a self, origin: &'a str) -> impl Iterator<Item = &'a Clause> {
        self.clauses.iter().filter(move |c| c.origin == origin)
    }

    /// Copy of the plan without the filter clauses carrying any of `tags`.
    pub fn without_filters(&self, tags: &[ClauseTag]) -> QueryPlan {
        QueryPlan {
            clauses: self
                .clauses
                .iter()
                .filter(|c| !(c.is_filter() && tags.contains(&c.tag)))
                .cloned()
                .collect(),
            minimum_should_match: self.minimum_should_match,
        }
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
    }
}
