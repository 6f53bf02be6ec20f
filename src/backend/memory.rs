use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AddressDocument, RawHit, SearchBackend};
use crate::core::error::BackendError;
use crate::search::{Field, Operator, Query, QueryPlan};


/// Evaluates plans over an in-memory document list with bool semantics. Scores are the summed
/// weights of the matching scored clauses.
pub struct MemoryBackend {
    docs: Vec<(String, AddressDocument)>,
    calls: AtomicUsize,
    fail_calls: usize,
}

impl MemoryBackend {
    pub fn new(docs: Vec<(&str, AddressDocument)>) -> Self {
        Self {
            docs: docs.into_iter().map(|(id, doc)| (id.to_string(), doc)).collect(),
            calls: AtomicUsize::new(0),
            fail_calls: 0,
        }
    }

    /// The first `n` executions fail with a transport error.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_calls = n;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn score(&self, plan: &QueryPlan, doc: &AddressDocument) -> Option<f32> {
        if !plan.filters().all(|c| matches(&c.query, doc)) || !plan.musts().all(|c| matches(&c.query, doc)) {
            return None;
        }

        let matched: Vec<f32> = plan
            .shoulds()
            .filter(|c| matches(&c.query, doc))
            .map(|c| c.weight)
            .collect();
        let should_count = plan.shoulds().count();
        if should_count > 0 && matched.len() < plan.minimum_should_match as usize {
            return None;
        }

        let must_score: f32 = plan.musts().map(|c| c.weight).sum();
        Some(must_score + matched.iter().sum::<f32>())
    }
}

impl SearchBackend for MemoryBackend {
    fn execute(&self, plan: &QueryPlan, limit: usize) -> Result<Vec<RawHit>, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_calls {
            return Err(BackendError::Transport("connection refused".to_string()));
        }

        let mut scored: Vec<(f32, &String, &AddressDocument)> = self
            .docs
            .iter()
            .filter_map(|(id, doc)| self.score(plan, doc).map(|s| (s, id, doc)))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(score, id, doc)| RawHit {
                id: id.clone(),
                score: Some(score),
                source: doc.clone(),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}


/// Convenience constructor for test documents.
pub fn doc(level: &str, name: &str, full: &str) -> AddressDocument {
    AddressDocument {
        level: Some(level.to_string()),
        name_norm: Some(name.to_string()),
        name_exact: Some(name.to_string()),
        full_norm: Some(full.to_string()),
        ..AddressDocument::default()
    }
}

pub fn house_doc(full: &str, house: &str, korpus: Option<&str>, stroenie: Option<&str>) -> AddressDocument {
    AddressDocument {
        level: Some("house".to_string()),
        full_norm: Some(full.to_string()),
        house_number: Some(house.to_string()),
        korpus: korpus.map(str::to_string),
        stroenie: stroenie.map(str::to_string),
        ..AddressDocument::default()
    }
}

fn field_value(doc: &AddressDocument, field: Field) -> Option<String> {
    match field {
        Field::Level => doc.level.clone(),
        Field::NameNorm => doc.name_norm.clone(),
        Field::NameExact => doc.name_exact.clone(),
        Field::FullNorm => doc.full_norm.clone(),
        Field::TypeNorm => doc.type_norm.clone(),
        Field::RegionCode => doc.region_code.clone(),
        Field::HouseNumber => doc.house_number.clone(),
        Field::Korpus => doc.korpus.clone(),
        Field::Stroenie => doc.stroenie.clone(),
        Field::HouseType => doc.house_type.clone(),
        Field::RoadKm => doc.road_km.map(|km| km.to_string()),
    }
}

// Edit distance Elasticsearch's AUTO fuzziness allows for a term of this length.
fn auto_fuzziness(len: usize) -> usize {
    match len {
        0..=2 => 0,
        3..=5 => 1,
        _ => 2,
    }
}

fn word_matches(doc_word: &str, query_word: &str, fuzzy: bool) -> bool {
    doc_word == query_word
        || (fuzzy && strsim::levenshtein(doc_word, query_word) <= auto_fuzziness(query_word.chars().count()))
}

// Stored full names keep their `, ` separators.
fn words(value: &str) -> Vec<&str> {
    value.split(|c: char| c.is_whitespace() || c == ',').filter(|w| !w.is_empty()).collect()
}

fn text_matches(value: &str, text: &str, operator: Operator, fuzzy: bool) -> bool {
    let words = words(value);
    let mut terms = text.split_whitespace().peekable();
    if terms.peek().is_none() {
        return false;
    }
    let hit = |term: &str| words.iter().any(|w| word_matches(w, term, fuzzy));
    match operator {
        Operator::And => terms.all(|t| hit(t)),
        Operator::Or => terms.any(|t| hit(t)),
    }
}

fn phrase_matches(value: &str, text: &str, slop: u32) -> bool {
    let words = words(value);
    let terms: Vec<&str> = text.split_whitespace().collect();
    let Some(first) = terms.first() else {
        return false;
    };

    (0..words.len()).filter(|i| words[*i] == *first).any(|start| {
        let mut position = start;
        let mut gaps = 0;
        for term in &terms[1..] {
            match words[position + 1..].iter().position(|w| w == term) {
                Some(offset) => {
                    gaps += offset;
                    position += offset + 1;
                }
                None => return false,
            }
        }
        gaps <= slop as usize
    })
}

fn wildcard_matches(value: &str, pattern: &str) -> bool {
    fn matches_from(value: &[char], pattern: &[char]) -> bool {
        match pattern.split_first() {
            None => value.is_empty(),
            Some(('*', rest)) => (0..=value.len()).any(|i| matches_from(&value[i..], rest)),
            Some((c, rest)) => value.first() == Some(c) && matches_from(&value[1..], rest),
        }
    }
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    matches_from(&value, &pattern)
}

fn matches(query: &Query, doc: &AddressDocument) -> bool {
    match query {
        Query::Phrase { field, text, slop } => field_value(doc, *field).is_some_and(|v| phrase_matches(&v, text, *slop)),
        Query::Match { field, text, operator, fuzzy } => {
            field_value(doc, *field).is_some_and(|v| text_matches(&v, text, *operator, *fuzzy))
        }
        Query::MultiMatch { fields, text, operator, fuzzy } => fields
            .iter()
            .filter_map(|f| field_value(doc, *f))
            .any(|v| text_matches(&v, text, *operator, *fuzzy)),
        Query::Term { field, value } => field_value(doc, *field).as_deref() == Some(value.as_str()),
        Query::Terms { field, values } => field_value(doc, *field).is_some_and(|v| values.contains(&v)),
        Query::Wildcard { field, pattern } => field_value(doc, *field).is_some_and(|v| wildcard_matches(&v, pattern)),
        Query::Range { field, gte, lte } => field_value(doc, *field)
            .and_then(|v| v.parse::<i64>().ok())
            .is_some_and(|n| (*gte..=*lte).contains(&n)),
        Query::Exists { field } => field_value(doc, *field).is_some_and(|v| !v.is_empty()),
        Query::Bool(b) => {
            let should_ok = b.should.is_empty()
                || b.minimum_should_match == 0
                || b.should.iter().filter(|q| matches(q, doc)).count() >= b.minimum_should_match as usize;
            b.must.iter().all(|q| matches(q, doc))
                && b.filter.iter().all(|q| matches(q, doc))
                && !b.must_not.iter().any(|q| matches(q, doc))
                && should_ok
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{Clause, ClauseRole, ClauseTag};

    #[test]
    fn test_phrase_with_slop() {
        assert!(phrase_matches("тверская ул дом 7 к 2", "тверская ул дом 7", 0));
        assert!(!phrase_matches("тверская ул дом 7", "тверская дом", 0));
        assert!(phrase_matches("тверская ул дом 7", "тверская дом", 1));
        assert!(!phrase_matches("", "тверская", 3));
        assert!(phrase_matches("москва г, тверская ул, дом 7", "тверская ул дом 7", 0));
    }

    #[test]
    fn test_fuzzy_match() {
        assert!(text_matches("тверская ул", "тверкая", Operator::Or, true));
        assert!(!text_matches("тверская ул", "тверкая", Operator::Or, false));
        assert!(!text_matches("тверская ул", "мира тверская", Operator::And, false));
    }

    #[test]
    fn test_wildcard() {
        assert!(wildcard_matches("21/2", "21/*"));
        assert!(!wildcard_matches("21", "21/*"));
        assert!(wildcard_matches("7", "7*"));
    }

    #[test]
    fn test_must_not_and_scoring() {
        let backend = MemoryBackend::new(vec![
            ("a", house_doc("тверская ул дом 7", "7", None, None)),
            ("b", house_doc("тверская ул дом 7 к 2", "7", Some("2"), None)),
        ]);
        let mut plan = QueryPlan::default();
        plan.push(Clause {
            role: ClauseRole::Should,
            weight: 3.0,
            tag: ClauseTag::HouseNumber,
            origin: "test",
            query: Query::term(Field::HouseNumber, "7"),
        });
        plan.push(Clause {
            role: ClauseRole::Should,
            weight: 10.0,
            tag: ClauseTag::HouseNumber,
            origin: "test",
            query: crate::search::BoolQuery::default()
                .with_must_not(Query::exists(Field::Korpus))
                .into_query(),
        });

        let hits = backend.execute(&plan, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[0].score, Some(13.0));
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_failing_backend() {
        let backend = MemoryBackend::new(vec![]).failing_first(1);
        assert!(backend.execute(&QueryPlan::default(), 10).is_err());
        assert!(backend.execute(&QueryPlan::default(), 10).unwrap().is_empty());
    }
}
