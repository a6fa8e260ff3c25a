use std::collections::BTreeSet;
use rayon::prelude::*;
use tracing::{debug, trace};
use crate::core::config::EngineConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, ValueRange};
use crate::index::posting::{difference_sorted, intersect_sorted, union_sorted};
use crate::mvcc::controller::Snapshot;
use crate::query::ast::{
    BucketFilterQuery, BucketSource, BucketSpec, DictionaryQuery, DistinctQuery, NotQuery, Query,
    SearchQuery, TermQuery,
};
use crate::scoring::accumulator::ScoreAccumulator;
use crate::scoring::scorer::Scorer;
use crate::search::results::{BucketRecord, DistinctValue, EvalResult, FieldMatch, MatchRecord};

/// Evaluation knobs taken from the engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationSettings {
    pub parallel_threshold: usize,
    pub search_requires_all_terms: bool,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        EvaluationSettings {
            parallel_threshold: 4,
            search_requires_all_terms: true,
        }
    }
}

impl From<&EngineConfig> for EvaluationSettings {
    fn from(config: &EngineConfig) -> Self {
        EvaluationSettings {
            parallel_threshold: config.parallel_threshold,
            search_requires_all_terms: config.search_requires_all_terms,
        }
    }
}

/// Walks a query tree against one snapshot.
///
/// Every match-shaped intermediate is sorted by id except SEARCH output,
/// which is score-ordered; combinators re-sort before merging. Parallel
/// children run on whichever rayon pool the caller installed.
pub struct Evaluator<'a> {
    snapshot: &'a Snapshot,
    scorer: &'a dyn Scorer,
    settings: EvaluationSettings,
}

impl<'a> Evaluator<'a> {
    pub fn new(snapshot: &'a Snapshot, scorer: &'a dyn Scorer, settings: EvaluationSettings) -> Self {
        Evaluator { snapshot, scorer, settings }
    }

    pub fn evaluate(&self, query: &Query) -> Result<EvalResult> {
        let result = self.eval(query)?;
        debug!(
            kind = query.kind(),
            version = self.snapshot.version,
            results = result.len(),
            "evaluated query"
        );
        Ok(result)
    }

    fn eval(&self, query: &Query) -> Result<EvalResult> {
        trace!(kind = query.kind(), "evaluating node");
        match query {
            Query::Literal(term) | Query::Get(term) => Ok(EvalResult::Matches(self.term(term))),
            Query::And(children) => self.and(children).map(EvalResult::Matches),
            Query::Or(children) => self.or(children).map(EvalResult::Matches),
            Query::Not(not) => self.not(not).map(EvalResult::Matches),
            Query::Bucket(spec) => Ok(EvalResult::Bucket(self.bucket(spec))),
            Query::BucketFilter(filter) => self.bucket_filter(filter).map(EvalResult::Buckets),
            Query::Dictionary(dictionary) => Ok(EvalResult::Values(self.dictionary(dictionary))),
            Query::Distinct(distinct) => Ok(EvalResult::FieldValues(self.distinct(distinct))),
            Query::Search(search) => Ok(EvalResult::Matches(self.search(search))),
        }
    }

    /// Evaluate a node that must produce document matches.
    fn matches(&self, query: &Query) -> Result<Vec<MatchRecord>> {
        match self.eval(query)? {
            EvalResult::Matches(records) => Ok(records),
            other => Err(Error::malformed(format!(
                "{} produced {} where document matches are required",
                query.kind(),
                other.shape()
            ))),
        }
    }

    /// Match records of every child, in child order, each sorted by id.
    fn children(&self, children: &[Query]) -> Result<Vec<Vec<MatchRecord>>> {
        let evaluate = |child: &Query| {
            self.matches(child).map(|mut records| {
                sort_by_id(&mut records);
                records
            })
        };

        if children.len() >= self.settings.parallel_threshold.max(2) {
            children.par_iter().map(evaluate).collect()
        } else {
            children.iter().map(evaluate).collect()
        }
    }

    fn term(&self, term: &TermQuery) -> Vec<MatchRecord> {
        let hits = self.snapshot.index.resolve(term.field.as_deref(), &term.range);
        let per_hit: Vec<Vec<MatchRecord>> = hits
            .iter()
            .map(|hit| {
                let weight = self.scorer.match_weight(hit);
                hit.postings
                    .iter()
                    .map(|id| {
                        MatchRecord::new(
                            id.clone(),
                            vec![FieldMatch {
                                field: hit.field.to_string(),
                                value: hit.value.to_string(),
                                weight,
                            }],
                        )
                    })
                    .collect()
            })
            .collect();

        match per_hit.len() {
            0 => Vec::new(),
            1 => per_hit.into_iter().next().unwrap_or_default(),
            _ => {
                let ids = union_all(per_hit.iter().map(|records| record_ids(records)));
                assemble(&ids, &per_hit)
            }
        }
    }

    fn and(&self, children: &[Query]) -> Result<Vec<MatchRecord>> {
        let results = self.children(children)?;
        let mut sets = results.iter().map(|records| record_ids(records));
        let Some(first) = sets.next() else {
            return Ok(Vec::new());
        };
        let ids = sets.fold(first, |acc, ids| intersect_sorted(&acc, &ids));
        Ok(assemble(&ids, &results))
    }

    fn or(&self, children: &[Query]) -> Result<Vec<MatchRecord>> {
        let results = self.children(children)?;
        let ids = union_all(results.iter().map(|records| record_ids(records)));
        Ok(assemble(&ids, &results))
    }

    fn not(&self, not: &NotQuery) -> Result<Vec<MatchRecord>> {
        let mut include = self.matches(&not.include)?;
        let exclude = self.match_ids(&not.exclude)?;
        if exclude.is_empty() {
            return Ok(include);
        }

        let mut include_ids = record_ids(&include);
        include_ids.sort();
        let keep = difference_sorted(&include_ids, &exclude);
        include.retain(|record| keep.binary_search(&record.id).is_ok());
        Ok(include)
    }

    fn bucket(&self, spec: &BucketSpec) -> BucketRecord {
        let ids = union_all(
            self.snapshot
                .index
                .lookup_range(&spec.field, &spec.range)
                .iter()
                .map(|hit| hit.postings.as_slice().to_vec()),
        );
        BucketRecord {
            field: spec.field.clone(),
            range: spec.range.clone(),
            ids,
        }
    }

    fn bucket_filter(&self, query: &BucketFilterQuery) -> Result<Vec<BucketRecord>> {
        let mut buckets: Vec<BucketRecord> = match &query.buckets {
            BucketSource::Literal(specs) => specs.iter().map(|spec| self.bucket(spec)).collect(),
            BucketSource::Query(source) => self.bucket_source(source)?,
        };

        let filter = self.match_ids(&query.filter)?;
        for bucket in &mut buckets {
            bucket.ids = intersect_sorted(&bucket.ids, &filter);
        }
        Ok(buckets)
    }

    /// Buckets derived from a nested node.
    fn bucket_source(&self, source: &Query) -> Result<Vec<BucketRecord>> {
        match self.eval(source)? {
            EvalResult::Bucket(bucket) => Ok(vec![bucket]),
            EvalResult::Buckets(buckets) => Ok(buckets),
            EvalResult::FieldValues(values) => Ok(values
                .into_iter()
                .map(|value| self.bucket(&BucketSpec {
                    field: value.field,
                    range: ValueRange::exact(value.value),
                }))
                .collect()),
            EvalResult::Values(values) => match source {
                Query::Dictionary(DictionaryQuery { fields }) if fields.len() == 1 => Ok(values
                    .into_iter()
                    .map(|value| self.bucket(&BucketSpec {
                        field: fields[0].clone(),
                        range: ValueRange::exact(value),
                    }))
                    .collect()),
                _ => Err(Error::malformed(
                    "BUCKETS needs a single-field DICTIONARY to derive buckets from values",
                )),
            },
            EvalResult::Matches(_) => Err(Error::malformed(format!(
                "BUCKETS cannot be derived from {}",
                source.kind()
            ))),
        }
    }

    fn dictionary(&self, query: &DictionaryQuery) -> Vec<String> {
        let index = &self.snapshot.index;
        let values: BTreeSet<&str> = if query.fields.is_empty() {
            index.iter().map(|hit| hit.value).collect()
        } else {
            query.fields.iter().flat_map(|field| index.values(field)).collect()
        };
        values.into_iter().map(str::to_string).collect()
    }

    fn distinct(&self, query: &DistinctQuery) -> Vec<DistinctValue> {
        self.snapshot
            .index
            .values(&query.field)
            .map(|value| DistinctValue {
                field: query.field.clone(),
                value: value.to_string(),
            })
            .collect()
    }

    fn search(&self, query: &SearchQuery) -> Vec<MatchRecord> {
        if query.terms.is_empty() {
            return Vec::new();
        }

        let mut accumulator = ScoreAccumulator::new(self.scorer, &self.snapshot.term_stats);
        for term in &query.terms {
            let range = ValueRange::exact(term.value.as_str());
            let hits = self.snapshot.text.resolve(term.field.as_deref(), &range);
            accumulator.add_term(&term.value, &hits);
        }
        accumulator.finish(self.settings.search_requires_all_terms)
    }

    /// Sorted id set of a match-shaped node.
    fn match_ids(&self, query: &Query) -> Result<Vec<DocId>> {
        let mut ids = record_ids(&self.matches(query)?);
        ids.sort();
        Ok(ids)
    }
}

fn sort_by_id(records: &mut [MatchRecord]) {
    records.sort_by(|a, b| a.id.cmp(&b.id));
}

fn record_ids(records: &[MatchRecord]) -> Vec<DocId> {
    records.iter().map(|record| record.id.clone()).collect()
}

fn union_all(sets: impl Iterator<Item = Vec<DocId>>) -> Vec<DocId> {
    sets.fold(Vec::new(), |acc, ids| union_sorted(&acc, &ids))
}

/// Build one record per id in `ids`, concatenating the matches of every
/// child that holds the id, in child order. Children must be id-sorted.
fn assemble(ids: &[DocId], children: &[Vec<MatchRecord>]) -> Vec<MatchRecord> {
    let mut cursors = vec![0usize; children.len()];
    ids.iter()
        .map(|id| {
            let mut matches = Vec::new();
            for (child, cursor) in children.iter().zip(cursors.iter_mut()) {
                while *cursor < child.len() && child[*cursor].id < *id {
                    *cursor += 1;
                }
                if let Some(record) = child.get(*cursor).filter(|record| record.id == *id) {
                    matches.extend(record.matches.iter().cloned());
                    *cursor += 1;
                }
            }
            MatchRecord::new(id.clone(), matches)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::inverted::InvertedIndex;
    use crate::scoring::scorer::IdfScorer;

    fn snapshot() -> Snapshot {
        let mut index = InvertedIndex::new();
        let rows: [(u64, &str, &str); 5] = [
            (1, "make", "volvo"),
            (2, "make", "bmw"),
            (3, "make", "volvo"),
            (3, "color", "red"),
            (4, "color", "red"),
        ];
        for (id, field, value) in rows {
            index.insert(field, value, DocId::from(id));
        }
        Snapshot { index, ..Snapshot::default() }
    }

    fn ids(result: EvalResult) -> Vec<String> {
        match result {
            EvalResult::Matches(records) => records.iter().map(|r| r.id.to_string()).collect(),
            other => panic!("unexpected {}", other.shape()),
        }
    }

    fn evaluate(query: &Query) -> Result<EvalResult> {
        let snapshot = snapshot();
        let scorer = IdfScorer;
        Evaluator::new(&snapshot, &scorer, EvaluationSettings::default()).evaluate(query)
    }

    #[test]
    fn and_concatenates_child_matches() {
        let query = Query::and(vec![Query::literal("make", "volvo"), Query::literal("color", "red")]);
        let result = evaluate(&query).unwrap();
        let EvalResult::Matches(records) = result else { panic!("expected matches") };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, DocId::from(3u64));
        let rendered: Vec<_> = records[0].matches.iter().map(FieldMatch::render).collect();
        assert_eq!(rendered, vec!["make:volvo#1.00", "color:red#1.00"]);
    }

    #[test]
    fn or_unions_in_id_order() {
        let query = Query::or(vec![Query::literal("color", "red"), Query::literal("make", "bmw")]);
        assert_eq!(ids(evaluate(&query).unwrap()), vec!["2", "3", "4"]);
    }

    #[test]
    fn empty_combinators_are_empty() {
        assert!(evaluate(&Query::and(vec![])).unwrap().is_empty());
        assert!(evaluate(&Query::or(vec![])).unwrap().is_empty());
    }

    #[test]
    fn unknown_values_absorb_and() {
        let query = Query::and(vec![Query::literal("make", "volvo"), Query::literal("make", "saab")]);
        assert!(evaluate(&query).unwrap().is_empty());
    }

    #[test]
    fn not_removes_excluded_ids() {
        let query = Query::not(Query::literal("make", "volvo"), Query::literal("color", "red"));
        assert_eq!(ids(evaluate(&query).unwrap()), vec!["1"]);
    }

    #[test]
    fn parallel_children_match_sequential() {
        let children: Vec<Query> = ["volvo", "bmw", "saab", "volvo", "bmw"]
            .into_iter()
            .map(|value| Query::literal("make", value))
            .collect();
        let snapshot = snapshot();
        let scorer = IdfScorer;
        let sequential = EvaluationSettings { parallel_threshold: usize::MAX, ..Default::default() };
        let parallel = EvaluationSettings { parallel_threshold: 2, ..Default::default() };

        let a = Evaluator::new(&snapshot, &scorer, sequential).evaluate(&Query::or(children.clone())).unwrap();
        let b = Evaluator::new(&snapshot, &scorer, parallel).evaluate(&Query::or(children)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn match_node_cannot_feed_buckets() {
        let query = Query::bucket_filter(
            BucketSource::Query(Box::new(Query::literal("make", "volvo"))),
            Query::literal("color", "red"),
        );
        assert!(evaluate(&query).unwrap_err().is_malformed_query());

        let query = Query::and(vec![Query::distinct("make")]);
        assert!(evaluate(&query).unwrap_err().is_malformed_query());
    }

    #[test]
    fn single_field_dictionary_feeds_buckets() {
        let query = Query::bucket_filter(
            BucketSource::Query(Box::new(Query::dictionary(["make"]))),
            Query::literal("color", "red"),
        );
        let EvalResult::Buckets(buckets) = evaluate(&query).unwrap() else { panic!("expected buckets") };
        let summary: Vec<_> = buckets
            .iter()
            .map(|b| (b.range.low.as_str(), b.ids.len()))
            .collect();
        assert_eq!(summary, vec![("bmw", 0), ("volvo", 1)]);

        let query = Query::bucket_filter(
            BucketSource::Query(Box::new(Query::dictionary(["make", "color"]))),
            Query::literal("color", "red"),
        );
        assert!(evaluate(&query).unwrap_err().is_malformed_query());
    }

    #[test]
    fn range_buckets_union_postings() {
        let query = Query::Bucket(BucketSpec {
            field: "make".to_string(),
            range: ValueRange::between("a", "c"),
        });
        let EvalResult::Bucket(bucket) = evaluate(&query).unwrap() else { panic!("expected a bucket") };
        assert_eq!(bucket.ids, vec![DocId::from(2u64)]);
    }

    #[test]
    fn dictionary_without_fields_spans_the_index() {
        let result = evaluate(&Query::dictionary(Vec::<String>::new())).unwrap();
        assert_eq!(
            result,
            EvalResult::Values(vec!["bmw".to_string(), "red".to_string(), "volvo".to_string()])
        );
    }
}
