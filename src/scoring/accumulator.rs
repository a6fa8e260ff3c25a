use std::collections::BTreeMap;
use crate::core::types::DocId;
use crate::index::inverted::PostingHit;
use crate::index::term_stats::TermStatistics;
use crate::scoring::scorer::Scorer;
use crate::search::results::{FieldMatch, MatchRecord};

#[derive(Debug, Default)]
struct DocScore {
    matches: Vec<FieldMatch>,
    score: f64,
    terms_matched: usize,
}

/// Collects SEARCH hits term by term and turns them into ranked match records.
pub struct ScoreAccumulator<'a> {
    scorer: &'a dyn Scorer,
    stats: &'a TermStatistics,
    docs: BTreeMap<DocId, DocScore>,
    terms_seen: usize,
}

impl<'a> ScoreAccumulator<'a> {
    pub fn new(scorer: &'a dyn Scorer, stats: &'a TermStatistics) -> Self {
        ScoreAccumulator {
            scorer,
            stats,
            docs: BTreeMap::new(),
            terms_seen: 0,
        }
    }

    /// Add every posting hit of one term. `hits` must be in field order so a
    /// document's matches come out ordered by field name.
    pub fn add_term(&mut self, term: &str, hits: &[PostingHit<'_>]) {
        self.terms_seen += 1;

        let mut per_doc: BTreeMap<&DocId, Vec<FieldMatch>> = BTreeMap::new();
        for hit in hits {
            let weight = self.scorer.match_weight(hit);
            for id in hit.postings {
                per_doc.entry(id).or_default().push(FieldMatch {
                    field: hit.field.to_string(),
                    value: hit.value.to_string(),
                    weight,
                });
            }
        }

        for (id, matches) in per_doc {
            let contribution = self.scorer.term_score(matches.len(), term, self.stats);
            let entry = self.docs.entry(id.clone()).or_default();
            entry.score += contribution;
            entry.terms_matched += 1;
            entry.matches.extend(matches);
        }
    }

    /// Ranked records: score descending, ties by ascending id. With
    /// `require_all`, documents missing any term are dropped.
    pub fn finish(self, require_all: bool) -> Vec<MatchRecord> {
        let terms_seen = self.terms_seen;
        let mut records: Vec<MatchRecord> = self
            .docs
            .into_iter()
            .filter(|(_, doc)| !require_all || doc.terms_matched == terms_seen)
            .map(|(id, doc)| MatchRecord {
                id,
                matches: doc.matches,
                score: Some(doc.score),
            })
            .collect();

        // Stable sort keeps the BTreeMap's id order among equal scores.
        records.sort_by(|a, b| {
            let a = a.score.unwrap_or_default();
            let b = b.score.unwrap_or_default();
            b.total_cmp(&a)
        });
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::posting::PostingList;
    use crate::scoring::scorer::IdfScorer;

    fn list(ids: &[u64]) -> PostingList {
        PostingList::from_unsorted(ids.iter().map(|&id| DocId::from(id)).collect())
    }

    fn stats() -> TermStatistics {
        let mut stats = TermStatistics::new();
        stats.add_document(["tesla", "red"]);
        stats.add_document(["tesla"]);
        stats.add_document(["volvo", "red"]);
        stats.add_document(["bmw"]);
        stats
    }

    #[test]
    fn ranks_by_score_then_id() {
        let stats = stats();
        let scorer = IdfScorer;
        let brand = list(&[1]);
        let make = list(&[0, 1]);

        let mut acc = ScoreAccumulator::new(&scorer, &stats);
        acc.add_term("tesla", &[
            PostingHit { field: "brand", value: "tesla", postings: &brand },
            PostingHit { field: "make", value: "tesla", postings: &make },
        ]);
        let records = acc.finish(true);

        let ids: Vec<_> = records.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["1", "0"]);
        let fields: Vec<_> = records[0].matches.iter().map(|m| m.field.as_str()).collect();
        assert_eq!(fields, vec!["brand", "make"]);
        assert!((records[0].score.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn conjunctive_mode_drops_partial_matches() {
        let stats = stats();
        let scorer = IdfScorer;
        let tesla = list(&[0, 1]);
        let red = list(&[0, 2]);

        let hits_tesla = [PostingHit { field: "make", value: "tesla", postings: &tesla }];
        let hits_red = [PostingHit { field: "color", value: "red", postings: &red }];

        let mut all = ScoreAccumulator::new(&scorer, &stats);
        all.add_term("tesla", &hits_tesla);
        all.add_term("red", &hits_red);
        let ids: Vec<_> = all.finish(true).into_iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["0"]);

        let mut any = ScoreAccumulator::new(&scorer, &stats);
        any.add_term("tesla", &hits_tesla);
        any.add_term("red", &hits_red);
        assert_eq!(any.finish(false).len(), 3);
    }
}
