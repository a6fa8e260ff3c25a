use crate::index::inverted::PostingHit;
use crate::index::term_stats::TermStatistics;
use crate::search::results::EXACT_MATCH_WEIGHT;

/// Scorer trait
pub trait Scorer: Send + Sync {
    /// Confidence attached to one matched posting.
    fn match_weight(&self, _hit: &PostingHit<'_>) -> f64 {
        EXACT_MATCH_WEIGHT
    }

    /// Contribution of one term to a document that matched it `match_count` times.
    fn term_score(&self, match_count: usize, term: &str, stats: &TermStatistics) -> f64;

    fn name(&self) -> &str;
}

/// `matchCount × log2(N / df)`
#[derive(Debug, Clone, Copy, Default)]
pub struct IdfScorer;

impl Scorer for IdfScorer {
    fn term_score(&self, match_count: usize, term: &str, stats: &TermStatistics) -> f64 {
        match_count as f64 * stats.idf(term)
    }

    fn name(&self) -> &str {
        "idf"
    }
}

/// Round to two decimals for output. Ordering always uses the raw score.
pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> TermStatistics {
        let mut stats = TermStatistics::new();
        for doc in [vec!["tesla"], vec!["tesla", "model"], vec!["volvo"], vec!["bmw"]] {
            stats.add_document(doc.into_iter());
        }
        stats
    }

    #[test]
    fn idf_scales_with_match_count() {
        let stats = stats();
        let scorer = IdfScorer;
        // N = 4, df(tesla) = 2
        assert!((scorer.term_score(1, "tesla", &stats) - 1.0).abs() < 1e-12);
        assert!((scorer.term_score(3, "tesla", &stats) - 3.0).abs() < 1e-12);
        assert_eq!(scorer.term_score(2, "unknown", &stats), 0.0);
    }

    #[test]
    fn rounding_is_output_only() {
        assert_eq!(round_score(0.6438561897747247), 0.64);
        assert_eq!(round_score(0.32192809488736235), 0.32);
        assert_eq!(round_score(2.0), 2.0);
    }
}
