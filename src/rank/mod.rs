//! Ranking and totals over raw aggregation results.

use crate::core::SubjectId;
use std::collections::HashMap;

/// Outcome of ranking an aggregation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedResult {
    /// The top entries, best first, at most `n` of them.
    pub top: Vec<(SubjectId, i64)>,
    /// 1-based rank of the requester, or 0 if the requester has no entry.
    pub requester_rank: usize,
    /// The requester's own value, 0 if absent. Reported even when the
    /// requester is outside the top list.
    pub requester_value: i64,
}

/// Sorts an aggregation result descending and truncates to the top `n`.
///
/// Ranks are 1-based in sorted order. The sort is stable, so subjects with
/// equal values keep the iteration order of the input map; that order is not
/// guaranteed deterministic, and neither is the tie-break here.
pub fn rank_top_n(
    results: &HashMap<SubjectId, i64>,
    n: usize,
    requester: &SubjectId,
) -> RankedResult {
    let requester_value = results.get(requester).copied().unwrap_or(0);

    let mut sorted: Vec<(SubjectId, i64)> = results
        .iter()
        .map(|(subject, &value)| (subject.clone(), value))
        .collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    let requester_rank = sorted
        .iter()
        .position(|(subject, _)| subject == requester)
        .map_or(0, |index| index + 1);

    sorted.truncate(n);

    RankedResult {
        top: sorted,
        requester_rank,
        requester_value,
    }
}

/// Sums an aggregation result into a population total.
pub fn population_total(results: &HashMap<SubjectId, i64>) -> i64 {
    results.values().fold(0i64, |sum, &value| sum.saturating_add(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn results(values: &[(&str, i64)]) -> HashMap<SubjectId, i64> {
        values
            .iter()
            .map(|(subject, value)| (SubjectId::new(*subject), *value))
            .collect()
    }

    #[test]
    fn test_top_n_descending_and_truncated() {
        let results = results(&[
            ("a", 100),
            ("b", 90),
            ("c", 80),
            ("d", 70),
            ("e", 60),
            ("f", 50),
            ("g", 40),
            ("h", 30),
            ("i", 20),
            ("j", 10),
        ]);

        let ranked = rank_top_n(&results, 5, &SubjectId::new("f"));

        assert_eq!(ranked.top.len(), 5);
        let values: Vec<i64> = ranked.top.iter().map(|(_, value)| *value).collect();
        assert_eq!(values, vec![100, 90, 80, 70, 60]);

        // Requester is ranked 6th, outside the top list, but still reported.
        assert_eq!(ranked.requester_rank, 6);
        assert_eq!(ranked.requester_value, 50);
        assert!(!ranked.top.iter().any(|(subject, _)| subject.as_str() == "f"));
    }

    #[test]
    fn test_requester_absent_gets_rank_zero() {
        let results = results(&[("a", 10), ("b", 5)]);
        let ranked = rank_top_n(&results, 10, &SubjectId::new("ghost"));
        assert_eq!(ranked.requester_rank, 0);
        assert_eq!(ranked.requester_value, 0);
        assert_eq!(ranked.top.len(), 2);
    }

    #[test]
    fn test_top_n_larger_than_population() {
        let results = results(&[("a", 10)]);
        let ranked = rank_top_n(&results, 100, &SubjectId::new("a"));
        assert_eq!(ranked.top.len(), 1);
        assert_eq!(ranked.requester_rank, 1);
        assert_eq!(ranked.requester_value, 10);
    }

    #[test]
    fn test_empty_results() {
        let ranked = rank_top_n(&HashMap::new(), 5, &SubjectId::new("a"));
        assert!(ranked.top.is_empty());
        assert_eq!(ranked.requester_rank, 0);
        assert_eq!(ranked.requester_value, 0);
    }

    #[test]
    fn test_population_total() {
        let results = results(&[("a", 10), ("b", 5), ("c", -2)]);
        assert_eq!(population_total(&results), 13);
        assert_eq!(population_total(&HashMap::new()), 0);
    }
}
