//! Merging of per-line counts and per-file records.
//!
//! The count merge is a null-propagating sum: `None` only survives where both
//! sides are `None` (or out of range). It is commutative and associative,
//! which the record-level fold relies on.

use super::{FileCoverage, LineCount};
use std::collections::HashMap;

/// Merge two count vectors into a new one.
///
/// The result has `max(a.len(), b.len())` entries; out-of-range positions are
/// treated as `None`. One-sided concrete counts win; two concrete counts add.
#[must_use]
pub fn merge_counts(a: &[LineCount], b: &[LineCount]) -> Vec<LineCount> {
    let len = a.len().max(b.len());
    let mut merged = Vec::with_capacity(len);
    for i in 0..len {
        let left = a.get(i).copied().flatten();
        let right = b.get(i).copied().flatten();
        merged.push(match (left, right) {
            (None, None) => None,
            (Some(n), None) | (None, Some(n)) => Some(n),
            (Some(n), Some(m)) => Some(n + m),
        });
    }
    merged
}

/// In-place form of [`merge_counts`]: folds `other` into `acc`.
pub fn merge_counts_into(acc: &mut Vec<LineCount>, other: &[LineCount]) {
    if acc.len() < other.len() {
        acc.resize(other.len(), None);
    }
    for (i, right) in other.iter().enumerate() {
        acc[i] = match (acc[i], *right) {
            (None, None) => None,
            (Some(n), None) | (None, Some(n)) => Some(n),
            (Some(n), Some(m)) => Some(n + m),
        };
    }
}

/// Fold any number of record collections into one, keyed by filename.
///
/// Records are appended in first-seen order; a repeated filename has its
/// counts merged and its `source` filled from the first non-empty one seen.
/// The input collections are never mutated.
#[must_use]
pub fn merge_records<'a, I>(collections: I) -> Vec<FileCoverage>
where
    I: IntoIterator<Item = &'a [FileCoverage]>,
{
    let mut merged: Vec<FileCoverage> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for collection in collections {
        for record in collection {
            if let Some(&i) = by_name.get(&record.filename) {
                let existing = &mut merged[i];
                if existing.source.is_empty() && !record.source.is_empty() {
                    existing.source = record.source.clone();
                }
                merge_counts_into(&mut existing.coverage, &record.coverage);
            } else {
                by_name.insert(record.filename.clone(), merged.len());
                merged.push(record.clone());
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_counts_null_handling() {
        assert_eq!(
            merge_counts(&[None, Some(5)], &[Some(3), None]),
            vec![Some(3), Some(5)]
        );
        assert_eq!(
            merge_counts(&[Some(0), None], &[None, Some(0)]),
            vec![Some(0), Some(0)]
        );
    }

    #[test]
    fn test_merge_counts_sums_concrete() {
        assert_eq!(
            merge_counts(&[Some(1), Some(2)], &[Some(3), Some(4)]),
            vec![Some(4), Some(6)]
        );
    }

    #[test]
    fn test_merge_counts_length_is_max() {
        assert_eq!(
            merge_counts(&[Some(1)], &[None, None, Some(2)]),
            vec![Some(1), None, Some(2)]
        );
        assert_eq!(merge_counts(&[], &[]), Vec::<LineCount>::new());
    }

    #[test]
    fn test_merge_counts_commutative() {
        let a = vec![None, Some(1), Some(0)];
        let b = vec![Some(2), None];
        assert_eq!(merge_counts(&a, &b), merge_counts(&b, &a));
    }

    #[test]
    fn test_merge_counts_into_matches_pure_form() {
        let a = vec![None, Some(1)];
        let b = vec![Some(2), Some(3), None];
        let mut acc = a.clone();
        merge_counts_into(&mut acc, &b);
        assert_eq!(acc, merge_counts(&a, &b));
    }

    #[test]
    fn test_merge_records_single_input_is_identity() {
        let records = vec![
            FileCoverage::new("a.jl", "src", vec![Some(1)]),
            FileCoverage::new("b.jl", "", vec![None, Some(2)]),
        ];
        assert_eq!(merge_records([records.as_slice()]), records);
    }

    #[test]
    fn test_merge_records_is_commutative() {
        let x = vec![FileCoverage::new("a.jl", "", vec![Some(1), None])];
        let y = vec![FileCoverage::new("a.jl", "", vec![None, Some(2)])];
        let xy = merge_records([x.as_slice(), y.as_slice()]);
        let yx = merge_records([y.as_slice(), x.as_slice()]);
        assert_eq!(xy[0].coverage, yx[0].coverage);
        assert_eq!(xy[0].coverage, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_merge_records_first_seen_order() {
        let x = vec![
            FileCoverage::new("b.jl", "", vec![Some(1)]),
            FileCoverage::new("a.jl", "", vec![Some(1)]),
        ];
        let y = vec![FileCoverage::new("c.jl", "", vec![Some(1)])];
        let merged = merge_records([x.as_slice(), y.as_slice()]);
        let names: Vec<&str> = merged.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["b.jl", "a.jl", "c.jl"]);
    }

    #[test]
    fn test_merge_records_first_nonempty_source_wins() {
        let x = vec![FileCoverage::new("a.jl", "", vec![Some(1)])];
        let y = vec![FileCoverage::new("a.jl", "text", vec![Some(1)])];
        let z = vec![FileCoverage::new("a.jl", "other", vec![Some(1)])];
        let merged = merge_records([x.as_slice(), y.as_slice(), z.as_slice()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, "text");
        assert_eq!(merged[0].coverage, vec![Some(3)]);
    }

    #[test]
    fn test_merge_records_does_not_mutate_inputs() {
        let x = vec![FileCoverage::new("a.jl", "", vec![Some(1)])];
        let y = vec![FileCoverage::new("a.jl", "", vec![Some(2)])];
        let _ = merge_records([x.as_slice(), y.as_slice()]);
        assert_eq!(x[0].coverage, vec![Some(1)]);
        assert_eq!(y[0].coverage, vec![Some(2)]);
    }

    #[test]
    fn test_merge_records_duplicates_within_one_collection() {
        let x = vec![
            FileCoverage::new("a.jl", "", vec![Some(1)]),
            FileCoverage::new("a.jl", "", vec![Some(1)]),
        ];
        let merged = merge_records([x.as_slice()]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].coverage, vec![Some(2)]);
    }
}
