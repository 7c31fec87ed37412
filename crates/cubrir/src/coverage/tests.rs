//! Cross-module scenarios: raw counts through merge, amendment, and LCOV.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::formatters::lcov::{self, LcovWriter};
use crate::syntax::frontend::BlockFrontend;
use proptest::prelude::*;

#[test]
fn test_pipeline_counts_to_lcov_and_back() {
    // two processes ran the same file; f was never invoked
    let source = "function f(x)\n  return x+1\nend\ng(x) = x * 2\n";
    let process_a = vec![None, None, None, Some(2)];
    let process_b = vec![None, None, None, Some(1)];

    let counts = merge_counts(&process_a, &process_b);
    let mut record = FileCoverage::new("demo.jl", source, counts);
    amend_coverage(&mut record, &BlockFrontend::default(), &AmendConfig::default()).unwrap();
    assert_eq!(record.coverage, vec![None, Some(0), None, Some(3)]);
    assert_eq!(record.summary(), CoverageSummary { covered: 1, total: 2 });

    let trace = LcovWriter::new(std::slice::from_ref(&record)).generate();
    let parsed = lcov::read_str(&trace);
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].filename, "demo.jl");
    assert_eq!(parsed[0].source, "");
    assert_eq!(parsed[0].coverage, record.coverage);
}

#[test]
fn test_merged_traces_from_independent_runs() {
    let run_a = vec![
        FileCoverage::new("a.jl", "", vec![Some(1), None, Some(0)]),
        FileCoverage::new("b.jl", "", vec![Some(2)]),
    ];
    let run_b = vec![FileCoverage::new("a.jl", "", vec![Some(1), Some(4)])];
    let merged = merge_records([run_a.as_slice(), run_b.as_slice()]);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].coverage, vec![Some(2), Some(4), Some(0)]);
    assert_eq!(merged[1].coverage, vec![Some(2)]);
}

#[test]
fn test_amendment_then_exclusion_then_summary() {
    let source = "function unused()\n    expensive()  # COV_EXCL_LINE\n    cheap()\nend\n";
    let mut record = FileCoverage::new("x.jl", source, vec![None; 4]);
    amend_coverage(&mut record, &BlockFrontend::default(), &AmendConfig::default()).unwrap();
    assert_eq!(record.coverage, vec![None, None, Some(0), None]);
    assert_eq!(record.summary(), CoverageSummary { covered: 0, total: 1 });
}

proptest! {
    #[test]
    fn prop_merge_counts_commutative(
        a in prop::collection::vec(prop::option::of(0u64..1000), 0..30),
        b in prop::collection::vec(prop::option::of(0u64..1000), 0..30),
    ) {
        prop_assert_eq!(merge_counts(&a, &b), merge_counts(&b, &a));
    }

    #[test]
    fn prop_merge_counts_associative(
        a in prop::collection::vec(prop::option::of(0u64..1000), 0..20),
        b in prop::collection::vec(prop::option::of(0u64..1000), 0..20),
        c in prop::collection::vec(prop::option::of(0u64..1000), 0..20),
    ) {
        let left = merge_counts(&merge_counts(&a, &b), &c);
        let right = merge_counts(&a, &merge_counts(&b, &c));
        prop_assert_eq!(left, right);
    }

    #[test]
    fn prop_merge_never_conflates_absent_and_zero(
        a in prop::collection::vec(prop::option::of(0u64..1000), 1..30),
    ) {
        let merged = merge_counts(&a, &a);
        for (orig, m) in a.iter().zip(&merged) {
            prop_assert_eq!(orig.is_none(), m.is_none());
        }
    }

    #[test]
    fn prop_lcov_round_trip_up_to_last_concrete(
        counts in prop::collection::vec(prop::option::of(0u64..1000), 0..40),
    ) {
        let record = FileCoverage::new("p.jl", "", counts.clone());
        let parsed = lcov::read_str(&LcovWriter::new(std::slice::from_ref(&record)).generate());
        let last_concrete = counts.iter().rposition(Option::is_some).map_or(0, |i| i + 1);
        prop_assert_eq!(parsed.len(), 1);
        prop_assert_eq!(&parsed[0].coverage, &counts[..last_concrete]);
    }

    #[test]
    fn prop_merge_records_single_collection_identity(
        counts in prop::collection::vec(prop::option::of(0u64..1000), 0..30),
    ) {
        let collection = vec![FileCoverage::new("one.jl", "text", counts)];
        prop_assert_eq!(merge_records([collection.as_slice()]), collection);
    }
}
