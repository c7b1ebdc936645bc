use super::*;
use std::collections::BTreeSet;

const SMALL_MAX: u64 = 6;

/// Set whose members are the set bits of `mask`, built through the parser.
fn from_mask(mask: u32, max: u64) -> IntervalSet {
    let spec = (0..max)
        .filter(|bit| mask & (1 << bit) != 0)
        .map(|bit| bit.to_string())
        .collect::<Vec<_>>()
        .join(",");
    IntervalSet::parse(&spec, max).unwrap()
}

fn members(set: &IntervalSet) -> BTreeSet<u64> {
    set.expand().into_iter().collect()
}

fn all_small_sets() -> Vec<IntervalSet> {
    (0..(1_u32 << SMALL_MAX)).map(|mask| from_mask(mask, SMALL_MAX)).collect()
}

#[test]
fn test_parse_and_canonical() {
    let set = IntervalSet::parse("0-2,5", 10).unwrap();
    assert_eq!(set.canonical(), "0-2,5");
    assert_eq!(set.expand(), vec![0, 1, 2, 5]);
    assert_eq!(set.len(), 4);
}

#[test]
fn test_union_merges_touching_runs() {
    let a = IntervalSet::parse("0-2,5", 10).unwrap();
    let b = IntervalSet::parse("3-4", 10).unwrap();
    assert_eq!(a.union(&b).canonical(), "0-5");
    assert_eq!((&a + &b).canonical(), "0-5");
}

#[test]
fn test_adjacent_tokens_merge_on_parse() {
    let set = IntervalSet::parse("0,1,2,4-5,6", 10).unwrap();
    assert_eq!(set.canonical(), "0-2,4-6");
    assert_eq!(set.intervals().len(), 2);
}

#[test]
fn test_canonicalization_is_idempotent() {
    for spec in ["", "0", "9", "0-9", "1,3,5,7", "0-1,2-3,8", "2-2,4-7"] {
        let once = IntervalSet::parse(spec, 10).unwrap();
        let twice = IntervalSet::parse(&once.canonical(), 10).unwrap();
        assert_eq!(once, twice, "spec {spec:?}");
        assert_eq!(once.canonical(), twice.canonical());
    }
}

#[test]
fn test_single_value_range_renders_as_number() {
    let set = IntervalSet::parse("3-3", 10).unwrap();
    assert_eq!(set.canonical(), "3");
}

#[test]
fn test_syntax_errors() {
    for spec in ["a", "1-", "-1", "1--2", "01", "1,,2", " 1", "1 ", "1,", "1-2-3", "+1"] {
        let err = IntervalSet::parse(spec, 10).unwrap_err();
        assert!(err.is_syntax(), "spec {spec:?} gave {err:?}");
    }
}

#[test]
fn test_overflowing_number_is_syntax_error() {
    let err = IntervalSet::parse("99999999999999999999999", 10).unwrap_err();
    assert!(err.is_syntax());
}

#[test]
fn test_error_names_offending_token() {
    let err = IntervalSet::parse("0-2,2-4", 10).unwrap_err();
    assert_eq!(err, PartitionError::NotMonotonic { token: "2-4".to_string() });

    let err = IntervalSet::parse("0,x", 10).unwrap_err();
    assert_eq!(err, PartitionError::Syntax { token: "x".to_string() });
}

#[test]
fn test_non_increasing_tokens_rejected() {
    for spec in ["5,3", "3,3", "4-2", "0-5,5", "0-5,1-2"] {
        let err = IntervalSet::parse(spec, 10).unwrap_err();
        assert!(
            matches!(err, PartitionError::NotMonotonic { .. }),
            "spec {spec:?} gave {err:?}"
        );
    }
}

#[test]
fn test_out_of_range_rejected() {
    assert_eq!(
        IntervalSet::parse("10", 10).unwrap_err(),
        PartitionError::OutOfRange { value: 10, max: 10 }
    );
    assert_eq!(
        IntervalSet::parse("5-12", 10).unwrap_err(),
        PartitionError::OutOfRange { value: 12, max: 10 }
    );
}

#[test]
fn test_zero_max_yields_empty_set() {
    let set = IntervalSet::parse("0-5", 0).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.max(), 0);
}

#[test]
fn test_empty_spec_yields_empty_set() {
    let set = IntervalSet::parse("", 10).unwrap();
    assert!(set.is_empty());
    assert_eq!(set.max(), 10);
    assert_eq!(set.canonical(), "");
}

#[test]
fn test_clone_is_independent() {
    let original = IntervalSet::parse("0-3", 10).unwrap();
    let copy = original.clone();
    let grown = copy.union(&IntervalSet::parse("8", 10).unwrap());
    assert_eq!(original.canonical(), "0-3");
    assert_eq!(copy.canonical(), "0-3");
    assert_eq!(grown.canonical(), "0-3,8");
}

#[test]
fn test_contains_cases() {
    let a = IntervalSet::parse("0-4,7-9", 10).unwrap();
    assert!(a.contains(&IntervalSet::parse("1-3,8", 10).unwrap()));
    assert!(a.contains(&IntervalSet::parse("", 10).unwrap()));
    assert!(!a.contains(&IntervalSet::parse("4-5", 10).unwrap()));
    assert!(!a.contains(&IntervalSet::parse("5", 10).unwrap()));
}

#[test]
fn test_mismatched_max_is_tolerated() {
    let a = IntervalSet::parse("0-4", 10).unwrap();
    let b = IntervalSet::parse("0-4", 20).unwrap();

    assert!(!a.contains(&b));
    assert!(!a.intersects(&b));
    assert_eq!(a.union(&b), a);
    assert_eq!(a.difference(&b), a);
}

#[test]
fn test_difference_cases() {
    let a = IntervalSet::parse("0-9", 10).unwrap();
    let b = IntervalSet::parse("2-3,6", 10).unwrap();
    assert_eq!(a.difference(&b).canonical(), "0-1,4-5,7-9");
    assert_eq!((&a - &b).canonical(), "0-1,4-5,7-9");
    assert!(a.difference(&a).is_empty());

    let spanning = IntervalSet::parse("1-8", 10).unwrap();
    let pieces = IntervalSet::parse("0-2,5,7-8", 10).unwrap();
    assert_eq!(spanning.difference(&pieces).canonical(), "3-4,6");
}

#[test]
fn test_contains_matches_member_superset() {
    let sets = all_small_sets();
    for a in &sets {
        let a_members = members(a);
        for b in &sets {
            assert_eq!(
                a.contains(b),
                members(b).is_subset(&a_members),
                "{} contains {}",
                a,
                b
            );
        }
    }
}

#[test]
fn test_intersects_matches_shared_members() {
    let sets = all_small_sets();
    for a in &sets {
        let a_members = members(a);
        for b in &sets {
            assert_eq!(
                a.intersects(b),
                !a_members.is_disjoint(&members(b)),
                "{} intersects {}",
                a,
                b
            );
        }
    }
}

#[test]
fn test_union_and_difference_match_member_algebra() {
    let sets = all_small_sets();
    for a in &sets {
        let a_members = members(a);
        for b in &sets {
            let b_members = members(b);

            let union: Vec<u64> = a_members.union(&b_members).copied().collect();
            assert_eq!(a.union(b).expand(), union, "{} + {}", a, b);

            let difference: Vec<u64> = a_members.difference(&b_members).copied().collect();
            assert_eq!(a.difference(b).expand(), difference, "{} - {}", a, b);
        }
    }
}

#[test]
fn test_combinators_keep_sets_canonical() {
    let sets = all_small_sets();
    for a in sets.iter().step_by(5) {
        for b in sets.iter().step_by(3) {
            for result in [a.union(b), a.difference(b)] {
                let reparsed = IntervalSet::parse(&result.canonical(), SMALL_MAX).unwrap();
                assert_eq!(result, reparsed);
                for pair in result.intervals().windows(2) {
                    assert!(pair[0].right() < pair[1].left(), "{} not merged", result);
                }
            }
        }
    }
}
