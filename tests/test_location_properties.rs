//! Property tests for source location ordering and containment.
#![cfg(feature = "proptest")]

use proptest::prelude::*;
use srcdata::SourceLocation;

fn location() -> impl Strategy<Value = SourceLocation> {
    (
        prop::sample::select(vec!["a.cpp", "b.cpp"]),
        1u32..50,
        1u32..80,
        0u32..5,
        0u32..80,
    )
        .prop_map(|(file, line, column, extra_lines, end_column)| {
            let end_line = line + extra_lines;
            let end_column = if extra_lines == 0 {
                column.max(end_column)
            } else {
                end_column.max(1)
            };
            SourceLocation::new(file, line, column).with_end(end_line, end_column)
        })
}

proptest! {
    #[test]
    fn ordering_is_total_and_consistent(a in location(), b in location()) {
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a.cmp(&b) == std::cmp::Ordering::Equal, a == b);
    }

    #[test]
    fn containment_is_reflexive_and_file_bound(a in location(), b in location()) {
        prop_assert!(a.contains(&a));
        if a.file() != b.file() {
            prop_assert!(!a.contains(&b));
        }
    }

    #[test]
    fn containment_is_transitive(a in location(), b in location(), c in location()) {
        if a.contains(&b) && b.contains(&c) {
            prop_assert!(a.contains(&c));
        }
    }

    #[test]
    fn precedes_agrees_with_start_order(a in location(), b in location()) {
        if a.precedes(&b) {
            prop_assert_eq!(a.file(), b.file());
            prop_assert!(a.start() < b.start());
            prop_assert!(!b.precedes(&a));
        }
    }
}
