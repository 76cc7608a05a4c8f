//! Enricher (spec.md section 4.3, component G): a pure function from a
//! raw draw plus its parsed number triple to the fully enriched record.
//! Invoked exactly once per draw, strictly before the write; no other
//! component recomputes these fields.

use chrono::Utc;
use draw_model::{Combination, Draw, NumberTriple, RawDraw};

/// Derives all 19 boolean/enum fields from `open_nums` and `sum`
/// (spec.md section 3) and stamps `created_at`/`updated_at`. The
/// timestamps are equal on first enrichment; a subsequent idempotent
/// upsert leaves both untouched (see `draw-core::writer`).
pub fn enrich(raw: RawDraw, triple: NumberTriple) -> Draw {
    let now = Utc::now();

    let is_big = raw.sum >= 14;
    let is_small = !is_big;
    let is_odd = raw.sum % 2 == 1;
    let is_even = !is_odd;
    let is_extreme_big = raw.sum >= 22;
    let is_extreme_small = raw.sum <= 5;

    let combination = match (is_big, is_odd) {
        (true, true) => Combination::BigOdd,
        (false, true) => Combination::SmallOdd,
        (true, false) => Combination::BigEven,
        (false, false) => Combination::SmallEven,
    };

    let (is_triple, is_pair, is_straight, is_misc) = classify_form(&triple);

    let is_small_edge = raw.sum <= 9;
    let is_middle = (10..=17).contains(&raw.sum);
    let is_big_edge = raw.sum >= 18;
    let is_edge = is_small_edge || is_big_edge;

    let is_dragon = triple.a > triple.c;
    let is_tiger = triple.a < triple.c;
    let is_tie = triple.a == triple.c;

    Draw {
        issue: raw.issue,
        open_time: raw.open_time,
        open_nums: raw.open_nums,
        sum: raw.sum,
        source: raw.source,
        created_at: now,
        updated_at: now,
        is_big,
        is_small,
        is_odd,
        is_even,
        is_extreme_big,
        is_extreme_small,
        combination,
        is_triple,
        is_pair,
        is_straight,
        is_misc,
        is_small_edge,
        is_middle,
        is_big_edge,
        is_edge,
        is_dragon,
        is_tiger,
        is_tie,
    }
}

/// Classifies the number triple's form. Exactly one of the four is
/// true: triple (all three digits equal), pair (exactly two equal),
/// straight (three distinct digits forming a consecutive run, in any
/// order), misc (everything else).
fn classify_form(t: &NumberTriple) -> (bool, bool, bool, bool) {
    let (a, b, c) = (t.a, t.b, t.c);
    if a == b && b == c {
        return (true, false, false, false);
    }
    if a == b || b == c || a == c {
        return (false, true, false, false);
    }
    let mut sorted = [a, b, c];
    sorted.sort_unstable();
    let is_straight = sorted[1] == sorted[0] + 1 && sorted[2] == sorted[1] + 1;
    if is_straight {
        (false, false, true, false)
    } else {
        (false, false, false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draw_model::Issue;

    fn raw(nums: &str, sum: u8) -> RawDraw {
        RawDraw {
            issue: Issue::parse("2025001").unwrap(),
            open_time: Utc::now(),
            open_nums: nums.to_string(),
            sum,
            source: "S1".to_string(),
        }
    }

    #[test]
    fn matches_fresh_system_scenario() {
        let r = raw("3+5+8", 16);
        let t = NumberTriple::parse_canonical(&r.open_nums).unwrap();
        let d = enrich(r, t);
        assert!(d.is_big && !d.is_small);
        assert!(d.is_even && !d.is_odd);
        assert!(matches!(d.combination, Combination::BigEven));
        assert!(!d.is_pair && !d.is_straight && !d.is_triple && d.is_misc);
        assert!(d.is_middle && !d.is_small_edge && !d.is_big_edge && !d.is_edge);
        assert!(!d.is_dragon && d.is_tiger && !d.is_tie);
    }

    #[test]
    fn extreme_sums_flag_correctly() {
        let low = raw("0+0+0", 0);
        let t = NumberTriple::parse_canonical(&low.open_nums).unwrap();
        let d = enrich(low, t);
        assert!(d.is_extreme_small);
        assert!(d.is_triple);

        let high = raw("9+9+9", 27);
        let t = NumberTriple::parse_canonical(&high.open_nums).unwrap();
        let d = enrich(high, t);
        assert!(d.is_extreme_big);
    }

    #[test]
    fn straight_and_pair_are_disjoint() {
        let straight = raw("3+4+5", 12);
        let t = NumberTriple::parse_canonical(&straight.open_nums).unwrap();
        let d = enrich(straight, t);
        assert!(d.is_straight && !d.is_pair && !d.is_triple && !d.is_misc);

        let pair = raw("3+3+5", 11);
        let t = NumberTriple::parse_canonical(&pair.open_nums).unwrap();
        let d = enrich(pair, t);
        assert!(d.is_pair && !d.is_straight && !d.is_triple && !d.is_misc);
    }

    #[test]
    fn exhaustive_forms_are_mutually_exclusive() {
        for a in 0u8..=9 {
            for b in 0u8..=9 {
                for c in 0u8..=9 {
                    let t = NumberTriple { a, b, c };
                    let (triple, pair, straight, misc) = classify_form(&t);
                    let count = [triple, pair, straight, misc].iter().filter(|x| **x).count();
                    assert_eq!(count, 1, "triple {a}{b}{c} classified into {count} forms");
                }
            }
        }
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::*;
    use draw_model::Issue;

    fn raw(a: u8, b: u8, c: u8) -> (RawDraw, NumberTriple) {
        let t = NumberTriple { a, b, c };
        let r = RawDraw {
            issue: Issue::parse("2025001").unwrap(),
            open_time: Utc::now(),
            open_nums: t.canonical_string(),
            sum: t.sum(),
            source: "S1".to_string(),
        };
        (r, t)
    }

    proptest! {
        /// Every mutually-exclusive group enriched from a draw (spec.md
        /// section 8's enrichment invariant) has exactly one member set,
        /// across the full digit space rather than the hand-picked cases
        /// above.
        #[test]
        fn enriched_groups_are_mutually_exclusive(a in 0u8..=9, b in 0u8..=9, c in 0u8..=9) {
            let (r, t) = raw(a, b, c);
            let d = enrich(r, t);

            prop_assert_eq!([d.is_big, d.is_small].iter().filter(|x| **x).count(), 1);
            prop_assert_eq!([d.is_odd, d.is_even].iter().filter(|x| **x).count(), 1);
            prop_assert_eq!(
                [d.is_triple, d.is_pair, d.is_straight, d.is_misc].iter().filter(|x| **x).count(),
                1
            );
            prop_assert_eq!(
                [d.is_small_edge, d.is_middle, d.is_big_edge].iter().filter(|x| **x).count(),
                1
            );
            prop_assert_eq!([d.is_dragon, d.is_tiger, d.is_tie].iter().filter(|x| **x).count(), 1);
            prop_assert_eq!(d.sum, a + b + c);
        }
    }
}
