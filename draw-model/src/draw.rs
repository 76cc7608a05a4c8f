use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ModelError, Result},
    ids::Issue,
};

/// The three digits making up a draw's `open_nums` string, in source order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberTriple {
    pub a: u8,
    pub b: u8,
    pub c: u8,
}

impl NumberTriple {
    /// Parses the canonical `"a+b+c"` grammar. Callers normalize other
    /// separator forms (comma, space, no separator) before reaching here;
    /// see `draw-core`'s parser table.
    pub fn parse_canonical(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('+').collect();
        let [a, b, c] = parts.as_slice() else {
            return Err(ModelError::InvalidNumbers(s.to_string()));
        };
        let parse_digit = |p: &str| -> Result<u8> {
            if p.len() == 1 && p.as_bytes()[0].is_ascii_digit() {
                Ok(p.as_bytes()[0] - b'0')
            } else {
                Err(ModelError::InvalidNumbers(s.to_string()))
            }
        };
        Ok(Self {
            a: parse_digit(a)?,
            b: parse_digit(b)?,
            c: parse_digit(c)?,
        })
    }

    pub fn canonical_string(&self) -> String {
        format!("{}+{}+{}", self.a, self.b, self.c)
    }

    pub fn sum(&self) -> u8 {
        self.a + self.b + self.c
    }
}

/// Cross-product label of magnitude x parity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combination {
    BigOdd,
    SmallOdd,
    BigEven,
    SmallEven,
}

impl Combination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combination::BigOdd => "big-odd",
            Combination::SmallOdd => "small-odd",
            Combination::BigEven => "big-even",
            Combination::SmallEven => "small-even",
        }
    }
}

/// One of the 49 fixed classification labels a draw can hold: 21
/// boolean/enum categories plus 28 sum buckets ("00".."27").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Big,
    Small,
    Odd,
    Even,
    ExtremeBig,
    ExtremeSmall,
    ComboBigOdd,
    ComboSmallOdd,
    ComboBigEven,
    ComboSmallEven,
    Triple,
    Pair,
    Straight,
    Misc,
    SmallEdge,
    Middle,
    BigEdge,
    Edge,
    Dragon,
    Tiger,
    Tie,
    /// Sum bucket, 0..=27.
    Sum(u8),
}

impl Category {
    /// The full closed set of 49 categories, in a stable order.
    pub fn all() -> Vec<Category> {
        use Category::*;
        let mut v = vec![
            Big, Small, Odd, Even, ExtremeBig, ExtremeSmall, ComboBigOdd,
            ComboSmallOdd, ComboBigEven, ComboSmallEven, Triple, Pair,
            Straight, Misc, SmallEdge, Middle, BigEdge, Edge, Dragon, Tiger,
            Tie,
        ];
        v.extend((0..=27u8).map(Sum));
        v
    }

    /// Stable string key, used as the database/category-counter key.
    pub fn key(&self) -> String {
        use Category::*;
        match self {
            Big => "big".into(),
            Small => "small".into(),
            Odd => "odd".into(),
            Even => "even".into(),
            ExtremeBig => "extreme_big".into(),
            ExtremeSmall => "extreme_small".into(),
            ComboBigOdd => "big-odd".into(),
            ComboSmallOdd => "small-odd".into(),
            ComboBigEven => "big-even".into(),
            ComboSmallEven => "small-even".into(),
            Triple => "triple".into(),
            Pair => "pair".into(),
            Straight => "straight".into(),
            Misc => "misc".into(),
            SmallEdge => "small_edge".into(),
            Middle => "middle".into(),
            BigEdge => "big_edge".into(),
            Edge => "edge".into(),
            Dragon => "dragon".into(),
            Tiger => "tiger".into(),
            Tie => "tie".into(),
            Sum(n) => format!("{n:02}"),
        }
    }

    /// Inverse of `key()`, used by storage layers reading category rows
    /// back out of persistence.
    pub fn from_key(key: &str) -> Option<Category> {
        use Category::*;
        Some(match key {
            "big" => Big,
            "small" => Small,
            "odd" => Odd,
            "even" => Even,
            "extreme_big" => ExtremeBig,
            "extreme_small" => ExtremeSmall,
            "big-odd" => ComboBigOdd,
            "small-odd" => ComboSmallOdd,
            "big-even" => ComboBigEven,
            "small-even" => ComboSmallEven,
            "triple" => Triple,
            "pair" => Pair,
            "straight" => Straight,
            "misc" => Misc,
            "small_edge" => SmallEdge,
            "middle" => Middle,
            "big_edge" => BigEdge,
            "edge" => Edge,
            "dragon" => Dragon,
            "tiger" => Tiger,
            "tie" => Tie,
            other => return other.parse::<u8>().ok().filter(|n| *n <= 27).map(Sum),
        })
    }
}

/// The raw fields emitted by a source poller, before validation and
/// enrichment. Numbers are already normalized to the canonical
/// `"a+b+c"` form by the parser table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDraw {
    pub issue: Issue,
    pub open_time: DateTime<Utc>,
    pub open_nums: String,
    pub sum: u8,
    pub source: String,
}

impl RawDraw {
    /// Structural validation from spec.md section 4.5: number grammar and
    /// digit-sum consistency. Issue shape is enforced by `Issue::parse`
    /// itself. Time parsing and non-regression are stateful and live in
    /// `draw-core`'s coordinator, not here.
    pub fn validate(&self) -> Result<NumberTriple> {
        let triple = NumberTriple::parse_canonical(&self.open_nums)?;
        if self.sum > 27 {
            return Err(ModelError::SumOutOfRange(self.sum));
        }
        let computed = triple.sum();
        if computed != self.sum {
            return Err(ModelError::SumMismatch {
                declared: self.sum,
                computed,
            });
        }
        Ok(triple)
    }
}

/// A committed draw with all 19 fields derived by the enricher
/// (`draw-core::enrich::enrich`) persisted alongside the raw fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub issue: Issue,
    pub open_time: DateTime<Utc>,
    pub open_nums: String,
    pub sum: u8,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub is_big: bool,
    pub is_small: bool,
    pub is_odd: bool,
    pub is_even: bool,
    pub is_extreme_big: bool,
    pub is_extreme_small: bool,
    pub combination: Combination,
    pub is_triple: bool,
    pub is_pair: bool,
    pub is_straight: bool,
    pub is_misc: bool,
    pub is_small_edge: bool,
    pub is_middle: bool,
    pub is_big_edge: bool,
    pub is_edge: bool,
    pub is_dragon: bool,
    pub is_tiger: bool,
    pub is_tie: bool,
}

impl Draw {
    /// The set `H` of categories held by this draw (spec.md section 4.6
    /// step 2): the sum bucket is always included alongside every
    /// boolean category that currently holds.
    pub fn held_categories(&self) -> Vec<Category> {
        use Category::*;
        let mut held = vec![Sum(self.sum)];
        held.push(if self.is_big { Big } else { Small });
        held.push(if self.is_odd { Odd } else { Even });
        if self.is_extreme_big {
            held.push(ExtremeBig);
        }
        if self.is_extreme_small {
            held.push(ExtremeSmall);
        }
        held.push(match self.combination {
            Combination::BigOdd => ComboBigOdd,
            Combination::SmallOdd => ComboSmallOdd,
            Combination::BigEven => ComboBigEven,
            Combination::SmallEven => ComboSmallEven,
        });
        held.push(if self.is_triple {
            Triple
        } else if self.is_pair {
            Pair
        } else if self.is_straight {
            Straight
        } else {
            Misc
        });
        held.push(if self.is_small_edge {
            SmallEdge
        } else if self.is_middle {
            Middle
        } else {
            BigEdge
        });
        if self.is_edge {
            held.push(Edge);
        }
        held.push(if self.is_dragon {
            Dragon
        } else if self.is_tiger {
            Tiger
        } else {
            Tie
        });
        held
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_triple_round_trips() {
        let t = NumberTriple::parse_canonical("3+5+8").unwrap();
        assert_eq!(t.sum(), 16);
        assert_eq!(t.canonical_string(), "3+5+8");
    }

    #[test]
    fn rejects_dash_separated() {
        assert!(NumberTriple::parse_canonical("3-5-8").is_err());
    }

    #[test]
    fn rejects_multi_digit_component() {
        assert!(NumberTriple::parse_canonical("10+5+8").is_err());
    }

    #[test]
    fn validate_rejects_sum_mismatch() {
        let raw = RawDraw {
            issue: Issue::parse("2025001").unwrap(),
            open_time: Utc::now(),
            open_nums: "3+5+8".into(),
            sum: 15,
            source: "S1".into(),
        };
        assert!(matches!(
            raw.validate(),
            Err(ModelError::SumMismatch { declared: 15, computed: 16 })
        ));
    }

    #[test]
    fn category_set_has_49_members() {
        assert_eq!(Category::all().len(), 49);
    }

    #[test]
    fn category_key_round_trips_for_every_member() {
        for c in Category::all() {
            let key = c.key();
            assert_eq!(Category::from_key(&key), Some(c), "key {key} did not round-trip");
        }
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::NumberTriple;

    proptest! {
        /// sum = a + b + c for any digit triple (spec.md section 8).
        #[test]
        fn sum_matches_digit_total(a in 0u8..=9, b in 0u8..=9, c in 0u8..=9) {
            let canonical = format!("{a}+{b}+{c}");
            let t = NumberTriple::parse_canonical(&canonical).unwrap();
            prop_assert_eq!(t.sum(), a + b + c);
            prop_assert_eq!(t.canonical_string(), canonical);
        }
    }
}
