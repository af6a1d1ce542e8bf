//! Explicit rounding helpers.
//!
//! Every tie rounds half up. Scoring paths use the integer forms so results
//! are exact and identical on every run; the `f64` forms exist for callers
//! that already hold a fractional value.

/// `floor(numer / denom + 1/2)` computed without floating point.
///
/// A zero denominator yields 0.
#[must_use]
pub fn round_ratio_half_up(numer: u64, denom: u64) -> u64 {
    if denom == 0 {
        return 0;
    }
    numer.saturating_mul(2).saturating_add(denom) / denom.saturating_mul(2)
}

/// Round to the nearest integer, ties up (2.5 -> 3).
#[must_use]
pub fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Round to the nearest 0.5, ties up (6.25 -> 6.5, 6.75 -> 7.0).
#[must_use]
pub fn round_to_half(x: f64) -> f64 {
    round_half_up(x * 2.0) / 2.0
}

/// Whole-number percentage of `score / total`, 0 when `total` is 0, capped at 100.
#[must_use]
pub fn percentage(score: u32, total: u32) -> u8 {
    let pct = round_ratio_half_up(u64::from(score.min(total)) * 100, u64::from(total));
    u8::try_from(pct.min(100)).unwrap_or(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_rounds_half_up() {
        assert_eq!(round_ratio_half_up(270, 40), 7); // 6.75
        assert_eq!(round_ratio_half_up(9, 2), 5); // 4.5
        assert_eq!(round_ratio_half_up(13, 3), 4); // 4.33
        assert_eq!(round_ratio_half_up(5, 0), 0);
    }

    #[test]
    fn float_helpers_break_ties_upwards() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(2.49), 2.0);
        assert_eq!(round_to_half(6.25), 6.5);
        assert_eq!(round_to_half(6.75), 7.0);
        assert_eq!(round_to_half(6.2), 6.0);
    }

    #[test]
    fn percentage_caps_and_guards_zero() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(5, 4), 100);
        assert_eq!(percentage(0, 0), 0);
    }
}
