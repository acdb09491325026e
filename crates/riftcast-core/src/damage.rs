//! Randomized base-damage rolls.
//!
//! A roll turns a mean, a scale factor, and a variance fraction into a single
//! magnitude. The draw is supplied by the caller so the roll itself stays a
//! pure function.

use serde::{Deserialize, Serialize};

/// Damage range described by `(mean, scale, variance)`.
///
/// With `base = mean * scale` the range is
/// `[base * (1 - variance/2), base * (1 + variance/2)]` and a draw maps onto it
/// linearly. A draw of `0.5` returns exactly `base`.
///
/// # Example
///
/// ```
/// use riftcast_core::damage::DamageRoll;
///
/// let roll = DamageRoll::new(1000.0, 1.5, 0.24);
/// assert_eq!(roll.roll(0.5), 1500.0);
/// assert!((roll.min() - 1320.0).abs() < 1e-9);
/// assert!((roll.max() - 1680.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRoll {
    /// Mean damage before scaling (usually the caster's spell scaling value).
    pub mean: f64,
    /// Multiplier applied to the mean.
    pub scale: f64,
    /// Total width of the range as a fraction of the scaled base.
    pub variance: f64,
}

impl DamageRoll {
    /// Creates a roll description.
    #[must_use]
    pub const fn new(mean: f64, scale: f64, variance: f64) -> Self {
        Self {
            mean,
            scale,
            variance,
        }
    }

    /// The scaled midpoint, `mean * scale`.
    #[must_use]
    pub fn base(&self) -> f64 {
        self.mean * self.scale
    }

    /// Smallest value this roll can return.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.roll(0.0)
    }

    /// Upper end of the range. A draw never quite reaches it.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.roll(1.0)
    }

    /// Maps `draw` onto the range, clamping negative results to zero.
    #[must_use]
    pub fn roll(&self, draw: f64) -> f64 {
        let value = self.base() * (1.0 + self.variance * (draw - 0.5));
        value.max(0.0)
    }
}

/// Free-function form of [`DamageRoll::roll`].
#[must_use]
pub fn roll(mean: f64, scale: f64, variance: f64, draw: f64) -> f64 {
    DamageRoll::new(mean, scale, variance).roll(draw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn midpoint_draw_returns_base_exactly() {
        assert_eq!(roll(1000.0, 1.5, 0.24, 0.5), 1500.0);
    }

    #[test]
    fn zero_variance_is_flat() {
        let r = DamageRoll::new(200.0, 2.0, 0.0);
        assert_eq!(r.roll(0.0), 400.0);
        assert_eq!(r.roll(0.99), 400.0);
    }

    #[test]
    fn negative_base_clamps_to_zero() {
        let r = DamageRoll::new(-100.0, 1.0, 0.5);
        assert_eq!(r.roll(0.0), 0.0);
        assert_eq!(r.roll(0.9), 0.0);
    }

    #[test]
    fn variance_above_two_clamps_lower_bound() {
        // 1 - 3/2 < 0: the low end of the range would be negative.
        let r = DamageRoll::new(100.0, 1.0, 3.0);
        assert_eq!(r.roll(0.0), 0.0);
        assert!(r.roll(0.9) > 0.0);
    }

    proptest! {
        #[test]
        fn roll_stays_within_range(
            mean in 0.0f64..100_000.0,
            scale in 0.0f64..10.0,
            variance in 0.0f64..=1.0,
            draw in 0.0f64..1.0,
        ) {
            let base = mean * scale;
            let value = roll(mean, scale, variance, draw);
            let lo = base * (1.0 - variance / 2.0);
            let hi = base * (1.0 + variance / 2.0);
            let slack = 1e-9 * base.max(1.0);
            prop_assert!(value >= lo - slack, "{value} below {lo}");
            prop_assert!(value <= hi + slack, "{value} above {hi}");
        }

        #[test]
        fn roll_is_monotonic_in_draw(
            mean in 0.0f64..100_000.0,
            scale in 0.0f64..10.0,
            variance in 0.0f64..=1.0,
            a in 0.0f64..1.0,
            b in 0.0f64..1.0,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(roll(mean, scale, variance, lo) <= roll(mean, scale, variance, hi));
        }
    }
}
