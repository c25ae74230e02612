//! Age-dependent fertility.
//!
//! Fertility follows a double-logistic curve: a logistic rise around a
//! rising midpoint multiplied by the complement of a logistic fall around
//! a falling midpoint, scaled by the peak per-cycle rate. Species with
//! near-zero steepness on both edges use the flat peak rate instead.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Curve policy
// ---------------------------------------------------------------------------

/// Fraction of the fertile span after puberty at which fertility peaks.
pub const PEAK_FRACTION: f64 = 0.127;

/// Divisor applied to `puberty + peak` to place the rising midpoint.
pub const RISING_MIDPOINT_DIVISOR: f64 = 1.6;

/// Divisor applied to `peak + menopause` to place the falling midpoint.
pub const FALLING_MIDPOINT_DIVISOR: f64 = 1.95;

/// Both steepness values below this select the flat curve.
pub const FLAT_CURVE_STEEPNESS_THRESHOLD: f64 = 0.01;

/// Multiplier applied to fertility when a mother uses contraception.
pub const CONTRACEPTION_FERTILITY_FACTOR: f64 = 0.123;

// ---------------------------------------------------------------------------
// Formulas
// ---------------------------------------------------------------------------

/// Standard logistic function.
///
/// Evaluated in the split form so large magnitudes saturate at 0 or 1
/// instead of overflowing `exp`.
pub fn logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Fertility probability at a given age (years).
///
/// `peak * logistic(rise_k * (age - rise_mid)) * (1 - logistic(fall_k * (age - fall_mid)))`.
/// Always within `[0, peak]`; returns 0 for a non-positive peak.
pub fn age_based_fertility(
    age_years: f64,
    peak: f64,
    rising_steepness: f64,
    rising_midpoint: f64,
    falling_steepness: f64,
    falling_midpoint: f64,
) -> f64 {
    if peak.is_nan() || peak <= 0.0 {
        return 0.0;
    }
    let rising = logistic(rising_steepness * (age_years - rising_midpoint));
    let falling = 1.0 - logistic(falling_steepness * (age_years - falling_midpoint));
    let value = peak * rising * falling;
    if value.is_nan() { 0.0 } else { value.clamp(0.0, peak) }
}

// ---------------------------------------------------------------------------
// FertilityCurve
// ---------------------------------------------------------------------------

/// A species' fertility curve with its midpoints already placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FertilityCurve {
    /// Peak per-cycle fertility.
    pub peak: f64,
    /// Steepness of the rising edge.
    pub rising_steepness: f64,
    /// Age (years) at the middle of the rising edge.
    pub rising_midpoint: f64,
    /// Steepness of the falling edge.
    pub falling_steepness: f64,
    /// Age (years) at the middle of the falling edge.
    pub falling_midpoint: f64,
}

impl FertilityCurve {
    /// Place the curve midpoints over a fertile window (years).
    pub fn for_window(
        puberty_years: f64,
        menopause_years: f64,
        peak: f64,
        rising_steepness: f64,
        falling_steepness: f64,
    ) -> Self {
        let fertile_years = menopause_years - puberty_years;
        let peak_age = fertile_years.mul_add(PEAK_FRACTION, puberty_years);
        Self {
            peak,
            rising_steepness,
            rising_midpoint: (puberty_years + peak_age) / RISING_MIDPOINT_DIVISOR,
            falling_steepness,
            falling_midpoint: (peak_age + menopause_years) / FALLING_MIDPOINT_DIVISOR,
        }
    }

    /// Return `true` when both edges are too shallow to matter.
    pub const fn is_flat(&self) -> bool {
        self.rising_steepness < FLAT_CURVE_STEEPNESS_THRESHOLD
            && self.falling_steepness < FLAT_CURVE_STEEPNESS_THRESHOLD
    }

    /// Per-cycle fertility at the given age (years).
    pub fn rate_at(&self, age_years: f64) -> f64 {
        if self.is_flat() {
            return self.peak.max(0.0);
        }
        age_based_fertility(
            age_years,
            self.peak,
            self.rising_steepness,
            self.rising_midpoint,
            self.falling_steepness,
            self.falling_midpoint,
        )
    }
}
