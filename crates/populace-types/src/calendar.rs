//! Day/year conversions shared by every crate.
//!
//! All durations are stored as whole days. Rates and the fertility curve
//! work in fractional years using the mean tropical year.

/// Length of the mean tropical year in days.
pub const EARTH_YEAR_DAYS: f64 = 365.2422;

/// Convert whole days to fractional years.
#[allow(clippy::cast_precision_loss)]
pub const fn days_to_years(days: i64) -> f64 {
    days as f64 / EARTH_YEAR_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_year_of_days_is_one_year() {
        let years = days_to_years(365);
        assert!((years - 0.999_337).abs() < 1e-5);
    }

    #[test]
    fn negative_days_stay_negative() {
        assert!(days_to_years(-10) < 0.0);
    }
}
