//! Extension duration, rate bucket, and fee computation.
//!
//! Pure functions over two timestamps and the configured rates. Two
//! strategies are kept side by side because the booking screens and the
//! pickup & return counter bill extensions differently:
//!
//! - [`PricingStrategy::Hourly`]: `hours × rate`, where the rate is the
//!   peak or low hourly rate chosen by the hour-of-day of the proposed
//!   return time.
//! - [`PricingStrategy::DayPlusHour`]: whole days at a day rate plus the
//!   remaining hours at a flat hourly rate.

use chrono::{NaiveDateTime, TimeDelta, Timelike};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RentalError;

const HOURS_PER_DAY: i64 = 24;

/// Largest accepted rate. Bounds every fee well inside `Decimal` range
/// for any pair of representable timestamps.
fn max_rate() -> Decimal {
    Decimal::new(1_000_000, 0)
}

fn check_rate(name: &str, rate: Decimal) -> Result<(), RentalError> {
    if rate.is_sign_negative() || rate > max_rate() {
        return Err(RentalError::Validation(format!(
            "{name} rate must be within [0, {}]: {rate}",
            max_rate()
        )));
    }
    Ok(())
}

/// Time-of-day bucket used to pick the hourly rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateClass {
    /// Daytime session (default `[08:00, 20:00)`).
    Peak,
    /// Everything outside the peak window.
    Low,
}

/// Named calculation strategy selected by the caller's flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStrategy {
    /// Peak/low hourly buckets.
    Hourly,
    /// Day rate plus flat hourly remainder.
    DayPlusHour,
}

/// Peak/low hourly rates and the peak window.
///
/// Only constructed through [`HourlyRates::new`] or `Default`, so the
/// rates are always within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourlyRates {
    peak: Decimal,
    low: Decimal,
    peak_start_hour: u32,
    peak_end_hour: u32,
}

impl HourlyRates {
    /// Creates validated hourly rates.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Validation`] if a rate is negative or above
    /// the rate cap, the peak rate is not strictly greater than the low
    /// rate, or the window is not `0 <= start < end <= 24`.
    pub fn new(
        peak: Decimal,
        low: Decimal,
        peak_start_hour: u32,
        peak_end_hour: u32,
    ) -> Result<Self, RentalError> {
        check_rate("low", low)?;
        check_rate("peak", peak)?;
        if peak <= low {
            return Err(RentalError::Validation(format!(
                "peak rate {peak} must exceed low rate {low}"
            )));
        }
        if peak_start_hour >= peak_end_hour || peak_end_hour > 24 {
            return Err(RentalError::Validation(format!(
                "invalid peak window [{peak_start_hour}, {peak_end_hour})"
            )));
        }
        Ok(Self {
            peak,
            low,
            peak_start_hour,
            peak_end_hour,
        })
    }

    /// Rate per hour inside the peak window.
    #[must_use]
    pub const fn peak(&self) -> Decimal {
        self.peak
    }

    /// Rate per hour outside the peak window.
    #[must_use]
    pub const fn low(&self) -> Decimal {
        self.low
    }

    /// First hour of the peak window (inclusive).
    #[must_use]
    pub const fn peak_start_hour(&self) -> u32 {
        self.peak_start_hour
    }

    /// End of the peak window (exclusive).
    #[must_use]
    pub const fn peak_end_hour(&self) -> u32 {
        self.peak_end_hour
    }

    /// Classifies a wall-clock time into a rate bucket.
    #[must_use]
    pub fn classify(&self, at: NaiveDateTime) -> RateClass {
        let hour = at.hour();
        if hour >= self.peak_start_hour && hour < self.peak_end_hour {
            RateClass::Peak
        } else {
            RateClass::Low
        }
    }

    /// Returns the hourly rate for a bucket.
    #[must_use]
    pub const fn rate_for(&self, class: RateClass) -> Decimal {
        match class {
            RateClass::Peak => self.peak,
            RateClass::Low => self.low,
        }
    }
}

impl Default for HourlyRates {
    fn default() -> Self {
        Self {
            peak: Decimal::new(15, 0),
            low: Decimal::new(10, 0),
            peak_start_hour: 8,
            peak_end_hour: 20,
        }
    }
}

/// Day rate plus flat hourly remainder rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayHourRates {
    per_day: Decimal,
    per_hour: Decimal,
}

impl DayHourRates {
    /// Creates validated day/hour rates.
    ///
    /// # Errors
    ///
    /// Returns [`RentalError::Validation`] if either rate is negative or
    /// above the rate cap.
    pub fn new(per_day: Decimal, per_hour: Decimal) -> Result<Self, RentalError> {
        check_rate("day", per_day)?;
        check_rate("hour", per_hour)?;
        Ok(Self { per_day, per_hour })
    }

    /// Rate per whole 24-hour day.
    #[must_use]
    pub const fn per_day(&self) -> Decimal {
        self.per_day
    }

    /// Rate per remaining hour.
    #[must_use]
    pub const fn per_hour(&self) -> Decimal {
        self.per_hour
    }
}

impl Default for DayHourRates {
    fn default() -> Self {
        Self {
            per_day: Decimal::new(50, 0),
            per_hour: Decimal::new(5, 0),
        }
    }
}

/// Result of pricing a proposed return time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionCalculation {
    /// Strategy that produced this calculation.
    pub strategy: PricingStrategy,
    /// Billed duration in whole hours (ceiling of elapsed time, >= 1).
    pub hours: i64,
    /// Whole days billed at the day rate (zero for hourly pricing).
    pub days: i64,
    /// Hours billed at the hourly rate after whole days are removed.
    pub remainder_hours: i64,
    /// Bucket of the proposed return time.
    pub rate_class: RateClass,
    /// Hourly rate applied to `remainder_hours`.
    pub hourly_rate: Decimal,
    /// Total fee.
    pub fee: Decimal,
}

/// Prices extensions against configured rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeExtensionCalculator {
    hourly: HourlyRates,
    day_hour: DayHourRates,
}

impl TimeExtensionCalculator {
    /// Creates a calculator with the given rate tables.
    #[must_use]
    pub const fn new(hourly: HourlyRates, day_hour: DayHourRates) -> Self {
        Self { hourly, day_hour }
    }

    /// Returns the hourly rate table.
    #[must_use]
    pub const fn hourly_rates(&self) -> &HourlyRates {
        &self.hourly
    }

    /// Returns the day/hour rate table.
    #[must_use]
    pub const fn day_hour_rates(&self) -> &DayHourRates {
        &self.day_hour
    }

    /// Prices an extension with the selected strategy.
    ///
    /// Returns `None` when `proposed` is not strictly after `reference`.
    #[must_use]
    pub fn compute(
        &self,
        strategy: PricingStrategy,
        reference: NaiveDateTime,
        proposed: NaiveDateTime,
    ) -> Option<ExtensionCalculation> {
        match strategy {
            PricingStrategy::Hourly => self.compute_hourly(reference, proposed),
            PricingStrategy::DayPlusHour => self.compute_day_hour(reference, proposed),
        }
    }

    /// `hours × rate`, rate chosen by the proposed time's bucket.
    #[must_use]
    pub fn compute_hourly(
        &self,
        reference: NaiveDateTime,
        proposed: NaiveDateTime,
    ) -> Option<ExtensionCalculation> {
        let hours = billed_hours(reference, proposed)?;
        let rate_class = self.hourly.classify(proposed);
        let hourly_rate = self.hourly.rate_for(rate_class);
        Some(ExtensionCalculation {
            strategy: PricingStrategy::Hourly,
            hours,
            days: 0,
            remainder_hours: hours,
            rate_class,
            hourly_rate,
            fee: hourly_rate * Decimal::from(hours),
        })
    }

    /// `days × day rate + remaining hours × hour rate`.
    #[must_use]
    pub fn compute_day_hour(
        &self,
        reference: NaiveDateTime,
        proposed: NaiveDateTime,
    ) -> Option<ExtensionCalculation> {
        let hours = billed_hours(reference, proposed)?;
        let days = hours / HOURS_PER_DAY;
        let remainder_hours = hours % HOURS_PER_DAY;
        let fee = self.day_hour.per_day * Decimal::from(days)
            + self.day_hour.per_hour * Decimal::from(remainder_hours);
        Some(ExtensionCalculation {
            strategy: PricingStrategy::DayPlusHour,
            hours,
            days,
            remainder_hours,
            rate_class: self.hourly.classify(proposed),
            hourly_rate: self.day_hour.per_hour,
            fee,
        })
    }
}

/// Ceiling of the elapsed time in hours; `None` unless strictly positive.
fn billed_hours(reference: NaiveDateTime, proposed: NaiveDateTime) -> Option<i64> {
    let elapsed = proposed.signed_duration_since(reference);
    if elapsed <= TimeDelta::zero() {
        return None;
    }
    let whole = elapsed.num_hours();
    if elapsed > TimeDelta::try_hours(whole)? {
        Some(whole + 1)
    } else {
        Some(whole)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        let Some(t) = NaiveDate::from_ymd_opt(2025, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
        else {
            panic!("valid timestamp");
        };
        t
    }

    #[test]
    fn overnight_extension_into_peak() {
        let calc = TimeExtensionCalculator::default();
        let Some(result) = calc.compute_hourly(at(1, 15, 18, 0), at(1, 16, 10, 0)) else {
            panic!("expected a valid extension");
        };
        assert_eq!(result.hours, 16);
        assert_eq!(result.rate_class, RateClass::Peak);
        assert_eq!(result.hourly_rate, Decimal::new(15, 0));
        assert_eq!(result.fee, Decimal::new(240, 0));
    }

    #[test]
    fn late_evening_extension_is_low() {
        let calc = TimeExtensionCalculator::default();
        let Some(result) = calc.compute_hourly(at(1, 14, 20, 0), at(1, 14, 22, 0)) else {
            panic!("expected a valid extension");
        };
        assert_eq!(result.hours, 2);
        assert_eq!(result.rate_class, RateClass::Low);
        assert_eq!(result.fee, Decimal::new(20, 0));
    }

    #[test]
    fn partial_hours_round_up() {
        let calc = TimeExtensionCalculator::default();
        let reference = at(3, 1, 9, 0);
        let Some(result) = calc.compute_hourly(reference, reference + Duration::minutes(61)) else {
            panic!("expected a valid extension");
        };
        assert_eq!(result.hours, 2);

        let Some(tiny) = calc.compute_hourly(reference, reference + Duration::milliseconds(1))
        else {
            panic!("expected a valid extension");
        };
        assert_eq!(tiny.hours, 1);

        let Some(sub_milli) =
            calc.compute_hourly(reference, reference + Duration::microseconds(500))
        else {
            panic!("a sub-millisecond extension is still positive");
        };
        assert_eq!(sub_milli.hours, 1);
        assert_eq!(sub_milli.fee, Decimal::new(15, 0));

        let Some(exact) = calc.compute_hourly(reference, reference + Duration::hours(3)) else {
            panic!("expected a valid extension");
        };
        assert_eq!(exact.hours, 3);
    }

    #[test]
    fn non_positive_durations_are_rejected() {
        let calc = TimeExtensionCalculator::default();
        let reference = at(1, 15, 18, 0);
        assert!(calc.compute_hourly(reference, reference).is_none());
        assert!(calc.compute_hourly(reference, at(1, 15, 12, 0)).is_none());
        assert!(calc.compute_day_hour(reference, reference).is_none());
        assert!(calc.compute_day_hour(reference, at(1, 10, 0, 0)).is_none());
    }

    #[test]
    fn peak_window_boundaries() {
        let rates = HourlyRates::default();
        assert_eq!(rates.classify(at(1, 1, 7, 59)), RateClass::Low);
        assert_eq!(rates.classify(at(1, 1, 8, 0)), RateClass::Peak);
        assert_eq!(rates.classify(at(1, 1, 19, 59)), RateClass::Peak);
        assert_eq!(rates.classify(at(1, 1, 20, 0)), RateClass::Low);
    }

    #[test]
    fn hourly_fee_is_hours_times_bucket_rate() {
        let calc = TimeExtensionCalculator::default();
        let reference = at(2, 1, 0, 0);
        for offset in 1..=72 {
            let proposed = reference + Duration::hours(offset);
            let Some(result) = calc.compute_hourly(reference, proposed) else {
                panic!("expected a valid extension for offset {offset}");
            };
            assert_eq!(result.hours, offset);
            let rate = calc.hourly_rates().rate_for(calc.hourly_rates().classify(proposed));
            assert_eq!(result.fee, rate * Decimal::from(offset));
        }
    }

    #[test]
    fn day_hour_splits_whole_days() {
        let calc = TimeExtensionCalculator::default();
        let reference = at(1, 15, 18, 0);
        let Some(result) = calc.compute_day_hour(reference, at(1, 17, 21, 0)) else {
            panic!("expected a valid extension");
        };
        assert_eq!(result.hours, 51);
        assert_eq!(result.days, 2);
        assert_eq!(result.remainder_hours, 3);
        assert_eq!(result.fee, Decimal::new(115, 0));
        assert_eq!(result.strategy, PricingStrategy::DayPlusHour);
    }

    #[test]
    fn day_hour_rounds_partial_hour_into_next_day() {
        let calc = TimeExtensionCalculator::default();
        let reference = at(1, 15, 18, 0);
        let proposed = reference + Duration::hours(23) + Duration::minutes(30);
        let Some(result) = calc.compute(PricingStrategy::DayPlusHour, reference, proposed) else {
            panic!("expected a valid extension");
        };
        assert_eq!(result.days, 1);
        assert_eq!(result.remainder_hours, 0);
        assert_eq!(result.fee, Decimal::new(50, 0));
    }

    #[test]
    fn rate_validation() {
        assert!(HourlyRates::new(Decimal::new(10, 0), Decimal::new(10, 0), 8, 20).is_err());
        assert!(HourlyRates::new(Decimal::new(15, 0), Decimal::new(-1, 0), 8, 20).is_err());
        assert!(HourlyRates::new(Decimal::new(15, 0), Decimal::new(10, 0), 20, 8).is_err());
        assert!(HourlyRates::new(Decimal::new(15, 0), Decimal::new(10, 0), 8, 25).is_err());
        assert!(HourlyRates::new(Decimal::new(15, 0), Decimal::new(10, 0), 0, 24).is_ok());
        assert!(DayHourRates::new(Decimal::new(-50, 0), Decimal::new(5, 0)).is_err());
    }

    #[test]
    fn oversized_rates_are_rejected() {
        assert!(HourlyRates::new(Decimal::MAX, Decimal::new(10, 0), 8, 20).is_err());
        assert!(HourlyRates::new(Decimal::new(1_000_001, 0), Decimal::new(10, 0), 8, 20).is_err());
        assert!(DayHourRates::new(Decimal::MAX, Decimal::new(5, 0)).is_err());
        assert!(DayHourRates::new(Decimal::new(50, 0), Decimal::MAX).is_err());
    }

    #[test]
    fn capped_rates_price_the_widest_span() {
        let Ok(hourly) = HourlyRates::new(max_rate(), Decimal::new(999_999, 0), 0, 24) else {
            panic!("rates at the cap are valid");
        };
        let Ok(day_hour) = DayHourRates::new(max_rate(), max_rate()) else {
            panic!("rates at the cap are valid");
        };
        let calc = TimeExtensionCalculator::new(hourly, day_hour);
        let (from, to) = (NaiveDateTime::MIN, NaiveDateTime::MAX);

        let Some(hourly_result) = calc.compute_hourly(from, to) else {
            panic!("expected a valid extension");
        };
        assert_eq!(
            hourly_result.fee,
            hourly_result.hourly_rate * Decimal::from(hourly_result.hours)
        );

        let Some(day_result) = calc.compute_day_hour(from, to) else {
            panic!("expected a valid extension");
        };
        assert!(day_result.fee > Decimal::ZERO);
    }

    #[test]
    fn custom_rates_change_fee() {
        let Ok(hourly) = HourlyRates::new(Decimal::new(20, 0), Decimal::new(12, 0), 6, 22) else {
            panic!("valid rates");
        };
        let calc = TimeExtensionCalculator::new(hourly, DayHourRates::default());
        let Some(result) = calc.compute_hourly(at(1, 14, 20, 0), at(1, 14, 22, 0)) else {
            panic!("expected a valid extension");
        };
        assert_eq!(result.rate_class, RateClass::Low);
        assert_eq!(result.fee, Decimal::new(24, 0));
    }
}
