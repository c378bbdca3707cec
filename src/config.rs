//! Rental core configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Missing or unparsable values fall
//! back to the defaults below; rate tables are validated after parsing.

use crate::pricing::{DayHourRates, HourlyRates, TimeExtensionCalculator};

/// Top-level configuration.
///
/// Loaded once at startup via [`RentalConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RentalConfig {
    /// Peak/low hourly extension rates.
    pub hourly_rates: HourlyRates,

    /// Day + hour extension rates used at the pickup & return counter.
    pub day_hour_rates: DayHourRates,

    /// Prefix of every access payload.
    pub access_payload_base_uri: String,

    /// Key mixed into the access payload checksum.
    pub access_payload_key: String,

    /// Capacity of the EventBus broadcast channel.
    pub event_bus_capacity: usize,
}

impl RentalConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured rates are inconsistent (peak not
    /// above low, negative or oversized rates, or an empty peak window).
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let defaults = HourlyRates::default();
        let hourly_rates = HourlyRates::new(
            parse_env("PRICING_PEAK_RATE", defaults.peak()),
            parse_env("PRICING_LOW_RATE", defaults.low()),
            parse_env("PRICING_PEAK_START_HOUR", defaults.peak_start_hour()),
            parse_env("PRICING_PEAK_END_HOUR", defaults.peak_end_hour()),
        )?;

        let defaults = DayHourRates::default();
        let day_hour_rates = DayHourRates::new(
            parse_env("PRICING_DAY_RATE", defaults.per_day()),
            parse_env("PRICING_DAY_HOURLY_RATE", defaults.per_hour()),
        )?;

        let access_payload_base_uri = std::env::var("ACCESS_PAYLOAD_BASE_URI")
            .unwrap_or_else(|_| "rental://jobs/confirm".to_string());
        let access_payload_key =
            std::env::var("ACCESS_PAYLOAD_KEY").unwrap_or_else(|_| "rental-dev-key".to_string());

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1024);

        Ok(Self {
            hourly_rates,
            day_hour_rates,
            access_payload_base_uri,
            access_payload_key,
            event_bus_capacity,
        })
    }

    /// Builds the extension calculator from the configured rates.
    #[must_use]
    pub const fn calculator(&self) -> TimeExtensionCalculator {
        TimeExtensionCalculator::new(self.hourly_rates, self.day_hour_rates)
    }
}

impl Default for RentalConfig {
    fn default() -> Self {
        Self {
            hourly_rates: HourlyRates::default(),
            day_hour_rates: DayHourRates::default(),
            access_payload_base_uri: "rental://jobs/confirm".to_string(),
            access_payload_key: "rental-dev-key".to_string(),
            event_bus_capacity: 1024,
        }
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn defaults_match_reference_rates() {
        let config = RentalConfig::default();
        assert_eq!(config.hourly_rates.peak(), Decimal::new(15, 0));
        assert_eq!(config.hourly_rates.low(), Decimal::new(10, 0));
        assert_eq!(config.day_hour_rates.per_day(), Decimal::new(50, 0));
        assert_eq!(config.day_hour_rates.per_hour(), Decimal::new(5, 0));
        assert_eq!(config.calculator(), TimeExtensionCalculator::default());
    }

    #[test]
    fn parse_env_falls_back_on_missing_key() {
        let value: Decimal = parse_env("RENTAL_TEST_SURELY_UNSET_KEY", Decimal::new(7, 0));
        assert_eq!(value, Decimal::new(7, 0));
    }
}
