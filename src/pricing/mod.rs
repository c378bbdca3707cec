//! Extension pricing: duration, rate bucket, and fee computation.
//!
//! [`TimeExtensionCalculator`] is side-effect free. It is consulted by
//! [`crate::service::ExtensionRequestManager`] whenever a new return time
//! is proposed.

pub mod calculator;

pub use calculator::{
    DayHourRates, ExtensionCalculation, HourlyRates, PricingStrategy, RateClass,
    TimeExtensionCalculator,
};
