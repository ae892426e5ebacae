use std::path::Path;
use std::time::Duration;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{BookingError, Result},
    pricing::PricingConfig,
};

/// Shape of the generated availability calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityRules {
    /// Number of consecutive days, starting with the window start
    pub window_days: u32,
    /// First bookable hour (inclusive)
    pub opening_hour: u32,
    /// Last bookable hour (exclusive)
    pub closing_hour: u32,
    /// An on-the-hour slot is offered when a uniform draw exceeds this value
    pub full_hour_threshold: f64,
    /// A half-past slot is offered when a uniform draw exceeds this value
    pub half_hour_threshold: f64,
    pub closed_weekdays: Vec<Weekday>,
}

impl Default for AvailabilityRules {
    fn default() -> Self {
        Self {
            window_days: 21,
            opening_hour: 9,
            closing_hour: 17,
            full_hour_threshold: 0.4,
            half_hour_threshold: 0.7,
            closed_weekdays: vec![Weekday::Sun],
        }
    }
}

/// Runtime configuration for the booking wizard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub availability: AvailabilityRules,
    pub pricing: PricingConfig,
    /// Simulated round-trip of the availability lookup
    pub availability_latency_ms: u64,
    /// Simulated round-trip of the booking submission
    pub submission_latency_ms: u64,
    /// How long a closed wizard keeps its draft before resetting
    pub reset_grace_ms: u64,
    /// Message shown when a submission fails
    pub failure_notice: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            availability: AvailabilityRules::default(),
            pricing: PricingConfig::default(),
            availability_latency_ms: 600,
            submission_latency_ms: 1500,
            reset_grace_ms: 500,
            failure_notice: "Es gab einen Fehler. Bitte versuchen Sie es erneut.".to_string(),
        }
    }
}

impl BookingConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: BookingConfig =
            serde_yaml::from_str(raw).map_err(|e| BookingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BookingError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&raw)
    }

    /// Load from the file named by `BOOKING_CONFIG`, or fall back to defaults.
    pub fn from_env() -> Result<Self> {
        match std::env::var("BOOKING_CONFIG") {
            Ok(path) => {
                info!(path = %path, "Loading booking configuration");
                Self::from_yaml_file(path)
            }
            Err(_) => {
                info!("BOOKING_CONFIG not set, using default booking configuration");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let rules = &self.availability;
        if rules.window_days == 0 {
            return Err(BookingError::Config("window_days must be positive".to_string()));
        }
        if rules.opening_hour >= rules.closing_hour || rules.closing_hour > 24 {
            return Err(BookingError::Config(format!(
                "invalid opening hours {}..{}",
                rules.opening_hour, rules.closing_hour
            )));
        }
        for (name, value) in [
            ("full_hour_threshold", rules.full_hour_threshold),
            ("half_hour_threshold", rules.half_hour_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BookingError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    pub fn availability_latency(&self) -> Duration {
        Duration::from_millis(self.availability_latency_ms)
    }

    pub fn submission_latency(&self) -> Duration {
        Duration::from_millis(self.submission_latency_ms)
    }

    pub fn reset_grace(&self) -> Duration {
        Duration::from_millis(self.reset_grace_ms)
    }
}
