use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Days, NaiveDate, NaiveTime};
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{config::AvailabilityRules, error::Result};

/// A bookable start time on a given day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    /// Display label, e.g. "9:00" or "14:30"
    pub time: String,
    pub starts_at: NaiveTime,
    pub available: bool,
}

/// Bookable slots for one calendar day, ordered by start time. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

/// Source of the calendar shown on the first wizard step.
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn fetch(&self, window_start: NaiveDate) -> Result<Vec<DayAvailability>>;
}

fn slot(date: NaiveDate, hour: u32, minute: u32) -> Option<TimeSlot> {
    let starts_at = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let id = if minute == 0 {
        format!("{}-{}", date, hour)
    } else {
        format!("{}-{}-{}", date, hour, minute)
    };
    Some(TimeSlot {
        id,
        time: format!("{}:{:02}", hour, minute),
        starts_at,
        available: true,
    })
}

/// Draw a randomized calendar over the window starting at `window_start`.
///
/// Each open hour gets two independent draws: the first decides the
/// on-the-hour slot, the second the half-past slot. Closed weekdays and days
/// without any slot are left out.
pub fn generate<R: Rng + ?Sized>(
    window_start: NaiveDate,
    rules: &AvailabilityRules,
    rng: &mut R,
) -> Vec<DayAvailability> {
    let mut availability = Vec::new();

    for offset in 0..rules.window_days {
        let Some(date) = window_start.checked_add_days(Days::new(u64::from(offset))) else {
            break;
        };
        if rules.closed_weekdays.contains(&date.weekday()) {
            continue;
        }

        let mut slots = Vec::new();
        for hour in rules.opening_hour..rules.closing_hour {
            if rng.random::<f64>() > rules.full_hour_threshold {
                slots.extend(slot(date, hour, 0));
            }
            if rng.random::<f64>() > rules.half_hour_threshold {
                slots.extend(slot(date, hour, 30));
            }
        }
        slots.sort_by_key(|slot| slot.starts_at);

        if !slots.is_empty() {
            availability.push(DayAvailability { date, slots });
        }
    }

    availability
}

/// In-memory stand-in for a scheduling backend.
///
/// Sleeps for `latency` before answering and draws slots from the injected
/// random source, so tests can pin the calendar with a seed.
pub struct MockAvailability<R = StdRng> {
    rules: AvailabilityRules,
    latency: Duration,
    rng: Mutex<R>,
}

impl MockAvailability<StdRng> {
    pub fn new(rules: AvailabilityRules, latency: Duration) -> Self {
        Self::with_rng(rules, latency, StdRng::from_os_rng())
    }

    pub fn seeded(rules: AvailabilityRules, latency: Duration, seed: u64) -> Self {
        Self::with_rng(rules, latency, StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore + Send> MockAvailability<R> {
    pub fn with_rng(rules: AvailabilityRules, latency: Duration, rng: R) -> Self {
        Self {
            rules,
            latency,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl<R: RngCore + Send> AvailabilitySource for MockAvailability<R> {
    async fn fetch(&self, window_start: NaiveDate) -> Result<Vec<DayAvailability>> {
        tokio::time::sleep(self.latency).await;

        let availability = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            generate(window_start, &self.rules, &mut *rng)
        };

        debug!(
            window_start = %window_start,
            days = availability.len(),
            slots = availability.iter().map(|d| d.slots.len()).sum::<usize>(),
            "Generated availability"
        );
        Ok(availability)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    /// Yields the same word forever
    struct ConstRng(u64);

    impl RngCore for ConstRng {
        fn next_u32(&mut self) -> u32 {
            self.0 as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(self.0 as u8);
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn generated_days_respect_calendar_invariants() {
        let rules = AvailabilityRules::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let days = generate(monday(), &rules, &mut rng);

            let last = monday() + Days::new(20);
            for day in &days {
                assert_ne!(day.date.weekday(), Weekday::Sun);
                assert!(day.date >= monday() && day.date <= last);
                assert!(!day.slots.is_empty());
                assert!(day.slots.len() <= 16);
                assert!(day.slots.windows(2).all(|w| w[0].starts_at <= w[1].starts_at));
                assert!(day.slots.iter().all(|s| s.available));
            }
            assert!(days.windows(2).all(|w| w[0].date < w[1].date));
        }
    }

    #[test]
    fn draws_above_both_thresholds_fill_every_slot() {
        // u64::MAX maps to the largest float below 1.0
        let mut rng = ConstRng(u64::MAX);
        let days = generate(monday(), &AvailabilityRules::default(), &mut rng);

        // 21 days starting Monday contain 3 Sundays
        assert_eq!(days.len(), 18);
        let first = &days[0];
        assert_eq!(first.slots.len(), 16);
        assert_eq!(first.slots[0].time, "9:00");
        assert_eq!(first.slots[1].time, "9:30");
        assert_eq!(first.slots[15].time, "16:30");
        assert_eq!(first.slots[0].id, "2026-10-19-9");
        assert_eq!(first.slots[1].id, "2026-10-19-9-30");
    }

    #[test]
    fn draws_below_both_thresholds_drop_every_day() {
        let mut rng = ConstRng(0);
        let days = generate(monday(), &AvailabilityRules::default(), &mut rng);
        assert!(days.is_empty());
    }

    #[test]
    fn window_starting_on_sunday_skips_day_zero() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut rng = ConstRng(u64::MAX);
        let days = generate(sunday, &AvailabilityRules::default(), &mut rng);
        assert_eq!(days[0].date, monday());
    }

    #[tokio::test(start_paused = true)]
    async fn seeded_mock_is_reproducible() {
        let rules = AvailabilityRules::default();
        let a = MockAvailability::seeded(rules.clone(), Duration::from_millis(600), 7);
        let b = MockAvailability::seeded(rules, Duration::from_millis(600), 7);

        let first = a.fetch(monday()).await.unwrap();
        let second = b.fetch(monday()).await.unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
