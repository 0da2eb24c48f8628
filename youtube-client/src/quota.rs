//! Daily YouTube Data API quota bookkeeping.
//!
//! Google resets the quota at midnight Pacific time, so the counter tracks
//! the Pacific calendar date and starts over when it changes. Charges are
//! taken before a request is sent; a charge that would exceed the daily
//! limit is refused and nothing is recorded.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use threadsift_core::YouTubeApiError;
use tracing::{debug, info, warn};

/// Cost of one `videos.list` or `commentThreads.list` page.
pub const LIST_COST: u64 = 1;
/// Cost of one `search.list` call.
pub const SEARCH_COST: u64 = 100;
pub const DEFAULT_DAILY_LIMIT: u64 = 10_000;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct QuotaCounter {
    used: AtomicU64,
    reset_date: Mutex<NaiveDate>,
    limit: u64,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for QuotaCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaCounter")
            .field("used", &self.used.load(Ordering::Relaxed))
            .field("reset_date", &*self.reset_date.lock())
            .field("limit", &self.limit)
            .finish()
    }
}

impl QuotaCounter {
    pub fn new(limit: u64) -> Self {
        Self::with_clock(limit, Arc::new(SystemClock))
    }

    pub fn with_clock(limit: u64, clock: Arc<dyn Clock>) -> Self {
        let today = pacific_date(clock.now());
        Self {
            used: AtomicU64::new(0),
            reset_date: Mutex::new(today),
            limit,
            clock,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        self.roll_over();
        self.used.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used())
    }

    pub fn reset_date(&self) -> NaiveDate {
        self.roll_over();
        *self.reset_date.lock()
    }

    /// Reserve `cost` units, or refuse without recording anything.
    pub fn charge(&self, cost: u64) -> Result<u64, YouTubeApiError> {
        self.roll_over();

        let mut current = self.used.load(Ordering::SeqCst);
        loop {
            let next = current.saturating_add(cost);
            if next > self.limit {
                warn!(
                    "YouTube quota refused: {} used, {} requested, limit {}",
                    current, cost, self.limit
                );
                return Err(YouTubeApiError::QuotaExceeded {
                    used: current,
                    limit: self.limit,
                    requested: cost,
                });
            }
            match self
                .used
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => {
                    debug!("Charged {} YouTube quota units ({}/{})", cost, next, self.limit);
                    return Ok(next);
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Zero the counter and re-read the date from the clock.
    pub fn reset(&self) {
        let mut date = self.reset_date.lock();
        *date = pacific_date(self.clock.now());
        self.used.store(0, Ordering::SeqCst);
    }

    fn roll_over(&self) {
        let today = pacific_date(self.clock.now());
        let mut date = self.reset_date.lock();
        if *date != today {
            info!(
                "New Pacific day {}, resetting YouTube quota ({} units used on {})",
                today,
                self.used.load(Ordering::SeqCst),
                *date
            );
            *date = today;
            self.used.store(0, Ordering::SeqCst);
        }
    }
}

/// Calendar date in US Pacific time, honouring daylight saving.
///
/// DST runs from 02:00 local on the second Sunday of March to 02:00 local
/// on the first Sunday of November.
pub fn pacific_date(now: DateTime<Utc>) -> NaiveDate {
    let offset_hours = if in_pacific_dst(now) { -7 } else { -8 };
    (now + Duration::hours(offset_hours)).date_naive()
}

fn in_pacific_dst(now: DateTime<Utc>) -> bool {
    let year = now.year();
    let start = nth_sunday_utc(year, 3, 2, 10);
    let end = nth_sunday_utc(year, 11, 1, 9);
    match (start, end) {
        (Some(start), Some(end)) => now >= start && now < end,
        _ => false,
    }
}

fn nth_sunday_utc(year: i32, month: u32, n: u8, utc_hour: u32) -> Option<DateTime<Utc>> {
    let day = NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, n)?;
    let at = day.and_hms_opt(utc_hour, 0, 0)?;
    Some(Utc.from_utc_datetime(&at))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        pub fn at(rfc3339: &str) -> Self {
            let at = DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc);
            Self(Mutex::new(at))
        }

        pub fn set(&self, rfc3339: &str) {
            *self.0.lock() = DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&Utc);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock()
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_pacific_date_standard_and_daylight_time() {
        // January: UTC-8.
        assert_eq!(pacific_date(utc("2025-01-15T07:59:00Z")), date("2025-01-14"));
        assert_eq!(pacific_date(utc("2025-01-15T08:00:00Z")), date("2025-01-15"));
        // July: UTC-7.
        assert_eq!(pacific_date(utc("2025-07-15T06:59:00Z")), date("2025-07-14"));
        assert_eq!(pacific_date(utc("2025-07-15T07:00:00Z")), date("2025-07-15"));
    }

    #[test]
    fn test_dst_boundaries_2025() {
        // 2025-03-09 02:00 PST = 10:00 UTC.
        assert!(!in_pacific_dst(utc("2025-03-09T09:59:59Z")));
        assert!(in_pacific_dst(utc("2025-03-09T10:00:00Z")));
        // 2025-11-02 02:00 PDT = 09:00 UTC.
        assert!(in_pacific_dst(utc("2025-11-02T08:59:59Z")));
        assert!(!in_pacific_dst(utc("2025-11-02T09:00:00Z")));
    }

    #[test]
    fn test_charge_refuses_over_limit() {
        let counter = QuotaCounter::with_clock(150, Arc::new(ManualClock::at("2025-05-01T12:00:00Z")));

        assert_eq!(counter.charge(SEARCH_COST).unwrap(), 100);
        assert_eq!(counter.charge(LIST_COST).unwrap(), 101);

        let err = counter.charge(SEARCH_COST).unwrap_err();
        assert!(matches!(
            err,
            YouTubeApiError::QuotaExceeded { used: 101, limit: 150, requested: 100 }
        ));
        assert_eq!(counter.used(), 101);
        assert_eq!(counter.remaining(), 49);
    }

    #[test]
    fn test_rolls_over_on_pacific_midnight() {
        let clock = Arc::new(ManualClock::at("2025-05-01T20:00:00Z"));
        let counter = QuotaCounter::with_clock(DEFAULT_DAILY_LIMIT, clock.clone());
        counter.charge(500).unwrap();

        // Still 2025-05-01 in California.
        clock.set("2025-05-02T06:30:00Z");
        assert_eq!(counter.used(), 500);

        clock.set("2025-05-02T07:00:00Z");
        assert_eq!(counter.used(), 0);
        assert_eq!(counter.reset_date(), date("2025-05-02"));
    }

    #[test]
    fn test_reset() {
        let counter = QuotaCounter::with_clock(10, Arc::new(ManualClock::at("2025-05-01T12:00:00Z")));
        counter.charge(10).unwrap();
        assert!(counter.charge(1).is_err());
        counter.reset();
        assert_eq!(counter.used(), 0);
        assert!(counter.charge(1).is_ok());
    }

    #[test]
    fn test_concurrent_charges_are_not_lost() {
        let counter = Arc::new(QuotaCounter::with_clock(
            DEFAULT_DAILY_LIMIT,
            Arc::new(ManualClock::at("2025-05-01T12:00:00Z")),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        counter.charge(LIST_COST).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(counter.used(), 2000);
    }
}
