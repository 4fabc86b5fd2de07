//! Cache manager for the rolling two-day price window
//!
//! Owns the "today" and "tomorrow" series for one pricing region and decides
//! when each needs re-fetching: a minimum interval between refresh attempts,
//! calendar-date staleness against the region's wall clock, and the fixed
//! afternoon cutoff before which next-day prices are not yet published
//! upstream.
//!
//! All day-boundary and cutoff decisions use the region's fixed UTC+1
//! offset, never the timezone of the machine we happen to run on: the
//! upstream price-day boundaries are defined in Danish local time.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, Timelike, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{DayPriceSeries, PriceSource, HOURS_PER_DAY};

/// Fixed UTC offset, in seconds, used for all calendar decisions
const REGION_UTC_OFFSET_SECS: i32 = 3600;

/// Region-local hour from which next-day prices are available upstream
pub const TOMORROW_CUTOFF_HOUR: u32 = 15;

/// Default minimum elapsed time between refresh attempts, in seconds
const MIN_REFRESH_INTERVAL_SECS: i64 = 60;

/// Which cached day a read targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDay {
    Today,
    Tomorrow,
}

impl fmt::Display for PriceDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceDay::Today => write!(f, "today"),
            PriceDay::Tomorrow => write!(f, "tomorrow"),
        }
    }
}

/// Errors for cache reads
///
/// These indicate usage errors (asking for an hour that does not exist, or
/// a day that is not cached yet) and propagate to the caller, unlike fetch
/// failures which are absorbed by `refresh`.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The requested day has no cached series
    #[error("no cached price series for {0}")]
    SeriesUnavailable(PriceDay),

    /// The requested hour is outside the 0-23 range of a day series
    #[error("hour {0} is outside the 0-23 range")]
    HourOutOfRange(u32),
}

/// The fixed region-local offset (UTC+1)
fn region_offset() -> FixedOffset {
    FixedOffset::east_opt(REGION_UTC_OFFSET_SECS).expect("static UTC+1 offset")
}

/// Current wall-clock time in the region-local offset
pub fn region_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&region_offset())
}

/// Rolling two-day price cache for a single region
///
/// Created once per configured region; both series are replaced whole on a
/// successful fetch and retained untouched on a failed one, so a transient
/// upstream outage degrades to serving the last known prices.
#[derive(Debug)]
pub struct PriceCache<S: PriceSource> {
    /// Pricing region this cache serves, immutable after construction
    region: String,
    /// Fetcher performing the actual network round trips
    source: S,
    /// Cached series for the current region-local date
    today: Option<DayPriceSeries>,
    /// Cached series for the next region-local date, absent before the cutoff
    tomorrow: Option<DayPriceSeries>,
    /// When the last refresh attempt passed the throttle
    last_attempt: Option<DateTime<FixedOffset>>,
    /// Minimum elapsed time between refresh attempts
    min_refresh_interval: Duration,
}

impl<S: PriceSource> PriceCache<S> {
    /// Creates an empty cache for `region`, fetching through `source`
    pub fn new(region: impl Into<String>, source: S) -> Self {
        Self {
            region: region.into(),
            source,
            today: None,
            tomorrow: None,
            last_attempt: None,
            min_refresh_interval: Duration::seconds(MIN_REFRESH_INTERVAL_SECS),
        }
    }

    /// Overrides the refresh throttle interval
    #[allow(dead_code)]
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// The region this cache was configured with
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Today's cached series, if any
    pub fn today(&self) -> Option<&DayPriceSeries> {
        self.today.as_ref()
    }

    /// Tomorrow's cached series, if any
    pub fn tomorrow(&self) -> Option<&DayPriceSeries> {
        self.tomorrow.as_ref()
    }

    /// The cached series for the requested day, if any
    pub fn series(&self, day: PriceDay) -> Option<&DayPriceSeries> {
        match day {
            PriceDay::Today => self.today(),
            PriceDay::Tomorrow => self.tomorrow(),
        }
    }

    /// When the last refresh attempt passed the throttle, if ever
    pub fn last_attempt(&self) -> Option<DateTime<FixedOffset>> {
        self.last_attempt
    }

    /// Tax-inclusive price for the given day and hour
    ///
    /// # Errors
    /// * `LookupError::HourOutOfRange` - `hour` is not within 0-23
    /// * `LookupError::SeriesUnavailable` - the day has no cached series
    pub fn price_at_hour(&self, day: PriceDay, hour: u32) -> Result<f64, LookupError> {
        if hour as usize >= HOURS_PER_DAY {
            return Err(LookupError::HourOutOfRange(hour));
        }

        let series = self
            .series(day)
            .ok_or(LookupError::SeriesUnavailable(day))?;

        series
            .point_at_hour(hour)
            .map(|point| point.price_incl_vat)
            .ok_or(LookupError::HourOutOfRange(hour))
    }

    /// Refreshes the cached series against the current region-local clock
    ///
    /// Performs at most two network fetches and never fails outward: fetch
    /// errors are logged and the previous series retained until the next
    /// polling cycle tries again.
    pub async fn refresh(&mut self) {
        self.refresh_at(region_now()).await;
    }

    /// Refresh with an injected wall-clock time
    ///
    /// Steps, in order:
    /// 1. Throttle: within the minimum interval of the last attempt, return
    ///    without evaluating anything (the attempt timestamp stays put).
    /// 2. Record the attempt, fetch or not.
    /// 3. Re-fetch today when absent or dated differently than `now`.
    /// 4. Before the cutoff hour, force tomorrow to absent: anything cached
    ///    there was computed for a previous lookup and must not be served.
    /// 5. Past the cutoff, re-fetch tomorrow when absent or stale.
    async fn refresh_at(&mut self, now: DateTime<FixedOffset>) {
        if let Some(last) = self.last_attempt {
            if now.signed_duration_since(last) < self.min_refresh_interval {
                debug!(region = %self.region, "refresh throttled");
                return;
            }
        }
        self.last_attempt = Some(now);

        let today = now.date_naive();
        if self.today.as_ref().map(|s| s.date) != Some(today) {
            match self.source.fetch_day(&self.region, today).await {
                Ok(series) => self.today = Some(series),
                Err(err) => {
                    warn!(region = %self.region, %err, "today fetch failed, keeping previous series");
                }
            }
        }

        if now.hour() < TOMORROW_CUTOFF_HOUR {
            if self.tomorrow.take().is_some() {
                debug!(region = %self.region, "dropping cached tomorrow series before cutoff");
            }
        } else if let Some(next_day) = today.succ_opt() {
            if self.tomorrow.as_ref().map(|s| s.date) != Some(next_day) {
                match self.source.fetch_day(&self.region, next_day).await {
                    Ok(series) => self.tomorrow = Some(series),
                    Err(err) => {
                        warn!(region = %self.region, %err, "tomorrow fetch failed, keeping previous series");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use chrono::{NaiveDate, NaiveDateTime};
    use reqwest::StatusCode;

    use crate::data::{PriceError, PricePoint};

    /// Recording fake price source; shared handles let tests inspect the
    /// calls made while the cache owns the source.
    #[derive(Clone, Default)]
    struct MockSource {
        calls: Rc<RefCell<Vec<(String, NaiveDate)>>>,
        fail: Rc<Cell<bool>>,
    }

    impl MockSource {
        fn fetch_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn fetched_dates(&self) -> Vec<NaiveDate> {
            self.calls.borrow().iter().map(|(_, d)| *d).collect()
        }

        fn fetched_regions(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(r, _)| r.clone()).collect()
        }
    }

    impl PriceSource for MockSource {
        async fn fetch_day(
            &self,
            region: &str,
            date: NaiveDate,
        ) -> Result<DayPriceSeries, PriceError> {
            self.calls.borrow_mut().push((region.to_string(), date));
            if self.fail.get() {
                return Err(PriceError::Status(StatusCode::SERVICE_UNAVAILABLE));
            }
            Ok(full_day(region, date))
        }
    }

    /// Builds a fully populated series with a linear price ramp
    fn full_day(region: &str, date: NaiveDate) -> DayPriceSeries {
        let hourly: Vec<PricePoint> = (0..HOURS_PER_DAY)
            .map(|hour| {
                let price = 50.0 + hour as f64;
                PricePoint {
                    is_highest_price: hour == HOURS_PER_DAY - 1,
                    is_lowest_price: hour == 0,
                    local_time: hour_start(date, hour as u32),
                    price_incl_vat: price,
                    raw_price_incl_vat: price - 20.0,
                    value: price,
                }
            })
            .collect();

        DayPriceSeries {
            date,
            region: region.to_string(),
            average_price: 61.5,
            current_price: 50.0,
            highest_price: 73.0,
            lowest_price: 50.0,
            hourly,
        }
    }

    fn hour_start(date: NaiveDate, hour: u32) -> NaiveDateTime {
        date.and_hms_opt(hour, 0, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Region-local wall clock for the given date and time of day
    fn at(d: NaiveDate, hour: u32, min: u32, sec: u32) -> DateTime<FixedOffset> {
        d.and_hms_opt(hour, min, sec)
            .unwrap()
            .and_local_timezone(region_offset())
            .unwrap()
    }

    fn fresh_cache(region: &str) -> (PriceCache<MockSource>, MockSource) {
        let source = MockSource::default();
        let cache = PriceCache::new(region, source.clone());
        (cache, source)
    }

    #[tokio::test]
    async fn test_morning_refresh_fetches_today_only() {
        // Region DK1, 2024-03-10T08:00:00+01:00, empty cache
        let (mut cache, source) = fresh_cache("DK1");

        cache.refresh_at(at(date(2024, 3, 10), 8, 0, 0)).await;

        assert_eq!(source.fetch_count(), 1);
        assert_eq!(source.fetched_dates(), vec![date(2024, 3, 10)]);
        assert_eq!(cache.today().unwrap().date, date(2024, 3, 10));
        assert!(cache.tomorrow().is_none());
    }

    #[tokio::test]
    async fn test_afternoon_refresh_fetches_both_days() {
        // Same region, 2024-03-10T16:00:00+01:00, empty cache
        let (mut cache, source) = fresh_cache("DK1");

        cache.refresh_at(at(date(2024, 3, 10), 16, 0, 0)).await;

        assert_eq!(source.fetch_count(), 2);
        assert_eq!(
            source.fetched_dates(),
            vec![date(2024, 3, 10), date(2024, 3, 11)]
        );
        assert_eq!(cache.tomorrow().unwrap().date, date(2024, 3, 11));
    }

    #[tokio::test]
    async fn test_refresh_passes_configured_region_to_source() {
        let (mut cache, source) = fresh_cache("DK2");

        cache.refresh_at(at(date(2024, 3, 10), 16, 0, 0)).await;

        assert_eq!(source.fetched_regions(), vec!["DK2", "DK2"]);
        assert_eq!(cache.region(), "DK2");
    }

    #[tokio::test]
    async fn test_second_refresh_within_throttle_window_is_noop() {
        let (mut cache, source) = fresh_cache("DK1");
        let t0 = at(date(2024, 3, 10), 8, 0, 0);

        cache.refresh_at(t0).await;
        cache.refresh_at(t0 + Duration::seconds(30)).await;

        assert_eq!(source.fetch_count(), 1);
        assert_eq!(cache.last_attempt(), Some(t0));
    }

    #[tokio::test]
    async fn test_refresh_at_exactly_the_interval_is_not_throttled() {
        let (mut cache, source) = fresh_cache("DK1");
        let t0 = at(date(2024, 3, 10), 16, 0, 0);
        let t1 = t0 + Duration::seconds(MIN_REFRESH_INTERVAL_SECS);

        cache.refresh_at(t0).await;
        cache.refresh_at(t1).await;

        // Nothing was stale, so no new fetch, but the attempt was recorded.
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(cache.last_attempt(), Some(t1));
    }

    #[tokio::test]
    async fn test_throttled_call_leaves_attempt_timestamp_unchanged() {
        let (mut cache, _source) = fresh_cache("DK1");
        let t0 = at(date(2024, 3, 10), 8, 0, 0);

        cache.refresh_at(t0).await;
        cache.refresh_at(t0 + Duration::seconds(45)).await;
        // 45s + 45s exceeds the interval relative to t0; had the throttled
        // call moved the timestamp, this third call would be suppressed too.
        cache.refresh_at(t0 + Duration::seconds(90)).await;

        assert_eq!(cache.last_attempt(), Some(t0 + Duration::seconds(90)));
    }

    #[tokio::test]
    async fn test_stale_today_is_refetched_after_rollover() {
        let (mut cache, source) = fresh_cache("DK1");

        cache.refresh_at(at(date(2024, 3, 9), 18, 0, 0)).await;
        assert_eq!(cache.today().unwrap().date, date(2024, 3, 9));

        cache.refresh_at(at(date(2024, 3, 10), 8, 0, 0)).await;

        assert_eq!(cache.today().unwrap().date, date(2024, 3, 10));
        // Day one fetched both (post-cutoff), day two only today.
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_rollover_before_cutoff_drops_stale_tomorrow() {
        let (mut cache, source) = fresh_cache("DK1");

        // Evening fetch caches 03-09 and 03-10.
        cache.refresh_at(at(date(2024, 3, 9), 18, 0, 0)).await;
        assert_eq!(cache.tomorrow().unwrap().date, date(2024, 3, 10));

        // Next morning 03-10 becomes today; its old series must not be
        // served as tomorrow, and no tomorrow fetch happens before 15:00.
        cache.refresh_at(at(date(2024, 3, 10), 8, 0, 0)).await;

        assert_eq!(cache.today().unwrap().date, date(2024, 3, 10));
        assert!(cache.tomorrow().is_none());
        assert_eq!(source.fetched_dates().last(), Some(&date(2024, 3, 10)));
    }

    #[tokio::test]
    async fn test_fresh_pair_is_not_refetched_after_cutoff() {
        let (mut cache, source) = fresh_cache("DK1");

        cache.refresh_at(at(date(2024, 3, 10), 16, 0, 0)).await;
        cache.refresh_at(at(date(2024, 3, 10), 16, 5, 0)).await;

        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_tomorrow_triggers_exactly_one_fetch() {
        let (mut cache, source) = fresh_cache("DK1");

        // Morning refresh leaves tomorrow absent.
        cache.refresh_at(at(date(2024, 3, 10), 8, 0, 0)).await;
        assert!(cache.tomorrow().is_none());

        // First refresh past the cutoff fills it with tomorrow's date.
        cache.refresh_at(at(date(2024, 3, 10), 15, 30, 0)).await;

        assert_eq!(cache.tomorrow().unwrap().date, date(2024, 3, 11));
        assert_eq!(source.fetched_dates(), vec![date(2024, 3, 10), date(2024, 3, 11)]);
    }

    #[tokio::test]
    async fn test_failed_today_fetch_retains_previous_series() {
        let (mut cache, source) = fresh_cache("DK1");

        cache.refresh_at(at(date(2024, 3, 9), 8, 0, 0)).await;
        let cached = cache.today().unwrap().clone();

        source.fail.set(true);
        cache.refresh_at(at(date(2024, 3, 10), 8, 0, 0)).await;

        // The fetch was attempted but the stale series survives untouched.
        assert_eq!(source.fetch_count(), 2);
        assert_eq!(cache.today().unwrap(), &cached);
        assert_eq!(cache.today().unwrap().date, date(2024, 3, 9));
    }

    #[tokio::test]
    async fn test_failed_fetch_on_empty_cache_stays_empty() {
        let (mut cache, source) = fresh_cache("DK1");
        source.fail.set(true);

        cache.refresh_at(at(date(2024, 3, 10), 16, 0, 0)).await;

        assert_eq!(source.fetch_count(), 2);
        assert!(cache.today().is_none());
        assert!(cache.tomorrow().is_none());
    }

    #[tokio::test]
    async fn test_failed_tomorrow_fetch_retains_previous_series() {
        let (mut cache, source) = fresh_cache("DK1");

        cache.refresh_at(at(date(2024, 3, 10), 16, 0, 0)).await;
        let cached = cache.tomorrow().unwrap().clone();

        // Force a (contrived) staleness by rolling two days ahead while the
        // source is down; the old tomorrow is kept rather than cleared.
        source.fail.set(true);
        cache.refresh_at(at(date(2024, 3, 12), 16, 0, 0)).await;

        assert_eq!(cache.tomorrow().unwrap(), &cached);
    }

    #[tokio::test]
    async fn test_price_at_hour_reads_tax_inclusive_price() {
        let (mut cache, _source) = fresh_cache("DK1");
        cache.refresh_at(at(date(2024, 3, 10), 16, 0, 0)).await;

        let price = cache.price_at_hour(PriceDay::Today, 8).unwrap();
        assert!((price - 58.0).abs() < 0.001);

        let tomorrow_price = cache.price_at_hour(PriceDay::Tomorrow, 0).unwrap();
        assert!((tomorrow_price - 50.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_price_at_hour_rejects_out_of_range_hour() {
        let (mut cache, _source) = fresh_cache("DK1");
        cache.refresh_at(at(date(2024, 3, 10), 8, 0, 0)).await;

        assert!(matches!(
            cache.price_at_hour(PriceDay::Today, 24),
            Err(LookupError::HourOutOfRange(24))
        ));
        assert!(matches!(
            cache.price_at_hour(PriceDay::Today, 25),
            Err(LookupError::HourOutOfRange(25))
        ));
    }

    #[tokio::test]
    async fn test_price_at_hour_rejects_absent_series() {
        let (cache, _source) = fresh_cache("DK1");

        assert!(matches!(
            cache.price_at_hour(PriceDay::Today, 8),
            Err(LookupError::SeriesUnavailable(PriceDay::Today))
        ));
    }

    #[tokio::test]
    async fn test_tomorrow_absent_before_cutoff_even_when_queried() {
        let (mut cache, _source) = fresh_cache("DK1");
        cache.refresh_at(at(date(2024, 3, 10), 14, 59, 0)).await;

        assert!(matches!(
            cache.price_at_hour(PriceDay::Tomorrow, 0),
            Err(LookupError::SeriesUnavailable(PriceDay::Tomorrow))
        ));
    }

    #[tokio::test]
    async fn test_custom_throttle_interval_is_honored() {
        let source = MockSource::default();
        let mut cache = PriceCache::new("DK1", source.clone())
            .with_min_refresh_interval(Duration::seconds(5));
        let t0 = at(date(2024, 3, 9), 8, 0, 0);

        cache.refresh_at(t0).await;
        cache.refresh_at(t0 + Duration::seconds(3)).await;
        assert_eq!(source.fetch_count(), 1);

        // Roll the date so the second evaluation has something to fetch.
        cache.refresh_at(at(date(2024, 3, 10), 8, 0, 6)).await;
        assert_eq!(source.fetch_count(), 2);
    }

    #[test]
    fn test_lookup_error_messages_name_the_day() {
        let unavailable = LookupError::SeriesUnavailable(PriceDay::Tomorrow);
        assert!(unavailable.to_string().contains("tomorrow"));

        let out_of_range = LookupError::HourOutOfRange(24);
        assert!(out_of_range.to_string().contains("24"));
    }
}
