//! Converts cached price series into displayable figures
//!
//! The wire carries every price in hundredths of the display unit, so all
//! figures shown to the user are scaled down by a fixed divisor to DKK/kWh.
//! Beyond the scaling this module is pass-through: summary fields and the
//! highest/lowest flags come from the cached series verbatim.

use chrono::NaiveDateTime;

use crate::data::{DayPriceSeries, PricePoint};

/// Display unit for all prices
pub const PRICE_UNIT: &str = "DKK/kWh";

/// Raw wire values are hundredths of the display unit
const PRICE_SCALE_DIVISOR: f64 = 100.0;

/// Display title for a region's price readout
pub fn instance_title(region: &str) -> String {
    format!("NRGI Price {region}")
}

/// Stable identifier for a region's price readout
pub fn instance_unique_id(region: &str) -> String {
    format!("nrgi_price_{}", region.to_lowercase())
}

/// Scales a raw wire value to the display unit
pub fn scale(raw: f64) -> f64 {
    raw / PRICE_SCALE_DIVISOR
}

/// One hour of the readout grid, scaled for display
#[derive(Debug, Clone, PartialEq)]
pub struct HourReading {
    /// Hour-aligned start, region-local wall clock
    pub start: NaiveDateTime,
    /// Tax-inclusive price, DKK/kWh
    pub price_incl_vat: f64,
    /// Pre-normalization raw price, DKK/kWh
    pub raw_price_incl_vat: f64,
    /// Headline figure, DKK/kWh
    pub value: f64,
    pub is_highest_price: bool,
    pub is_lowest_price: bool,
}

impl From<&PricePoint> for HourReading {
    fn from(point: &PricePoint) -> Self {
        Self {
            start: point.local_time,
            price_incl_vat: scale(point.price_incl_vat),
            raw_price_incl_vat: scale(point.raw_price_incl_vat),
            value: scale(point.value),
            is_highest_price: point.is_highest_price,
            is_lowest_price: point.is_lowest_price,
        }
    }
}

/// Scaled pass-through of a series' summary fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DaySummary {
    pub average: f64,
    pub highest: f64,
    pub lowest: f64,
    pub current: f64,
}

/// The displayed state: the headline value at the given hour, DKK/kWh
///
/// Absent when the series has no entry for the hour; the caller decides
/// how to render a missing state.
pub fn current_value(today: &DayPriceSeries, hour: u32) -> Option<f64> {
    today.point_at_hour(hour).map(|point| scale(point.value))
}

/// The full-day readout rows for a cached series
pub fn day_readings(series: &DayPriceSeries) -> Vec<HourReading> {
    series.hourly.iter().map(HourReading::from).collect()
}

/// The scaled summary for a cached series
pub fn day_summary(series: &DayPriceSeries) -> DaySummary {
    DaySummary {
        average: scale(series.average_price),
        highest: scale(series.highest_price),
        lowest: scale(series.lowest_price),
        current: scale(series.current_price),
    }
}
