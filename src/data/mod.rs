//! Core data models for the Danish spot price viewer
//!
//! This module contains the data types used throughout the application for
//! representing a day's hourly electricity prices as published by nrgi.dk.

pub mod prices;

pub use prices::{NrgiClient, PriceError, PriceSource};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Number of hourly entries in a fully populated day series
pub const HOURS_PER_DAY: usize = 24;

/// A single hour's spot price observation
///
/// Field names follow the internal snake_case convention; the wire format
/// uses camelCase keys (`priceInclVat`, `isHighestPrice`, ...), mapped
/// declaratively through serde's rename rules rather than hand-written
/// translation code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Whether this hour carries the day's highest price, as flagged upstream
    pub is_highest_price: bool,
    /// Whether this hour carries the day's lowest price, as flagged upstream
    pub is_lowest_price: bool,
    /// Hour-aligned start of the observation, region-local wall clock
    pub local_time: NaiveDateTime,
    /// Tax-inclusive price, in hundredths of DKK/kWh
    pub price_incl_vat: f64,
    /// Pre-normalization raw price, same unit
    pub raw_price_incl_vat: f64,
    /// Headline figure used for the displayed state
    pub value: f64,
}

/// One calendar day's hourly price series for a single pricing region
///
/// The summary fields (`average_price`, `highest_price`, `lowest_price`,
/// `current_price`) are carried through from the source verbatim and never
/// recomputed locally. The same goes for the highest/lowest flags on the
/// individual entries: when several hours tie on an extreme value, whatever
/// the upstream flagged is what we serve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPriceSeries {
    /// Calendar date this series covers; the authoritative staleness key
    pub date: NaiveDate,
    /// Pricing region code, immutable once fetched
    pub region: String,
    pub average_price: f64,
    pub current_price: f64,
    pub highest_price: f64,
    pub lowest_price: f64,
    /// Chronological hourly entries; index equals hour of day, never reordered
    #[serde(rename = "prices")]
    pub hourly: Vec<PricePoint>,
}

impl DayPriceSeries {
    /// Returns the entry for the given hour of day, if present
    pub fn point_at_hour(&self, hour: u32) -> Option<&PricePoint> {
        self.hourly.get(hour as usize)
    }
}
