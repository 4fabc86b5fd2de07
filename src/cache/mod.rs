//! In-memory price cache for the rolling two-day window
//!
//! Provides a `PriceCache` that holds today's and tomorrow's hourly price
//! series for one region and decides when each needs re-fetching.

pub mod manager;

pub use manager::{region_now, LookupError, PriceCache, PriceDay, TOMORROW_CUTOFF_HOUR};
