//! nrgi.dk price history API client
//!
//! Fetches one day's hourly spot prices for a pricing region and parses the
//! response into our `DayPriceSeries` model. The client is stateless across
//! calls and performs no retries; the caller's polling cadence decides when
//! a failed day is attempted again.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use super::{DayPriceSeries, HOURS_PER_DAY};

/// Base URL for the nrgi.dk price history endpoint
const NRGI_PRICE_ENDPOINT: &str = "https://nrgi.dk/api/common/pricehistory";

/// Per-request timeout; a hung upstream blocks the caller no longer than this
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when fetching a day's prices
#[derive(Debug, Error)]
pub enum PriceError {
    /// HTTP transport failed or the request timed out
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("price endpoint returned status {0}")]
    Status(StatusCode),

    /// The response body was not the expected JSON shape
    #[error("failed to parse price response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The series did not carry one entry per hour of the day
    #[error("expected 24 hourly prices, got {hours}")]
    TruncatedSeries { hours: usize },

    /// The response covers a different calendar date than requested
    #[error("requested prices for {requested} but response covers {received}")]
    WrongDay {
        requested: NaiveDate,
        received: NaiveDate,
    },
}

/// Source of day price series, one network round trip per call
///
/// The cache manager is generic over this so its refresh logic can be
/// driven by a recording mock in tests.
#[allow(async_fn_in_trait)]
pub trait PriceSource {
    /// Fetches the full hourly series for `date` in `region`
    async fn fetch_day(&self, region: &str, date: NaiveDate) -> Result<DayPriceSeries, PriceError>;
}

/// Client for the nrgi.dk price history API
#[derive(Debug, Clone)]
pub struct NrgiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl Default for NrgiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NrgiClient {
    /// Creates a new NrgiClient with default settings
    pub fn new() -> Self {
        Self {
            http_client: Client::new(),
            base_url: NRGI_PRICE_ENDPOINT.to_string(),
        }
    }

    /// Creates a new NrgiClient with a custom HTTP client
    #[allow(dead_code)]
    pub fn with_client(client: Client) -> Self {
        Self {
            http_client: client,
            base_url: NRGI_PRICE_ENDPOINT.to_string(),
        }
    }

    /// Creates a new NrgiClient with a custom base URL (for testing)
    #[cfg(test)]
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
        }
    }
}

impl PriceSource for NrgiClient {
    /// Fetches the price series for a specific date and region
    ///
    /// # Arguments
    /// * `region` - Pricing region code, e.g. "DK1"
    /// * `date` - Calendar date to fetch, encoded as `YYYY-MM-DD`
    ///
    /// # Returns
    /// * `Ok(DayPriceSeries)` - A fully populated 24-hour series for `date`
    /// * `Err(PriceError)` - If the request, status, or body shape fails
    async fn fetch_day(&self, region: &str, date: NaiveDate) -> Result<DayPriceSeries, PriceError> {
        let date_param = date.format("%Y-%m-%d").to_string();

        debug!(region, date = %date_param, "fetching spot prices from nrgi.dk");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("region", region), ("date", date_param.as_str())])
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PriceError::Status(status));
        }

        let body = response.text().await?;
        parse_series(&body, date)
    }
}

/// Parses a price history response body and validates its shape
///
/// A valid series carries exactly one entry per hour and covers the
/// requested date; anything else is rejected rather than cached partially.
fn parse_series(body: &str, requested: NaiveDate) -> Result<DayPriceSeries, PriceError> {
    let series: DayPriceSeries = serde_json::from_str(body)?;

    if series.hourly.len() != HOURS_PER_DAY {
        return Err(PriceError::TruncatedSeries {
            hours: series.hourly.len(),
        });
    }

    if series.date != requested {
        return Err(PriceError::WrongDay {
            requested,
            received: series.date,
        });
    }

    Ok(series)
}
