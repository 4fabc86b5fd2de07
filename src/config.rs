//! Region configuration and the cache instance registry
//!
//! One cache instance serves exactly one pricing region from a small fixed
//! set. The registry is an explicit map owned by the application lifecycle
//! and handed by reference to the presentation layer; nothing here is
//! global state.

use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::cache::PriceCache;
use crate::data::PriceSource;

/// Pricing regions this deployment supports
pub const SUPPORTED_REGIONS: [&str; 2] = ["DK1", "DK2"];

/// Identifier handed out for each registered cache instance
pub type InstanceId = u32;

/// Errors raised while configuring instances
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The region code is not in the supported set
    #[error("unsupported region '{0}', expected one of: DK1, DK2")]
    UnknownRegion(String),

    /// Another instance already serves this region
    #[error("region '{0}' is already configured")]
    DuplicateRegion(String),
}

/// Checks a region code against the supported set
pub fn validate_region(region: &str) -> Result<(), ConfigError> {
    if SUPPORTED_REGIONS.contains(&region) {
        Ok(())
    } else {
        Err(ConfigError::UnknownRegion(region.to_string()))
    }
}

/// Instance-id keyed registry of price cache managers
///
/// Registering validates the region and rejects one that is already served
/// by a live instance; deregistering drops the instance and frees its
/// region. No close or flush is needed beyond the drop, the cache holds no
/// resources outside memory.
#[derive(Debug)]
pub struct CacheRegistry<S: PriceSource> {
    entries: HashMap<InstanceId, PriceCache<S>>,
    next_id: InstanceId,
}

impl<S: PriceSource> Default for CacheRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: PriceSource> CacheRegistry<S> {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 0,
        }
    }

    /// Registers a cache instance for `region`, fetching through `source`
    ///
    /// # Errors
    /// * `ConfigError::UnknownRegion` - `region` is not supported
    /// * `ConfigError::DuplicateRegion` - `region` already has an instance
    pub fn register(&mut self, region: &str, source: S) -> Result<InstanceId, ConfigError> {
        validate_region(region)?;
        if self.region_in_use(region) {
            return Err(ConfigError::DuplicateRegion(region.to_string()));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, PriceCache::new(region, source));
        info!(region, id, "registered price cache instance");
        Ok(id)
    }

    /// Drops the instance behind `id`, returning it if it existed
    #[allow(dead_code)]
    pub fn deregister(&mut self, id: InstanceId) -> Option<PriceCache<S>> {
        self.entries.remove(&id)
    }

    /// Read access to the instance behind `id`
    pub fn get(&self, id: InstanceId) -> Option<&PriceCache<S>> {
        self.entries.get(&id)
    }

    /// Write access to the instance behind `id`
    #[allow(dead_code)]
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut PriceCache<S>> {
        self.entries.get_mut(&id)
    }

    /// Mutable iterator over every registered cache, for refresh passes
    pub fn caches_mut(&mut self) -> impl Iterator<Item = &mut PriceCache<S>> {
        self.entries.values_mut()
    }

    /// Whether some instance already serves `region`
    pub fn region_in_use(&self, region: &str) -> bool {
        self.entries.values().any(|cache| cache.region() == region)
    }

    /// The first supported region without an instance, if any
    #[allow(dead_code)]
    pub fn default_region(&self) -> Option<&'static str> {
        SUPPORTED_REGIONS
            .iter()
            .copied()
            .find(|region| !self.region_in_use(region))
    }

    /// Number of registered instances
    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no instance is registered
    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
