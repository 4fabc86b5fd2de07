//! Application state management
//!
//! This module owns the registry of per-region price caches, drives the
//! polling schedule that keeps them refreshed, and handles keyboard input
//! for the terminal UI.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use tracing::debug;

use crate::cache::PriceCache;
use crate::cli::StartupConfig;
use crate::config::{CacheRegistry, ConfigError, InstanceId};
use crate::data::NrgiClient;
use crate::readout;

/// Main application struct managing state and the cache registry
pub struct App {
    /// Registry of price cache instances, one per configured region
    pub registry: CacheRegistry<NrgiClient>,
    /// Registered instance ids in display order
    instance_ids: Vec<InstanceId>,
    /// Index into `instance_ids` of the instance being displayed
    pub selected: usize,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag indicating a refresh pass was requested by keypress
    pub refresh_requested: bool,
    /// When the last refresh pass ran
    last_poll: Option<Instant>,
    /// Time between scheduled refresh passes
    poll_interval: Duration,
}

impl App {
    /// Creates an App with one cache instance per configured region
    ///
    /// # Errors
    /// * `ConfigError::UnknownRegion` - a region is not supported
    /// * `ConfigError::DuplicateRegion` - the same region was given twice
    pub fn from_startup_config(config: &StartupConfig) -> Result<Self, ConfigError> {
        let mut registry = CacheRegistry::new();
        let mut instance_ids = Vec::new();

        for region in &config.regions {
            let id = registry.register(region, NrgiClient::new())?;
            debug!(
                id,
                readout = %readout::instance_unique_id(region),
                "configured region readout"
            );
            instance_ids.push(id);
        }

        Ok(Self {
            registry,
            instance_ids,
            selected: 0,
            should_quit: false,
            refresh_requested: false,
            last_poll: None,
            poll_interval: config.poll_interval,
        })
    }

    /// Number of registered instances
    pub fn instance_count(&self) -> usize {
        self.instance_ids.len()
    }

    /// The cache instance currently being displayed
    pub fn selected_cache(&self) -> Option<&PriceCache<NrgiClient>> {
        self.instance_ids
            .get(self.selected)
            .and_then(|id| self.registry.get(*id))
    }

    /// Whether a refresh pass should run now
    ///
    /// True on the first call, whenever the poll interval has elapsed, and
    /// whenever a manual refresh was requested. The per-cache throttle still
    /// bounds actual fetch frequency regardless of how often this fires.
    pub fn refresh_due(&self) -> bool {
        if self.refresh_requested {
            return true;
        }
        match self.last_poll {
            None => true,
            Some(last) => last.elapsed() >= self.poll_interval,
        }
    }

    /// Runs one refresh pass over every registered cache
    ///
    /// Distinct regions refresh concurrently; each individual cache still
    /// sees strictly serial refresh calls.
    pub async fn refresh_all(&mut self) {
        let refreshes = self.registry.caches_mut().map(|cache| cache.refresh());
        futures::future::join_all(refreshes).await;

        self.last_poll = Some(Instant::now());
        self.refresh_requested = false;
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q` or `Esc`: Quit the application
    /// - `Tab`/`Right`/`l`: Show the next configured region
    /// - `BackTab`/`Left`/`h`: Show the previous configured region
    /// - `r`: Request an immediate refresh pass
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                self.select_next();
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.select_previous();
            }
            KeyCode::Char('r') => {
                self.refresh_requested = true;
            }
            _ => {}
        }
    }

    fn select_next(&mut self) {
        if !self.instance_ids.is_empty() {
            self.selected = (self.selected + 1) % self.instance_ids.len();
        }
    }

    fn select_previous(&mut self) {
        if !self.instance_ids.is_empty() {
            self.selected = (self.selected + self.instance_ids.len() - 1) % self.instance_ids.len();
        }
    }
}
