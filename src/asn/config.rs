//! Resolver settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of ASNs resolved concurrently
pub const DEFAULT_WORKERS: usize = 8;

/// Default timeout for one live provider call in milliseconds
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 5000;

/// Settings for batch attribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSettings {
    /// Number of ASNs resolved concurrently (default: 8)
    pub workers: usize,
    /// Timeout for a single live provider call (default: 5000ms)
    pub provider_timeout: Duration,
    /// Deadline for a whole batch; live providers still pending when it
    /// passes return empty (default: none)
    pub deadline: Option<Duration>,
    /// Query live providers (cymru, ipinfo) (default: true)
    pub live: bool,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            provider_timeout: Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
            deadline: None,
            live: true,
        }
    }
}

impl ResolverSettings {
    /// Create a new ResolverSettings builder
    pub fn builder() -> ResolverSettingsBuilder {
        ResolverSettingsBuilder::new()
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be at least 1".to_string());
        }
        if self.provider_timeout.as_millis() == 0 {
            return Err("provider_timeout must be greater than 0".to_string());
        }
        if self.deadline.is_some_and(|d| d.as_millis() == 0) {
            return Err("deadline must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for ResolverSettings
pub struct ResolverSettingsBuilder {
    settings: ResolverSettings,
}

impl ResolverSettingsBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            settings: ResolverSettings::default(),
        }
    }

    /// Set the number of concurrent workers
    pub fn workers(mut self, workers: usize) -> Self {
        self.settings.workers = workers;
        self
    }

    /// Set the live provider timeout
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.settings.provider_timeout = timeout;
        self
    }

    /// Set the batch deadline
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.settings.deadline = Some(deadline);
        self
    }

    /// Enable or disable live providers
    pub fn live(mut self, live: bool) -> Self {
        self.settings.live = live;
        self
    }

    /// Build the settings
    pub fn build(self) -> Result<ResolverSettings, String> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

impl Default for ResolverSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
