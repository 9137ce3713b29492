//! Global element ceiling and progress reporting

use super::error::{LoadError, LoadResult};
use tracing::info;

/// Default number of elements between progress events
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Counts admitted elements against the server element limit
#[derive(Debug, Clone)]
pub struct IngestionGuard {
    limit: i64,
    progress_interval: u64,
    counter: u64,
}

impl IngestionGuard {
    /// A negative `limit` disables the ceiling
    pub fn new(limit: i64) -> Self {
        Self {
            limit,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            counter: 0,
        }
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Count one more element, failing once the ceiling is exceeded
    pub fn admit(&mut self) -> LoadResult<u64> {
        self.counter += 1;
        if self.limit >= 0 && self.counter > self.limit as u64 {
            return Err(LoadError::ElementLimitExceeded { limit: self.limit });
        }
        if self.progress_interval > 0 && self.counter % self.progress_interval == 0 {
            info!(elements = self.counter, "Loaded {} elements in CX", self.counter);
        }
        Ok(self.counter)
    }

    pub fn count(&self) -> u64 {
        self.counter
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}
