//! Configuration for a key rotation manager.

use std::time::Duration;

use crate::error::{KeyrotError, Result};

/// Default total lifetime of a key.
pub const DEFAULT_DURATION: Duration = Duration::from_secs(5 * 60);
/// Default number of keys retained at once.
pub const DEFAULT_LIMIT: usize = 2;
/// Default number of random bits per key.
pub const DEFAULT_BITS: usize = 256;
/// Default clock-skew tolerance applied when checking validity.
pub const DEFAULT_GRACE: Duration = Duration::from_millis(750);
/// Largest accepted retain limit; the cadence divides a `Duration` by a `u32`.
pub const MAX_LIMIT: usize = u32::MAX as usize;

/// Configuration for a [`Manager`](crate::Manager).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Maximum validity period of a key.
    pub duration: Duration,
    /// Number of keys to maintain within the validity period. This also sets
    /// the rotation cadence, which is `duration / limit`.
    pub limit: usize,
    /// Number of bits in key values (rounded up to whole bytes).
    pub bits: usize,
    /// How far past its nominal expiry a key is still accepted.
    pub grace: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            limit: DEFAULT_LIMIT,
            bits: DEFAULT_BITS,
            grace: DEFAULT_GRACE,
        }
    }
}

impl ManagerConfig {
    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration for which keys will be valid.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the maximum number of keys to be retained.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the number of bits of entropy in generated keys.
    pub fn with_bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }

    /// Set the clock-skew grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Spacing between successive key generations.
    pub fn rotation_interval(&self) -> Duration {
        // Unvalidated configs may carry a zero or oversized limit.
        let divisor = u32::try_from(self.limit.max(1)).unwrap_or(u32::MAX);
        self.duration / divisor
    }

    /// Reject settings that would make the manager unusable or insecure.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(KeyrotError::InvalidLimit(self.limit));
        }
        if self.duration.is_zero() {
            return Err(KeyrotError::InvalidDuration);
        }
        if self.bits == 0 {
            return Err(KeyrotError::InvalidBits(self.bits));
        }
        Ok(())
    }
}
