//! Time-limited key values.

use std::fmt;
use std::time::{Duration, SystemTime};

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// A time-limited key with a cryptographically secure random value encoded
/// as a hexadecimal string.
///
/// Keys are immutable. Cloning produces an independent snapshot, so a key
/// handed to a caller is never changed by a later rotation.
#[derive(Clone)]
pub struct Key {
    created_at: SystemTime,
    valid_for: Duration,
    value: String,
}

impl Key {
    /// Create a key from an already generated value.
    pub fn new(value: impl Into<String>, created_at: SystemTime, valid_for: Duration) -> Self {
        Self {
            created_at,
            valid_for,
            value: value.into(),
        }
    }

    /// Age of the key at the given time. Times before creation yield zero.
    pub fn age(&self, at: SystemTime) -> Duration {
        at.duration_since(self.created_at).unwrap_or(Duration::ZERO)
    }

    /// Returns true if the key is valid at the given time.
    pub fn is_valid(&self, at: SystemTime) -> bool {
        self.age(at) <= self.valid_for
    }

    /// When the key was generated.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// How long the key stays valid after creation.
    pub fn valid_for(&self) -> Duration {
        self.valid_for
    }

    /// Last instant at which the key is valid, if representable.
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.created_at.checked_add(self.valid_for)
    }

    /// The key value as a hexadecimal string.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Constant-time comparison of a candidate value against this key.
    pub fn matches(&self, candidate: &str) -> bool {
        self.value.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("created_at", &self.created_at)
            .field("valid_for", &self.valid_for)
            .field("value", &"<redacted>")
            .finish()
    }
}

impl Drop for Key {
    fn drop(&mut self) {
        // Clear the secret from memory when dropped
        self.value.zeroize();
    }
}
