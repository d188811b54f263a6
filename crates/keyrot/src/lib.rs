//! Rotating, time-limited authentication keys.
//!
//! This crate provides functionality for:
//! - Generating cryptographically secure random key values as lowercase hex
//! - Keeping a bounded set of recent keys, rotated lazily as they age
//! - Validating candidate values against the keys that are still acceptable
//!
//! # Rotation
//!
//! A [`Manager`] keeps at most `limit` keys, each valid for `duration`. A new
//! key is minted whenever the newest one is older than `duration / limit`, so
//! over one validity window exactly `limit` keys are produced. Older keys stay
//! acceptable until they expire or are pushed out by the limit.
//!
//! Validity checks tolerate a small clock skew (see [`ManagerConfig::grace`]).
//!
//! # Security Features
//!
//! - Key values come from the operating system's secure random source
//! - Failure to obtain random bytes is fatal; weak keys are never issued
//! - Constant-time comparison of candidate values
//! - Memory zeroization of key values after use
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use keyrot::{Manager, ManagerConfig};
//!
//! let config = ManagerConfig::new()
//!     .with_duration(Duration::from_secs(60))
//!     .with_limit(3);
//! let manager = Manager::new(config).unwrap();
//!
//! // Hand the current key to a client...
//! let key = manager.current_key();
//!
//! // ...and accept it when it comes back.
//! assert!(manager.validate(key.as_str()));
//! assert!(!manager.validate("stale"));
//! ```

mod clock;
mod config;
mod error;
mod generate;
mod key;
mod manager;

// Public re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DEFAULT_BITS, DEFAULT_DURATION, DEFAULT_GRACE, DEFAULT_LIMIT, MAX_LIMIT, ManagerConfig,
};
pub use error::{KeyrotError, Result};
pub use generate::{Generator, OsRngGenerator, byte_len, generate};
pub use key::Key;
pub use manager::Manager;
