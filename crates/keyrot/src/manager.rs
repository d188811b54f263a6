//! Lazily rotating key set.
//!
//! The manager keeps at most `limit` keys, newest first. Every query checks
//! whether the newest key has aged past `duration / limit` and, if so, mints
//! a new one and evicts keys that have expired or fall past the limit.
//!
//! Readers share an `RwLock` read guard for the common path. When rotation is
//! due the caller drops the read guard, takes the write guard and re-checks
//! before rotating, so racing callers produce a single new key.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use crate::clock::{Clock, SystemClock};
use crate::config::ManagerConfig;
use crate::error::Result;
use crate::generate::{Generator, OsRngGenerator};
use crate::key::Key;

/// Manages time-limited rotating keys.
pub struct Manager {
    config: ManagerConfig,
    generator: Arc<dyn Generator + Send + Sync>,
    clock: Arc<dyn Clock + Send + Sync>,
    keys: RwLock<Vec<Key>>,
    rotations: AtomicU64,
}

impl Manager {
    /// Create a manager using the OS random source and the system clock.
    pub fn new(config: ManagerConfig) -> Result<Self> {
        Self::with_parts(config, Arc::new(OsRngGenerator), Arc::new(SystemClock))
    }

    /// Create a manager with explicit generator and clock.
    ///
    /// Returns an error if the config has a zero duration or bit count, or a
    /// limit outside `1..=MAX_LIMIT`.
    pub fn with_parts(
        config: ManagerConfig,
        generator: Arc<dyn Generator + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            generator,
            clock,
            keys: RwLock::new(Vec::new()),
            rotations: AtomicU64::new(0),
        })
    }

    /// Settings this manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Spacing between successive key generations.
    pub fn rotation_interval(&self) -> Duration {
        self.config.rotation_interval()
    }

    /// Number of rotations performed since construction.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Returns true if `candidate` is the value of a currently valid key.
    pub fn validate(&self, candidate: &str) -> bool {
        self.validate_at(candidate, self.clock.now())
    }

    /// Like [`validate`](Self::validate), evaluated at the given time.
    pub fn validate_at(&self, candidate: &str, at: SystemTime) -> bool {
        let effective = self.effective_time(at);
        self.keys_at(at)
            .iter()
            .any(|key| key.is_valid(effective) && key.matches(candidate))
    }

    /// Returns the most recently generated key, rotating first if due.
    pub fn current_key(&self) -> Key {
        self.current_key_at(self.clock.now())
    }

    /// Like [`current_key`](Self::current_key), evaluated at the given time.
    pub fn current_key_at(&self, at: SystemTime) -> Key {
        self.keys_at(at)
            .into_iter()
            .next()
            .expect("key set is never empty after rotation")
    }

    /// Snapshot of the retained keys, newest first. Does not rotate.
    pub fn keys(&self) -> Vec<Key> {
        self.keys.read().expect("key set poisoned").clone()
    }

    /// Rotate the keys if necessary and return a copy of the current set.
    fn keys_at(&self, at: SystemTime) -> Vec<Key> {
        {
            let keys = self.keys.read().expect("key set poisoned");
            if !self.should_rotate(&keys, at) {
                return keys.clone();
            }
        }

        let mut keys = self.keys.write().expect("key set poisoned");
        // Another caller may have rotated while we waited for the write lock.
        if self.should_rotate(&keys, at) {
            self.rotate(&mut keys, at);
        }
        keys.clone()
    }

    /// Rotation is due when the set is empty, or the newest key has expired or
    /// outlived the rotation interval at `at`.
    ///
    /// This uses the caller's time without the grace period on purpose. Grace
    /// only widens acceptance in validity checks; applying it here would skew
    /// the cadence away from `duration / limit`.
    fn should_rotate(&self, keys: &[Key], at: SystemTime) -> bool {
        let Some(newest) = keys.first() else {
            return true;
        };

        if !newest.is_valid(at) {
            return true;
        }

        newest.age(at) >= self.config.rotation_interval()
    }

    fn rotate(&self, keys: &mut Vec<Key>, at: SystemTime) {
        let value = match self.generator.generate(self.config.bits) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Key rotation aborted: {}", e);
                panic!("{}", e);
            }
        };

        // Stamp with the real current time, never the caller's `at`. The wall
        // clock can step backwards; keep the list ordered newest first. After
        // such a step the stamp sits ahead of the wall clock by up to the size
        // of the step, so the new key lives slightly shorter in wall time.
        let now = self.clock.now();
        let created_at = keys
            .first()
            .map_or(now, |newest| now.max(newest.created_at()));
        let next = Key::new(value, created_at, self.config.duration);

        let effective = self.effective_time(at);
        let limit = self.config.limit;
        let previous = std::mem::take(keys);
        let evicted = previous.len();

        let mut rotated = Vec::with_capacity(limit.min(previous.len() + 1));
        rotated.push(next);
        rotated.extend(
            previous
                .into_iter()
                .enumerate()
                .filter(|(i, key)| i + 1 < limit && key.is_valid(effective))
                .map(|(_, key)| key),
        );
        let evicted = evicted + 1 - rotated.len();
        *keys = rotated;

        let total = self.rotations.fetch_add(1, Ordering::Relaxed) + 1;
        log::debug!(
            "Rotated auth keys: {} retained, {} evicted, {} rotations total",
            keys.len(),
            evicted,
            total
        );
    }

    /// Caller's time pulled back by the grace period, used for validity checks.
    fn effective_time(&self, at: SystemTime) -> SystemTime {
        at.checked_sub(self.config.grace).unwrap_or(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::KeyrotError;
    use std::sync::atomic::AtomicUsize;

    /// Produces "key-0", "key-1", ... and counts calls.
    #[derive(Default)]
    struct SequenceGenerator {
        calls: AtomicUsize,
    }

    impl Generator for SequenceGenerator {
        fn generate(&self, _bits: usize) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("key-{}", n))
        }
    }

    struct FailingGenerator;

    impl Generator for FailingGenerator {
        fn generate(&self, _bits: usize) -> Result<String> {
            let cause = std::io::Error::other("entropy source unavailable");
            Err(KeyrotError::Entropy(rand::Error::new(cause)))
        }
    }

    fn start() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn manager(config: ManagerConfig) -> (Manager, Arc<ManualClock>, Arc<SequenceGenerator>) {
        let clock = Arc::new(ManualClock::new(start()));
        let generator = Arc::new(SequenceGenerator::default());
        let manager = Manager::with_parts(config, generator.clone(), clock.clone()).unwrap();
        (manager, clock, generator)
    }

    fn config(duration_secs: u64, limit: usize) -> ManagerConfig {
        ManagerConfig::new()
            .with_duration(Duration::from_secs(duration_secs))
            .with_limit(limit)
            .with_grace(Duration::ZERO)
    }

    #[test]
    fn starts_empty_and_rotates_on_first_access() {
        let (manager, _clock, generator) = manager(config(10, 2));
        assert!(manager.keys().is_empty());
        assert_eq!(manager.rotations(), 0);

        let key = manager.current_key();
        assert_eq!(key.as_str(), "key-0");
        assert_eq!(key.created_at(), start());
        assert_eq!(key.valid_for(), Duration::from_secs(10));
        assert_eq!(manager.rotations(), 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn validate_on_empty_manager_rotates_and_rejects_unknown() {
        let (manager, _clock, _gen) = manager(config(10, 2));
        assert!(!manager.validate("nope"));
        assert_eq!(manager.keys().len(), 1);
    }

    #[test]
    fn no_rotation_before_interval() {
        let (manager, clock, _gen) = manager(config(10, 2));
        let first = manager.current_key();
        clock.advance(Duration::from_millis(4_999));
        assert_eq!(manager.current_key().as_str(), first.as_str());
        assert_eq!(manager.rotations(), 1);
    }

    #[test]
    fn rotates_at_interval_and_keeps_previous() {
        let (manager, clock, _gen) = manager(config(10, 2));
        manager.current_key();
        clock.advance(Duration::from_secs(5));

        let second = manager.current_key();
        assert_eq!(second.as_str(), "key-1");

        let keys = manager.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].as_str(), "key-1");
        assert_eq!(keys[1].as_str(), "key-0");
        assert!(manager.validate("key-0"));
        assert!(manager.validate("key-1"));
    }

    #[test]
    fn retain_limit_caps_key_count() {
        let (manager, clock, _gen) = manager(config(30, 3));
        for _ in 0..10 {
            manager.current_key();
            assert!(manager.keys().len() <= 3);
            clock.advance(Duration::from_secs(10));
        }
        assert_eq!(manager.rotations(), 10);
    }

    #[test]
    fn limit_of_one_keeps_only_newest() {
        let (manager, clock, _gen) = manager(config(10, 1));
        manager.current_key();
        clock.advance(Duration::from_secs(10));
        manager.current_key();

        let keys = manager.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].as_str(), "key-1");
        assert!(!manager.validate("key-0"));
    }

    #[test]
    fn expired_keys_dropped_during_rotation() {
        let (manager, clock, _gen) = manager(config(10, 4));
        manager.current_key();
        // Skip far enough that the old key has expired.
        clock.advance(Duration::from_secs(11));
        manager.current_key();

        let keys = manager.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].as_str(), "key-1");
    }

    #[test]
    fn rotation_stamps_clock_time_not_caller_time() {
        let (manager, _clock, _gen) = manager(config(10, 2));
        let skewed = start() + Duration::from_secs(3);
        let key = manager.current_key_at(skewed);
        assert_eq!(key.created_at(), start());
    }

    #[test]
    fn keys_stay_ordered_when_clock_steps_back() {
        let (manager, clock, _gen) = manager(config(10, 2));
        manager.current_key();
        clock.set(start() - Duration::from_secs(60));
        manager.current_key_at(start() + Duration::from_secs(5));

        let keys = manager.keys();
        assert_eq!(keys.len(), 2);
        assert!(keys[0].created_at() >= keys[1].created_at());
    }

    #[test]
    fn grace_extends_acceptance_past_expiry() {
        let config = config(10, 2).with_grace(Duration::from_secs(1));
        let (manager, _clock, _gen) = manager(config);
        let key = manager.current_key();

        // Within the grace period the key is still accepted, even though the
        // expiry forces a rotation.
        let late = start() + Duration::from_millis(10_500);
        assert!(manager.validate_at(key.as_str(), late));
    }

    #[test]
    fn rejects_invalid_config() {
        let clock = Arc::new(ManualClock::new(start()));
        let result = Manager::with_parts(
            ManagerConfig::new().with_limit(0),
            Arc::new(SequenceGenerator::default()),
            clock,
        );
        assert!(matches!(result, Err(KeyrotError::InvalidLimit(0))));
    }

    #[test]
    fn huge_limit_rejected_without_allocating() {
        let clock = Arc::new(ManualClock::new(start()));
        if let Ok(limit) = usize::try_from(u64::from(u32::MAX) + 1) {
            let result = Manager::with_parts(
                ManagerConfig::new().with_limit(limit),
                Arc::new(SequenceGenerator::default()),
                clock,
            );
            assert!(matches!(result, Err(KeyrotError::InvalidLimit(l)) if l == limit));
        }
    }

    #[test]
    fn max_limit_manager_rotates_with_small_key_set() {
        let (manager, clock, _gen) = manager(config(10, crate::config::MAX_LIMIT));
        manager.current_key();
        clock.advance(Duration::from_millis(1));
        manager.current_key();

        let keys = manager.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].as_str(), "key-1");
        assert_eq!(manager.rotations(), 2);
    }

    #[test]
    #[should_panic(expected = "entropy source unavailable")]
    fn generator_failure_is_fatal() {
        let manager = Manager::with_parts(
            ManagerConfig::default(),
            Arc::new(FailingGenerator),
            Arc::new(ManualClock::new(start())),
        )
        .unwrap();
        manager.current_key();
    }

    #[test]
    fn os_rng_manager_generates_hex_keys() {
        let manager = Manager::new(ManagerConfig::new().with_bits(128)).unwrap();
        let key = manager.current_key();
        assert_eq!(key.as_str().len(), 32);
        assert!(manager.validate(key.as_str()));
    }
}
