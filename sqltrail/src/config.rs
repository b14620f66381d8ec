//! Profiler configuration
//!
//! [`ProfilerConfig`] is the serializable, load-once form (defaults, JSON file,
//! CLI overrides). [`Settings`] is the live form shared by the trackers: the
//! enable switch and the caller skip depth are atomics, the thresholds sit
//! behind their own lock. None of these reads coordinate with the cache lock.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::cache::DEFAULT_CAPACITY;
use crate::classification::Thresholds;
use crate::domain::ConfigError;

/// Stack frames skipped above the tracking call by default (1 = direct caller).
pub const DEFAULT_SKIP_FRAMES: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// When false, tracking calls are no-ops and the inspector does not start
    pub enabled: bool,
    /// Scopes retained; any negative value means unlimited
    pub capacity: i64,
    /// Frames skipped when resolving an operation's caller
    pub skip_frames: usize,
    pub thresholds: Thresholds,
}

impl Default for ProfilerConfig {
    #[allow(clippy::cast_possible_wrap)] // DEFAULT_CAPACITY is small
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY as i64,
            skip_frames: DEFAULT_SKIP_FRAMES,
            thresholds: Thresholds::default(),
        }
    }
}

impl ProfilerConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed, or if a threshold pair is
    /// inverted.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFailed { path: path.to_path_buf(), source })?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|source| ConfigError::ParseFailed { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`ConfigError::InvalidThresholds`] for an inverted pair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()
    }

    /// Capacity as a deque limit (`None` = unbounded).
    #[must_use]
    pub fn capacity_limit(&self) -> Option<usize> {
        usize::try_from(self.capacity).ok()
    }
}

/// Live settings read on the tracking hot path.
#[derive(Debug)]
pub struct Settings {
    enabled: AtomicBool,
    skip_frames: AtomicUsize,
    thresholds: RwLock<Thresholds>,
}

impl Settings {
    #[must_use]
    pub fn from_config(config: &ProfilerConfig) -> Self {
        Self {
            enabled: AtomicBool::new(config.enabled),
            skip_frames: AtomicUsize::new(config.skip_frames),
            thresholds: RwLock::new(config.thresholds),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn skip_frames(&self) -> usize {
        self.skip_frames.load(Ordering::Relaxed)
    }

    pub fn set_skip_frames(&self, skip: usize) {
        self.skip_frames.store(skip, Ordering::Relaxed);
    }

    /// Copy of the current thresholds.
    pub fn thresholds(&self) -> Thresholds {
        *self.thresholds.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// # Errors
    /// Rejects inverted pairs and leaves the current thresholds in place.
    pub fn set_thresholds(&self, thresholds: Thresholds) -> Result<(), ConfigError> {
        thresholds.validate()?;
        *self.thresholds.write().unwrap_or_else(PoisonError::into_inner) = thresholds;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&ProfilerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::TierThresholds;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ProfilerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.capacity_limit(), Some(50));
        assert_eq!(config.skip_frames, 1);
    }

    #[test]
    fn test_negative_capacity_is_unbounded() {
        let config = ProfilerConfig { capacity: -1, ..ProfilerConfig::default() };
        assert_eq!(config.capacity_limit(), None);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"capacity": 3, "thresholds": {{"scope": {{"fast_ms": 1, "medium_ms": 2}}}}}}"#)
            .unwrap();

        let config = ProfilerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.capacity, 3);
        assert!(config.enabled);
        assert_eq!(config.thresholds.scope, TierThresholds::from_millis(1, 2));
        assert_eq!(config.thresholds.operation, Thresholds::default().operation);
    }

    #[test]
    fn test_load_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = ProfilerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailed { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProfilerConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }

    #[test]
    fn test_settings_reject_inverted_thresholds() {
        let settings = Settings::default();
        let mut bad = Thresholds::default();
        bad.operation = TierThresholds::from_millis(300, 200);

        assert!(settings.set_thresholds(bad).is_err());
        assert_eq!(settings.thresholds(), Thresholds::default());
    }
}
