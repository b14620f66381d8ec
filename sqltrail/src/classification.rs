//! Latency and count tiers for inspector display.
//!
//! Every trace number shown in the inspector is bucketed into a [`Tier`] so the
//! page can color it. Two thresholds split a value into three buckets:
//!
//! ```text
//!   value <= fast           → Tier::Fast
//!   value <= medium         → Tier::Medium
//!   otherwise               → Tier::Slow
//! ```
//!
//! The same shape is applied independently to
//! 1. a single operation's elapsed time
//! 2. the summed elapsed time of all operations in a scope
//! 3. the number of operations in a scope (thresholds are counts)
//! 4. the whole scope's elapsed time
//!
//! Comparisons always use the full-precision [`Duration`]; only
//! [`format_duration`] truncates, and only for display.
//!
//! Request methods get a fixed, non-latency badge through [`method_tier`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::ConfigError;

/// Display bucket for a trace value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Fast,
    Medium,
    Slow,
    /// Non-latency highlight, used for method badges
    Informational,
    /// Unmapped label or unfinished record
    #[default]
    Neutral,
}

impl Tier {
    /// Stylesheet class the inspector page uses for this tier.
    #[must_use]
    pub fn css_class(self) -> &'static str {
        match self {
            Tier::Fast => "success",
            Tier::Medium => "warning",
            Tier::Slow => "danger",
            Tier::Informational => "info",
            Tier::Neutral => "light",
        }
    }
}

// =============================================================================
// THRESHOLDS
// =============================================================================

/// Two latency cut-offs splitting durations into fast / medium / slow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(rename = "fast_ms", with = "millis")]
    pub fast: Duration,
    #[serde(rename = "medium_ms", with = "millis")]
    pub medium: Duration,
}

impl TierThresholds {
    #[must_use]
    pub const fn from_millis(fast: u64, medium: u64) -> Self {
        Self { fast: Duration::from_millis(fast), medium: Duration::from_millis(medium) }
    }

    #[must_use]
    pub fn classify(&self, elapsed: Duration) -> Tier {
        if elapsed <= self.fast {
            Tier::Fast
        } else if elapsed <= self.medium {
            Tier::Medium
        } else {
            Tier::Slow
        }
    }
}

/// Two count cut-offs with the same three-bucket shape as [`TierThresholds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountThresholds {
    pub fast: usize,
    pub medium: usize,
}

impl CountThresholds {
    #[must_use]
    pub fn classify(&self, count: usize) -> Tier {
        if count <= self.fast {
            Tier::Fast
        } else if count <= self.medium {
            Tier::Medium
        } else {
            Tier::Slow
        }
    }
}

/// Full threshold set consulted by the inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Single operation elapsed time
    pub operation: TierThresholds,
    /// Sum of all operation elapsed times within a scope
    pub operations_total: TierThresholds,
    /// Number of operations within a scope
    pub operation_count: CountThresholds,
    /// Whole scope elapsed time
    pub scope: TierThresholds,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            operation: TierThresholds::from_millis(100, 250),
            operations_total: TierThresholds::from_millis(100, 250),
            operation_count: CountThresholds { fast: 10, medium: 15 },
            scope: TierThresholds::from_millis(250, 500),
        }
    }
}

impl Thresholds {
    /// Reject pairs whose fast cut-off sits above the medium one.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidThresholds`] naming the first bad pair.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let latency_pairs = [
            ("operation", self.operation),
            ("operations_total", self.operations_total),
            ("scope", self.scope),
        ];
        for (name, pair) in latency_pairs {
            if pair.fast > pair.medium {
                return Err(ConfigError::InvalidThresholds {
                    name,
                    fast: format_duration(pair.fast),
                    medium: format_duration(pair.medium),
                });
            }
        }
        if self.operation_count.fast > self.operation_count.medium {
            return Err(ConfigError::InvalidThresholds {
                name: "operation_count",
                fast: self.operation_count.fast.to_string(),
                medium: self.operation_count.medium.to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// METHOD BADGES
// =============================================================================

/// Fixed badge table for request methods. Matching is exact.
const METHOD_TIERS: &[(&str, Tier)] = &[
    ("GET", Tier::Fast),
    ("POST", Tier::Informational),
    ("PUT", Tier::Medium),
    ("PATCH", Tier::Medium),
    ("DELETE", Tier::Slow),
];

/// Badge tier for a request method; unmapped methods are [`Tier::Neutral`].
#[must_use]
pub fn method_tier(method: &str) -> Tier {
    METHOD_TIERS
        .iter()
        .find(|(verb, _)| *verb == method)
        .map_or(Tier::Neutral, |(_, tier)| *tier)
}

// =============================================================================
// DURATION DISPLAY
// =============================================================================

/// Render a duration for humans, dropping the fractional part of the
/// largest unit: `1h2m3s`, `1m30s`, `4s`, `150ms`, `850µs`, `12ns`.
#[must_use]
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 3600 {
        format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else if secs >= 1 {
        format!("{secs}s")
    } else if elapsed.as_millis() >= 1 {
        format!("{}ms", elapsed.as_millis())
    } else if elapsed.as_micros() >= 1 {
        format!("{}µs", elapsed.as_micros())
    } else {
        format!("{}ns", elapsed.as_nanos())
    }
}

/// Serde helper storing a [`Duration`] as whole milliseconds.
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[allow(clippy::cast_possible_truncation)] // thresholds never approach u64::MAX ms
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
