//! EngineConfig - 起動時に一度だけ読む設定
//!
//! # 形式（JSON）
//! ```json
//! {
//!   "request_timeout_secs": 60,
//!   "frame_interval_ms": 16,
//!   "timings": { "bigbrian": { "duration_secs": 60, "retry_delay_secs": 1, "repeat_delay_secs": 0.1 } }
//! }
//! ```
//! 省略したフィールドと効果は既定値で埋めます。読み込み後は不変な `Timings` になります。

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pack::EffectKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Seconds of one effect kind, as written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    pub duration_secs: f64,
    pub retry_delay_secs: f64,
    pub repeat_delay_secs: f64,
}

impl TimingConfig {
    pub const fn new(duration_secs: f64, retry_delay_secs: f64, repeat_delay_secs: f64) -> Self {
        Self {
            duration_secs,
            retry_delay_secs,
            repeat_delay_secs,
        }
    }

    fn validate(&self, kind: EffectKind) -> Result<Timing, ConfigError> {
        let check = |name: &str, secs: f64| {
            Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|duration| !duration.is_zero())
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("{kind}.{name} must be a positive number, got {secs}"))
                })
        };
        Ok(Timing {
            duration: check("duration_secs", self.duration_secs)?,
            retry_delay: check("retry_delay_secs", self.retry_delay_secs)?,
            repeat_delay: check("repeat_delay_secs", self.repeat_delay_secs)?,
        })
    }
}

/// Validated timing of one effect kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Hold/tick duration.
    pub duration: Duration,
    /// Delay between failed attempts (precondition, action, setup).
    pub retry_delay: Duration,
    /// Tick interval of periodic effects.
    pub repeat_delay: Duration,
}

/// Per-kind default timings.
pub fn default_timing(kind: EffectKind) -> TimingConfig {
    match kind {
        EffectKind::BigBrian => TimingConfig::new(60.0, 1.0, 0.1),
        EffectKind::ExpensiveSpells => TimingConfig::new(60.0, 1.0, 0.05),
        EffectKind::CheapSpells => TimingConfig::new(60.0, 1.0, 0.25),
        EffectKind::RandomSpell => TimingConfig::new(30.0, 1.0, 0.25),
        _ => TimingConfig::new(60.0, 1.0, 1.0),
    }
}

fn default_timings() -> BTreeMap<EffectKind, TimingConfig> {
    EffectKind::ALL
        .into_iter()
        .map(|kind| (kind, default_timing(kind)))
        .collect()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_frame_interval_ms() -> u64 {
    16
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long a request may wait for its precondition before it is dropped.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Emulated frame period of the development device.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Overrides merged over the defaults.
    #[serde(default)]
    pub timings: BTreeMap<EffectKind, TimingConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            frame_interval_ms: default_frame_interval_ms(),
            timings: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be > 0".into()));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("frame_interval_ms must be > 0".into()));
        }
        for (kind, timing) in &self.timings {
            timing.validate(*kind)?;
        }
        Ok(())
    }

    /// Defaults overlaid with the configured entries.
    pub fn timings(&self) -> Result<Timings, ConfigError> {
        let mut merged = default_timings();
        merged.extend(self.timings.iter().map(|(kind, timing)| (*kind, *timing)));
        let entries = merged
            .into_iter()
            .map(|(kind, timing)| Ok((kind, timing.validate(kind)?)))
            .collect::<Result<_, ConfigError>>()?;
        Ok(Timings { entries })
    }
}

/// Immutable, validated timing table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timings {
    entries: BTreeMap<EffectKind, Timing>,
}

impl Timings {
    /// Only the given entries; kinds left out have no timing.
    pub fn from_entries(entries: impl IntoIterator<Item = (EffectKind, Timing)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, kind: EffectKind) -> Option<Timing> {
        self.entries.get(&kind).copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.entries.keys().copied()
    }
}
