use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub dialog: DialogConfig,
}

impl Config {
    /// Load config from file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid JSON,
    /// or holds values the dialog cannot run with.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        super::validation::warn_unknown_fields(&content, "config.json");
        let config: Self = serde_json::from_str(&content)?;
        config.dialog.validate()?;
        Ok(config)
    }

    /// Save config to file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Timing and thresholds of the break dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogConfig {
    /// Input pause required before taking the grab. A little above the
    /// gap between key presses of a slow typist.
    #[serde(default = "default_idle_time_to_push_modal")]
    pub idle_time_to_push_modal_ms: u64,

    /// How long to keep retrying a refused grab
    #[serde(default = "default_push_modal_time_limit")]
    pub push_modal_time_limit_secs: u64,

    /// Grab attempts per second while retrying
    #[serde(default = "default_push_modal_rate")]
    pub push_modal_rate: u64,

    /// Pointer travel between two motion samples that dismisses the dialog
    #[serde(default = "default_motion_distance")]
    pub motion_distance_to_close: f64,

    #[serde(default = "default_idle_time_to_open")]
    pub idle_time_to_open_ms: u64,

    #[serde(default = "default_idle_time_to_close")]
    pub idle_time_to_close_ms: u64,

    /// Minimum time the dialog stays up before input may dismiss it
    #[serde(default = "default_min_display_time")]
    pub min_display_time_ms: u64,

    #[serde(default = "default_fade_in_time")]
    pub fade_in_time_ms: u64,

    #[serde(default = "default_fade_out_time")]
    pub fade_out_time_ms: u64,

    /// Breaks closer to their end than this are not reopened when idle
    #[serde(default = "default_open_when_idle_min_remaining")]
    pub open_when_idle_min_remaining_secs: f64,

    #[serde(default = "default_description")]
    pub description: String,
}

fn default_idle_time_to_push_modal() -> u64 {
    600
}
fn default_push_modal_time_limit() -> u64 {
    1000
}
fn default_push_modal_rate() -> u64 {
    60
}
fn default_motion_distance() -> f64 {
    20.0
}
fn default_idle_time_to_open() -> u64 {
    60_000
}
fn default_idle_time_to_close() -> u64 {
    600
}
fn default_min_display_time() -> u64 {
    500
}
fn default_fade_in_time() -> u64 {
    300
}
fn default_fade_out_time() -> u64 {
    300
}
fn default_open_when_idle_min_remaining() -> f64 {
    3.0
}
fn default_description() -> String {
    "It's time to take a break".to_string()
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            idle_time_to_push_modal_ms: default_idle_time_to_push_modal(),
            push_modal_time_limit_secs: default_push_modal_time_limit(),
            push_modal_rate: default_push_modal_rate(),
            motion_distance_to_close: default_motion_distance(),
            idle_time_to_open_ms: default_idle_time_to_open(),
            idle_time_to_close_ms: default_idle_time_to_close(),
            min_display_time_ms: default_min_display_time(),
            fade_in_time_ms: default_fade_in_time(),
            fade_out_time_ms: default_fade_out_time(),
            open_when_idle_min_remaining_secs: default_open_when_idle_min_remaining(),
            description: default_description(),
        }
    }
}

impl DialogConfig {
    /// Reject values the dialog cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.push_modal_rate == 0 || self.push_modal_rate > 1000 {
            return Err(Error::Config(format!(
                "pushModalRate must be between 1 and 1000, got {}",
                self.push_modal_rate
            )));
        }
        if self.push_modal_time_limit_secs == 0 {
            return Err(Error::Config(
                "pushModalTimeLimitSecs must be positive".to_string(),
            ));
        }
        if !self.motion_distance_to_close.is_finite() || self.motion_distance_to_close < 0.0 {
            return Err(Error::Config(format!(
                "motionDistanceToClose must be a non-negative number, got {}",
                self.motion_distance_to_close
            )));
        }
        if !self.open_when_idle_min_remaining_secs.is_finite() {
            return Err(Error::Config(
                "openWhenIdleMinRemainingSecs must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Wait after `open()` before watching for an input pause
    #[must_use]
    pub fn push_modal_delay(&self) -> Duration {
        Duration::from_millis(
            self.min_display_time_ms
                .saturating_sub(self.idle_time_to_push_modal_ms),
        )
    }

    #[must_use]
    pub fn idle_time_to_push_modal(&self) -> Duration {
        Duration::from_millis(self.idle_time_to_push_modal_ms)
    }

    /// Period of grab retries
    #[must_use]
    pub fn push_modal_interval(&self) -> Duration {
        Duration::from_millis(1000 / self.push_modal_rate.max(1))
    }

    /// Grab attempts allowed before the dialog gives up and closes
    #[must_use]
    pub fn max_push_modal_attempts(&self) -> u64 {
        self.push_modal_rate
            .saturating_mul(self.push_modal_time_limit_secs)
    }

    #[must_use]
    pub fn idle_time_to_open(&self) -> Duration {
        Duration::from_millis(self.idle_time_to_open_ms)
    }

    #[must_use]
    pub fn idle_time_to_close(&self) -> Duration {
        Duration::from_millis(self.idle_time_to_close_ms)
    }

    #[must_use]
    pub fn min_display_time(&self) -> Duration {
        Duration::from_millis(self.min_display_time_ms)
    }

    #[must_use]
    pub fn fade_in_time(&self) -> Duration {
        Duration::from_millis(self.fade_in_time_ms)
    }

    #[must_use]
    pub fn fade_out_time(&self) -> Duration {
        Duration::from_millis(self.fade_out_time_ms)
    }

    /// Squared motion distance past which the dialog closes
    #[must_use]
    pub fn motion_distance_squared(&self) -> f64 {
        self.motion_distance_to_close * self.motion_distance_to_close
    }
}
