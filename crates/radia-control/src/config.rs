// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tunables of the adaptive scheduler.

use crate::error::ConfigError;
use radia_core::Measure;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Longest duration any field may hold, in seconds.
pub const MAX_DURATION_SECS: f32 = 3600.0;

/// Every constant the scheduler uses, with durations in seconds.
///
/// Missing fields fall back to [`Default`], so a RON file only needs the
/// values it overrides:
///
/// ```
/// use radia_control::SchedulerConfig;
///
/// let config = SchedulerConfig::from_ron_str("(max_improve_step: 0.05)").unwrap();
/// assert_eq!(config.max_improve_step, 0.05);
/// assert_eq!(config.min_improve_step, 0.005);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Calculation stays paused this long after a critical interaction ends.
    pub pause_after_interaction: f32,
    /// Lower bound of the improve step.
    pub min_improve_step: f32,
    /// Upper bound of the improve step.
    pub max_improve_step: f32,
    /// Step used while nobody is looking at the results.
    pub no_interaction_step: f32,
    /// Weight of the previous value in the timing averages.
    pub ema_weight: f32,
    /// Step multiplier when calculation is slower than the caller's frame.
    pub step_shrink: f32,
    /// Step multiplier when calculation keeps up with the caller's frame.
    pub step_grow: f32,
    /// The step never drops below this fraction of the average calculation time.
    pub min_calc_fraction: f32,
    /// Readback period right after a big change.
    pub min_readback_period: f32,
    /// Readback period ceiling.
    pub max_readback_period: f32,
    /// Readback period multiplier applied after each readback.
    pub readback_period_growth: f32,
    /// Seam dilation passes per ambient map readback.
    pub dilation_passes: u32,
    /// Quantity written to the illumination buffers.
    pub measure: Measure,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pause_after_interaction: 0.2,
            min_improve_step: 0.005,
            max_improve_step: 0.2,
            no_interaction_step: 0.1,
            ema_weight: 0.6,
            step_shrink: 0.8,
            step_grow: 1.2,
            min_calc_fraction: 0.4,
            min_readback_period: 0.1,
            max_readback_period: 1.5,
            readback_period_growth: 1.3,
            dilation_passes: 1,
            measure: Measure::IndirectIrradiance,
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a RON config.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Checks ranges and cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let seconds = [
            ("pause_after_interaction", self.pause_after_interaction),
            ("min_improve_step", self.min_improve_step),
            ("max_improve_step", self.max_improve_step),
            ("no_interaction_step", self.no_interaction_step),
            ("min_readback_period", self.min_readback_period),
            ("max_readback_period", self.max_readback_period),
        ];
        for (name, value) in seconds {
            if !(0.0..=MAX_DURATION_SECS).contains(&value) {
                return Err(invalid(format!(
                    "{name} must lie in [0, {MAX_DURATION_SECS}] seconds (got {value})"
                )));
            }
        }
        if self.min_improve_step <= 0.0 {
            return Err(invalid("min_improve_step must be positive".to_owned()));
        }
        if self.min_improve_step > self.max_improve_step {
            return Err(invalid(format!(
                "min_improve_step ({}) exceeds max_improve_step ({})",
                self.min_improve_step, self.max_improve_step
            )));
        }
        if !(self.min_improve_step..=self.max_improve_step).contains(&self.no_interaction_step) {
            return Err(invalid(format!(
                "no_interaction_step ({}) lies outside [{}, {}]",
                self.no_interaction_step, self.min_improve_step, self.max_improve_step
            )));
        }
        if !(0.0..=1.0).contains(&self.ema_weight) {
            return Err(invalid(format!("ema_weight ({}) must lie in [0, 1]", self.ema_weight)));
        }
        if !(self.step_shrink > 0.0 && self.step_shrink <= 1.0) {
            return Err(invalid(format!("step_shrink ({}) must lie in (0, 1]", self.step_shrink)));
        }
        if !(self.step_grow >= 1.0 && self.step_grow.is_finite()) {
            return Err(invalid(format!("step_grow ({}) must be at least 1", self.step_grow)));
        }
        if !(self.min_calc_fraction >= 0.0 && self.min_calc_fraction.is_finite()) {
            return Err(invalid(format!(
                "min_calc_fraction ({}) must be non-negative",
                self.min_calc_fraction
            )));
        }
        if self.min_readback_period > self.max_readback_period {
            return Err(invalid(format!(
                "min_readback_period ({}) exceeds max_readback_period ({})",
                self.min_readback_period, self.max_readback_period
            )));
        }
        if !(self.readback_period_growth >= 1.0 && self.readback_period_growth.is_finite()) {
            return Err(invalid(format!(
                "readback_period_growth ({}) must be at least 1",
                self.readback_period_growth
            )));
        }
        Ok(())
    }

    /// [`pause_after_interaction`](Self::pause_after_interaction) as a [`Duration`].
    pub fn pause_after_interaction(&self) -> Duration {
        Duration::from_secs_f32(self.pause_after_interaction)
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}
