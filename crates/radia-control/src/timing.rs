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

//! Timing state: interaction pauses, step averages and the readback throttle.

use crate::config::SchedulerConfig;
use std::time::{Duration, Instant};

/// Exponential moving average, seeded by its first sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    value: Option<f32>,
    weight: f32,
}

impl Ema {
    /// Creates an unseeded average keeping `weight` of the old value per sample.
    pub fn new(weight: f32) -> Self {
        Self {
            value: None,
            weight,
        }
    }

    /// Folds in a sample; non-finite samples are ignored.
    pub fn observe(&mut self, sample: f32) {
        if !sample.is_finite() {
            return;
        }
        self.value = Some(match self.value {
            Some(old) => self.weight * old + (1.0 - self.weight) * sample,
            None => sample,
        });
    }

    /// Current average, `None` until the first sample.
    pub fn value(&self) -> Option<f32> {
        self.value
    }
}

/// Adaptive period between two result readbacks.
///
/// The period starts at its floor, grows after every readback up to a
/// ceiling, and drops back to the floor on big scene changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadbackThrottle {
    last: Option<Instant>,
    period: f32,
    floor: f32,
    ceiling: f32,
    growth: f32,
}

impl ReadbackThrottle {
    /// Creates a throttle from the readback fields of `config`.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            last: None,
            period: config.min_readback_period,
            floor: config.min_readback_period,
            ceiling: config.max_readback_period,
            growth: config.readback_period_growth,
        }
    }

    /// Whether a readback may run at `now`. The first readback is always due.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.period(),
            None => true,
        }
    }

    /// Records a readback at `now` and lengthens the period.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
        self.period = (self.period * self.growth).min(self.ceiling);
    }

    /// Drops the period back to its floor.
    pub fn reset_period(&mut self) {
        self.period = self.floor;
    }

    /// Current period.
    pub fn period(&self) -> Duration {
        Duration::from_secs_f32(self.period)
    }

    /// Time of the last readback.
    pub fn last(&self) -> Option<Instant> {
        self.last
    }
}

/// Chooses the next improve step, in seconds.
///
/// While the caller keeps using the results and both averages are known, the
/// previous step shrinks when calculating takes longer than the caller's own
/// frame and grows otherwise, but never below `min_calc_fraction` of the
/// average calculation time. Without that feedback the batch step is used.
/// The result always lies within the configured bounds.
pub fn next_improve_step(
    config: &SchedulerConfig,
    previous: f32,
    calc_step: Option<f32>,
    user_step: Option<f32>,
    used: bool,
) -> f32 {
    let step = match (used, calc_step, user_step) {
        (true, Some(calc), Some(user)) => {
            let factor = if calc > user {
                config.step_shrink
            } else {
                config.step_grow
            };
            (previous * factor).max(config.min_calc_fraction * calc)
        }
        _ => config.no_interaction_step,
    };
    let step = if step.is_finite() {
        step
    } else {
        config.no_interaction_step
    };
    step.clamp(config.min_improve_step, config.max_improve_step)
}

/// Everything the scheduler remembers about time.
#[derive(Debug, Clone)]
pub struct TimingState {
    pub(crate) last_critical_interaction: Option<Instant>,
    pub(crate) interaction_in_progress: bool,
    pub(crate) last_calc_end: Option<Instant>,
    pub(crate) last_illumination_use: Option<Instant>,
    pub(crate) user_step: Ema,
    pub(crate) calc_step: Ema,
    pub(crate) improve_step: f32,
    pub(crate) throttle: ReadbackThrottle,
}

impl TimingState {
    /// Creates the state for a fresh scheduler.
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            last_critical_interaction: None,
            interaction_in_progress: false,
            last_calc_end: None,
            last_illumination_use: None,
            user_step: Ema::new(config.ema_weight),
            calc_step: Ema::new(config.ema_weight),
            improve_step: config.no_interaction_step,
            throttle: ReadbackThrottle::new(config),
        }
    }

    /// Whether calculation is held back by a critical interaction at `now`.
    pub fn is_paused(&self, now: Instant, pause: Duration) -> bool {
        if self.interaction_in_progress {
            return true;
        }
        self.last_critical_interaction
            .is_some_and(|last| now.saturating_duration_since(last) < pause)
    }

    /// If the results were used since the last calculation, folds the time
    /// since then into the caller's frame average. Returns whether they were.
    pub fn observe_user_step(&mut self, now: Instant) -> bool {
        let used = match (self.last_illumination_use, self.last_calc_end) {
            (Some(used_at), Some(calc_end)) => used_at >= calc_end,
            _ => false,
        };
        if let (true, Some(calc_end)) = (used, self.last_calc_end) {
            self.user_step
                .observe(now.saturating_duration_since(calc_end).as_secs_f32());
        }
        used
    }

    /// Records a calculation that ran from `start` to `end`.
    pub fn finish_calculation(&mut self, start: Instant, end: Instant) {
        self.calc_step
            .observe(end.saturating_duration_since(start).as_secs_f32());
        self.last_calc_end = Some(end);
    }

    /// Current improve step.
    pub fn improve_step(&self) -> Duration {
        Duration::from_secs_f32(self.improve_step)
    }
}
