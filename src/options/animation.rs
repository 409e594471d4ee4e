use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::animation::EasingFunction;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Animation", inline)]
#[serde(default)]
/// Transition timing and auto-advance behavior.
pub struct AnimationOptions {
    /// Progress added per tick. 0.02 finishes a transition in 50 frames.
    #[schemars(title = "Step", range(min = 0.001, max = 1.0), extend("step" = 0.001))]
    pub step: f32,
    /// Easing curve applied to raw progress.
    #[schemars(title = "Easing")]
    pub easing: EasingFunction,
    /// Seconds between automatic transitions.
    #[schemars(title = "Advance Interval", range(min = 0.1, max = 60.0), extend("step" = 0.1))]
    pub advance_interval_secs: f32,
    /// Start auto-advancing as soon as a viewer is created.
    #[schemars(title = "Autoplay")]
    pub autoplay: bool,
    /// Wrap from the last entry back to the first.
    #[serde(rename = "loop")]
    #[schemars(title = "Loop")]
    pub looping: bool,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            step: 0.02,
            easing: EasingFunction::QuadraticInOut,
            advance_interval_secs: 3.0,
            autoplay: true,
            looping: true,
        }
    }
}

impl AnimationOptions {
    /// Auto-advance interval, clamped to 1 ms ..= 1 day.
    #[must_use]
    pub fn advance_interval(&self) -> Duration {
        Duration::from_secs_f32(
            self.advance_interval_secs.max(0.001).min(86_400.0),
        )
    }
}
