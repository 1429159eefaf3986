//! Property animation
//!
//! One [`AnimationClock`] drives every animation of a scene. The host ticks
//! it once per rendered frame; each tick interpolates the attributes of every
//! node with running tasks and settles the [`Completion`]s of tasks that
//! ended. Nothing runs on another thread: completions are plain futures,
//! composed with [`Completion::all`] and sequenced with `.await`, and polled
//! by a `futures` local executor after each tick.
//!
//! # Usage
//!
//! ```ignore
//! let mut proxy = AnimatedNode::new(clock.clone(), Some(node), "x");
//! let done = proxy.animate_to(NodeProps::new().opacity(1.0), AnimationConfig::default());
//! clock.tick(BASE_DURATION);
//! ```

pub mod animatable;
pub mod clock;
pub mod completion;
pub mod easing;
pub mod transition;

pub use animatable::{Animatable, AnimatableTo, AnimatedNode, NodeProps, ProxyState};
pub use clock::{AnimationClock, SubscriberId};
pub use completion::{Completion, CompletionResult};
pub use easing::EasingFn;
pub use transition::Transition;

use std::time::Duration;

use crate::config::DEFAULT_BASE_DURATION;

/// Duration every [`AnimationConfig`] multiplier is relative to, unless the
/// clock was given another one
pub const BASE_DURATION: Duration = DEFAULT_BASE_DURATION;

/// Timing of one animation request
#[derive(Debug, Clone, Copy)]
pub struct AnimationConfig {
    /// Length in units of the base duration
    pub duration_multiplier: f64,
    /// Wait before starting, in units of the base duration
    pub delay_multiplier: f64,
    pub easing: EasingFn,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        AnimationConfig {
            duration_multiplier: 1.0,
            delay_multiplier: 0.0,
            easing: easing::ease_in_out,
        }
    }
}

impl AnimationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duration(mut self, multiplier: f64) -> Self {
        self.duration_multiplier = multiplier;
        self
    }

    pub fn delay(mut self, multiplier: f64) -> Self {
        self.delay_multiplier = multiplier;
        self
    }

    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// `(delay, duration)` for a given base duration
    pub fn timing(&self, base: Duration) -> (Duration, Duration) {
        (
            scale(base, self.delay_multiplier),
            scale(base, self.duration_multiplier),
        )
    }
}

/// Negative and non-finite multipliers count as zero
fn scale(base: Duration, multiplier: f64) -> Duration {
    if multiplier.is_finite() && multiplier > 0.0 {
        base.mul_f64(multiplier)
    } else {
        Duration::ZERO
    }
}
