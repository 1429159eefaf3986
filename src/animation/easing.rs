//! Easing curves for the transition planner
//!
//! Progress `t` is clamped to `[0, 1]` and the eased result stays in
//! `[0, 1]`. Slides ease in and out, fade-ins ease out, ghosts ease in.

/// Easing function signature
pub type EasingFn = fn(f64) -> f64;

/// Constant velocity.
#[inline]
pub fn linear(t: f64) -> f64 {
    t.clamp(0.0, 1.0)
}

/// Accelerates from rest.
#[inline]
pub fn ease_in(t: f64) -> f64 {
    linear(t).powi(2)
}

/// Decelerates to rest; the mirror image of [`ease_in`].
#[inline]
pub fn ease_out(t: f64) -> f64 {
    1.0 - ease_in(1.0 - t)
}

/// [`ease_in`] over the first half, [`ease_out`] over the second.
#[inline]
pub fn ease_in_out(t: f64) -> f64 {
    let t = linear(t);
    if t < 0.5 {
        ease_in(2.0 * t) / 2.0
    } else {
        0.5 + ease_out(2.0 * t - 1.0) / 2.0
    }
}
