//! The per-scene animation clock
//!
//! Proxies subscribe with the node they animate and register tasks. A task
//! captures the current attribute values when it is registered and
//! interpolates toward its targets between `start` and `end`:
//!
//! - numbers interpolate through the task's easing
//! - colors interpolate per RGB channel
//! - points and text snap to the target once the task starts
//!
//! All tasks of one node are merged into a single `set_attrs` per tick. The
//! clock is running while any subscription has a task left.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::oneshot;

use super::completion::{Completion, CompletionResult};
use super::easing::EasingFn;
use super::AnimationConfig;
use crate::error::AnimationError;
use crate::scene::{Attr, AttrValue, NodeId, Scene};

pub type SubscriberId = u64;

struct Track {
    attr: Attr,
    from: AttrValue,
    to: AttrValue,
}

struct Task {
    tracks: Vec<Track>,
    start: Duration,
    end: Duration,
    easing: EasingFn,
    done: Option<oneshot::Sender<CompletionResult>>,
}

impl Task {
    /// Linear progress, `None` before the task starts
    fn progress(&self, now: Duration) -> Option<f64> {
        if now < self.start {
            return None;
        }
        if self.end <= self.start {
            return Some(1.0);
        }
        let elapsed = (now - self.start).as_secs_f64();
        let length = (self.end - self.start).as_secs_f64();
        Some((elapsed / length).min(1.0))
    }

    fn resolve(&mut self) {
        if let Some(done) = self.done.take() {
            // The receiver may already be gone
            let _ = done.send(Ok(()));
        }
    }
}

fn interpolate(from: &AttrValue, to: &AttrValue, t: f64) -> AttrValue {
    if t >= 1.0 {
        return to.clone();
    }
    match (from, to) {
        (AttrValue::Number(a), AttrValue::Number(b)) => AttrValue::Number(a + (b - a) * t),
        (AttrValue::Color(a), AttrValue::Color(b)) => AttrValue::Color(a.lerp(*b, t)),
        _ => to.clone(),
    }
}

struct Subscription {
    node: NodeId,
    tasks: Vec<Task>,
}

struct ClockState {
    scene: Rc<RefCell<Scene>>,
    now: Duration,
    base_duration: Duration,
    next_id: SubscriberId,
    subscriptions: BTreeMap<SubscriberId, Subscription>,
}

/// Shared handle to a scene's clock
#[derive(Clone)]
pub struct AnimationClock {
    state: Rc<RefCell<ClockState>>,
}

impl AnimationClock {
    pub fn new(scene: Rc<RefCell<Scene>>, base_duration: Duration) -> Self {
        AnimationClock {
            state: Rc::new(RefCell::new(ClockState {
                scene,
                now: Duration::ZERO,
                base_duration,
                next_id: 0,
                subscriptions: BTreeMap::new(),
            })),
        }
    }

    pub fn scene(&self) -> Rc<RefCell<Scene>> {
        self.state.borrow().scene.clone()
    }

    /// Time of the last tick
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    pub fn base_duration(&self) -> Duration {
        self.state.borrow().base_duration
    }

    pub fn set_base_duration(&self, base_duration: Duration) {
        self.state.borrow_mut().base_duration = base_duration;
    }

    /// Whether any task is left; the host may stop ticking otherwise
    pub fn is_running(&self) -> bool {
        self.state
            .borrow()
            .subscriptions
            .values()
            .any(|s| !s.tasks.is_empty())
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscriptions.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.state
            .borrow()
            .subscriptions
            .values()
            .map(|s| s.tasks.len())
            .sum()
    }

    pub fn subscribe(&self, node: NodeId) -> SubscriberId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id;
        state.next_id += 1;
        state.subscriptions.insert(
            id,
            Subscription {
                node,
                tasks: Vec::new(),
            },
        );
        id
    }

    /// Drop a subscription, resolving all of its pending tasks
    pub fn unsubscribe(&self, id: SubscriberId) {
        let removed = self.state.borrow_mut().subscriptions.remove(&id);
        if let Some(mut subscription) = removed {
            let pending = subscription.tasks.len();
            for task in &mut subscription.tasks {
                task.resolve();
            }
            tracing::trace!(subscriber = id, pending, "unsubscribed");
        }
    }

    /// Register a task moving the subscriber's node toward `targets`
    ///
    /// Start values are read from the scene now. An unknown subscriber has
    /// been destroyed, so the request resolves without effect.
    pub fn animate(
        &self,
        id: SubscriberId,
        targets: Vec<(Attr, AttrValue)>,
        config: &AnimationConfig,
    ) -> Completion {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(subscription) = state.subscriptions.get_mut(&id) else {
            return Completion::resolved();
        };
        let scene = state.scene.borrow();
        if !scene.contains(subscription.node) {
            return Completion::rejected(AnimationError::NodeNotDrawn {
                entity: format!("{:?}", subscription.node),
            });
        }
        if targets.is_empty() {
            return Completion::resolved();
        }

        let tracks = targets
            .into_iter()
            .map(|(attr, to)| {
                let from = scene
                    .get_attr(subscription.node, attr)
                    .unwrap_or_else(|| to.clone());
                Track { attr, from, to }
            })
            .collect();
        let (delay, duration) = config.timing(state.base_duration);
        let start = state.now + delay;
        let (tx, completion) = Completion::channel();
        subscription.tasks.push(Task {
            tracks,
            start,
            end: start + duration,
            easing: config.easing,
            done: Some(tx),
        });
        completion
    }

    /// Advance to `now` (time since the clock started) and apply every task
    ///
    /// Returns the number of nodes updated.
    pub fn tick(&self, now: Duration) -> usize {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.now = state.now.max(now);
        let now = state.now;

        let mut scene = state.scene.borrow_mut();
        let mut updated = 0;
        for subscription in state.subscriptions.values_mut() {
            let mut merged: Vec<(Attr, AttrValue)> = Vec::new();
            for task in &mut subscription.tasks {
                let Some(progress) = task.progress(now) else {
                    continue;
                };
                let eased = if progress >= 1.0 {
                    1.0
                } else {
                    (task.easing)(progress)
                };
                for track in &task.tracks {
                    merged.push((track.attr, interpolate(&track.from, &track.to, eased)));
                }
                if progress >= 1.0 {
                    task.resolve();
                }
            }
            subscription.tasks.retain(|task| task.done.is_some());
            if !merged.is_empty() {
                scene.set_attrs(subscription.node, merged);
                updated += 1;
            }
        }
        tracing::trace!(now_ms = now.as_millis() as u64, updated, "clock tick");
        updated
    }

    /// Tick `dt` after the previous tick
    pub fn advance(&self, dt: Duration) -> usize {
        let now = self.now() + dt;
        self.tick(now)
    }
}

impl std::fmt::Debug for AnimationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("AnimationClock")
            .field("now", &state.now)
            .field("subscriptions", &state.subscriptions.len())
            .finish()
    }
}
