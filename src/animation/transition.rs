//! Transitions between two drawn layouts
//!
//! [`Transition::plan`] diffs the entities of the previous scene against the
//! freshly drawn next scene by [`EntityKey`]:
//!
//! - entities in both that moved slide from their old position, frames that
//!   changed size resize, bindings whose text changed flash
//! - arrows whose route changed, and entities that are new, fade in once
//!   everything else has settled
//! - entities that disappeared are copied into the overlay as ghosts and
//!   fade out
//!
//! On top of that the machine step itself is animated: a literal leaving the
//! control slides onto the stash, an identifier lookup slides a copy of the
//! binding onto the stash, and an assignment slides the old stash top into
//! the binding it writes.
//!
//! Every proxy is destroyed when the transition finishes, which hides the
//! ghosts and leaves every other node at its final position.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use futures::FutureExt;

use super::animatable::{Animatable, AnimatableTo, AnimatedNode, NodeProps};
use super::clock::AnimationClock;
use super::completion::{Completion, CompletionResult};
use super::{easing, AnimationConfig};
use crate::diagram::geometry::Point;
use crate::error::LayoutError;
use crate::layout::Layout;
use crate::scene::{palette, Attr, EntityKey, Layer, NodeId, Rgb, Scene, Shape};

/// Duration multipliers of each kind of change
const SLIDE: f64 = 1.0;
const FADE: f64 = 0.5;
const FLASH: f64 = 2.0;

enum Step {
    Slide {
        node: NodeId,
        from: Point,
        to: Point,
        label: String,
    },
    Resize {
        node: NodeId,
        from: (f64, f64),
        to: (f64, f64),
        label: String,
    },
    Flash {
        node: NodeId,
        color: Rgb,
        label: String,
    },
    FadeIn {
        node: NodeId,
        label: String,
    },
    FadeOut {
        ghost_of: NodeId,
        label: String,
    },
    /// Ghost that travels to `to` before fading
    Carry {
        ghost_of: NodeId,
        to: Point,
        label: String,
    },
}

/// A planned animation from one layout to the next
pub struct Transition {
    proxies: Rc<RefCell<Vec<AnimatedNode>>>,
    future: Option<LocalBoxFuture<'static, CompletionResult>>,
    finished: Rc<Cell<bool>>,
}

impl Transition {
    /// Plan and start the transition
    ///
    /// `next` must already be drawn into the clock's scene and `prev` into
    /// `previous_scene`. Slides, ghost fades and flashes start right away;
    /// fade-ins start from the returned future once those have finished, so
    /// the future has to be polled for the transition to complete.
    pub fn plan(
        prev: &Layout,
        next: &Layout,
        previous_scene: &Scene,
        clock: &AnimationClock,
    ) -> Result<Transition, LayoutError> {
        let scene_rc = clock.scene();
        let steps = {
            let scene = scene_rc.borrow();
            diff(prev, next, previous_scene, &scene)?
        };
        let overlay = scene_rc.borrow().layer(Layer::Overlay);

        let mut proxies = Vec::new();
        let mut started = Vec::new();
        for step in steps {
            let (proxy, completions) = run_step(step, clock, previous_scene, overlay);
            started.extend(completions);
            proxies.push(proxy);
        }
        tracing::debug!(
            proxies = proxies.len(),
            started = started.len(),
            "transition planned"
        );

        let proxies = Rc::new(RefCell::new(proxies));
        let finished = Rc::new(Cell::new(false));
        let future = {
            let proxies = proxies.clone();
            let finished = finished.clone();
            let first = Completion::all(started);
            async move {
                let first = first.await;
                let fade_ins: Vec<Completion> = proxies
                    .borrow_mut()
                    .iter_mut()
                    .filter(|p| p.has_preset())
                    .map(|p| p.animate())
                    .collect();
                let second = Completion::all(fade_ins).await;
                for proxy in proxies.borrow_mut().iter_mut() {
                    proxy.destroy();
                }
                finished.set(true);
                first.and(second)
            }
            .boxed_local()
        };

        Ok(Transition {
            proxies,
            future: Some(future),
            finished,
        })
    }

    /// The future driving the transition, to be spawned on a local executor
    pub fn take_future(&mut self) -> Option<LocalBoxFuture<'static, CompletionResult>> {
        self.future.take()
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.borrow().len()
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    /// Tear down every proxy; pending completions resolve
    ///
    /// Nodes of the next scene jump to their final state and ghosts are
    /// hidden, so the scene looks as if the transition had run to the end.
    pub fn destroy(&mut self) {
        for proxy in self.proxies.borrow_mut().iter_mut() {
            if let Err(err) = proxy.settle() {
                tracing::warn!(%err, "node not settled");
            }
            proxy.destroy();
        }
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("proxies", &self.proxy_count())
            .field("finished", &self.is_finished())
            .finish()
    }
}

fn run_step(
    step: Step,
    clock: &AnimationClock,
    previous_scene: &Scene,
    overlay: NodeId,
) -> (AnimatedNode, Vec<Completion>) {
    let slide = AnimationConfig::new().duration(SLIDE);
    let fade = AnimationConfig::new().duration(FADE).easing(easing::ease_out);

    let ghost = |of: NodeId| {
        clock
            .scene()
            .borrow_mut()
            .adopt(previous_scene, of, overlay)
    };
    let initial = |proxy: &AnimatedNode, props: NodeProps| {
        if let Err(err) = proxy.set(props) {
            tracing::warn!(%err, "initial state not applied");
        }
    };

    match step {
        Step::Slide {
            node,
            from,
            to,
            label,
        } => {
            let mut proxy = AnimatedNode::new(clock.clone(), Some(node), label)
                .with_target(NodeProps::new().at(to));
            initial(&proxy, NodeProps::new().at(from));
            let done = proxy.animate_to(NodeProps::new().at(to), slide);
            (proxy, vec![done])
        }
        Step::Resize {
            node,
            from,
            to,
            label,
        } => {
            let mut proxy = AnimatedNode::new(clock.clone(), Some(node), label)
                .with_target(NodeProps::new().width(to.0).height(to.1));
            initial(&proxy, NodeProps::new().width(from.0).height(from.1));
            let done = proxy.animate_to(NodeProps::new().width(to.0).height(to.1), slide);
            (proxy, vec![done])
        }
        Step::Flash { node, color, label } => {
            let mut proxy = AnimatedNode::new(clock.clone(), Some(node), label)
                .with_target(NodeProps::new().fill(color));
            initial(&proxy, NodeProps::new().fill(palette::FLASH));
            let done = proxy.animate_to(
                NodeProps::new().fill(color),
                AnimationConfig::new().duration(FLASH).easing(easing::ease_in),
            );
            (proxy, vec![done])
        }
        Step::FadeIn { node, label } => {
            let proxy = AnimatedNode::new(clock.clone(), Some(node), label)
                .with_preset(NodeProps::new().opacity(1.0), fade)
                .with_target(NodeProps::new().opacity(1.0));
            initial(&proxy, NodeProps::new().opacity(0.0));
            (proxy, Vec::new())
        }
        Step::FadeOut { ghost_of, label } => {
            let mut proxy = AnimatedNode::owned(clock.clone(), ghost(ghost_of), label);
            let done = proxy.animate_to(NodeProps::new().opacity(0.0), fade);
            (proxy, vec![done])
        }
        Step::Carry {
            ghost_of,
            to,
            label,
        } => {
            let mut proxy = AnimatedNode::owned(clock.clone(), ghost(ghost_of), label);
            let moved = proxy.animate_to(NodeProps::new().at(to), slide);
            let faded = proxy.animate_to(NodeProps::new().opacity(0.0), fade.delay(SLIDE));
            (proxy, vec![moved, faded])
        }
    }
}

/// Stash item pushed by this step and where it comes from
struct Push {
    key: EntityKey,
    from: Point,
    /// Control item that turned into the pushed stash item
    consumed: Option<EntityKey>,
}

fn pushed_item(prev: &Layout, next: &Layout) -> Result<Option<Push>, LayoutError> {
    let (Some(command), Some(pushed)) = (prev.machine().control_top(), next.machine().stash_top())
    else {
        return Ok(None);
    };
    if next.machine().stash.len() <= prev.machine().stash.len() {
        return Ok(None);
    }
    let key = EntityKey::Stash(pushed.index);
    if command.is_literal {
        return Ok(Some(Push {
            key,
            from: Point::new(command.x(), command.y()),
            consumed: Some(EntityKey::Control(command.index)),
        }));
    }
    let (Some(name), Some(frame)) = (&command.looks_up, prev.diagram().current_frame()) else {
        return Ok(None);
    };
    let binding = prev.diagram().binding(prev.diagram().lookup_binding(frame, name)?);
    Ok(Some(Push {
        key,
        from: Point::new(binding.x(), binding.y()),
        consumed: None,
    }))
}

/// Stash item an assignment writes, and the binding it lands in
fn assigned_item(prev: &Layout, next: &Layout) -> Result<Option<(EntityKey, Point)>, LayoutError> {
    let (Some(command), Some(top)) = (prev.machine().control_top(), prev.machine().stash_top())
    else {
        return Ok(None);
    };
    let (Some(name), Some(frame)) = (&command.assigns, next.diagram().current_frame()) else {
        return Ok(None);
    };
    let binding = next.diagram().binding(next.diagram().lookup_binding(frame, name)?);
    Ok(Some((
        EntityKey::Stash(top.index),
        Point::new(binding.x(), binding.y()),
    )))
}

fn position(scene: &Scene, node: NodeId) -> Point {
    scene.absolute_position(node)
}

/// First child of `node` with the given shape, skipping `skip` matches
fn child_of(scene: &Scene, node: NodeId, shape: Shape, skip: usize) -> Option<NodeId> {
    scene
        .children(node)
        .iter()
        .copied()
        .filter(|&c| scene.shape(c) == shape)
        .nth(skip)
}

fn diff(
    prev: &Layout,
    next: &Layout,
    previous_scene: &Scene,
    scene: &Scene,
) -> Result<Vec<Step>, LayoutError> {
    let before: BTreeMap<EntityKey, NodeId> = previous_scene
        .entities()
        .map(|(key, node)| (key.clone(), node))
        .collect();
    let push = pushed_item(prev, next)?;
    let assignment = assigned_item(prev, next)?;

    let mut handled: BTreeSet<EntityKey> = BTreeSet::new();
    let mut steps = Vec::new();

    if let Some(push) = &push {
        if let Some(node) = scene.entity(&push.key) {
            steps.push(Step::Slide {
                node,
                from: push.from,
                to: position(scene, node),
                label: format!("{:?}", push.key),
            });
            handled.insert(push.key.clone());
            handled.extend(push.consumed.clone());
        }
    }
    if let Some((key, to)) = &assignment {
        if let Some(&ghost_of) = before.get(key) {
            steps.push(Step::Carry {
                ghost_of,
                to: *to,
                label: format!("{:?}", key),
            });
            // Still on the stash afterwards: leave the real item alone
            if scene.entity(key).is_none() {
                handled.insert(key.clone());
            }
        }
    }

    for (key, node) in scene.entities() {
        if handled.contains(key) {
            continue;
        }
        let label = format!("{:?}", key);
        let Some(&old) = before.get(key) else {
            steps.push(Step::FadeIn { node, label });
            continue;
        };

        if let EntityKey::Arrow(_) = key {
            if previous_scene.get_attr(old, Attr::Points) != scene.get_attr(node, Attr::Points) {
                steps.push(Step::FadeIn { node, label });
            }
            continue;
        }

        let (from, to) = (position(previous_scene, old), position(scene, node));
        if from != to {
            steps.push(Step::Slide {
                node,
                from,
                to,
                label: label.clone(),
            });
        }

        match key {
            EntityKey::Frame(_) => {
                let boxes = (
                    child_of(previous_scene, old, Shape::Rect, 0),
                    child_of(scene, node, Shape::Rect, 0),
                );
                if let (Some(a), Some(b)) = boxes {
                    let size = |s: &Scene, n| (s.number(n, Attr::Width), s.number(n, Attr::Height));
                    let (from, to) = (size(previous_scene, a), size(scene, b));
                    if from != to {
                        steps.push(Step::Resize {
                            node: b,
                            from,
                            to,
                            label,
                        });
                    }
                }
            }
            EntityKey::Binding(..) => {
                let texts = (
                    child_of(previous_scene, old, Shape::Text, 1),
                    child_of(scene, node, Shape::Text, 1),
                );
                let changed = match texts {
                    (Some(a), Some(b)) => {
                        previous_scene.get_attr(a, Attr::Text) != scene.get_attr(b, Attr::Text)
                    }
                    (None, None) => false,
                    _ => true,
                };
                if let (true, Some(text)) = (changed, texts.1) {
                    let color = scene
                        .get_attr(text, Attr::Fill)
                        .and_then(|v| v.as_color())
                        .unwrap_or(palette::VALUE);
                    steps.push(Step::Flash {
                        node: text,
                        color,
                        label,
                    });
                }
            }
            _ => {}
        }
    }

    for (key, &old) in &before {
        if scene.entity(key).is_none() && !handled.contains(key) {
            steps.push(Step::FadeOut {
                ghost_of: old,
                label: format!("{:?}", key),
            });
        }
    }
    Ok(steps)
}
