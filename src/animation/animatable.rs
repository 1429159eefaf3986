//! Animatable proxies
//!
//! An [`AnimatedNode`] stands in for one scene node during a transition. It
//! moves through `Constructed -> Animating -> Destroyed`; `Destroyed` is
//! terminal and every later request resolves at once without effect.

use super::clock::{AnimationClock, SubscriberId};
use super::completion::Completion;
use super::AnimationConfig;
use crate::diagram::geometry::Point;
use crate::error::AnimationError;
use crate::scene::{Attr, AttrValue, NodeId, Rgb};

/// Something that runs a preset animation and can be torn down
pub trait Animatable {
    fn animate(&mut self) -> Completion;

    /// Stop, resolving everything pending. Safe to call more than once.
    fn destroy(&mut self);
}

/// Something that can be moved toward a partial set of properties
pub trait AnimatableTo<P> {
    fn animate_to(&mut self, props: P, config: AnimationConfig) -> Completion;
}

/// Partial set of node properties; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeProps {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub opacity: Option<f64>,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    pub points: Option<Vec<Point>>,
    pub text: Option<String>,
}

impl NodeProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(self, point: Point) -> Self {
        self.x(point.x).y(point.y)
    }

    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn fill(mut self, color: Rgb) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn stroke(mut self, color: Rgb) -> Self {
        self.stroke = Some(color);
        self
    }

    pub fn points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == NodeProps::default()
    }

    pub fn into_attrs(self) -> Vec<(Attr, AttrValue)> {
        let numbers = [
            (Attr::X, self.x),
            (Attr::Y, self.y),
            (Attr::Width, self.width),
            (Attr::Height, self.height),
            (Attr::Opacity, self.opacity),
        ];
        let colors = [(Attr::Fill, self.fill), (Attr::Stroke, self.stroke)];

        let mut attrs: Vec<(Attr, AttrValue)> = numbers
            .into_iter()
            .filter_map(|(attr, v)| v.map(|v| (attr, AttrValue::Number(v))))
            .chain(
                colors
                    .into_iter()
                    .filter_map(|(attr, c)| c.map(|c| (attr, AttrValue::Color(c)))),
            )
            .collect();
        if let Some(points) = self.points {
            attrs.push((Attr::Points, AttrValue::Points(points)));
        }
        if let Some(text) = self.text {
            attrs.push((Attr::Text, AttrValue::Text(text)));
        }
        attrs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Constructed,
    Animating,
    Destroyed,
}

/// Animation proxy for one scene node
#[derive(Debug)]
pub struct AnimatedNode {
    clock: AnimationClock,
    node: Option<NodeId>,
    label: String,
    /// Whether destroying the proxy hides the node
    owns_node: bool,
    subscriber: Option<SubscriberId>,
    state: ProxyState,
    preset: Option<(NodeProps, AnimationConfig)>,
    /// Final state applied by [`AnimatedNode::settle`]
    target: Option<NodeProps>,
}

impl AnimatedNode {
    /// Proxy for a node that outlives the proxy
    pub fn new(clock: AnimationClock, node: Option<NodeId>, label: impl Into<String>) -> Self {
        AnimatedNode {
            clock,
            node,
            label: label.into(),
            owns_node: false,
            subscriber: None,
            state: ProxyState::Constructed,
            preset: None,
            target: None,
        }
    }

    /// Proxy that owns its node, hidden when the proxy is destroyed
    pub fn owned(clock: AnimationClock, node: NodeId, label: impl Into<String>) -> Self {
        AnimatedNode {
            owns_node: true,
            ..AnimatedNode::new(clock, Some(node), label)
        }
    }

    /// Target and timing used by [`Animatable::animate`]
    pub fn with_preset(mut self, props: NodeProps, config: AnimationConfig) -> Self {
        self.preset = Some((props, config));
        self
    }

    /// State the node must end in, even when torn down early
    pub fn with_target(mut self, props: NodeProps) -> Self {
        self.target = Some(props);
        self
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> ProxyState {
        self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ProxyState::Destroyed
    }

    pub fn has_preset(&self) -> bool {
        self.preset.is_some()
    }

    /// Apply properties right away, without animating
    pub fn set(&self, props: NodeProps) -> Result<(), AnimationError> {
        if self.is_destroyed() {
            return Ok(());
        }
        let node = self.drawn_node()?;
        self.clock
            .scene()
            .borrow_mut()
            .set_attrs(node, props.into_attrs());
        Ok(())
    }

    /// Jump straight to the target, if one was given
    pub fn settle(&self) -> Result<(), AnimationError> {
        match &self.target {
            Some(props) => self.set(props.clone()),
            None => Ok(()),
        }
    }

    fn drawn_node(&self) -> Result<NodeId, AnimationError> {
        self.node
            .filter(|&node| self.clock.scene().borrow().contains(node))
            .ok_or_else(|| AnimationError::NodeNotDrawn {
                entity: self.label.clone(),
            })
    }
}

impl AnimatableTo<NodeProps> for AnimatedNode {
    fn animate_to(&mut self, props: NodeProps, config: AnimationConfig) -> Completion {
        if self.is_destroyed() {
            return Completion::resolved();
        }
        let node = match self.drawn_node() {
            Ok(node) => node,
            Err(err) => return Completion::rejected(err),
        };
        let subscriber = match self.subscriber {
            Some(id) => id,
            None => {
                let id = self.clock.subscribe(node);
                self.subscriber = Some(id);
                id
            }
        };
        self.state = ProxyState::Animating;
        self.clock.animate(subscriber, props.into_attrs(), &config)
    }
}

impl Animatable for AnimatedNode {
    fn animate(&mut self) -> Completion {
        match self.preset.clone() {
            Some((props, config)) => self.animate_to(props, config),
            None => Completion::resolved(),
        }
    }

    fn destroy(&mut self) {
        if self.is_destroyed() {
            return;
        }
        if let Some(id) = self.subscriber.take() {
            self.clock.unsubscribe(id);
        }
        if self.owns_node {
            if let Some(node) = self.node {
                self.clock.scene().borrow_mut().set_visible(node, false);
            }
        }
        self.state = ProxyState::Destroyed;
        tracing::trace!(label = %self.label, "proxy destroyed");
    }
}
