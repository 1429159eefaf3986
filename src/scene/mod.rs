//! Scene graph the diagram is drawn into
//!
//! The scene is the drawing surface every visual entity renders to: a tree
//! of shapes with numeric, color, point and text attributes. It knows nothing
//! about frames or values; the terminal viewer walks it to paint cells and
//! the animation clock reads and writes its attributes.
//!
//! # Structure
//!
//! - One group per [`Layer`] under the root, painted in declaration order
//! - Child positions are relative to their parent group
//! - Invisible nodes hide their whole subtree
//! - [`EntityKey`]s index the nodes of laid-out entities so two scenes of
//!   consecutive snapshots can be compared

pub mod color;
pub mod draw;

pub use color::{palette, Rgb};

use crate::diagram::geometry::Point;
use crate::layout::ArrowKey;
use crate::snapshot::{EnvId, HeapId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Group,
    Rect,
    Text,
    Circle,
    /// Polyline through the `Points` attribute, with an arrowhead at the end
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attr {
    X,
    Y,
    Width,
    Height,
    Radius,
    Opacity,
    Fill,
    Stroke,
    Points,
    Text,
}

impl Attr {
    pub fn is_color(self) -> bool {
        matches!(self, Attr::Fill | Attr::Stroke)
    }

    pub fn is_numeric(self) -> bool {
        !self.is_color() && !matches!(self, Attr::Points | Attr::Text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Number(f64),
    Color(Rgb),
    Points(Vec<Point>),
    Text(String),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Rgb> {
        match self {
            AttrValue::Color(c) => Some(*c),
            _ => None,
        }
    }
}

/// Attribute storage of one node
#[derive(Debug, Clone, PartialEq)]
pub struct Attrs {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub radius: f64,
    pub opacity: f64,
    pub fill: Option<Rgb>,
    pub stroke: Option<Rgb>,
    pub points: Vec<Point>,
    pub text: String,
}

impl Default for Attrs {
    fn default() -> Self {
        Attrs {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            radius: 0.0,
            opacity: 1.0,
            fill: None,
            stroke: None,
            points: Vec::new(),
            text: String::new(),
        }
    }
}

impl Attrs {
    pub fn get(&self, attr: Attr) -> Option<AttrValue> {
        Some(match attr {
            Attr::X => AttrValue::Number(self.x),
            Attr::Y => AttrValue::Number(self.y),
            Attr::Width => AttrValue::Number(self.width),
            Attr::Height => AttrValue::Number(self.height),
            Attr::Radius => AttrValue::Number(self.radius),
            Attr::Opacity => AttrValue::Number(self.opacity),
            Attr::Fill => AttrValue::Color(self.fill?),
            Attr::Stroke => AttrValue::Color(self.stroke?),
            Attr::Points => AttrValue::Points(self.points.clone()),
            Attr::Text => AttrValue::Text(self.text.clone()),
        })
    }

    /// Store a value; a value of the wrong type is ignored
    pub fn set(&mut self, attr: Attr, value: AttrValue) -> bool {
        match (attr, value) {
            (Attr::X, AttrValue::Number(n)) => self.x = n,
            (Attr::Y, AttrValue::Number(n)) => self.y = n,
            (Attr::Width, AttrValue::Number(n)) => self.width = n,
            (Attr::Height, AttrValue::Number(n)) => self.height = n,
            (Attr::Radius, AttrValue::Number(n)) => self.radius = n,
            (Attr::Opacity, AttrValue::Number(n)) => self.opacity = n.clamp(0.0, 1.0),
            (Attr::Fill, AttrValue::Color(c)) => self.fill = Some(c),
            (Attr::Stroke, AttrValue::Color(c)) => self.stroke = Some(c),
            (Attr::Points, AttrValue::Points(p)) => self.points = p,
            (Attr::Text, AttrValue::Text(t)) => self.text = t,
            _ => return false,
        }
        true
    }
}

/// Paint order of the top-level groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Frames,
    Values,
    Arrows,
    Control,
    Stash,
    /// Temporary copies used by transitions
    Overlay,
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Frames,
        Layer::Values,
        Layer::Arrows,
        Layer::Control,
        Layer::Stash,
        Layer::Overlay,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Stable identity of a drawn entity across snapshots
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Frame(EnvId),
    Binding(EnvId, String),
    Value(HeapId),
    Arrow(ArrowKey),
    /// Control item by position from the bottom of the stack
    Control(usize),
    /// Stash item by position from the bottom of the stack
    Stash(usize),
}

#[derive(Debug, Clone)]
struct SceneNode {
    shape: Shape,
    attrs: Attrs,
    visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    layers: Vec<NodeId>,
    entities: BTreeMap<EntityKey, NodeId>,
}

impl Default for Scene {
    fn default() -> Self {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut scene = Scene {
            nodes: Vec::new(),
            layers: Vec::new(),
            entities: BTreeMap::new(),
        };
        let root = scene.push(Shape::Group, None);
        for _ in Layer::ALL {
            let layer = scene.push(Shape::Group, Some(root));
            scene.layers.push(layer);
        }
        scene
    }

    fn push(&mut self, shape: Shape, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SceneNode {
            shape,
            attrs: Attrs::default(),
            visible: true,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn layer(&self, layer: Layer) -> NodeId {
        self.layers[layer.index()]
    }

    /// Create a node under `parent`
    pub fn add(
        &mut self,
        parent: NodeId,
        shape: Shape,
        attrs: impl IntoIterator<Item = (Attr, AttrValue)>,
    ) -> NodeId {
        let id = self.push(shape, Some(parent));
        for (attr, value) in attrs {
            self.nodes[id.0].attrs.set(attr, value);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1 + Layer::ALL.len()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        node.0 < self.nodes.len()
    }

    pub fn shape(&self, node: NodeId) -> Shape {
        self.nodes[node.0].shape
    }

    pub fn attrs(&self, node: NodeId) -> &Attrs {
        &self.nodes[node.0].attrs
    }

    pub fn get_attr(&self, node: NodeId, attr: Attr) -> Option<AttrValue> {
        self.nodes.get(node.0)?.attrs.get(attr)
    }

    /// Numeric attribute, zero when unset or not numeric
    pub fn number(&self, node: NodeId, attr: Attr) -> f64 {
        self.get_attr(node, attr)
            .and_then(|v| v.as_number())
            .unwrap_or(0.0)
    }

    pub fn set_attr(&mut self, node: NodeId, attr: Attr, value: AttrValue) {
        self.set_attrs(node, [(attr, value)]);
    }

    /// Apply several attributes at once
    pub fn set_attrs(&mut self, node: NodeId, attrs: impl IntoIterator<Item = (Attr, AttrValue)>) {
        let Some(target) = self.nodes.get_mut(node.0) else {
            tracing::warn!(?node, "set_attrs on a node of another scene");
            return;
        };
        for (attr, value) in attrs {
            if !target.attrs.set(attr, value) {
                tracing::warn!(?node, ?attr, "attribute value of the wrong type ignored");
            }
        }
    }

    pub fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(target) = self.nodes.get_mut(node.0) {
            target.visible = visible;
        }
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(node.0).is_some_and(|n| n.visible)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Position of a node in canvas pixels
    pub fn absolute_position(&self, node: NodeId) -> Point {
        let mut point = Point::default();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let attrs = &self.nodes[id.0].attrs;
            point.x += attrs.x;
            point.y += attrs.y;
            cursor = self.nodes[id.0].parent;
        }
        point
    }

    pub fn register(&mut self, key: EntityKey, node: NodeId) {
        self.entities.insert(key, node);
    }

    pub fn entity(&self, key: &EntityKey) -> Option<NodeId> {
        self.entities.get(key).copied()
    }

    /// Every registered entity, in key order
    pub fn entities(&self) -> impl Iterator<Item = (&EntityKey, NodeId)> + '_ {
        self.entities.iter().map(|(k, &v)| (k, v))
    }

    /// Deep copy a subtree of `other` under `parent`, at the same canvas
    /// position it had there
    pub fn adopt(&mut self, other: &Scene, node: NodeId, parent: NodeId) -> NodeId {
        let origin = self.absolute_position(parent);
        let at = other.absolute_position(node);
        let copy = self.copy_subtree(other, node, parent);
        let attrs = &mut self.nodes[copy.0].attrs;
        attrs.x = at.x - origin.x;
        attrs.y = at.y - origin.y;
        copy
    }

    fn copy_subtree(&mut self, other: &Scene, node: NodeId, parent: NodeId) -> NodeId {
        let source = &other.nodes[node.0];
        let copy = self.push(source.shape, Some(parent));
        self.nodes[copy.0].attrs = source.attrs.clone();
        self.nodes[copy.0].visible = source.visible;
        for &child in &source.children {
            self.copy_subtree(other, child, copy);
        }
        copy
    }

    /// Visit visible nodes in paint order with their canvas origin and
    /// effective opacity
    pub fn visit(&self, mut f: impl FnMut(NodeId, Shape, &Attrs, Point, f64)) {
        let mut stack = vec![(self.root(), Point::default(), 1.0)];
        while let Some((id, parent_origin, parent_opacity)) = stack.pop() {
            let node = &self.nodes[id.0];
            if !node.visible {
                continue;
            }
            let origin = Point::new(parent_origin.x + node.attrs.x, parent_origin.y + node.attrs.y);
            let opacity = parent_opacity * node.attrs.opacity;
            f(id, node.shape, &node.attrs, origin, opacity);
            for &child in node.children.iter().rev() {
                stack.push((child, origin, opacity));
            }
        }
    }
}
