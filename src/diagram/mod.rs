//! Visual entities of one machine snapshot
//!
//! A [`Diagram`] is an arena holding every frame, binding, value and array
//! unit of a snapshot. Entities refer to each other by index
//! ([`FrameId`], [`BindingId`], [`ValueId`], [`UnitId`]), so parent links and
//! value back-references never own anything and a whole diagram is dropped in
//! one go when the next snapshot is laid out.
//!
//! # Modules
//!
//! - [`frame`], [`binding`], [`value`], [`array`]: the entities
//! - [`factory`]: raw value conversion with heap memoization
//! - [`geometry`], [`text`]: boxes, points and measured labels
//!
//! Building a diagram sizes every entity; positions are assigned afterwards by
//! [`crate::layout`].

pub mod array;
pub mod binding;
pub mod factory;
pub mod frame;
pub mod geometry;
pub mod text;
pub mod value;

pub use array::{ArrayUnit, ArrayValue, UnitId};
pub use binding::{Binding, BindingId};
pub use factory::ValueFactory;
pub use frame::{Frame, FrameId};
pub use geometry::{Point, Rect};
pub use text::Text;
pub use value::{Placement, Reference, Value, ValueId, ValueKind};

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::snapshot::{ControlItem, EnvId, EnvTree, HeapId, Snapshot};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct Diagram {
    tree: EnvTree,
    /// Frame `i` belongs to environment `i` of the tree
    pub(crate) frames: Vec<Frame>,
    pub(crate) bindings: Vec<Binding>,
    pub(crate) values: Vec<Value>,
    pub(crate) units: Vec<ArrayUnit>,
    heap_index: FxHashMap<HeapId, ValueId>,
    /// Frame indices sorted by environment creation order
    creation_order: Vec<FrameId>,
    current: Option<FrameId>,
}

impl Diagram {
    /// Convert a snapshot into sized, unpositioned entities
    pub fn build(snapshot: &Snapshot, config: &LayoutConfig) -> Result<Self, LayoutError> {
        let tree = EnvTree::new(snapshot.environments.clone())?;

        let mut creation_order: Vec<FrameId> = (0..tree.len()).map(FrameId).collect();
        creation_order.sort_by(|a, b| tree.node(a.0).id.cmp(&tree.node(b.0).id));

        let mut frames: Vec<Frame> = tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| {
                Frame::new(
                    node.id.clone(),
                    node.label(),
                    tree.parent(i).map(FrameId),
                    tree.depth(i),
                    config,
                )
            })
            .collect();
        for (i, frame) in frames.iter_mut().enumerate() {
            frame.children = tree.children(i).iter().copied().map(FrameId).collect();
        }

        // Heap objects may be defined on the stash or the control and only
        // referenced from a binding
        let roots = tree
            .nodes()
            .iter()
            .flat_map(|node| node.bindings.iter().map(|b| &b.value))
            .chain(snapshot.stash.iter().map(|item| &item.value))
            .chain(snapshot.control.iter().filter_map(|item| match item {
                ControlItem::Literal { value } => Some(value),
                _ => None,
            }));
        let mut factory = ValueFactory::new(roots, config);

        // Main references follow environment creation order
        let mut bindings = Vec::new();
        for &frame_id in &creation_order {
            for raw in &tree.node(frame_id.0).bindings {
                let id = BindingId(bindings.len());
                let value = factory.create(&raw.value, Reference::Binding(id))?;
                let inline = factory.value(value).inline_text().cloned();
                bindings.push(Binding::new(frame_id, &raw.name, value, inline, config));
                frames[frame_id.0].bindings.push(id);
            }
        }
        let (values, units, heap_index) = factory.finish();

        for value in &values {
            if let ValueKind::Fn(f) = &value.kind {
                if tree.index_of(&f.env).is_none() {
                    return Err(LayoutError::UnknownEnvironment {
                        env: f.env.to_string(),
                    });
                }
            }
        }

        for frame in &mut frames {
            let ids = frame.bindings.clone();
            frame.fit(ids.iter().map(|b| &bindings[b.0]), config);
        }

        let current = match &snapshot.current_env {
            Some(env) => Some(FrameId(tree.index_of(env).ok_or_else(|| {
                LayoutError::UnknownEnvironment {
                    env: env.to_string(),
                }
            })?)),
            None => None,
        };
        if let Some(id) = current {
            frames[id.0].is_current = true;
        }

        tracing::debug!(
            frames = frames.len(),
            bindings = bindings.len(),
            values = values.len(),
            units = units.len(),
            "built diagram"
        );

        Ok(Diagram {
            tree,
            frames,
            bindings,
            values,
            units,
            heap_index,
            creation_order,
            current,
        })
    }

    /// Find `name` in `frame` or the closest enclosing frame that binds it
    pub fn lookup_binding(&self, frame: FrameId, name: &str) -> Result<BindingId, LayoutError> {
        let mut chain = Vec::new();
        let mut cursor = Some(frame);
        while let Some(id) = cursor {
            let frame = &self.frames[id.0];
            chain.push(frame.name.full.clone());
            if let Some(&binding) = frame
                .bindings
                .iter()
                .find(|b| self.bindings[b.0].name == name)
            {
                return Ok(binding);
            }
            // The tree was validated acyclic, so this walk ends at a root
            cursor = frame.parent;
        }
        Err(LayoutError::MissingBinding {
            name: name.to_string(),
            chain,
        })
    }

    pub fn tree(&self) -> &EnvTree {
        &self.tree
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> &Frame {
        &self.frames[id.0]
    }

    pub fn frame_for(&self, env: &EnvId) -> Option<FrameId> {
        self.tree.index_of(env).map(FrameId)
    }

    pub fn creation_order(&self) -> &[FrameId] {
        &self.creation_order
    }

    /// Frame the machine is evaluating in, if the snapshot says
    pub fn current_frame(&self) -> Option<FrameId> {
        self.current
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    /// The single visual instance of a heap object
    pub fn value_for_heap(&self, heap: HeapId) -> Option<ValueId> {
        self.heap_index.get(&heap).copied()
    }

    pub fn units(&self) -> &[ArrayUnit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> &ArrayUnit {
        &self.units[id.0]
    }

    /// Frame holding a reference, directly or through enclosing arrays
    pub fn owning_frame(&self, reference: Reference) -> Option<FrameId> {
        let mut reference = reference;
        // Bounded by the unit count; a cycle of arrays has no owning frame
        for _ in 0..=self.units.len() {
            match reference {
                Reference::Binding(id) => return Some(self.bindings[id.0].frame),
                Reference::Unit(id) => {
                    let array = self.units[id.0].array;
                    reference = self.values[array.0].main_reference()?;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{EnvNode, RawValue};

    fn num(value: f64) -> RawValue {
        RawValue::Number { value }
    }

    fn chain_snapshot() -> Snapshot {
        Snapshot::new(vec![
            EnvNode::new("0", "global", None).bind("x", num(1.0)),
            EnvNode::new("1", "program", Some("0")),
            EnvNode::new("2", "f", Some("1")).bind("n", num(3.0)),
            EnvNode::new("3", "g", Some("2")),
        ])
    }

    #[test]
    fn test_lookup_walks_to_global() {
        let config = LayoutConfig::default();
        let diagram = Diagram::build(&chain_snapshot(), &config).unwrap();
        let innermost = diagram.frame_for(&EnvId::new("3")).unwrap();
        let binding = diagram.lookup_binding(innermost, "x").unwrap();
        assert_eq!(diagram.binding(binding).name, "x");
        assert_eq!(
            diagram.binding(binding).frame,
            diagram.frame_for(&EnvId::new("0")).unwrap()
        );
    }

    #[test]
    fn test_missing_binding_reports_chain() {
        let config = LayoutConfig::default();
        let diagram = Diagram::build(&chain_snapshot(), &config).unwrap();
        let innermost = diagram.frame_for(&EnvId::new("3")).unwrap();
        let err = diagram.lookup_binding(innermost, "y").unwrap_err();
        assert_eq!(
            err,
            LayoutError::MissingBinding {
                name: "y".to_string(),
                chain: vec![
                    "g".to_string(),
                    "f".to_string(),
                    "program".to_string(),
                    "global".to_string()
                ],
            }
        );
    }

    #[test]
    fn test_closure_with_unknown_env_is_rejected() {
        let config = LayoutConfig::default();
        let snapshot = Snapshot::new(vec![EnvNode::new("0", "global", None).bind(
            "f",
            RawValue::Closure {
                id: HeapId(1),
                env: "42".to_string(),
                params: Vec::new(),
                body: String::new(),
            },
        )]);
        assert_eq!(
            Diagram::build(&snapshot, &config).unwrap_err(),
            LayoutError::UnknownEnvironment {
                env: "42".to_string()
            }
        );
    }

    #[test]
    fn test_owning_frame_through_nested_arrays() {
        let config = LayoutConfig::default();
        let snapshot = Snapshot::new(vec![EnvNode::new("0", "global", None).bind(
            "xs",
            RawValue::Array {
                id: HeapId(1),
                elements: vec![RawValue::Array {
                    id: HeapId(2),
                    elements: vec![num(5.0)],
                }],
            },
        )]);
        let diagram = Diagram::build(&snapshot, &config).unwrap();
        let inner = diagram.value_for_heap(HeapId(2)).unwrap();
        let main = diagram.value(inner).main_reference().unwrap();
        assert!(matches!(main, Reference::Unit(_)));
        assert_eq!(diagram.owning_frame(main), Some(FrameId(0)));
    }

    #[test]
    fn test_current_frame_is_marked() {
        let config = LayoutConfig::default();
        let mut snapshot = chain_snapshot();
        snapshot.current_env = Some(EnvId::new("2"));
        let diagram = Diagram::build(&snapshot, &config).unwrap();
        let current = diagram.current_frame().unwrap();
        assert!(diagram.frame(current).is_current);
        assert_eq!(diagram.frame(current).name.full, "f");
    }
}
