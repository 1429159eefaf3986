//! Raw value to visual value conversion
//!
//! Every heap object gets exactly one [`Value`], however many bindings or
//! array units hold it. The memo table is keyed by the allocation id the
//! evaluator assigned, and an entry is recorded *before* the object's
//! elements are visited so self-referencing arrays terminate.

use super::array::{ArrayUnit, ArrayValue, UnitId};
use super::text::Text;
use super::value::{
    ContinuationValue, FnValue, GlobalFnValue, PrimitiveValue, Reference, Value, ValueId,
    ValueKind,
};
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::snapshot::{EnvId, HeapId, RawValue};
use rustc_hash::FxHashMap;

pub struct ValueFactory<'a> {
    config: &'a LayoutConfig,
    /// First definition of every heap object in the snapshot
    definitions: FxHashMap<HeapId, &'a RawValue>,
    memo: FxHashMap<HeapId, ValueId>,
    values: Vec<Value>,
    units: Vec<ArrayUnit>,
}

impl<'a> ValueFactory<'a> {
    /// Collect heap definitions from every value reachable in the snapshot
    pub fn new(roots: impl IntoIterator<Item = &'a RawValue>, config: &'a LayoutConfig) -> Self {
        let mut definitions = FxHashMap::default();
        for root in roots {
            root.walk(&mut |raw| {
                if raw.is_heap_definition() {
                    if let Some(id) = raw.heap_id() {
                        definitions.entry(id).or_insert(raw);
                    }
                }
            });
        }
        ValueFactory {
            config,
            definitions,
            memo: FxHashMap::default(),
            values: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Value for `raw`, recording `holder` as one of its references
    ///
    /// The first holder to reach a heap object becomes its main reference.
    pub fn create(&mut self, raw: &'a RawValue, holder: Reference) -> Result<ValueId, LayoutError> {
        let raw = self.resolve(raw)?;

        if let Some(heap) = raw.heap_id() {
            if let Some(&id) = self.memo.get(&heap) {
                self.values[id.0].add_reference(holder);
                return Ok(id);
            }
        }

        let id = ValueId(self.values.len());
        let mut value = Value::new(self.kind_of(raw), self.config);
        value.add_reference(holder);
        self.values.push(value);

        if let Some(heap) = raw.heap_id() {
            self.memo.insert(heap, id);
        }
        if let RawValue::Array { elements, .. } = raw {
            self.fill_array(id, elements)?;
        }
        Ok(id)
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0]
    }

    pub fn lookup(&self, heap: HeapId) -> Option<ValueId> {
        self.memo.get(&heap).copied()
    }

    /// Hand over the arenas, with each unit's main-reference flag settled
    pub fn finish(mut self) -> (Vec<Value>, Vec<ArrayUnit>, FxHashMap<HeapId, ValueId>) {
        for (i, unit) in self.units.iter_mut().enumerate() {
            unit.is_main_reference =
                self.values[unit.value.0].is_main_reference(Reference::Unit(UnitId(i)));
        }
        (self.values, self.units, self.memo)
    }

    fn resolve(&self, raw: &'a RawValue) -> Result<&'a RawValue, LayoutError> {
        match raw {
            RawValue::Ref { id } => self
                .definitions
                .get(id)
                .copied()
                .ok_or(LayoutError::UnknownHeapRef { id: id.0 }),
            _ => Ok(raw),
        }
    }

    fn kind_of(&self, raw: &RawValue) -> ValueKind {
        let config = self.config;
        match raw {
            RawValue::Array { id, .. } => ValueKind::Array(ArrayValue::new(*id)),
            RawValue::Closure {
                id,
                env,
                params,
                body,
            } => ValueKind::Fn(FnValue {
                heap: *id,
                env: EnvId::new(env.as_str()),
                params: params.clone(),
                body: body.clone(),
                label: Text::new(format!("({}) => {}", params.join(", "), body), config),
            }),
            RawValue::Builtin { id, name } => ValueKind::GlobalFn(GlobalFnValue {
                heap: *id,
                name: Text::new(name.as_str(), config),
            }),
            RawValue::Continuation { id } => {
                ValueKind::Continuation(ContinuationValue { heap: *id })
            }
            RawValue::Unassigned => ValueKind::Unassigned(PrimitiveValue {
                text: Text::new(raw.display_text(), config),
            }),
            // Primitives, and refs already resolved by the caller
            _ => ValueKind::Primitive(PrimitiveValue {
                text: Text::new(raw.display_text(), config),
            }),
        }
    }

    fn fill_array(&mut self, array: ValueId, elements: &'a [RawValue]) -> Result<(), LayoutError> {
        let first = self.units.len();
        // Unit ids must exist before the elements are visited, since nested
        // arrays push their own units. Element ids are patched below.
        for index in 0..elements.len() {
            self.units
                .push(ArrayUnit::new(array, index, array, self.config));
        }

        for (index, element) in elements.iter().enumerate() {
            let unit = UnitId(first + index);
            let value = self.create(element, Reference::Unit(unit))?;
            let content = self.values[value.0].inline_text().cloned();
            let unit = &mut self.units[first + index];
            unit.value = value;
            unit.is_last = index + 1 == elements.len();
            unit.content = content;
        }

        let config = self.config;
        let width = match &mut self.values[array.0].kind {
            ValueKind::Array(value) => {
                value.units = (first..first + elements.len()).map(UnitId).collect();
                value.width(config)
            }
            _ => config.unit_width,
        };
        self.values[array.0].set_size(width, config.unit_height);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::binding::BindingId;

    fn num(value: f64) -> RawValue {
        RawValue::Number { value }
    }

    #[test]
    fn test_shared_array_is_created_once() {
        let config = LayoutConfig::default();
        let array = RawValue::Array {
            id: HeapId(7),
            elements: vec![num(1.0), num(2.0)],
        };
        let alias = RawValue::Ref { id: HeapId(7) };
        let mut factory = ValueFactory::new([&array, &alias], &config);

        let a = factory
            .create(&array, Reference::Binding(BindingId(0)))
            .unwrap();
        let b = factory
            .create(&alias, Reference::Binding(BindingId(1)))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(
            factory.value(a).main_reference(),
            Some(Reference::Binding(BindingId(0)))
        );
        assert_eq!(factory.value(a).references.len(), 2);

        let (values, units, memo) = factory.finish();
        assert_eq!(units.len(), 2);
        assert!(units[1].is_last);
        assert_eq!(units[0].content.as_ref().unwrap().content, "1");
        assert_eq!(memo.get(&HeapId(7)), Some(&a));
        assert_eq!(values[a.0].width(), 2.0 * config.unit_width);
    }

    #[test]
    fn test_self_referencing_array_terminates() {
        let config = LayoutConfig::default();
        let array = RawValue::Array {
            id: HeapId(1),
            elements: vec![num(0.0), RawValue::Ref { id: HeapId(1) }],
        };
        let mut factory = ValueFactory::new([&array], &config);
        let id = factory
            .create(&array, Reference::Binding(BindingId(0)))
            .unwrap();
        let (values, units, _) = factory.finish();
        assert_eq!(units[1].value, id);
        assert!(!units[1].is_main_reference);
        assert_eq!(
            values[id.0].main_reference(),
            Some(Reference::Binding(BindingId(0)))
        );
    }

    #[test]
    fn test_unknown_ref_is_an_error() {
        let config = LayoutConfig::default();
        let dangling = RawValue::Ref { id: HeapId(99) };
        let mut factory = ValueFactory::new([&dangling], &config);
        assert_eq!(
            factory.create(&dangling, Reference::Binding(BindingId(0))),
            Err(LayoutError::UnknownHeapRef { id: 99 })
        );
    }

    #[test]
    fn test_primitives_are_never_shared() {
        let config = LayoutConfig::default();
        let one = num(1.0);
        let mut factory = ValueFactory::new([&one], &config);
        let a = factory.create(&one, Reference::Binding(BindingId(0))).unwrap();
        let b = factory.create(&one, Reference::Binding(BindingId(1))).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_array_has_placeholder_width() {
        let config = LayoutConfig::default();
        let empty = RawValue::Array {
            id: HeapId(3),
            elements: Vec::new(),
        };
        let mut factory = ValueFactory::new([&empty], &config);
        let id = factory.create(&empty, Reference::Binding(BindingId(0))).unwrap();
        assert_eq!(factory.value(id).width(), config.unit_width);
        assert!(factory.value(id).as_array().unwrap().is_empty());
    }
}
