// Integration tests for the layout engine

use envtty::config::LayoutConfig;
use envtty::diagram::Diagram;
use envtty::error::LayoutError;
use envtty::layout::array_level::ArrayLevel;
use envtty::layout::{ArrowKey, Layout};
use envtty::snapshot::{EnvId, EnvNode, HeapId, RawValue, Snapshot};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn num(value: f64) -> RawValue {
    RawValue::Number { value }
}

fn array(id: u64, elements: Vec<RawValue>) -> RawValue {
    RawValue::Array {
        id: HeapId(id),
        elements,
    }
}

fn frame_x(layout: &Layout, env: &str) -> f64 {
    let diagram = layout.diagram();
    let id = diagram
        .frame_for(&EnvId::new(env))
        .expect("frame exists");
    diagram.frame(id).x()
}

#[test]
fn test_sibling_frames_pack_after_widest_column() {
    // Titles are the only thing giving these frames width
    let config = LayoutConfig {
        char_width: 1.0,
        frame_padding_x: 0.0,
        frame_min_width: 0.0,
        frame_margin_x: 30.0,
        max_text_chars: 200,
        ..LayoutConfig::bare()
    };
    let snapshot = Snapshot::new(vec![
        EnvNode::new("0", &"p".repeat(80), None),
        EnvNode::new("1", &"a".repeat(100), Some("0")),
        EnvNode::new("2", &"b".repeat(140), Some("0")),
    ]);

    let layout = Layout::compute(&snapshot, &config).unwrap();

    assert_eq!(frame_x(&layout, "0"), 0.0);
    assert_eq!(frame_x(&layout, "1"), 0.0);
    assert_eq!(frame_x(&layout, "2"), 130.0);
    assert_eq!(layout.cum_widths(), &[0.0, 130.0, 300.0]);
}

#[test]
fn test_colliding_array_moves_to_next_lane() {
    let mut level = ArrayLevel::new(0);
    assert_eq!(level.claim(0.0, 120.0, 0, 0.0), 0);
    assert_eq!(level.claim(50.0, 80.0, 0, 0.0), 1);
    assert_eq!(level.intervals(0), &[(0.0, 120.0)]);
    assert_eq!(level.intervals(1), &[(50.0, 130.0)]);

    // Clear of the first array, so lane 0 still has room
    assert_eq!(level.claim(200.0, 80.0, 0, 0.0), 0);
}

#[test]
fn test_arrays_of_sibling_bindings_stack_into_lanes() {
    let config = LayoutConfig::bare();
    let snapshot = Snapshot::new(vec![EnvNode::new("0", "global", None)
        .bind("a", array(1, vec![num(1.0), num(2.0), num(3.0)]))
        .bind("b", array(2, vec![num(4.0), num(5.0)]))]);

    let layout = Layout::compute(&snapshot, &config).unwrap();
    let diagram = layout.diagram();
    let a = diagram.value(diagram.value_for_heap(HeapId(1)).unwrap());
    let b = diagram.value(diagram.value_for_heap(HeapId(2)).unwrap());

    // Both bindings start at the same x, so the arrays cannot share a lane
    assert_eq!(a.lane, Some(0));
    assert_eq!(b.lane, Some(1));
    assert!(b.y() > a.y());
}

#[test]
fn test_lookup_from_nested_frame_reaches_global() {
    let config = LayoutConfig::bare();
    let snapshot = Snapshot::new(vec![
        EnvNode::new("0", "global", None).bind("answer", num(42.0)),
        EnvNode::new("1", "program", Some("0")).bind("x", num(1.0)),
        EnvNode::new("2", "f", Some("1")).bind("y", num(2.0)),
        EnvNode::new("3", "g", Some("2")),
        EnvNode::new("4", "h", Some("3")).bind("x", num(3.0)),
    ]);
    let diagram = Diagram::build(&snapshot, &config).unwrap();
    let deepest = diagram.frame_for(&EnvId::new("4")).unwrap();
    let global = diagram.frame_for(&EnvId::new("0")).unwrap();

    let binding = diagram.lookup_binding(deepest, "answer").unwrap();
    assert_eq!(diagram.binding(binding).frame, global);

    // The nearest binding shadows outer ones
    let x = diagram.lookup_binding(deepest, "x").unwrap();
    assert_eq!(diagram.binding(x).frame, deepest);

    let err = diagram.lookup_binding(deepest, "missing").unwrap_err();
    assert_eq!(
        err,
        LayoutError::MissingBinding {
            name: "missing".to_string(),
            chain: ["h", "g", "f", "program", "global"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    );
}

#[test]
fn test_shared_array_is_drawn_once() {
    let config = LayoutConfig::bare();
    let snapshot = Snapshot::new(vec![
        EnvNode::new("0", "global", None).bind("xs", array(7, vec![num(1.0)])),
        EnvNode::new("1", "f", Some("0")).bind("ys", RawValue::Ref { id: HeapId(7) }),
    ]);

    let layout = Layout::compute(&snapshot, &config).unwrap();
    let diagram = layout.diagram();
    let arrays = diagram
        .values()
        .iter()
        .filter(|v| v.as_array().is_some())
        .count();
    assert_eq!(arrays, 1);
    let value = diagram.value(diagram.value_for_heap(HeapId(7)).unwrap());
    assert_eq!(value.references.len(), 2);
    // One arrow per binding pointing at the array
    let binding_arrows = layout
        .arrows()
        .iter()
        .filter(|a| matches!(a.key, ArrowKey::Binding(..)))
        .count();
    assert_eq!(binding_arrows, 2);
    assert!(layout.arrows().iter().all(|a| a.is_orthogonal()));
}

#[test]
fn test_unknown_heap_ref_is_an_error() {
    let snapshot = Snapshot::new(vec![
        EnvNode::new("0", "global", None).bind("xs", RawValue::Ref { id: HeapId(99) })
    ]);
    let err = Layout::compute(&snapshot, &LayoutConfig::bare()).unwrap_err();
    assert_eq!(err, LayoutError::UnknownHeapRef { id: 99 });
}

#[test]
fn test_layout_is_deterministic() {
    let snapshot = Snapshot::new(vec![
        EnvNode::new("0", "global", None).bind("xs", array(1, vec![num(1.0), num(2.0)])),
        EnvNode::new("1", "program", Some("0")).bind(
            "f",
            RawValue::Closure {
                id: HeapId(2),
                env: "1".to_string(),
                params: vec!["n".to_string()],
                body: "n * 2".to_string(),
            },
        ),
        EnvNode::new("2", "f", Some("1")).bind("n", num(3.0)),
    ]);
    let config = LayoutConfig::default();

    let first = Layout::compute(&snapshot, &config).unwrap();
    let second = Layout::compute(&snapshot, &config).unwrap();

    let frames = |l: &Layout| -> Vec<(f64, f64, f64, f64)> {
        l.diagram()
            .frames()
            .iter()
            .map(|f| (f.x(), f.y(), f.width(), f.height()))
            .collect()
    };
    let values = |l: &Layout| -> Vec<(f64, f64)> {
        l.diagram().values().iter().map(|v| (v.x(), v.y())).collect()
    };
    let arrows = |l: &Layout| -> Vec<Vec<(f64, f64)>> {
        l.arrows()
            .iter()
            .map(|a| a.points.iter().map(|p| (p.x, p.y)).collect())
            .collect()
    };
    assert_eq!(frames(&first), frames(&second));
    assert_eq!(values(&first), values(&second));
    assert_eq!(arrows(&first), arrows(&second));
    assert_eq!(first.cum_widths(), second.cum_widths());
    assert_eq!(first.cum_heights(), second.cum_heights());
}

/// A random environment tree: node `i` hangs below an earlier node
fn arb_snapshot() -> impl Strategy<Value = Snapshot> {
    prop::collection::vec((any::<prop::sample::Index>(), 1usize..20, 0usize..3, 0usize..4), 1..12)
        .prop_map(|nodes| {
            let mut heap = 0;
            let environments = nodes
                .iter()
                .enumerate()
                .map(|(i, (parent, name_len, primitives, array_len))| {
                    let parent = (i > 0).then(|| parent.index(i).to_string());
                    let mut node =
                        EnvNode::new(&i.to_string(), &"n".repeat(*name_len), parent.as_deref());
                    for k in 0..*primitives {
                        node = node.bind(&format!("v{}", k), num(k as f64));
                    }
                    if *array_len > 0 {
                        heap += 1;
                        let elements = (0..*array_len).map(|e| num(e as f64)).collect();
                        node = node.bind("xs", array(heap, elements));
                    }
                    node
                })
                .collect();
            Snapshot::new(environments)
        })
}

proptest! {
    #[test]
    fn prop_frames_in_a_row_never_overlap(snapshot in arb_snapshot()) {
        let layout = Layout::compute(&snapshot, &LayoutConfig::default()).unwrap();
        let diagram = layout.diagram();
        for level in &layout.grid().frame_levels {
            for pair in level.frames.windows(2) {
                let left = diagram.frame(pair[0]).extent();
                let right = diagram.frame(pair[1]).extent();
                prop_assert!(left.right() <= right.x, "{:?} overlaps {:?}", left, right);
            }
        }
    }

    #[test]
    fn prop_child_never_left_of_parent(snapshot in arb_snapshot()) {
        let layout = Layout::compute(&snapshot, &LayoutConfig::default()).unwrap();
        let diagram = layout.diagram();
        for frame in diagram.frames() {
            if let Some(parent) = frame.parent {
                let parent = diagram.frame(parent);
                prop_assert!(frame.x_coord >= parent.x_coord);
                prop_assert!(frame.x() >= parent.x());
            }
        }
    }

    #[test]
    fn prop_arrays_in_a_lane_never_overlap(snapshot in arb_snapshot()) {
        let layout = Layout::compute(&snapshot, &LayoutConfig::default()).unwrap();
        for level in &layout.grid().array_levels {
            for lane in 0..level.lane_count() {
                for pair in level.intervals(lane).windows(2) {
                    prop_assert!(pair[0].1 <= pair[1].0, "{:?} overlaps {:?}", pair[0], pair[1]);
                }
            }
        }
    }
}
