//! Drawing laid-out entities into a scene
//!
//! Every entity remembers the node it was drawn as, so drawing twice is a
//! no-op and returns the same node. Top-level nodes are registered under
//! their [`EntityKey`].

use super::color::palette;
use super::{Attr, AttrValue, EntityKey, Layer, NodeId, Scene, Shape};
use crate::config::LayoutConfig;
use crate::diagram::{Diagram, FrameId, ValueId, ValueKind};
use crate::layout::{Arrow, ControlBox, Layout, StashBox};

fn num(attr: Attr, value: f64) -> (Attr, AttrValue) {
    (attr, AttrValue::Number(value))
}

fn text(value: &str) -> (Attr, AttrValue) {
    (Attr::Text, AttrValue::Text(value.to_string()))
}

fn fill(color: super::Rgb) -> (Attr, AttrValue) {
    (Attr::Fill, AttrValue::Color(color))
}

fn stroke(color: super::Rgb) -> (Attr, AttrValue) {
    (Attr::Stroke, AttrValue::Color(color))
}

impl Layout {
    /// Draw every entity; returns how many nodes were created by this call
    pub fn draw(&mut self, scene: &mut Scene) -> usize {
        let before = scene.len();
        let (config, diagram, machine, arrows) = self.parts_mut();

        let frames: Vec<FrameId> = diagram.creation_order().to_vec();
        for id in frames {
            draw_frame(diagram, id, scene);
        }
        for i in 0..diagram.bindings.len() {
            draw_binding(diagram, i, scene, config);
        }
        for i in 0..diagram.values.len() {
            draw_value(diagram, ValueId(i), scene, config);
        }
        for arrow in arrows.iter_mut() {
            draw_arrow(arrow, scene);
        }
        for item in machine.control.iter_mut() {
            draw_control(item, scene, config);
        }
        for item in machine.stash.iter_mut() {
            draw_stash(item, scene, config);
        }

        let created = scene.len() - before;
        tracing::trace!(created, "layout drawn");
        created
    }
}

pub fn draw_frame(diagram: &mut Diagram, id: FrameId, scene: &mut Scene) -> NodeId {
    let frame = &mut diagram.frames[id.0];
    if let Some(node) = frame.node {
        return node;
    }
    let color = if frame.is_current {
        palette::CURRENT_FRAME
    } else {
        palette::FRAME
    };
    let group = scene.add(
        scene.layer(Layer::Frames),
        Shape::Group,
        [num(Attr::X, frame.x()), num(Attr::Y, frame.title_y())],
    );
    scene.add(group, Shape::Text, [text(&frame.name.content), fill(color)]);
    scene.add(
        group,
        Shape::Rect,
        [
            num(Attr::Y, frame.name.height),
            num(Attr::Width, frame.width()),
            num(Attr::Height, frame.height()),
            stroke(color),
        ],
    );
    frame.node = Some(group);
    scene.register(EntityKey::Frame(frame.env.clone()), group);
    group
}

pub fn draw_binding(
    diagram: &mut Diagram,
    index: usize,
    scene: &mut Scene,
    config: &LayoutConfig,
) -> NodeId {
    let env = diagram.frames[diagram.bindings[index].frame.0].env.clone();
    let binding = &mut diagram.bindings[index];
    if let Some(node) = binding.node {
        return node;
    }
    let group = scene.add(
        scene.layer(Layer::Frames),
        Shape::Group,
        [num(Attr::X, binding.x()), num(Attr::Y, binding.y())],
    );
    scene.add(
        group,
        Shape::Text,
        [text(&binding.key.content), fill(palette::FOREGROUND)],
    );
    let value_x = binding.key.width + config.char_width;
    match &binding.inline {
        Some(inline) => {
            scene.add(
                group,
                Shape::Text,
                [
                    num(Attr::X, value_x),
                    text(&inline.content),
                    fill(palette::VALUE),
                ],
            );
        }
        None => {
            scene.add(
                group,
                Shape::Circle,
                [
                    num(Attr::X, value_x),
                    num(Attr::Y, binding.height() / 2.0),
                    num(Attr::Radius, 1.0),
                    fill(palette::ARROW),
                ],
            );
        }
    }
    binding.node = Some(group);
    scene.register(EntityKey::Binding(env, binding.name.clone()), group);
    group
}

/// Heap values only; primitives are drawn by whoever holds them
pub fn draw_value(
    diagram: &mut Diagram,
    id: ValueId,
    scene: &mut Scene,
    config: &LayoutConfig,
) -> Option<NodeId> {
    let value = &diagram.values[id.0];
    if let Some(node) = value.node {
        return Some(node);
    }
    let heap = value.heap_id()?;
    if !value.is_placed() {
        return None;
    }
    let group = scene.add(
        scene.layer(Layer::Values),
        Shape::Group,
        [num(Attr::X, value.x()), num(Attr::Y, value.y())],
    );
    let r = config.fn_radius;
    match &value.kind {
        ValueKind::Array(array) => {
            if array.is_empty() {
                scene.add(
                    group,
                    Shape::Rect,
                    [
                        num(Attr::Width, config.unit_width),
                        num(Attr::Height, config.unit_height),
                        stroke(palette::MUTED),
                    ],
                );
            }
            for unit_id in &array.units {
                let unit = &mut diagram.units[unit_id.0];
                let cell = scene.add(
                    group,
                    Shape::Group,
                    [num(Attr::X, unit.x() - value.x())],
                );
                scene.add(
                    cell,
                    Shape::Rect,
                    [
                        num(Attr::Width, unit.width()),
                        num(Attr::Height, unit.height()),
                        stroke(palette::VALUE),
                    ],
                );
                scene.add(
                    cell,
                    Shape::Text,
                    [
                        num(Attr::Y, -config.line_height),
                        text(&unit.index.to_string()),
                        fill(palette::MUTED),
                    ],
                );
                let middle = (unit.height() - config.line_height) / 2.0;
                match &unit.content {
                    Some(content) => {
                        scene.add(
                            cell,
                            Shape::Text,
                            [
                                num(Attr::X, config.char_width),
                                num(Attr::Y, middle),
                                text(&content.content),
                                fill(palette::FOREGROUND),
                            ],
                        );
                    }
                    None => {
                        scene.add(
                            cell,
                            Shape::Circle,
                            [
                                num(Attr::X, unit.width() / 2.0),
                                num(Attr::Y, unit.height() / 2.0),
                                num(Attr::Radius, 1.0),
                                fill(palette::ARROW),
                            ],
                        );
                    }
                }
                unit.node = Some(cell);
            }
        }
        ValueKind::Fn(_) | ValueKind::GlobalFn(_) => {
            let color = match value.kind {
                ValueKind::Fn(_) => palette::CLOSURE,
                _ => palette::MUTED,
            };
            for cx in [r, 3.0 * r] {
                scene.add(
                    group,
                    Shape::Circle,
                    [
                        num(Attr::X, cx),
                        num(Attr::Y, r),
                        num(Attr::Radius, r),
                        stroke(color),
                    ],
                );
            }
        }
        ValueKind::Continuation(_) => {
            scene.add(
                group,
                Shape::Rect,
                [
                    num(Attr::Width, value.width()),
                    num(Attr::Height, value.height()),
                    stroke(palette::CLOSURE),
                ],
            );
        }
        ValueKind::Primitive(_) | ValueKind::Unassigned(_) => {}
    }
    diagram.values[id.0].node = Some(group);
    scene.register(EntityKey::Value(heap), group);
    Some(group)
}

pub fn draw_arrow(arrow: &mut Arrow, scene: &mut Scene) -> NodeId {
    if let Some(node) = arrow.node {
        return node;
    }
    let node = scene.add(
        scene.layer(Layer::Arrows),
        Shape::Path,
        [
            (Attr::Points, AttrValue::Points(arrow.points.clone())),
            stroke(palette::ARROW),
        ],
    );
    arrow.node = Some(node);
    scene.register(EntityKey::Arrow(arrow.key.clone()), node);
    node
}

fn draw_item(
    scene: &mut Scene,
    layer: Layer,
    rect: crate::diagram::Rect,
    label: &str,
    color: super::Rgb,
    config: &LayoutConfig,
) -> NodeId {
    let group = scene.add(
        scene.layer(layer),
        Shape::Group,
        [num(Attr::X, rect.x), num(Attr::Y, rect.y)],
    );
    scene.add(
        group,
        Shape::Rect,
        [
            num(Attr::Width, rect.width),
            num(Attr::Height, rect.height),
            stroke(color),
        ],
    );
    scene.add(
        group,
        Shape::Text,
        [
            num(Attr::X, config.char_width),
            num(Attr::Y, (rect.height - config.line_height) / 2.0),
            text(label),
            fill(palette::FOREGROUND),
        ],
    );
    group
}

pub fn draw_control(item: &mut ControlBox, scene: &mut Scene, config: &LayoutConfig) -> NodeId {
    if let Some(node) = item.node {
        return node;
    }
    let color = if item.is_instruction {
        palette::CONTROL
    } else {
        palette::MUTED
    };
    let node = draw_item(scene, Layer::Control, item.rect(), &item.text.content, color, config);
    item.node = Some(node);
    scene.register(EntityKey::Control(item.index), node);
    node
}

pub fn draw_stash(item: &mut StashBox, scene: &mut Scene, config: &LayoutConfig) -> NodeId {
    if let Some(node) = item.node {
        return node;
    }
    let node = draw_item(
        scene,
        Layer::Stash,
        item.rect(),
        &item.text.content,
        palette::STASH,
        config,
    );
    item.node = Some(node);
    scene.register(EntityKey::Stash(item.index), node);
    node
}
