//! Frames: one box per environment

use super::binding::{Binding, BindingId};
use super::geometry::Rect;
use super::text::Text;
use crate::config::LayoutConfig;
use crate::scene::NodeId;
use crate::snapshot::EnvId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub(crate) usize);

impl FrameId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Frame {
    pub env: EnvId,
    /// Title drawn above the box
    pub name: Text,
    pub parent: Option<FrameId>,
    /// Children in creation order
    pub children: Vec<FrameId>,
    /// Tree depth, which is also the frame row
    pub level: usize,
    /// Grid column
    pub x_coord: usize,
    pub bindings: Vec<BindingId>,
    pub is_current: bool,
    /// The box itself, excluding the title
    rect: Rect,
    total_width: f64,
    pub(crate) node: Option<NodeId>,
}

impl Frame {
    pub fn new(
        env: EnvId,
        label: &str,
        parent: Option<FrameId>,
        level: usize,
        config: &LayoutConfig,
    ) -> Self {
        Frame {
            env,
            name: Text::new(label, config),
            parent,
            children: Vec::new(),
            level,
            x_coord: 0,
            bindings: Vec::new(),
            is_current: false,
            rect: Rect::new(0.0, 0.0, config.frame_min_width, 0.0),
            total_width: config.frame_min_width,
            node: None,
        }
    }

    /// Size the box around its bindings
    ///
    /// The box is as wide as the widest binding and as tall as all bindings
    /// stacked; a frame without bindings keeps one empty line.
    pub(crate) fn fit<'a>(
        &mut self,
        bindings: impl IntoIterator<Item = &'a Binding>,
        config: &LayoutConfig,
    ) {
        let (widest, stacked) = bindings
            .into_iter()
            .fold((0.0_f64, 0.0_f64), |(w, h), b| (w.max(b.width()), h + b.height()));
        self.rect.width = config
            .frame_min_width
            .max(widest + 2.0 * config.frame_padding_x);
        self.rect.height = 2.0 * config.frame_padding_y + stacked.max(config.line_height);
        self.total_width = self.rect.width.max(self.name.width);
    }

    /// Make room for a value drawn to the right of the box
    pub(crate) fn extend_total_width(&mut self, right_of_box: f64) {
        self.total_width = self.total_width.max(self.rect.width + right_of_box);
    }

    pub(crate) fn set_position(&mut self, x: f64, y: f64) {
        self.rect.x = x;
        self.rect.y = y;
    }

    /// Top of the title label
    pub fn title_y(&self) -> f64 {
        self.rect.y - self.name.height
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn x(&self) -> f64 {
        self.rect.x
    }

    pub fn y(&self) -> f64 {
        self.rect.y
    }

    pub fn width(&self) -> f64 {
        self.rect.width
    }

    pub fn height(&self) -> f64 {
        self.rect.height
    }

    pub fn right(&self) -> f64 {
        self.rect.right()
    }

    pub fn bottom(&self) -> f64 {
        self.rect.bottom()
    }

    /// Box plus everything drawn beside it
    pub fn total_width(&self) -> f64 {
        self.total_width
    }

    /// Box plus title
    pub fn total_height(&self) -> f64 {
        self.rect.height + self.name.height
    }

    /// Everything the frame occupies, title and side values included
    pub fn extent(&self) -> Rect {
        Rect::new(
            self.rect.x,
            self.title_y(),
            self.total_width,
            self.total_height(),
        )
    }
}
