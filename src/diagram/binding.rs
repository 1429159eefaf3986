//! Bindings: one `key: value` row inside a frame

use super::frame::FrameId;
use super::geometry::{Point, Rect};
use super::text::Text;
use super::value::ValueId;
use crate::config::LayoutConfig;
use crate::scene::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct Binding {
    pub frame: FrameId,
    pub name: String,
    /// `name:`
    pub key: Text,
    pub value: ValueId,
    /// Value text when the value is drawn inline
    pub inline: Option<Text>,
    rect: Rect,
    /// Width including a value drawn beside the frame through this binding
    total_width: f64,
    pub(crate) node: Option<NodeId>,
}

impl Binding {
    pub fn new(
        frame: FrameId,
        name: &str,
        value: ValueId,
        inline: Option<Text>,
        config: &LayoutConfig,
    ) -> Self {
        let key = Text::new(format!("{}:", name), config);
        let width = match &inline {
            Some(text) => key.width + config.char_width + text.width,
            // room for the arrow's starting dot
            None => key.width + 2.0 * config.char_width,
        };
        let height = key.height.max(inline.as_ref().map_or(0.0, |t| t.height));
        Binding {
            frame,
            name: name.to_string(),
            key,
            value,
            inline,
            rect: Rect::new(0.0, 0.0, width, height),
            total_width: width,
            node: None,
        }
    }

    /// Widen the binding so it covers a value drawn through it
    pub(crate) fn cover_value_right(&mut self, value_right: f64) {
        self.total_width = self.total_width.max(value_right - self.rect.x);
    }

    /// Reset the extent, used before re-deriving it
    pub(crate) fn reset_total_width(&mut self) {
        self.total_width = self.rect.width;
    }

    pub(crate) fn set_position(&mut self, x: f64, y: f64) {
        self.rect.x = x;
        self.rect.y = y;
    }

    /// Where an arrow to a non-inline value starts
    pub fn anchor(&self, config: &LayoutConfig) -> Point {
        Point::new(
            self.rect.x + self.key.width + config.char_width,
            self.rect.y + self.rect.height / 2.0,
        )
    }

    pub fn is_inline(&self) -> bool {
        self.inline.is_some()
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

    pub fn total_width(&self) -> f64 {
        self.total_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_width_covers_key_and_value() {
        let config = LayoutConfig::default();
        let inline = Text::new("42", &config);
        let binding = Binding::new(FrameId(0), "x", ValueId(0), Some(inline), &config);
        // "x:" + space + "42"
        assert_eq!(binding.width(), 5.0 * config.char_width);
        assert!(binding.width() >= binding.key.width);
    }

    #[test]
    fn test_total_width_covers_value() {
        let config = LayoutConfig::default();
        let mut binding = Binding::new(FrameId(0), "f", ValueId(0), None, &config);
        binding.set_position(100.0, 0.0);
        binding.cover_value_right(260.0);
        assert_eq!(binding.total_width(), 160.0);
        binding.cover_value_right(120.0);
        assert_eq!(binding.total_width(), 160.0);
    }
}
