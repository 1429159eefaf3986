//! Layout and animation configuration
//!
//! All geometry is expressed in diagram pixels. The terminal viewer maps one
//! character cell to [`LayoutConfig::char_width`] x [`LayoutConfig::line_height`]
//! pixels, so the defaults are multiples of the cell size wherever possible.
//!
//! Every field has a default, and a trace file may override any subset of them
//! through its optional `config` section.

use serde::Deserialize;
use std::time::Duration;

/// Width of one text character in pixels
pub const DEFAULT_CHAR_WIDTH: f64 = 8.0;

/// Height of one text line in pixels
pub const DEFAULT_LINE_HEIGHT: f64 = 16.0;

/// Base duration every animation multiplier is relative to
pub const DEFAULT_BASE_DURATION: Duration = Duration::from_millis(400);

/// Geometry knobs for the layout engine
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub char_width: f64,
    pub line_height: f64,

    /// Empty border around the whole canvas
    pub canvas_padding: f64,

    /// Horizontal gap between frame columns
    pub frame_margin_x: f64,
    /// Vertical gap between rows
    pub frame_margin_y: f64,
    pub frame_padding_x: f64,
    pub frame_padding_y: f64,
    pub frame_min_width: f64,

    /// Distance between a frame's right border and closures drawn beside it
    pub fn_gap: f64,
    pub fn_radius: f64,

    pub unit_width: f64,
    pub unit_height: f64,
    /// Vertical gap between two array lanes (holds the index labels)
    pub array_lane_gap: f64,
    /// Minimum horizontal clearance between arrays sharing a lane
    pub array_min_gap: f64,

    pub arrow_lane_count: usize,
    pub arrow_lane_interval: usize,
    /// Fraction of a margin that arrow lanes may occupy
    pub arrow_margin_fraction: f64,

    /// Longest text drawn before truncation with an ellipsis
    pub max_text_chars: usize,

    /// Width of the control column, zero hides control and stash
    pub control_width: f64,
    pub stash_item_min_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            char_width: DEFAULT_CHAR_WIDTH,
            line_height: DEFAULT_LINE_HEIGHT,
            canvas_padding: 16.0,
            frame_margin_x: 32.0,
            frame_margin_y: 32.0,
            frame_padding_x: 16.0,
            frame_padding_y: 16.0,
            frame_min_width: 64.0,
            fn_gap: 16.0,
            fn_radius: 8.0,
            unit_width: 56.0,
            unit_height: 48.0,
            array_lane_gap: 16.0,
            array_min_gap: 16.0,
            arrow_lane_count: 5,
            arrow_lane_interval: 2,
            arrow_margin_fraction: 0.8,
            max_text_chars: 24,
            control_width: 160.0,
            stash_item_min_width: 32.0,
        }
    }
}

impl LayoutConfig {
    /// A configuration without padding or machine columns, so the frame
    /// grid starts at pixel (0, 0)
    pub fn bare() -> Self {
        LayoutConfig {
            canvas_padding: 0.0,
            control_width: 0.0,
            ..LayoutConfig::default()
        }
    }

    /// Whether the control column and stash row are laid out at all
    pub fn shows_machine(&self) -> bool {
        self.control_width > 0.0
    }
}

/// Timing knobs for transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSettings {
    pub base_duration: Duration,
    pub enabled: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        AnimationSettings {
            base_duration: DEFAULT_BASE_DURATION,
            enabled: true,
        }
    }
}
