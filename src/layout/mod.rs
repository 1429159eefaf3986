//! Snapshot layout
//!
//! [`Layout::compute`] turns a [`Snapshot`] into positioned entities:
//!
//! 1. [`Diagram::build`] converts environments and raw values into sized
//!    frames, bindings, values and array units.
//! 2. [`Machine::build`] places the control column and stash row and decides
//!    where the frame grid starts.
//! 3. [`Grid::build`] assigns columns and rows and positions everything in
//!    the diagram.
//! 4. [`arrow::route_all`] routes arrows through [`ArrowLanes`].
//!
//! All running state of a pass (cumulative widths and heights, the arrow
//! lanes) lives in a [`LayoutContext`] created for that pass, so two layouts
//! never share anything.

pub mod array_level;
pub mod arrow;
pub mod arrow_lane;
pub mod frame_level;
pub mod grid;
pub mod machine;

pub use array_level::ArrayLevel;
pub use arrow::{Arrow, ArrowKey};
pub use arrow_lane::{ArrowLane, ArrowLanes, LaneTarget};
pub use frame_level::FrameLevel;
pub use grid::Grid;
pub use machine::{ControlBox, Machine, StashBox};

use crate::config::LayoutConfig;
use crate::diagram::geometry::{Point, Rect};
use crate::diagram::Diagram;
use crate::error::LayoutError;
use crate::snapshot::Snapshot;

/// Running state of one layout pass
#[derive(Debug, Clone)]
pub struct LayoutContext {
    pub config: LayoutConfig,
    /// Pixel position of grid column 0, row 0
    pub origin: Point,
    /// `cum_widths[x]` is the left edge of column `x`, relative to the origin
    pub cum_widths: Vec<f64>,
    /// `cum_heights[r]` is the top of row `r`, relative to the origin
    pub cum_heights: Vec<f64>,
    pub max_x_coord: usize,
    pub lanes: ArrowLanes,
}

impl LayoutContext {
    pub fn new(config: LayoutConfig, origin: Point) -> Self {
        LayoutContext {
            config,
            origin,
            cum_widths: vec![0.0],
            cum_heights: vec![0.0],
            max_x_coord: 0,
            lanes: ArrowLanes::new(),
        }
    }

    /// Forget everything computed so far
    pub fn reset(&mut self) {
        self.cum_widths = vec![0.0];
        self.cum_heights = vec![0.0];
        self.max_x_coord = 0;
        self.lanes.clear();
    }

    /// Record a frame of `width` in column `x`
    ///
    /// `cum_widths[x + 1] = max(existing, cum_widths[x] + width + margin)`.
    /// Columns left of `x` without any frame carry the previous edge.
    pub fn claim_column(&mut self, x: usize, width: f64) {
        while self.cum_widths.len() < x + 2 {
            let last = self.cum_widths.last().copied().unwrap_or(0.0);
            self.cum_widths.push(last);
        }
        let right = self.cum_widths[x] + width + self.config.frame_margin_x;
        if right > self.cum_widths[x + 1] {
            self.cum_widths[x + 1] = right;
        }
        self.max_x_coord = self.max_x_coord.max(x);
    }

    /// Pixel x of a grid column
    pub fn column_x(&self, x: usize) -> f64 {
        let offset = match self.cum_widths.get(x) {
            Some(&w) => w,
            None => self.cum_widths.last().copied().unwrap_or(0.0),
        };
        self.origin.x + offset
    }

    /// Pixel y of the top of a row
    pub fn row_y(&self, row: usize) -> f64 {
        let offset = match self.cum_heights.get(row) {
            Some(&h) => h,
            None => self.cum_heights.last().copied().unwrap_or(0.0),
        };
        self.origin.y + offset
    }
}

/// A fully positioned snapshot
#[derive(Debug, Clone)]
pub struct Layout {
    config: LayoutConfig,
    diagram: Diagram,
    grid: Grid,
    machine: Machine,
    arrows: Vec<Arrow>,
    cum_widths: Vec<f64>,
    cum_heights: Vec<f64>,
    width: f64,
    height: f64,
}

impl Layout {
    pub fn compute(snapshot: &Snapshot, config: &LayoutConfig) -> Result<Layout, LayoutError> {
        let mut diagram = Diagram::build(snapshot, config)?;
        let machine = Machine::build(snapshot, &diagram, config);
        let mut ctx = LayoutContext::new(config.clone(), machine.grid_origin());

        let grid = Grid::build(&mut diagram, &mut ctx);
        let arrows = arrow::route_all(&diagram, &machine, &mut ctx);

        let mut layout = Layout {
            config: config.clone(),
            diagram,
            grid,
            machine,
            arrows,
            cum_widths: ctx.cum_widths,
            cum_heights: ctx.cum_heights,
            width: 0.0,
            height: 0.0,
        };
        let extent = layout.content_extent();
        layout.width = extent.right() + config.canvas_padding;
        layout.height = extent.bottom() + config.canvas_padding;
        tracing::debug!(
            width = layout.width,
            height = layout.height,
            "layout computed"
        );
        Ok(layout)
    }

    /// Union of everything drawn, starting at the canvas origin
    fn content_extent(&self) -> Rect {
        let diagram = &self.diagram;
        let mut extent = Rect::default();
        let boxes = diagram
            .frames()
            .iter()
            .map(|f| f.extent())
            .chain(diagram.values().iter().filter(|v| v.is_placed()).map(|v| v.rect()))
            .chain(self.machine.extent());
        for rect in boxes {
            extent = extent.union(&rect);
        }
        for arrow in &self.arrows {
            for p in &arrow.points {
                extent = extent.union(&Rect::new(p.x, p.y, 0.0, 0.0));
            }
        }
        extent
    }

    /// Mutable access for drawing, which records node handles on entities
    pub(crate) fn parts_mut(
        &mut self,
    ) -> (&LayoutConfig, &mut Diagram, &mut Machine, &mut [Arrow]) {
        (
            &self.config,
            &mut self.diagram,
            &mut self.machine,
            &mut self.arrows,
        )
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    pub fn cum_widths(&self) -> &[f64] {
        &self.cum_widths
    }

    pub fn cum_heights(&self) -> &[f64] {
        &self.cum_heights
    }

    /// Canvas width, padding included
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Canvas height, padding included
    pub fn height(&self) -> f64 {
        self.height
    }
}
