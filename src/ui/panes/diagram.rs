//! Diagram pane: paints a [`Scene`] into terminal cells
//!
//! Canvas pixels map to cells through the layout's character width and line
//! height. Rects become box outlines (bracket pairs when only one line tall),
//! paths become box-drawing polylines with an arrow head, circles become a
//! dot or a ring. Nodes below a minimum opacity are skipped; the rest are
//! blended toward the background.

use crate::config::LayoutConfig;
use crate::diagram::geometry::Point;
use crate::scene::{palette, Attrs, Scene, Shape};
use crate::ui::theme::{blend, DEFAULT_THEME};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Widget},
    Frame,
};

/// Nodes fainter than this are not drawn at all
const MIN_OPACITY: f64 = 0.15;

/// Widget drawing a scene with a scroll offset in cells
pub struct SceneWidget<'a> {
    scene: &'a Scene,
    char_width: f64,
    line_height: f64,
    scroll: (u16, u16),
}

impl<'a> SceneWidget<'a> {
    pub fn new(scene: &'a Scene, config: &LayoutConfig) -> Self {
        SceneWidget {
            scene,
            char_width: config.char_width.max(1.0),
            line_height: config.line_height.max(1.0),
            scroll: (0, 0),
        }
    }

    pub fn scroll(mut self, x: u16, y: u16) -> Self {
        self.scroll = (x, y);
        self
    }
}

/// Cell writer clipped to an area
struct Canvas<'b> {
    buf: &'b mut Buffer,
    area: Rect,
    char_width: f64,
    line_height: f64,
    scroll: (u16, u16),
}

impl Canvas<'_> {
    fn col(&self, x: f64) -> i64 {
        (x / self.char_width).floor() as i64 - self.scroll.0 as i64
    }

    fn row(&self, y: f64) -> i64 {
        (y / self.line_height).floor() as i64 - self.scroll.1 as i64
    }

    fn put(&mut self, col: i64, row: i64, ch: char, style: Style) {
        if col < 0 || row < 0 || col >= self.area.width as i64 || row >= self.area.height as i64 {
            return;
        }
        let x = self.area.x + col as u16;
        let y = self.area.y + row as u16;
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_char(ch).set_style(style);
        }
    }

    fn text(&mut self, col: i64, row: i64, text: &str, style: Style) {
        for (i, ch) in text.chars().enumerate() {
            self.put(col + i as i64, row, ch, style);
        }
    }

    fn rect(&mut self, origin: Point, attrs: &Attrs, style: Style) {
        let c0 = self.col(origin.x);
        let r0 = self.row(origin.y);
        let c1 = self.col(origin.x + attrs.width).max(c0 + 1) - 1;
        let r1 = self.row(origin.y + attrs.height).max(r0 + 1) - 1;
        if r0 == r1 {
            self.put(c0, r0, '[', style);
            self.put(c1.max(c0 + 1), r0, ']', style);
            return;
        }
        for c in c0 + 1..c1 {
            self.put(c, r0, '─', style);
            self.put(c, r1, '─', style);
        }
        for r in r0 + 1..r1 {
            self.put(c0, r, '│', style);
            self.put(c1, r, '│', style);
        }
        self.put(c0, r0, '┌', style);
        self.put(c1, r0, '┐', style);
        self.put(c0, r1, '└', style);
        self.put(c1, r1, '┘', style);
    }

    fn circle(&mut self, origin: Point, attrs: &Attrs, style: Style) {
        let ch = if attrs.radius * 2.0 < self.char_width {
            '•'
        } else {
            '○'
        };
        self.put(self.col(origin.x), self.row(origin.y), ch, style);
    }

    fn path(&mut self, origin: Point, attrs: &Attrs, style: Style) {
        let cells: Vec<(i64, i64)> = attrs
            .points
            .iter()
            .map(|p| (self.col(origin.x + p.x), self.row(origin.y + p.y)))
            .collect();
        for pair in cells.windows(2) {
            let ((c0, r0), (c1, r1)) = (pair[0], pair[1]);
            if r0 == r1 {
                for c in c0.min(c1)..=c0.max(c1) {
                    self.put(c, r0, '─', style);
                }
            } else {
                for r in r0.min(r1)..=r0.max(r1) {
                    self.put(c0, r, '│', style);
                }
            }
        }
        for i in 1..cells.len().saturating_sub(1) {
            let (prev, at, next) = (cells[i - 1], cells[i], cells[i + 1]);
            if let Some(ch) = bend(side(at, prev), side(at, next)) {
                self.put(at.0, at.1, ch, style);
            }
        }
        if let [.., before, last] = cells.as_slice() {
            let head = match side(*last, *before) {
                Side::Up => '▼',
                Side::Down => '▲',
                Side::Left => '▶',
                Side::Right => '◀',
                Side::Same => return,
            };
            self.put(last.0, last.1, head, style);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Up,
    Down,
    Left,
    Right,
    Same,
}

/// Side of `at` on which `other` lies
fn side(at: (i64, i64), other: (i64, i64)) -> Side {
    if other.1 < at.1 {
        Side::Up
    } else if other.1 > at.1 {
        Side::Down
    } else if other.0 < at.0 {
        Side::Left
    } else if other.0 > at.0 {
        Side::Right
    } else {
        Side::Same
    }
}

fn bend(a: Side, b: Side) -> Option<char> {
    use Side::*;
    Some(match (a, b) {
        (Left, Down) | (Down, Left) => '┐',
        (Left, Up) | (Up, Left) => '┘',
        (Right, Down) | (Down, Right) => '┌',
        (Right, Up) | (Up, Right) => '└',
        (Up, Down) | (Down, Up) => '│',
        (Left, Right) | (Right, Left) => '─',
        _ => return None,
    })
}

impl Widget for SceneWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut canvas = Canvas {
            buf,
            area,
            char_width: self.char_width,
            line_height: self.line_height,
            scroll: self.scroll,
        };
        self.scene.visit(|_, shape, attrs, origin, opacity| {
            if opacity < MIN_OPACITY {
                return;
            }
            let stroke_color = attrs.stroke.unwrap_or(palette::MUTED);
            let stroke = Style::default().fg(blend(stroke_color, opacity));
            let fill_color = attrs.fill.unwrap_or(palette::FOREGROUND);
            let fill = Style::default().fg(blend(fill_color, opacity));
            match shape {
                Shape::Group => {}
                Shape::Rect => canvas.rect(origin, attrs, stroke),
                Shape::Text => {
                    let (col, row) = (canvas.col(origin.x), canvas.row(origin.y));
                    canvas.text(col, row, &attrs.text, fill);
                }
                Shape::Circle => {
                    let style = if attrs.fill.is_some() { fill } else { stroke };
                    canvas.circle(origin, attrs, style);
                }
                Shape::Path => canvas.path(origin, attrs, stroke),
            }
        });
    }
}

/// Render the diagram pane
pub fn render_diagram_pane(
    frame: &mut Frame,
    area: Rect,
    scene: &Scene,
    config: &LayoutConfig,
    scroll: (u16, u16),
    title: &str,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(DEFAULT_THEME.border_focused)
                .add_modifier(Modifier::BOLD),
        )
        .style(Style::default().bg(DEFAULT_THEME.bg));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(SceneWidget::new(scene, config).scroll(scroll.0, scroll.1), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Attr, AttrValue, Layer};

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, row)).map(|c| c.symbol().to_string()).unwrap_or_default())
            .collect()
    }

    fn config() -> LayoutConfig {
        LayoutConfig {
            char_width: 1.0,
            line_height: 1.0,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_rect_and_text() {
        let mut scene = Scene::new();
        let layer = scene.layer(Layer::Frames);
        let group = scene.add(
            layer,
            Shape::Group,
            [(Attr::X, AttrValue::Number(1.0)), (Attr::Y, AttrValue::Number(1.0))],
        );
        scene.add(
            group,
            Shape::Rect,
            [(Attr::Width, AttrValue::Number(4.0)), (Attr::Height, AttrValue::Number(3.0))],
        );
        scene.add(group, Shape::Text, [
            (Attr::X, AttrValue::Number(1.0)),
            (Attr::Y, AttrValue::Number(1.0)),
            (Attr::Text, AttrValue::Text("ab".to_string())),
        ]);

        let area = Rect::new(0, 0, 6, 5);
        let mut buf = Buffer::empty(area);
        SceneWidget::new(&scene, &config()).render(area, &mut buf);
        assert_eq!(row_text(&buf, 1), " ┌──┐ ");
        assert_eq!(row_text(&buf, 2), " │ab│ ");
        assert_eq!(row_text(&buf, 3), " └──┘ ");
    }

    #[test]
    fn test_path_bends_and_head() {
        let mut scene = Scene::new();
        let layer = scene.layer(Layer::Arrows);
        scene.add(layer, Shape::Path, [(
            Attr::Points,
            AttrValue::Points(vec![
                Point::new(0.0, 0.0),
                Point::new(3.0, 0.0),
                Point::new(3.0, 2.0),
            ]),
        )]);
        let area = Rect::new(0, 0, 5, 3);
        let mut buf = Buffer::empty(area);
        SceneWidget::new(&scene, &config()).render(area, &mut buf);
        assert_eq!(row_text(&buf, 0), "───┐ ");
        assert_eq!(row_text(&buf, 1), "   │ ");
        assert_eq!(row_text(&buf, 2), "   ▼ ");
    }

    #[test]
    fn test_faint_and_scrolled_out_nodes_skipped() {
        let mut scene = Scene::new();
        let layer = scene.layer(Layer::Values);
        scene.add(layer, Shape::Text, [
            (Attr::Text, AttrValue::Text("x".to_string())),
            (Attr::Opacity, AttrValue::Number(0.1)),
        ]);
        scene.add(layer, Shape::Text, [
            (Attr::Y, AttrValue::Number(1.0)),
            (Attr::Text, AttrValue::Text("yz".to_string())),
        ]);
        let area = Rect::new(0, 0, 3, 2);
        let mut buf = Buffer::empty(area);
        SceneWidget::new(&scene, &config()).scroll(1, 1).render(area, &mut buf);
        assert_eq!(row_text(&buf, 0), "z  ");
        assert_eq!(row_text(&buf, 1), "   ");
    }
}
