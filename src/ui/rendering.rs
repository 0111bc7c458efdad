//! Canvas rendering for the grid, connectors and unit nodes.
//!
//! Geometry that SVG export also needs (connector control points, arrow
//! heads, unit symbols) lives in free functions working in plain
//! coordinates; the painter code maps it to the screen.

use super::state::FlowsheetApp;
use crate::constants::{
    ARROW_HALF_WIDTH, ARROW_LENGTH, GRID_SIZE, MAJOR_GRID_EVERY, MAX_CURVATURE, PORT_RADIUS,
};
use crate::types::*;
use eframe::egui;
use eframe::epaint::{CubicBezierShape, StrokeKind};

/// Connector stroke colour.
pub const CONNECTOR_COLOR: egui::Color32 = egui::Color32::from_rgb(200, 200, 200);
/// Colour of node names.
pub const NAME_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 220, 220);
/// Fill of inlet ports.
pub const INPUT_PORT_COLOR: egui::Color32 = egui::Color32::from_rgb(150, 150, 250);
/// Fill of outlet ports.
pub const OUTPUT_PORT_COLOR: egui::Color32 = egui::Color32::from_rgb(250, 150, 150);

const MINOR_GRID_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(8, 8, 8, 40);
const MAJOR_GRID_COLOR: egui::Color32 = egui::Color32::from_rgba_premultiplied(16, 16, 16, 80);

/// One stroke of a unit symbol in unit-square coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct IconPath {
    /// Points with (0,0) at the node's top-left and (1,1) at its bottom-right
    pub points: Vec<(f32, f32)>,
    /// Whether the last point joins back to the first
    pub closed: bool,
}

fn closed(points: &[(f32, f32)]) -> IconPath {
    IconPath {
        points: points.to_vec(),
        closed: true,
    }
}

fn open(points: &[(f32, f32)]) -> IconPath {
    IconPath {
        points: points.to_vec(),
        closed: false,
    }
}

/// Strokes making up the symbol for `icon`.
pub fn icon_paths(icon: UnitIcon) -> Vec<IconPath> {
    match icon {
        UnitIcon::Valve => vec![
            closed(&[(0.15, 0.2), (0.5, 0.5), (0.15, 0.8)]),
            closed(&[(0.85, 0.2), (0.5, 0.5), (0.85, 0.8)]),
            open(&[(0.5, 0.5), (0.5, 0.15)]),
            open(&[(0.38, 0.15), (0.62, 0.15)]),
        ],
        UnitIcon::Inlet => vec![closed(&[
            (0.15, 0.25),
            (0.6, 0.25),
            (0.85, 0.5),
            (0.6, 0.75),
            (0.15, 0.75),
        ])],
        UnitIcon::Outlet => vec![closed(&[
            (0.15, 0.25),
            (0.6, 0.25),
            (0.85, 0.5),
            (0.6, 0.75),
            (0.15, 0.75),
            (0.35, 0.5),
        ])],
        UnitIcon::Compressor => vec![closed(&[
            (0.15, 0.1),
            (0.85, 0.3),
            (0.85, 0.7),
            (0.15, 0.9),
        ])],
        UnitIcon::Tank => vec![closed(&[
            (0.2, 0.15),
            (0.35, 0.05),
            (0.65, 0.05),
            (0.8, 0.15),
            (0.8, 0.85),
            (0.65, 0.95),
            (0.35, 0.95),
            (0.2, 0.85),
        ])],
        UnitIcon::Pipe => vec![
            open(&[(0.1, 0.35), (0.9, 0.35)]),
            open(&[(0.1, 0.65), (0.9, 0.65)]),
            open(&[(0.1, 0.25), (0.1, 0.75)]),
            open(&[(0.9, 0.25), (0.9, 0.75)]),
        ],
        UnitIcon::Splitter => vec![
            open(&[(0.0, 0.5), (0.5, 0.5)]),
            open(&[(0.5, 0.5), (1.0, 0.25)]),
            open(&[(0.5, 0.5), (1.0, 0.5)]),
            open(&[(0.5, 0.5), (1.0, 0.75)]),
        ],
        UnitIcon::Mixer => vec![
            open(&[(0.0, 0.25), (0.5, 0.5)]),
            open(&[(0.0, 0.5), (0.5, 0.5)]),
            open(&[(0.0, 0.75), (0.5, 0.5)]),
            open(&[(0.5, 0.5), (1.0, 0.5)]),
        ],
        UnitIcon::Generic => vec![closed(&[
            (0.15, 0.15),
            (0.85, 0.15),
            (0.85, 0.85),
            (0.15, 0.85),
        ])],
    }
}

/// Cubic Bézier control points for a connector from an outlet at `start`
/// to an inlet at `end`.
///
/// The curve leaves and enters horizontally; the handle length is half the
/// chord, capped at [`MAX_CURVATURE`].
pub fn connector_points(start: (f32, f32), end: (f32, f32)) -> [(f32, f32); 4] {
    let curvature = (distance(start, end) * 0.5).min(MAX_CURVATURE);
    [
        start,
        (start.0 + curvature, start.1),
        (end.0 - curvature, end.1),
        end,
    ]
}

/// Triangle with its tip at `end`, pointing along the chord from `start`.
///
/// Returns `[tip, left, right]`, or `None` for a zero-length chord.
pub fn arrow_head(start: (f32, f32), end: (f32, f32)) -> Option<[(f32, f32); 3]> {
    let length = distance(start, end);
    if length < f32::EPSILON {
        return None;
    }
    let dir = ((end.0 - start.0) / length, (end.1 - start.1) / length);
    let normal = (-dir.1, dir.0);
    let base = (end.0 - dir.0 * ARROW_LENGTH, end.1 - dir.1 * ARROW_LENGTH);
    Some([
        end,
        (
            base.0 + normal.0 * ARROW_HALF_WIDTH,
            base.1 + normal.1 * ARROW_HALF_WIDTH,
        ),
        (
            base.0 - normal.0 * ARROW_HALF_WIDTH,
            base.1 - normal.1 * ARROW_HALF_WIDTH,
        ),
    ])
}

impl FlowsheetApp {
    fn to_screen(&self, p: (f32, f32)) -> egui::Pos2 {
        self.world_to_screen(egui::pos2(p.0, p.1))
    }

    /// Renders all flowsheet elements on the canvas.
    ///
    /// Layers, back to front: grid, connectors, connection preview, nodes,
    /// marquee.
    pub fn render_flowsheet_elements(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        if self.canvas.show_grid {
            self.draw_grid(painter, canvas_rect);
        }

        for connection in &self.flowsheet.connections {
            if let (Some(start), Some(end)) = (
                self.flowsheet.port_world_position(connection.from),
                self.flowsheet.port_world_position(connection.to),
            ) {
                self.draw_connector(painter, start, end, CONNECTOR_COLOR);
            }
        }

        if let Some(pending) = self.interaction.pending_connection {
            self.draw_connection_preview(painter, pending.from, pending.end);
        }

        for node in &self.flowsheet.nodes {
            self.draw_node(painter, node);
        }

        if let Some(marquee) = self.interaction.marquee {
            let rect = egui::Rect::from_two_pos(self.to_screen(marquee.start), self.to_screen(marquee.end));
            painter.rect_filled(rect, 0.0, egui::Color32::from_rgba_unmultiplied(100, 150, 255, 40));
            painter.rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(1.0, egui::Color32::from_rgb(100, 150, 255)),
                StrokeKind::Inside,
            );
        }
    }

    /// Draws minor grid lines every [`GRID_SIZE`] world units and a stronger
    /// line every [`MAJOR_GRID_EVERY`] minor cells.
    pub fn draw_grid(&self, painter: &egui::Painter, canvas_rect: egui::Rect) {
        let screen_step = GRID_SIZE * self.canvas.zoom_factor;
        let show_minor = screen_step >= 4.0;

        let top_left = self.screen_to_world(canvas_rect.min);
        let bottom_right = self.screen_to_world(canvas_rect.max);
        let minor = egui::Stroke::new(1.0, MINOR_GRID_COLOR);
        let major = egui::Stroke::new(1.0, MAJOR_GRID_COLOR);

        let first = (top_left.x / GRID_SIZE).floor() as i64;
        let last = (bottom_right.x / GRID_SIZE).ceil() as i64;
        for i in first..=last {
            let is_major = i.rem_euclid(MAJOR_GRID_EVERY as i64) == 0;
            if !is_major && !show_minor {
                continue;
            }
            let x = self.world_to_screen(egui::pos2(i as f32 * GRID_SIZE, 0.0)).x;
            painter.line_segment(
                [egui::pos2(x, canvas_rect.min.y), egui::pos2(x, canvas_rect.max.y)],
                if is_major { major } else { minor },
            );
        }

        let first = (top_left.y / GRID_SIZE).floor() as i64;
        let last = (bottom_right.y / GRID_SIZE).ceil() as i64;
        for i in first..=last {
            let is_major = i.rem_euclid(MAJOR_GRID_EVERY as i64) == 0;
            if !is_major && !show_minor {
                continue;
            }
            let y = self.world_to_screen(egui::pos2(0.0, i as f32 * GRID_SIZE)).y;
            painter.line_segment(
                [egui::pos2(canvas_rect.min.x, y), egui::pos2(canvas_rect.max.x, y)],
                if is_major { major } else { minor },
            );
        }
    }

    /// Draws a curved connector with an arrow head at `end` (world coordinates).
    fn draw_connector(
        &self,
        painter: &egui::Painter,
        start: (f32, f32),
        end: (f32, f32),
        color: egui::Color32,
    ) {
        let points = connector_points(start, end).map(|p| self.to_screen(p));
        painter.add(CubicBezierShape::from_points_stroke(
            points,
            false,
            egui::Color32::TRANSPARENT,
            egui::Stroke::new(2.0, color),
        ));

        if let Some(arrow) = arrow_head(start, end) {
            painter.add(egui::Shape::convex_polygon(
                arrow.iter().map(|p| self.to_screen(*p)).collect(),
                color,
                egui::Stroke::NONE,
            ));
        }
    }

    /// Half-transparent connector from the port being dragged to the pointer.
    pub fn draw_connection_preview(&self, painter: &egui::Painter, from: PortRef, end: (f32, f32)) {
        let Some(anchor) = self.flowsheet.port_world_position(from) else {
            return;
        };
        let color = CONNECTOR_COLOR.gamma_multiply(0.5);
        // Streams always run outlet to inlet, so a drag from an inlet draws backwards
        match from.direction {
            PortDirection::Output => self.draw_connector(painter, anchor, end, color),
            PortDirection::Input => self.draw_connector(painter, end, anchor, color),
        }
    }

    /// Renders a single unit: body, symbol, name, selection border and ports.
    pub fn draw_node(&self, painter: &egui::Painter, node: &Node) {
        let zoom = self.canvas.zoom_factor;
        let rect = egui::Rect::from_min_size(
            self.to_screen(node.position),
            egui::vec2(node.size.0, node.size.1) * zoom,
        );

        painter.rect_filled(rect, 4.0 * zoom, egui::Color32::from_rgba_unmultiplied(60, 60, 64, 200));

        let icon_stroke = egui::Stroke::new((1.5 * zoom).max(1.0), CONNECTOR_COLOR);
        for path in icon_paths(node.icon) {
            let points: Vec<egui::Pos2> = path
                .points
                .iter()
                .map(|(u, v)| rect.min + egui::vec2(u * rect.width(), v * rect.height()))
                .collect();
            if path.closed {
                painter.add(egui::Shape::closed_line(points, icon_stroke));
            } else {
                painter.add(egui::Shape::line(points, icon_stroke));
            }
        }

        let name_size = (13.0 * zoom).clamp(6.0, 40.0);
        painter.text(
            egui::pos2(rect.center().x, rect.min.y - 4.0 * zoom),
            egui::Align2::CENTER_BOTTOM,
            &node.name,
            egui::FontId::proportional(name_size),
            NAME_COLOR,
        );

        if self.interaction.is_selected(node.id) {
            painter.rect_stroke(
                rect,
                4.0,
                egui::Stroke::new(2.0, CONNECTOR_COLOR),
                StrokeKind::Outside,
            );
        }

        let radius = PORT_RADIUS * zoom;
        let label_font = egui::FontId::proportional((11.0 * zoom).clamp(5.0, 32.0));
        for port in node.inputs.iter().chain(node.outputs.iter()) {
            let center = self.to_screen(node.port_position(port));
            let (fill, anchor, label_pos) = match port.direction {
                PortDirection::Input => (
                    INPUT_PORT_COLOR,
                    egui::Align2::RIGHT_CENTER,
                    center - egui::vec2(radius + 3.0, 0.0),
                ),
                PortDirection::Output => (
                    OUTPUT_PORT_COLOR,
                    egui::Align2::LEFT_CENTER,
                    center + egui::vec2(radius + 3.0, 0.0),
                ),
            };
            painter.circle_filled(center, radius, fill);
            painter.text(label_pos, anchor, &port.name, label_font.clone(), NAME_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_curvature_is_capped() {
        let [p0, p1, p2, p3] = connector_points((0.0, 0.0), (1000.0, 0.0));
        assert_eq!(p0, (0.0, 0.0));
        assert_eq!(p1, (100.0, 0.0));
        assert_eq!(p2, (900.0, 0.0));
        assert_eq!(p3, (1000.0, 0.0));
    }

    #[test]
    fn test_connector_curvature_short_chord() {
        let [_, p1, p2, _] = connector_points((0.0, 0.0), (30.0, 40.0));
        // chord is 50, handles are half of it
        assert_eq!(p1, (25.0, 0.0));
        assert_eq!(p2, (5.0, 40.0));
    }

    #[test]
    fn test_arrow_head_geometry() {
        let [tip, left, right] = arrow_head((0.0, 0.0), (100.0, 0.0)).unwrap();
        assert_eq!(tip, (100.0, 0.0));
        assert_eq!(left, (90.0, 5.0));
        assert_eq!(right, (90.0, -5.0));
        assert!(arrow_head((3.0, 3.0), (3.0, 3.0)).is_none());
    }

    #[test]
    fn test_icon_paths_stay_in_unit_square() {
        for icon in [
            UnitIcon::Valve,
            UnitIcon::Inlet,
            UnitIcon::Outlet,
            UnitIcon::Compressor,
            UnitIcon::Tank,
            UnitIcon::Pipe,
            UnitIcon::Splitter,
            UnitIcon::Mixer,
            UnitIcon::Generic,
        ] {
            let paths = icon_paths(icon);
            assert!(!paths.is_empty(), "{icon:?} has no strokes");
            for path in paths {
                assert!(path.points.len() >= 2);
                for (u, v) in path.points {
                    assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v));
                }
            }
        }
    }
}
