//! Export utilities: render the current flowsheet to SVG and PNG.

use super::rendering::{arrow_head, connector_points, icon_paths};
use super::state::{ExportFormat, FileOperationResult, FlowsheetApp};
use crate::constants::PORT_RADIUS;
use crate::error::{FlowsheetError, Result};
use crate::types::*;
use eframe::egui;
use std::fmt::Write as _;
use std::sync::Arc;

/// Empty space around the drawing.
const MARGIN: f32 = 40.0;
/// Room reserved above each unit for its name.
const NAME_HEIGHT: f32 = 18.0;
/// Room reserved beside each port for its label.
const PORT_LABEL_WIDTH: f32 = 60.0;

impl FlowsheetApp {
    /// Starts an export: builds the image now, then asks where to put it.
    pub fn start_export(&mut self, ctx: &egui::Context, format: ExportFormat) {
        let (svg, width, height) = build_svg(&self.flowsheet);
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();

        match format {
            ExportFormat::Svg => {
                self.spawn_file_task(async move {
                    if let Some(handle) = rfd::AsyncFileDialog::new()
                        .add_filter("SVG", &["svg"])
                        .set_file_name("flowsheet.svg")
                        .save_file()
                        .await
                    {
                        let path = handle.path().to_path_buf();
                        let result = match super::file_ops::write_file(&path, svg.as_bytes()) {
                            Ok(()) => FileOperationResult::ExportCompleted(path),
                            Err(e) => FileOperationResult::OperationFailed(e),
                        };
                        let _ = sender.send(result);
                    }
                    ctx.request_repaint();
                });
            }
            ExportFormat::Png => {
                let pixmap = match render_png(&svg, width, height) {
                    Ok(pixmap) => pixmap,
                    Err(err) => {
                        self.report_error(err);
                        return;
                    }
                };
                self.spawn_file_task(async move {
                    if let Some(handle) = rfd::AsyncFileDialog::new()
                        .add_filter("PNG", &["png"])
                        .set_file_name("flowsheet.png")
                        .save_file()
                        .await
                    {
                        let path = handle.path().to_path_buf();
                        let result = match pixmap.save_png(&path) {
                            Ok(()) => FileOperationResult::ExportCompleted(path),
                            Err(e) => FileOperationResult::OperationFailed(
                                FlowsheetError::Export(e.to_string()),
                            ),
                        };
                        let _ = sender.send(result);
                    }
                    ctx.request_repaint();
                });
            }
        }
    }
}

/// World-space bounding box of everything drawn for `flowsheet`.
fn drawing_bounds(flowsheet: &Flowsheet) -> Option<(f32, f32, f32, f32)> {
    let mut bounds: Option<(f32, f32, f32, f32)> = None;
    for node in &flowsheet.nodes {
        let (x, y) = node.position;
        let (w, h) = node.size;
        let left = if node.inputs.is_empty() { 0.0 } else { PORT_LABEL_WIDTH };
        let right = if node.outputs.is_empty() { 0.0 } else { PORT_LABEL_WIDTH };
        let rect = (
            x - PORT_RADIUS - left,
            y - NAME_HEIGHT,
            x + w + PORT_RADIUS + right,
            y + h + PORT_RADIUS,
        );
        bounds = Some(match bounds {
            None => rect,
            Some((a, b, c, d)) => (a.min(rect.0), b.min(rect.1), c.max(rect.2), d.max(rect.3)),
        });
    }
    bounds
}

fn hex(color: egui::Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

/// Builds an SVG document of the whole flowsheet. Returns (svg, width, height).
///
/// Connectors use the same curves and arrow heads as the canvas at 100% zoom.
pub fn build_svg(flowsheet: &Flowsheet) -> (String, u32, u32) {
    use super::rendering::{CONNECTOR_COLOR, INPUT_PORT_COLOR, NAME_COLOR, OUTPUT_PORT_COLOR};

    let (min_x, min_y, max_x, max_y) = drawing_bounds(flowsheet).unwrap_or((0.0, 0.0, 200.0, 100.0));
    let width = ((max_x - min_x) + 2.0 * MARGIN).ceil().max(1.0) as u32;
    let height = ((max_y - min_y) + 2.0 * MARGIN).ceil().max(1.0) as u32;

    let map = |p: (f32, f32)| (p.0 - min_x + MARGIN, p.1 - min_y + MARGIN);
    let stroke = hex(CONNECTOR_COLOR);

    let mut out = String::new();
    let _ = writeln!(
        out,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
    );
    let _ = writeln!(
        out,
        "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"#2b2b2b\" />"
    );

    // Connectors
    let _ = writeln!(out, "<g stroke=\"{stroke}\" stroke-width=\"2\" fill=\"none\">");
    let mut arrows = Vec::new();
    for connection in &flowsheet.connections {
        let (Some(start), Some(end)) = (
            flowsheet.port_world_position(connection.from),
            flowsheet.port_world_position(connection.to),
        ) else {
            continue;
        };
        let [p0, p1, p2, p3] = connector_points(start, end).map(map);
        let _ = writeln!(
            out,
            "  <path d=\"M{:.1},{:.1} C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" />",
            p0.0, p0.1, p1.0, p1.1, p2.0, p2.1, p3.0, p3.1
        );
        if let Some(arrow) = arrow_head(start, end) {
            arrows.push(arrow.map(map));
        }
    }
    let _ = writeln!(out, "</g>");

    // Units
    for node in &flowsheet.nodes {
        let (x, y) = map(node.position);
        let (w, h) = node.size;
        let _ = writeln!(out, "<g>");
        let _ = writeln!(
            out,
            "  <rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{w:.1}\" height=\"{h:.1}\" rx=\"4\" ry=\"4\" fill=\"#3c3c40\" />"
        );
        for path in icon_paths(node.icon) {
            let points: Vec<String> = path
                .points
                .iter()
                .map(|(u, v)| format!("{:.1},{:.1}", x + u * w, y + v * h))
                .collect();
            let element = if path.closed { "polygon" } else { "polyline" };
            let _ = writeln!(
                out,
                "  <{element} points=\"{}\" fill=\"none\" stroke=\"{stroke}\" stroke-width=\"1.5\" />",
                points.join(" ")
            );
        }
        let _ = writeln!(
            out,
            "  <text x=\"{:.1}\" y=\"{:.1}\" font-size=\"13\" fill=\"{}\" text-anchor=\"middle\">{}</text>",
            x + w / 2.0,
            y - 4.0,
            hex(NAME_COLOR),
            escape_xml(&node.name)
        );
        for port in node.inputs.iter().chain(node.outputs.iter()) {
            let (px, py) = map(node.port_position(port));
            let (fill, anchor, label_x) = match port.direction {
                PortDirection::Input => (INPUT_PORT_COLOR, "end", px - PORT_RADIUS - 3.0),
                PortDirection::Output => (OUTPUT_PORT_COLOR, "start", px + PORT_RADIUS + 3.0),
            };
            let _ = writeln!(
                out,
                "  <circle cx=\"{px:.1}\" cy=\"{py:.1}\" r=\"{PORT_RADIUS}\" fill=\"{}\" />",
                hex(fill)
            );
            let _ = writeln!(
                out,
                "  <text x=\"{label_x:.1}\" y=\"{py:.1}\" font-size=\"11\" fill=\"{}\" text-anchor=\"{anchor}\" dominant-baseline=\"central\">{}</text>",
                hex(NAME_COLOR),
                escape_xml(&port.name)
            );
        }
        let _ = writeln!(out, "</g>");
    }

    // Arrow heads go last so unit bodies never hide them
    let _ = writeln!(out, "<g fill=\"{stroke}\">");
    for [tip, left, right] in arrows {
        let _ = writeln!(
            out,
            "  <polygon points=\"{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" />",
            tip.0, tip.1, left.0, left.1, right.0, right.1
        );
    }
    let _ = writeln!(out, "</g>");
    let _ = writeln!(out, "</svg>");

    (out, width, height)
}

/// Rasterises an SVG document at 1:1 scale.
pub fn render_png(svg: &str, width: u32, height: u32) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    opt.fontdb = Arc::new(db);

    let tree = usvg::Tree::from_data(svg.as_bytes(), &opt)
        .map_err(|e| FlowsheetError::Export(format!("Failed to parse SVG: {e}")))?;

    let mut pixmap = tiny_skia::Pixmap::new(width.max(1), height.max(1)).ok_or_else(|| {
        FlowsheetError::Export(format!("Failed to create pixmap {width}x{height}"))
    })?;
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
    Ok(pixmap)
}

fn escape_xml(input: &str) -> String {
    let mut s = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => s.push_str("&amp;"),
            '<' => s.push_str("&lt;"),
            '>' => s.push_str("&gt;"),
            '"' => s.push_str("&quot;"),
            '\'' => s.push_str("&apos;"),
            _ => s.push(ch),
        }
    }
    s
}
