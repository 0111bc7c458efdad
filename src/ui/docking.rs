//! Docked tab layout: the toolbar, the flowsheet canvas and the results panel.

use super::menu::help_marker;
use super::state::FlowsheetApp;
use crate::types::Flowsheet;
use eframe::egui;
use egui_dock::{DockState, NodeIndex, TabViewer};
use serde::{Deserialize, Serialize};

/// Tabs hosted by the dock area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DockTab {
    /// Unit palette and canvas options
    Toolbar,
    /// The flowsheet canvas
    FlowEditor,
    /// Per-unit parameter summary and stream list
    Results,
}

impl DockTab {
    /// Title shown on the tab.
    pub fn title(self) -> &'static str {
        match self {
            DockTab::Toolbar => "Toolbar",
            DockTab::FlowEditor => "Process Flow Editor",
            DockTab::Results => "Results",
        }
    }
}

/// Builds the initial three-column layout.
///
/// `left_ratio` is the toolbar's share of the whole width and `right_ratio`
/// the results column's share of what remains; the canvas takes the rest.
pub fn default_dock_state(left_ratio: f32, right_ratio: f32) -> DockState<DockTab> {
    let mut dock_state = DockState::new(vec![DockTab::Toolbar]);

    let [_toolbar, center] = dock_state.main_surface_mut().split_right(
        NodeIndex::root(),
        left_ratio,
        vec![DockTab::FlowEditor],
    );
    let _ = dock_state.main_surface_mut().split_right(
        center,
        1.0 - right_ratio,
        vec![DockTab::Results],
    );

    dock_state
}

/// Wrapper struct for egui_dock TabViewer implementation.
/// Holds mutable reference to FlowsheetApp for rendering tabs.
pub struct DockTabs<'a> {
    pub app: &'a mut FlowsheetApp,
}

impl<'a> TabViewer for DockTabs<'a> {
    type Tab = DockTab;

    fn title(&mut self, tab: &mut DockTab) -> egui::WidgetText {
        tab.title().into()
    }

    fn ui(&mut self, ui: &mut egui::Ui, tab: &mut DockTab) {
        match tab {
            DockTab::Toolbar => self.app.draw_toolbar_tab(ui),
            DockTab::FlowEditor => self.app.draw_canvas(ui),
            DockTab::Results => self.app.draw_results_tab(ui),
        }
    }

    fn closeable(&mut self, _tab: &mut DockTab) -> bool {
        false
    }
}

impl FlowsheetApp {
    /// Unit palette and canvas toggles.
    pub fn draw_toolbar_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let types = self.factory.types();
            let popup = ui.menu_button("Add Unit", |ui| {
                for unit_type in &types {
                    if ui.button(unit_type).clicked() {
                        if let Err(err) = self.add_unit(unit_type) {
                            self.report_error(err);
                        }
                        ui.close();
                    }
                }
            });
            self.interaction.add_unit_popup_open = popup.inner.is_some();
            help_marker(ui, "New units are placed in the middle of the visible canvas.");
        });

        ui.separator();
        ui.checkbox(&mut self.canvas.show_grid, "Show Grid");
        ui.horizontal(|ui| {
            if ui.button("Reset Zoom").clicked() {
                self.reset_zoom();
            }
            ui.label(format!("{:.0}%", self.canvas.zoom_factor * 100.0));
        });

        ui.separator();
        ui.weak("Drag from a port to another unit's port to connect them.");
        ui.weak("Double-click a unit to edit its properties.");
        ui.weak("Middle-drag pans, the wheel zooms, Alt snaps to the grid.");
    }

    /// Read-only summary of every unit's parameters and all streams.
    pub fn draw_results_tab(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if self.flowsheet.nodes.is_empty() {
                    ui.weak("The flowsheet is empty.");
                    return;
                }

                for node in &self.flowsheet.nodes {
                    egui::CollapsingHeader::new(&node.name)
                        .id_salt(node.id)
                        .default_open(true)
                        .show(ui, |ui| {
                            ui.weak(&node.unit_type);
                            for parameter in &node.parameters {
                                let marker = if parameter.specified { "spec" } else { "calc" };
                                ui.label(format!(
                                    "{}: {:.6} {} ({marker})",
                                    parameter.label, parameter.value, parameter.unit
                                ));
                            }
                        });
                }

                ui.separator();
                ui.strong("Streams");
                let streams = stream_labels(&self.flowsheet);
                if streams.is_empty() {
                    ui.weak("No connections.");
                }
                for stream in streams {
                    ui.label(stream);
                }
            });
    }

    /// Puts the tabs back to the configured layout.
    pub fn reset_layout(&mut self) {
        self.dock_state = default_dock_state(self.config.left_ratio, self.config.right_ratio);
    }
}

/// "Unit.Port → Unit.Port" for every connection, in connection order.
pub fn stream_labels(flowsheet: &Flowsheet) -> Vec<String> {
    flowsheet
        .connections
        .iter()
        .map(|c| {
            format!(
                "{} → {}",
                flowsheet.port_label(c.from),
                flowsheet.port_label(c.to)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::NodeFactory;
    use crate::types::PortRef;

    #[test]
    fn test_default_layout_has_all_tabs() {
        let dock = default_dock_state(0.2, 0.2);
        for tab in [DockTab::Toolbar, DockTab::FlowEditor, DockTab::Results] {
            assert!(dock.find_tab(&tab).is_some(), "missing {tab:?}");
        }
    }

    fn horizontal_fractions(dock: &DockState<DockTab>) -> Vec<f32> {
        dock.main_surface()
            .iter()
            .filter_map(|node| match node {
                egui_dock::Node::Horizontal(split) => Some(split.fraction),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_default_layout_split_fractions() {
        let dock = default_dock_state(0.25, 0.3);
        // Root split gives the toolbar its share, the inner one sizes the canvas
        assert_eq!(horizontal_fractions(&dock), vec![0.25, 1.0 - 0.3]);
    }

    #[test]
    fn test_reset_layout_uses_configured_ratios() {
        let mut app = FlowsheetApp::new(crate::config::AppConfig {
            left_ratio: 0.2,
            right_ratio: 0.4,
            ..Default::default()
        });
        app.dock_state = DockState::new(vec![DockTab::FlowEditor]);

        app.reset_layout();

        assert_eq!(horizontal_fractions(&app.dock_state), vec![0.2, 1.0 - 0.4]);
    }

    #[test]
    fn test_layout_survives_serde() {
        let dock = default_dock_state(0.25, 0.3);
        let json = serde_json::to_string(&dock).unwrap();
        let back: DockState<DockTab> = serde_json::from_str(&json).unwrap();
        assert!(back.find_tab(&DockTab::Results).is_some());
    }

    #[test]
    fn test_tab_titles() {
        assert_eq!(DockTab::FlowEditor.title(), "Process Flow Editor");
        assert_eq!(DockTab::Toolbar.title(), "Toolbar");
        assert_eq!(DockTab::Results.title(), "Results");
    }

    #[test]
    fn test_stream_labels() {
        let factory = NodeFactory::default();
        let mut sheet = Flowsheet::new();
        let inlet = sheet.add_node(factory.create("Inlet", "Feed", (0.0, 0.0)).unwrap());
        let valve = sheet.add_node(factory.create("Valve", "V-1", (200.0, 0.0)).unwrap());
        sheet
            .connect(PortRef::output(inlet, 0), PortRef::input(valve, 0))
            .unwrap();

        let labels = stream_labels(&sheet);
        assert_eq!(labels.len(), 1);
        assert!(labels[0].starts_with("Feed."));
        assert!(labels[0].contains(" → V-1."));
    }
}
