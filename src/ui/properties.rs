//! Floating properties window for the unit picked by double-click.

use super::state::FlowsheetApp;
use super::undo::UndoAction;
use crate::types::{NodeId, Parameter};
use eframe::egui;

impl FlowsheetApp {
    /// Opens the properties window for `node_id`.
    pub fn open_properties(&mut self, node_id: NodeId) {
        self.commit_pending_name();
        self.interaction.properties_target = Some(node_id);
        self.interaction.show_properties = true;
        self.load_temp_name(node_id);
    }

    fn load_temp_name(&mut self, node_id: NodeId) {
        if let Some(node) = self.flowsheet.node(node_id) {
            self.interaction.temp_node_name = node.name.clone();
            self.interaction.temp_name_node = Some(node_id);
        }
    }

    /// Renders the properties window while it is open.
    ///
    /// Specified parameters are editable; calculated ones are shown read-only.
    /// Every committed change is recorded for undo.
    pub fn draw_properties_window(&mut self, ctx: &egui::Context) {
        if !self.interaction.show_properties {
            return;
        }
        let Some(node_id) = self.interaction.properties_target else {
            self.interaction.show_properties = false;
            return;
        };
        if self.interaction.temp_name_node != Some(node_id) {
            self.commit_pending_name();
            self.load_temp_name(node_id);
        }
        let Some(node) = self.flowsheet.node(node_id) else {
            self.interaction.show_properties = false;
            return;
        };

        let title = format!("{} Properties", node.name);
        let unit_type = node.unit_type.clone();
        let original = node.parameters.clone();
        let mut parameters = original.clone();
        let mut open = true;
        let mut commit_name = false;

        egui::Window::new(title)
            .id(egui::Id::new("properties_window"))
            .open(&mut open)
            .resizable(true)
            .default_width(380.0)
            .show(ctx, |ui| {
                ui.label(format!("Unit type: {unit_type}"));
                ui.horizontal(|ui| {
                    ui.label("Name");
                    let response = ui.text_edit_singleline(&mut self.interaction.temp_node_name);
                    if response.lost_focus() {
                        commit_name = true;
                    }
                });

                egui::CollapsingHeader::new("Properties")
                    .default_open(true)
                    .show(ui, |ui| {
                        egui::Grid::new("properties_grid")
                            .num_columns(3)
                            .striped(true)
                            .show(ui, |ui| {
                                for parameter in parameters.iter_mut() {
                                    ui.checkbox(&mut parameter.specified, &parameter.label)
                                        .on_hover_text("Checked values are specified, unchecked ones are calculated");
                                    if parameter.specified {
                                        ui.add(
                                            egui::DragValue::new(&mut parameter.value)
                                                .speed(0.01)
                                                .min_decimals(6)
                                                .max_decimals(6),
                                        );
                                    } else {
                                        ui.label(format!("{:.6}", parameter.value));
                                    }
                                    ui.label(&parameter.unit);
                                    ui.end_row();
                                }
                            });
                    });
            });

        self.apply_parameter_edits(node_id, &original, parameters);

        if commit_name || !open {
            self.commit_name_edit(node_id);
        }
        if !open {
            self.interaction.show_properties = false;
        }
    }

    /// Writes every parameter of `edited` that differs from `original` back to
    /// the node, recording one undo entry per run of edits to the same parameter.
    pub fn apply_parameter_edits(
        &mut self,
        node_id: NodeId,
        original: &[Parameter],
        edited: Vec<Parameter>,
    ) {
        for (index, (old, new)) in original.iter().zip(edited).enumerate() {
            if *old == new {
                continue;
            }
            let Some(slot) = self
                .flowsheet
                .node_mut(node_id)
                .and_then(|node| node.parameters.get_mut(index))
            else {
                continue;
            };
            *slot = new.clone();
            self.undo_history.push_coalesced(UndoAction::ParameterChanged {
                node_id,
                index,
                old: old.clone(),
                new,
            });
            self.mark_dirty();
        }
    }

    /// Commits the name being edited for the previously loaded node, if any.
    fn commit_pending_name(&mut self) {
        if let Some(previous) = self.interaction.temp_name_node {
            self.commit_name_edit(previous);
        }
    }

    /// Applies the name typed in the properties window.
    ///
    /// Blank names are rejected and the field reverts to the current name.
    pub fn commit_name_edit(&mut self, node_id: NodeId) {
        let new_name = self.interaction.temp_node_name.trim().to_string();
        let Some(node) = self.flowsheet.node_mut(node_id) else {
            return;
        };
        if new_name.is_empty() {
            self.interaction.temp_node_name = node.name.clone();
            return;
        }
        if node.name != new_name {
            let old_name = std::mem::replace(&mut node.name, new_name.clone());
            self.undo_history.push_action(UndoAction::NodeRenamed {
                node_id,
                old_name,
                new_name: new_name.clone(),
            });
            self.interaction.temp_node_name = new_name;
            self.mark_dirty();
        }
    }
}
