//! Canvas interaction and navigation functionality.
//!
//! This module handles canvas panning, zooming, the press/drag/release state
//! machine for selecting, moving and connecting units, and the coordinate
//! transformations between screen and world space.
//!
//! The state machine itself ([`FlowsheetApp::press`], [`FlowsheetApp::drag_to`],
//! [`FlowsheetApp::release`]) works purely in world coordinates so it can be
//! driven without an egui frame.

use super::state::{FlowsheetApp, Marquee, PendingConnection};
use super::undo::UndoAction;
use crate::constants::{
    CONNECTION_RELEASE_SNAP, DOUBLE_CLICK_SECONDS, GRID_SIZE, MAX_ZOOM, MIN_PORT_SNAP_DISTANCE,
    MIN_ZOOM, ZOOM_STEP,
};
use crate::error::Result;
use crate::types::*;
use eframe::egui;

/// Rounds a world position to the nearest grid intersection.
pub fn snap_to_grid(pos: (f32, f32)) -> (f32, f32) {
    (
        (pos.0 / GRID_SIZE).round() * GRID_SIZE,
        (pos.1 / GRID_SIZE).round() * GRID_SIZE,
    )
}

impl FlowsheetApp {
    /// Converts screen coordinates to world coordinates accounting for zoom and pan.
    pub fn screen_to_world(&self, screen_pos: egui::Pos2) -> egui::Pos2 {
        (screen_pos - self.canvas.offset) / self.canvas.zoom_factor
    }

    /// Converts world coordinates to screen coordinates accounting for zoom and pan.
    pub fn world_to_screen(&self, world_pos: egui::Pos2) -> egui::Pos2 {
        world_pos * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Handles middle-button panning.
    pub fn handle_canvas_panning(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (middle_down, pointer) = ui.input(|i| (i.pointer.middle_down(), i.pointer.latest_pos()));

        if middle_down {
            if let Some(current_pos) = pointer {
                if !self.interaction.is_panning {
                    if response.rect.contains(current_pos) {
                        self.interaction.is_panning = true;
                        self.interaction.last_pan_pos = Some(current_pos);
                    }
                } else if let Some(last_pos) = self.interaction.last_pan_pos {
                    self.canvas.offset += current_pos - last_pos;
                    self.interaction.last_pan_pos = Some(current_pos);
                }
            }
        } else {
            self.interaction.is_panning = false;
            self.interaction.last_pan_pos = None;
        }
    }

    /// Handles scroll wheel zooming around the cursor.
    pub fn handle_canvas_zoom(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let scroll_delta = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll_delta == 0.0 {
            return;
        }
        let Some(mouse_pos) = ui.input(|i| i.pointer.hover_pos()) else {
            return;
        };
        if !response.rect.contains(mouse_pos) {
            return;
        }
        let step = if scroll_delta > 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
        self.zoom_at(mouse_pos, self.canvas.zoom_factor + step);
    }

    /// Sets the zoom level while keeping the world point under `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: egui::Pos2, zoom: f32) {
        let world_anchor = self.screen_to_world(anchor);
        let old_zoom = self.canvas.zoom_factor;
        self.canvas.zoom_factor = zoom.clamp(MIN_ZOOM, MAX_ZOOM);

        if (self.canvas.zoom_factor - old_zoom).abs() > f32::EPSILON {
            let moved_to = self.world_to_screen(world_anchor);
            self.canvas.offset += anchor - moved_to;
        }
    }

    /// Restores 100% zoom around the centre of the canvas.
    pub fn reset_zoom(&mut self) {
        let anchor = self
            .canvas
            .last_rect
            .map_or(egui::Pos2::ZERO, |rect| rect.center());
        self.zoom_at(anchor, 1.0);
    }

    /// Feeds primary-button input for this frame into the state machine.
    ///
    /// A gesture only starts when the press lands on the visible canvas, so
    /// clicks on windows and popups above it are ignored.
    pub fn handle_primary_pointer(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (pressed, down, released, pointer, modifiers, time) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.latest_pos(),
                i.modifiers,
                i.time,
            )
        });
        let Some(pos) = pointer else {
            return;
        };
        let world = self.screen_to_world(pos);
        let world = (world.x, world.y);

        if pressed {
            if response.rect.contains(pos) && response.contains_pointer() {
                self.interaction.primary_gesture = true;
                self.press(world, modifiers, time);
            }
        } else if down && self.interaction.primary_gesture {
            self.drag_to(world, modifiers.alt);
        }

        if released && self.interaction.primary_gesture {
            self.interaction.primary_gesture = false;
            self.release();
        }
    }

    /// Primary button went down at `world`.
    pub fn press(&mut self, world: (f32, f32), modifiers: egui::Modifiers, time: f64) {
        if self.interaction.add_unit_popup_open {
            return;
        }
        let additive = modifiers.ctrl || modifiers.command || modifiers.shift;

        let Some(node_id) = self.flowsheet.node_at(world) else {
            self.interaction.last_click = None;
            if additive {
                self.interaction.marquee = Some(Marquee {
                    start: world,
                    end: world,
                });
            } else {
                self.interaction.clear_selection();
            }
            return;
        };

        let double_click = matches!(
            self.interaction.last_click,
            Some((last, at)) if last == node_id && time - at < DOUBLE_CLICK_SECONDS
        );
        if double_click {
            self.interaction.last_click = None;
            self.open_properties(node_id);
            return;
        }
        self.interaction.last_click = Some((node_id, time));

        let Some(node) = self.flowsheet.node(node_id) else {
            return;
        };
        if let Some((direction, index)) =
            node.nearest_port(world, MIN_PORT_SNAP_DISTANCE, PortFilter::Any)
        {
            self.interaction.pending_connection = Some(PendingConnection {
                from: PortRef {
                    node: node_id,
                    direction,
                    index,
                },
                end: world,
            });
            return;
        }
        let grab = (world.0 - node.position.0, world.1 - node.position.1);

        if additive {
            if !self.interaction.is_selected(node_id) {
                self.interaction.selected_nodes.push(node_id);
            }
        } else if !self.interaction.is_selected(node_id) {
            self.interaction.selected_nodes.clear();
            self.interaction.selected_nodes.push(node_id);
        }
        self.interaction.properties_target = Some(node_id);

        self.interaction.dragging_node = Some(node_id);
        self.interaction.drag_grab_offset = grab;
        self.interaction.drag_original_positions = self
            .interaction
            .selected_nodes
            .iter()
            .filter_map(|id| self.flowsheet.node(*id).map(|n| (*id, n.position)))
            .collect();
    }

    /// Pointer moved to `world` with the primary button held.
    ///
    /// With `snap` set the grabbed node lands on the grid and the rest of
    /// the selection follows by the same delta.
    pub fn drag_to(&mut self, world: (f32, f32), snap: bool) {
        if let Some(pending) = &mut self.interaction.pending_connection {
            pending.end = world;
            return;
        }
        if let Some(marquee) = &mut self.interaction.marquee {
            marquee.end = world;
            return;
        }
        let Some(grabbed) = self
            .interaction
            .dragging_node
            .and_then(|id| self.flowsheet.node(id))
        else {
            return;
        };

        let grab = self.interaction.drag_grab_offset;
        let mut target = (world.0 - grab.0, world.1 - grab.1);
        if snap {
            target = snap_to_grid(target);
        }
        let delta = (target.0 - grabbed.position.0, target.1 - grabbed.position.1);
        if delta == (0.0, 0.0) {
            return;
        }

        for (id, _) in &self.interaction.drag_original_positions {
            if let Some(node) = self.flowsheet.node_mut(*id) {
                node.position.0 += delta.0;
                node.position.1 += delta.1;
            }
        }
    }

    /// Primary button released: finish whatever gesture is active.
    pub fn release(&mut self) {
        if let Some(pending) = self.interaction.pending_connection.take() {
            self.finalize_connection(pending);
        }

        if let Some(marquee) = self.interaction.marquee.take() {
            for id in self.flowsheet.nodes_in_rect(marquee.start, marquee.end) {
                if !self.interaction.is_selected(id) {
                    self.interaction.selected_nodes.push(id);
                }
            }
        }

        if self.interaction.dragging_node.take().is_some() {
            let originals = std::mem::take(&mut self.interaction.drag_original_positions);
            let moves: Vec<_> = originals
                .into_iter()
                .filter_map(|(id, old)| {
                    let new = self.flowsheet.node(id)?.position;
                    (new != old).then_some((id, old, new))
                })
                .collect();
            if !moves.is_empty() {
                self.undo_history
                    .push_action(UndoAction::NodesMoved { moves });
                self.mark_dirty();
            }
        }
    }

    /// Drops the stream being drawn, if any.
    pub fn cancel_pending_connection(&mut self) {
        if self.interaction.pending_connection.take().is_some() {
            log::debug!("Connection cancelled");
        }
    }

    /// Connects the pending stream to the nearest compatible port under its end.
    ///
    /// Rule violations (occupied port, same direction, self loop) leave the
    /// flowsheet untouched.
    fn finalize_connection(&mut self, pending: PendingConnection) {
        let wanted = PortFilter::only(pending.from.direction.opposite());
        let target = self
            .flowsheet
            .nodes
            .iter()
            .filter(|node| node.id != pending.from.node)
            .find_map(|node| {
                node.nearest_port(pending.end, CONNECTION_RELEASE_SNAP, wanted)
                    .map(|(direction, index)| PortRef {
                        node: node.id,
                        direction,
                        index,
                    })
            });
        let Some(target) = target else {
            return;
        };

        match self.flowsheet.connect(pending.from, target) {
            Ok(index) => {
                let connection = self.flowsheet.connections[index];
                log::info!(
                    "Connected {} -> {}",
                    self.flowsheet.port_label(connection.from),
                    self.flowsheet.port_label(connection.to)
                );
                self.undo_history
                    .push_action(UndoAction::ConnectionCreated { connection });
                self.mark_dirty();
            }
            Err(err) => log::debug!("Connection rejected: {err}"),
        }
    }

    /// World position at the centre of the visible canvas.
    pub fn visible_world_center(&self) -> (f32, f32) {
        let center = self
            .canvas
            .last_rect
            .map_or(egui::Pos2::ZERO, |rect| self.screen_to_world(rect.center()));
        (center.x, center.y)
    }

    /// Adds a unit of `unit_type` centred in the visible canvas and selects it.
    pub fn add_unit(&mut self, unit_type: &str) -> Result<NodeId> {
        let name = self.flowsheet.next_default_name(unit_type);
        let (cx, cy) = self.visible_world_center();
        let mut node = self.factory.create(unit_type, &name, (cx, cy))?;
        node.position = (cx - node.size.0 * 0.5, cy - node.size.1 * 0.5);

        let id = self.flowsheet.add_node(node);
        log::info!("Added {unit_type} '{name}'");
        self.undo_history
            .push_action(UndoAction::NodesCreated { node_ids: vec![id] });

        self.interaction.selected_nodes = vec![id];
        self.interaction.properties_target = Some(id);
        self.mark_dirty();
        Ok(id)
    }

    /// Deletes the selected units together with their streams.
    pub fn delete_selected(&mut self) {
        if self.interaction.selected_nodes.is_empty() {
            return;
        }
        let ids = std::mem::take(&mut self.interaction.selected_nodes);
        let removed = self.flowsheet.remove_nodes(&ids);

        if self
            .interaction
            .properties_target
            .is_some_and(|target| ids.contains(&target))
        {
            self.interaction.properties_target = None;
            self.interaction.show_properties = false;
        }
        if removed.is_empty() {
            return;
        }

        log::info!(
            "Deleted {} unit(s) and {} connection(s)",
            removed.nodes.len(),
            removed.connections.len()
        );
        self.undo_history
            .push_action(UndoAction::NodesDeleted { removed });
        self.mark_dirty();
    }

    /// Selects every unit.
    pub fn select_all(&mut self) {
        self.interaction.selected_nodes = self.flowsheet.nodes.iter().map(|n| n.id).collect();
    }
}
