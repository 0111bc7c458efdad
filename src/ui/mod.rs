//! User interface components and rendering logic for the flowsheet editor.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main FlowsheetApp
//! - `canvas` - Canvas navigation and the press/drag/release state machine
//! - `rendering` - Drawing the grid, connectors and units
//! - `docking` - Tab layout, toolbar and results tabs
//! - `properties` - The per-unit properties window
//! - `menu` - Menu bar and modal dialogs
//! - `file_ops` - Save/load through native file dialogs
//! - `export` - SVG and PNG export
//! - `theme` - Colour themes and fonts
//! - `undo` - Undo/redo history

mod canvas;
mod docking;
mod export;
mod file_ops;
mod menu;
mod properties;
mod rendering;
mod state;
mod theme;
mod undo;

pub use canvas::snap_to_grid;
pub use docking::{default_dock_state, DockTab};
pub use export::{build_svg, render_png};
pub use menu::{help_marker, message_modal};
pub use state::FlowsheetApp;
pub use theme::{install_fonts, Theme};
pub use undo::{UndoAction, UndoHistory, UndoableFlowsheet};

use self::docking::DockTabs;
use self::state::PendingConfirmAction;
use eframe::egui;
use egui_dock::{DockArea, DockState};

/// Storage key of the persisted UI state.
pub const APP_STATE_KEY: &str = "app_state";

impl eframe::App for FlowsheetApp {
    /// Persist UI preferences between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string(APP_STATE_KEY, json);
            }
            Err(err) => {
                log::error!("Failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_style(ctx);

        self.handle_pending_operations(ctx);
        self.handle_shortcuts(ctx);

        // Intercept native window close requests (titlebar X)
        self.handle_close_request(ctx);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.draw_menu_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let dock_style = egui_dock::Style::from_egui(ctx.style().as_ref());
            let mut dock_state = std::mem::replace(&mut self.dock_state, DockState::new(Vec::new()));
            {
                let mut tabs = DockTabs { app: self };
                DockArea::new(&mut dock_state)
                    .style(dock_style)
                    .show_close_buttons(false)
                    .show_inside(ui, &mut tabs);
            }
            self.dock_state = dock_state;
        });

        self.draw_properties_window(ctx);
        self.draw_unsaved_dialog(ctx);
        self.draw_exit_dialog(ctx);
        self.draw_message_windows(ctx);
    }
}

impl FlowsheetApp {
    /// Applies the selected theme and, once, the configured fonts.
    fn apply_style(&mut self, ctx: &egui::Context) {
        if !self.fonts_installed {
            install_fonts(ctx, &self.config.fonts);
            self.fonts_installed = true;
        }
        if self.applied_theme != Some(self.theme) {
            ctx.set_visuals(self.theme.visuals());
            self.applied_theme = Some(self.theme);
        }
    }

    /// Allocates the canvas, feeds it this frame's input and paints it.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        // World origin starts at the canvas' top-left corner
        if !self.canvas.anchored {
            self.canvas.offset = response.rect.min.to_vec2();
            self.canvas.anchored = true;
        }
        self.canvas.last_rect = Some(response.rect);

        self.handle_canvas_panning(ui, &response);
        self.handle_canvas_zoom(ui, &response);
        self.handle_primary_pointer(ui, &response);

        let painter = painter.with_clip_rect(response.rect);
        self.render_flowsheet_elements(&painter, response.rect);
    }

    /// Keyboard shortcuts; ignored while a text field has focus.
    ///
    /// Uses the platform-standard Command (macOS) or Control (Windows/Linux) modifier.
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }

        let (delete, enter, escape, undo, redo, new, open, save, save_as, select_all) =
            ctx.input(|i| {
                let cmd = i.modifiers.command;
                let shift = i.modifiers.shift;
                (
                    i.key_pressed(egui::Key::Delete),
                    i.key_pressed(egui::Key::Enter),
                    i.key_pressed(egui::Key::Escape),
                    i.key_pressed(egui::Key::Z) && cmd && !shift,
                    (i.key_pressed(egui::Key::Z) && cmd && shift)
                        || (i.key_pressed(egui::Key::Y) && cmd),
                    i.key_pressed(egui::Key::N) && cmd,
                    i.key_pressed(egui::Key::O) && cmd,
                    i.key_pressed(egui::Key::S) && cmd && !shift,
                    i.key_pressed(egui::Key::S) && cmd && shift,
                    i.key_pressed(egui::Key::A) && cmd,
                )
            });

        if delete {
            self.delete_selected();
        }
        if enter {
            if let Some(target) = self.interaction.properties_target {
                self.open_properties(target);
            }
        }
        if escape {
            self.cancel_pending_connection();
        }
        if undo {
            self.perform_undo();
        } else if redo {
            self.perform_redo();
        }
        if new {
            self.request_confirmed(PendingConfirmAction::New);
        }
        if open {
            self.request_confirmed(PendingConfirmAction::Open);
        }
        if save_as {
            self.save_as_flowsheet();
        } else if save {
            self.save_flowsheet();
        }
        if select_all {
            self.select_all();
        }
    }

    /// Performs an undo operation.
    pub fn perform_undo(&mut self) {
        if let Some(action) = self.undo_history.pop_undo() {
            if let Some(redo_action) = self.flowsheet.apply_undo(&action) {
                self.undo_history.push_redo(redo_action);
                self.after_history_step();
            }
        }
    }

    /// Performs a redo operation.
    pub fn perform_redo(&mut self) {
        if let Some(action) = self.undo_history.pop_redo() {
            if let Some(undo_action) = self.flowsheet.apply_redo(&action) {
                // Don't call push_action here as it would clear the redo stack
                self.undo_history.push_undo(undo_action);
                self.after_history_step();
            }
        }
    }

    fn after_history_step(&mut self) {
        self.mark_dirty();
        self.interaction.selected_nodes.clear();
        self.interaction.temp_name_node = None;
        let target_gone = self
            .interaction
            .properties_target
            .is_some_and(|id| self.flowsheet.node(id).is_none());
        if target_gone {
            self.interaction.properties_target = None;
            self.interaction.show_properties = false;
        }
    }
}

#[cfg(test)]
mod tests;
