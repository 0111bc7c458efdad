//! Main menu bar and the modal dialogs it can open.

use super::state::{ExportFormat, FlowsheetApp, PendingConfirmAction};
use super::theme::Theme;
use eframe::egui;

/// Text shown by the exit confirmation.
pub const EXIT_PROMPT: &str =
    "You are about to leave the simulation environment. Would you still like to exit?";

/// Small "(?)" label that explains `text` on hover.
pub fn help_marker(ui: &mut egui::Ui, text: &str) {
    ui.weak("(?)").on_hover_text(text);
}

/// Centered modal with a single OK button. Clears `message` once dismissed.
pub fn message_modal(ctx: &egui::Context, id: &str, title: &str, message: &mut Option<String>) {
    let Some(text) = message.as_deref() else {
        return;
    };
    let mut dismissed = false;
    let modal = egui::Modal::new(egui::Id::new(id)).show(ctx, |ui| {
        ui.set_max_width(420.0);
        ui.heading(title);
        ui.add_space(4.0);
        ui.label(text);
        ui.add_space(8.0);
        if ui.button("OK").clicked() {
            dismissed = true;
        }
    });
    if dismissed || modal.should_close() {
        *message = None;
    }
}

fn menu_item(ui: &mut egui::Ui, label: &str, shortcut: &str, enabled: bool) -> bool {
    ui.add_enabled(enabled, egui::Button::new(label).shortcut_text(shortcut))
        .clicked()
}

impl FlowsheetApp {
    /// Renders the File / Edit / Window menus.
    pub fn draw_menu_bar(&mut self, ui: &mut egui::Ui) {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if menu_item(ui, "New", "Ctrl+N", true) {
                    self.request_confirmed(PendingConfirmAction::New);
                    ui.close();
                }
                if menu_item(ui, "Open…", "Ctrl+O", true) {
                    self.request_confirmed(PendingConfirmAction::Open);
                    ui.close();
                }
                if menu_item(ui, "Save", "Ctrl+S", true) {
                    self.save_flowsheet();
                    ui.close();
                }
                if menu_item(ui, "Save As…", "Ctrl+Shift+S", true) {
                    self.save_as_flowsheet();
                    ui.close();
                }
                ui.separator();
                let has_units = !self.flowsheet.nodes.is_empty();
                if menu_item(ui, "Export SVG…", "", has_units) {
                    self.file.pending_export = Some(ExportFormat::Svg);
                    ui.close();
                }
                if menu_item(ui, "Export PNG…", "", has_units) {
                    self.file.pending_export = Some(ExportFormat::Png);
                    ui.close();
                }
                ui.separator();
                if ui.button("Exit").clicked() {
                    self.dialogs.show_exit_dialog = true;
                    ui.close();
                }
            });

            ui.menu_button("Edit", |ui| {
                if menu_item(ui, "Undo", "Ctrl+Z", self.undo_history.can_undo()) {
                    self.perform_undo();
                    ui.close();
                }
                if menu_item(ui, "Redo", "Ctrl+Shift+Z", self.undo_history.can_redo()) {
                    self.perform_redo();
                    ui.close();
                }
                ui.separator();
                let has_selection = !self.interaction.selected_nodes.is_empty();
                if menu_item(ui, "Delete Selected", "Del", has_selection) {
                    self.delete_selected();
                    ui.close();
                }
                if menu_item(ui, "Select All", "Ctrl+A", true) {
                    self.select_all();
                    ui.close();
                }
            });

            ui.menu_button("Window", |ui| {
                ui.menu_button("Theme", |ui| {
                    for theme in Theme::ALL {
                        if ui
                            .radio(self.theme == theme, theme.name())
                            .clicked()
                        {
                            self.theme = theme;
                            log::info!("Switched theme to {}", theme.name());
                            ui.close();
                        }
                    }
                });
                ui.checkbox(&mut self.canvas.show_grid, "Show Grid");
                if ui.button("Reset Zoom").clicked() {
                    self.reset_zoom();
                    ui.close();
                }
                if ui.button("Reset Layout").clicked() {
                    self.reset_layout();
                    ui.close();
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let name = self
                    .file
                    .current_path
                    .as_ref()
                    .and_then(|p| p.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "Untitled".to_string());
                let marker = if self.file.has_unsaved_changes { "*" } else { "" };
                ui.weak(format!("{name}{marker}"));
            });
        });
    }

    /// Confirmation shown before the application closes.
    pub fn draw_exit_dialog(&mut self, ctx: &egui::Context) {
        if !self.dialogs.show_exit_dialog {
            return;
        }
        let mut confirmed = false;
        let mut cancelled = false;
        let modal = egui::Modal::new(egui::Id::new("exit_dialog")).show(ctx, |ui| {
            ui.set_max_width(360.0);
            ui.label(EXIT_PROMPT);
            if let Some(warning) = self.exit_warning() {
                ui.add_space(4.0);
                ui.colored_label(ui.visuals().warn_fg_color, warning);
            }
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Yes").clicked() {
                    confirmed = true;
                }
                if ui.button("No").clicked() {
                    cancelled = true;
                }
            });
        });

        if confirmed {
            self.confirm_exit(ctx);
        } else if cancelled || modal.should_close() {
            self.dialogs.show_exit_dialog = false;
        }
    }

    /// Extra line shown by the exit confirmation when work would be lost.
    pub fn exit_warning(&self) -> Option<&'static str> {
        self.file
            .has_unsaved_changes
            .then_some("Unsaved changes will be lost.")
    }

    /// Closes the viewport, letting the resulting close request through.
    pub fn confirm_exit(&mut self, ctx: &egui::Context) {
        self.dialogs.show_exit_dialog = false;
        self.dialogs.allow_close_on_next_request = true;
        log::info!("Exit confirmed");
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    /// Turns a native close request into the exit confirmation, unless the
    /// user already confirmed.
    pub fn handle_close_request(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        if self.dialogs.allow_close_on_next_request {
            self.dialogs.allow_close_on_next_request = false;
        } else {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.dialogs.show_exit_dialog = true;
        }
    }

    /// Unsaved changes confirmation for New and Open.
    pub fn draw_unsaved_dialog(&mut self, ctx: &egui::Context) {
        if !self.file.show_unsaved_dialog {
            return;
        }
        let Some(action) = self.file.pending_confirm_action else {
            self.file.show_unsaved_dialog = false;
            return;
        };
        let (title, confirm_label) = match action {
            PendingConfirmAction::New => ("Unsaved changes: create new?", "Discard and Create New"),
            PendingConfirmAction::Open => ("Unsaved changes: open file?", "Discard and Open"),
        };

        let mut choice = None;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("You have unsaved changes. Are you sure you want to continue?");
                ui.horizontal(|ui| {
                    if ui.button(confirm_label).clicked() {
                        choice = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        choice = Some(false);
                    }
                });
            });

        if let Some(confirmed) = choice {
            self.file.show_unsaved_dialog = false;
            self.file.pending_confirm_action = None;
            if confirmed {
                self.run_confirmed(action);
            }
        }
    }

    /// Error and information messages.
    pub fn draw_message_windows(&mut self, ctx: &egui::Context) {
        if let Some(error) = self.dialogs.error_message.clone() {
            let mut open = true;
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .open(&mut open)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.colored_label(ui.visuals().error_fg_color, error);
                    if ui.button("Close").clicked() {
                        self.dialogs.error_message = None;
                    }
                });
            if !open {
                self.dialogs.error_message = None;
            }
        }

        message_modal(ctx, "info_modal", "Information", &mut self.dialogs.info_message);
    }
}
