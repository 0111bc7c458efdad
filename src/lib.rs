//! # Flowsheet Editor
//!
//! A desktop editor for chemical-process flowsheets: unit operations (valves,
//! tanks, compressors, ...) placed on a zoomable canvas and connected by
//! streams running from outlet ports to inlet ports.
//!
//! ## Features
//! - Docked Toolbar / Process Flow Editor / Results layout
//! - Unit creation through a registry of constructors ([`factory::NodeFactory`])
//! - Selection, marquee selection, dragging with optional grid snapping
//! - Port-to-port stream creation with snapping and occupancy rules
//! - Per-unit properties window with editable parameters
//! - Undo/redo, JSON save/load, SVG and PNG export
//! - Colour themes and configurable fonts

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod constants;
pub mod error;
pub mod factory;
mod types;
mod ui;

// Re-export public types and functions
pub use types::*;
pub use ui::{
    build_svg, default_dock_state, help_marker, install_fonts, message_modal, render_png,
    snap_to_grid, DockTab, FlowsheetApp, Theme, UndoAction, UndoHistory, UndoableFlowsheet,
    APP_STATE_KEY,
};

use config::AppConfig;

/// Runs the flowsheet editor with the given configuration.
///
/// Must be called from within a tokio runtime so that file dialogs can run
/// in the background.
///
/// # Example
///
/// ```no_run
/// use flowsheet_editor::{config::AppConfig, run_app};
///
/// #[tokio::main]
/// async fn main() -> Result<(), eframe::Error> {
///     run_app(AppConfig::default())
/// }
/// ```
pub fn run_app(config: AppConfig) -> Result<(), eframe::Error> {
    let (width, height) = config.initial_window_size;
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title(config.window_title.clone())
            .with_inner_size([width, height]),
        ..Default::default()
    };
    let title = config.window_title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let stored = cc
                .storage
                .and_then(|storage| storage.get_string(APP_STATE_KEY));
            Ok(Box::new(FlowsheetApp::restore(stored, config)))
        }),
    )
}
