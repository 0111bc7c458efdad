//! Application state management structures.
//!
//! This module contains the state structures that track the editor's current
//! UI state: canvas navigation, pointer interactions, file operations and
//! dialogs, plus the [`FlowsheetApp`] that owns them.

use super::docking::{default_dock_state, DockTab};
use super::theme::Theme;
use super::undo::UndoHistory;
use crate::config::AppConfig;
use crate::error::{FlowsheetError, Result};
use crate::factory::NodeFactory;
use crate::types::*;
use eframe::egui;
use egui_dock::DockState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// State related to canvas navigation and display.
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasState {
    /// Screen position of the world origin
    #[serde(skip)]
    pub offset: egui::Vec2,
    /// Current zoom level (1.0 = normal, 2.0 = 2x zoom, 0.5 = 50% zoom)
    pub zoom_factor: f32,
    /// Whether the grid should be displayed on the canvas
    pub show_grid: bool,
    /// Whether `offset` has been anchored to the canvas rectangle yet
    #[serde(skip)]
    pub anchored: bool,
    /// Canvas rectangle from the last frame it was drawn
    #[serde(skip)]
    pub last_rect: Option<egui::Rect>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
            show_grid: true,
            anchored: false,
            last_rect: None,
        }
    }
}

/// A stream being drawn from a port towards the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingConnection {
    /// Port the stream starts from
    pub from: PortRef,
    /// Current preview end point in world coordinates
    pub end: (f32, f32),
}

/// A rubber-band selection rectangle in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    /// Corner where the press happened
    pub start: (f32, f32),
    /// Corner following the pointer
    pub end: (f32, f32),
}

/// State related to user interactions with nodes and canvas.
#[derive(Default)]
pub struct InteractionState {
    /// Selected nodes, in selection order
    pub selected_nodes: Vec<NodeId>,
    /// Node shown in the properties window
    pub properties_target: Option<NodeId>,
    /// Whether the properties window is open
    pub show_properties: bool,
    /// Node grabbed by the current drag
    pub dragging_node: Option<NodeId>,
    /// Pointer position minus the grabbed node's position, in world units
    pub drag_grab_offset: (f32, f32),
    /// Positions of every dragged node before the drag started (for undo)
    pub drag_original_positions: Vec<(NodeId, (f32, f32))>,
    /// Stream currently being drawn
    pub pending_connection: Option<PendingConnection>,
    /// Node and time of the last press on a node, for double-click detection
    pub last_click: Option<(NodeId, f64)>,
    /// Whether the user is currently panning the canvas
    pub is_panning: bool,
    /// Last pointer position during panning
    pub last_pan_pos: Option<egui::Pos2>,
    /// Active marquee selection
    pub marquee: Option<Marquee>,
    /// Whether the primary button went down on the canvas and is still held
    pub primary_gesture: bool,
    /// Whether the Add Unit popup is open
    pub add_unit_popup_open: bool,
    /// Name being edited in the properties window
    pub temp_node_name: String,
    /// Node whose name is loaded in `temp_node_name`
    pub temp_name_node: Option<NodeId>,
}

impl InteractionState {
    /// Clears the selection and the properties target.
    pub fn clear_selection(&mut self) {
        self.selected_nodes.clear();
        self.properties_target = None;
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected_nodes.contains(&id)
    }
}

/// Represents a pending save operation type.
#[derive(Debug)]
pub enum PendingSaveOperation {
    /// Save with a new file path (show file picker)
    SaveAs,
    /// Save to the existing file path
    Save,
}

/// Represents a pending load operation type.
#[derive(Debug)]
pub enum PendingLoadOperation {
    /// Load from a file (show file picker)
    Load,
}

/// Formats the flowsheet can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Scalable vector graphics
    Svg,
    /// Rasterised PNG image
    Png,
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// Save operation completed successfully with the given path
    SaveCompleted(PathBuf),
    /// Load operation completed successfully with path and content
    LoadCompleted(PathBuf, String),
    /// An export was written to the given path
    ExportCompleted(PathBuf),
    /// Operation failed
    OperationFailed(FlowsheetError),
}

/// Pending confirmation actions that may require user approval due to unsaved changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmAction {
    /// User is attempting to create a new document
    New,
    /// User is attempting to open a file
    Open,
}

/// State related to file operations and persistence.
pub struct FileState {
    /// Current file path for save/load operations
    pub current_path: Option<PathBuf>,
    /// Flag indicating if the flowsheet has unsaved changes
    pub has_unsaved_changes: bool,
    /// Save requested this frame
    pub pending_save_operation: Option<PendingSaveOperation>,
    /// Load requested this frame
    pub pending_load_operation: Option<PendingLoadOperation>,
    /// Export requested this frame
    pub pending_export: Option<ExportFormat>,
    /// Channel for receiving file operation results from async contexts
    pub file_operation_sender: Sender<FileOperationResult>,
    /// Receiving end polled once per frame
    pub file_operation_receiver: Receiver<FileOperationResult>,
    /// Whether to show an unsaved-changes confirmation dialog
    pub show_unsaved_dialog: bool,
    /// The action the user attempted that requires confirmation
    pub pending_confirm_action: Option<PendingConfirmAction>,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            current_path: None,
            has_unsaved_changes: false,
            pending_save_operation: None,
            pending_load_operation: None,
            pending_export: None,
            file_operation_sender: sender,
            file_operation_receiver: receiver,
            show_unsaved_dialog: false,
            pending_confirm_action: None,
        }
    }
}

/// Modal dialogs and message windows.
#[derive(Debug, Default)]
pub struct DialogState {
    /// Whether the exit confirmation is showing
    pub show_exit_dialog: bool,
    /// One-shot flag letting the next close request through after confirmation
    pub allow_close_on_next_request: bool,
    /// Last error reported by a file or export operation
    pub error_message: Option<String>,
    /// Informational message shown in a modal
    pub info_message: Option<String>,
}

/// The main application structure containing UI state and the flowsheet data.
///
/// Only UI preferences survive restarts; the document, selection and
/// history are dropped by [`FlowsheetApp::reset_non_ui_fields`].
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct FlowsheetApp {
    /// The flowsheet being edited
    pub flowsheet: Flowsheet,
    /// Constructors for the unit types offered by Add Unit
    #[serde(skip)]
    pub factory: NodeFactory,
    /// Startup configuration
    #[serde(skip)]
    pub config: AppConfig,
    /// Active colour theme
    pub theme: Theme,
    /// Theme applied to the egui context, if any yet
    #[serde(skip)]
    pub applied_theme: Option<Theme>,
    /// Whether fonts have been installed into the egui context
    #[serde(skip)]
    pub fonts_installed: bool,
    /// Docked tab layout
    pub dock_state: DockState<DockTab>,
    /// Canvas navigation and display state
    pub canvas: CanvasState,
    /// User interaction state
    #[serde(skip)]
    pub interaction: InteractionState,
    /// File operations state
    #[serde(skip)]
    pub file: FileState,
    /// Dialog state
    #[serde(skip)]
    pub dialogs: DialogState,
    /// Undo/redo history for tracking and reversing actions
    pub undo_history: UndoHistory,
}

impl Default for FlowsheetApp {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl FlowsheetApp {
    /// Creates an editor with an empty flowsheet laid out per `config`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            flowsheet: Flowsheet::new(),
            factory: NodeFactory::default(),
            theme: config.theme,
            applied_theme: None,
            fonts_installed: false,
            dock_state: default_dock_state(config.left_ratio, config.right_ratio),
            config,
            canvas: CanvasState::default(),
            interaction: InteractionState::default(),
            file: FileState::default(),
            dialogs: DialogState::default(),
            undo_history: UndoHistory::new(),
        }
    }

    /// Serializes the application state to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes application state from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Restores persisted UI preferences on top of a fresh editor.
    ///
    /// Falls back to a fresh editor when the stored state cannot be read.
    pub fn restore(stored: Option<String>, config: AppConfig) -> Self {
        let Some(json) = stored else {
            return Self::new(config);
        };
        match Self::from_json(&json) {
            Ok(mut app) => {
                app.config = config;
                app.reset_non_ui_fields();
                log::info!("Restored UI state");
                app
            }
            Err(err) => {
                log::warn!("Discarding stored UI state: {err}");
                Self::new(config)
            }
        }
    }

    /// Resets any non-UI related fields, so that when state is persisted
    /// only settings related to the UI are retained.
    pub fn reset_non_ui_fields(&mut self) {
        let config = self.config.clone();
        let theme = self.theme;
        let show_grid = self.canvas.show_grid;
        let zoom_factor = self.canvas.zoom_factor;
        let dock_state = std::mem::replace(&mut self.dock_state, DockState::new(Vec::new()));

        *self = Self::new(config);
        self.theme = theme;
        self.canvas.show_grid = show_grid;
        self.canvas.zoom_factor = zoom_factor;
        self.dock_state = dock_state;
    }

    /// Marks the document as modified.
    pub fn mark_dirty(&mut self) {
        self.file.has_unsaved_changes = true;
    }

    /// Shows `err` in the error window and logs it.
    pub fn report_error(&mut self, err: FlowsheetError) {
        log::error!("{err}");
        self.dialogs.error_message = Some(err.to_string());
    }
}
