//! File operations for saving and loading flowsheets.
//!
//! Dialogs and disk access run on the tokio runtime; results come back to the
//! UI thread over a channel that is drained once per frame.

use super::state::{
    FileOperationResult, FlowsheetApp, PendingConfirmAction, PendingLoadOperation,
    PendingSaveOperation,
};
use crate::error::{FlowsheetError, Result};
use crate::types::Flowsheet;
use eframe::egui;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Default file name offered by the save dialog.
const DEFAULT_FILE_NAME: &str = "flowsheet.json";

impl FlowsheetApp {
    /// Handles pending file operations.
    ///
    /// Processes results of finished background operations, then starts any
    /// save, load or export requested since the last frame.
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.file.file_operation_receiver.try_recv() {
            self.apply_file_result(result);
        }

        if let Some(save_op) = self.file.pending_save_operation.take() {
            self.start_save(ctx, save_op);
        }

        if let Some(PendingLoadOperation::Load) = self.file.pending_load_operation.take() {
            let ctx = ctx.clone();
            let sender = self.file.file_operation_sender.clone();
            self.spawn_file_task(async move {
                if let Some(handle) = rfd::AsyncFileDialog::new()
                    .add_filter("Flowsheet", &["json"])
                    .pick_file()
                    .await
                {
                    let path = handle.path().to_path_buf();
                    let result = match std::fs::read_to_string(&path) {
                        Ok(json) => FileOperationResult::LoadCompleted(path, json),
                        Err(e) => FileOperationResult::OperationFailed(e.into()),
                    };
                    let _ = sender.send(result);
                } else {
                    log::debug!("Open dialog cancelled");
                }
                ctx.request_repaint();
            });
        }

        if let Some(format) = self.file.pending_export.take() {
            self.start_export(ctx, format);
        }
    }

    fn start_save(&mut self, ctx: &egui::Context, save_op: PendingSaveOperation) {
        let json = match self.flowsheet.to_json() {
            Ok(json) => json,
            Err(err) => {
                self.report_error(err);
                return;
            }
        };
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();

        match (save_op, self.file.current_path.clone()) {
            (PendingSaveOperation::Save, Some(path)) => {
                self.spawn_file_task(async move {
                    let _ = sender.send(write_document(path, &json));
                    ctx.request_repaint();
                });
            }
            _ => {
                self.spawn_file_task(async move {
                    if let Some(handle) = rfd::AsyncFileDialog::new()
                        .add_filter("Flowsheet", &["json"])
                        .set_file_name(DEFAULT_FILE_NAME)
                        .save_file()
                        .await
                    {
                        let _ = sender.send(write_document(handle.path().to_path_buf(), &json));
                    }
                    ctx.request_repaint();
                });
            }
        }
    }

    /// Runs `task` on the tokio runtime the app was started in.
    pub(crate) fn spawn_file_task<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(err) => self.report_error(FlowsheetError::Task(err.to_string())),
        }
    }

    /// Applies the outcome of a background file operation.
    pub fn apply_file_result(&mut self, result: FileOperationResult) {
        match result {
            FileOperationResult::SaveCompleted(path) => {
                log::info!("Saved flowsheet to {}", path.display());
                self.file.current_path = Some(path);
                self.file.has_unsaved_changes = false;
            }
            FileOperationResult::LoadCompleted(path, content) => {
                if let Err(err) = self.load_document(path, &content) {
                    self.report_error(err);
                }
            }
            FileOperationResult::ExportCompleted(path) => {
                log::info!("Exported flowsheet to {}", path.display());
                self.dialogs.info_message = Some(format!("Exported to {}", path.display()));
            }
            FileOperationResult::OperationFailed(error) => {
                self.report_error(error);
            }
        }
    }

    /// Replaces the document with `content` read from `path`.
    ///
    /// The current document is left untouched when `content` does not parse.
    pub fn load_document(&mut self, path: PathBuf, content: &str) -> Result<()> {
        let flowsheet = Flowsheet::from_json(content)?;
        log::info!(
            "Loaded {} units and {} streams from {}",
            flowsheet.nodes.len(),
            flowsheet.connections.len(),
            path.display()
        );
        self.replace_document(flowsheet);
        self.file.current_path = Some(path);
        Ok(())
    }

    fn replace_document(&mut self, flowsheet: Flowsheet) {
        self.flowsheet = flowsheet;
        self.file.has_unsaved_changes = false;
        self.interaction = Default::default();
        self.undo_history.clear();
    }

    /// Opens a file dialog to save the flowsheet with a new name.
    pub fn save_as_flowsheet(&mut self) {
        self.file.pending_save_operation = Some(PendingSaveOperation::SaveAs);
    }

    /// Saves the flowsheet to the current file path, or triggers "Save As" if no path is set.
    pub fn save_flowsheet(&mut self) {
        if self.file.current_path.is_some() {
            self.file.pending_save_operation = Some(PendingSaveOperation::Save);
        } else {
            self.save_as_flowsheet();
        }
    }

    /// Opens a file dialog to load a flowsheet from disk.
    pub fn load_flowsheet(&mut self) {
        self.file.pending_load_operation = Some(PendingLoadOperation::Load);
    }

    /// Creates a new empty flowsheet, resetting all document state.
    pub fn new_flowsheet(&mut self) {
        self.replace_document(Flowsheet::new());
        self.file.current_path = None;
        log::info!("Started a new flowsheet");
    }

    /// Runs `action` now, or asks first when there are unsaved changes.
    pub fn request_confirmed(&mut self, action: PendingConfirmAction) {
        if self.file.has_unsaved_changes {
            self.file.show_unsaved_dialog = true;
            self.file.pending_confirm_action = Some(action);
        } else {
            self.run_confirmed(action);
        }
    }

    /// Performs an action the user confirmed.
    pub fn run_confirmed(&mut self, action: PendingConfirmAction) {
        match action {
            PendingConfirmAction::New => self.new_flowsheet(),
            PendingConfirmAction::Open => self.load_flowsheet(),
        }
    }
}

fn write_document(path: PathBuf, json: &str) -> FileOperationResult {
    match write_file(&path, json.as_bytes()) {
        Ok(()) => FileOperationResult::SaveCompleted(path),
        Err(err) => FileOperationResult::OperationFailed(err),
    }
}

pub(crate) fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)?;
    Ok(())
}
