/// Reverting the last journaled rename or blurry-image move.
///
/// Undo is never automatic: a failed run leaves its partial state in place
/// and only an explicit `undo` replays the journal backwards.
use crate::error::{ToolError, ToolResult};
use crate::history::{FileMover, JournalAction, Operation, OperationLog};
use std::fmt;
use std::path::{Path, PathBuf};

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// The kind of run that was reverted.
    pub action: JournalAction,
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files that failed to restore, with the reason.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Files that were skipped because they were no longer where the run left them.
    pub skipped_files: Vec<(PathBuf, String)>,
}

impl UndoReport {
    fn new(action: JournalAction) -> Self {
        Self {
            action,
            restored_files: 0,
            failed_restores: Vec::new(),
            skipped_files: Vec::new(),
        }
    }

    /// Returns the total number of operations processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if the undo was completely successful.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

impl fmt::Display for UndoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.action {
            JournalAction::Rename => "rename",
            JournalAction::MoveBlurry => "blurry image move",
        };
        write!(f, "Undo of {} complete!\n  Restored: {}", what, self.restored_files)?;

        if !self.skipped_files.is_empty() {
            write!(f, "\n  Skipped: {}", self.skipped_files.len())?;
            for (path, reason) in &self.skipped_files {
                write!(f, "\n    - {}: {}", path.display(), reason)?;
            }
        }

        if !self.failed_restores.is_empty() {
            write!(f, "\n  Failed: {}", self.failed_restores.len())?;
            for (path, reason) in &self.failed_restores {
                write!(f, "\n    - {}: {}", path.display(), reason)?;
            }
            write!(f, "\nHistory file was NOT deleted due to failures.")?;
        }
        Ok(())
    }
}

/// Why a single restore did not happen.
enum RestoreFailure {
    /// The file is no longer where the run put it.
    Missing(PathBuf),
    /// The filesystem refused.
    Failed(PathBuf, String),
}

/// Manages undo operations.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent journaled run in `base_path`.
    ///
    /// Operations are reversed last-first. A file occupying an original
    /// location is first backed up as `<name>.bak.<timestamp>`. The journal is
    /// deleted only when every file was restored.
    ///
    /// # Errors
    ///
    /// Fails if `base_path` is not a directory, or if there is no readable
    /// journal in it.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dataset_tools::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// let result = UndoManager::undo(Path::new("/path/to/directory"));
    /// match result {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {}", e),
    /// }
    /// ```
    pub fn undo(base_path: &Path) -> ToolResult<UndoReport> {
        if !base_path.is_dir() {
            return Err(ToolError::invalid_directory(base_path));
        }

        let log = OperationLog::load(base_path)?.ok_or_else(|| ToolError::NothingToUndo {
            path: base_path.to_path_buf(),
        })?;
        tracing::info!(
            directory = %base_path.display(),
            action = ?log.action,
            operations = log.operations.len(),
            recorded_at = %log.timestamp,
            "undoing previous run"
        );

        let mut report = UndoReport::new(log.action);
        for operation in log.operations.iter().rev() {
            match Self::restore_file(operation) {
                Ok(()) => report.restored_files += 1,
                Err(RestoreFailure::Missing(path)) => report
                    .skipped_files
                    .push((path, "File not found at expected location".to_string())),
                Err(RestoreFailure::Failed(path, reason)) => {
                    tracing::warn!(file = %path.display(), %reason, "restore failed");
                    report.failed_restores.push((path, reason));
                }
            }
        }

        if report.is_complete_success()
            && let Err(e) = OperationLog::delete(base_path)
        {
            tracing::warn!(error = %e, "could not delete history file");
        }

        Ok(report)
    }

    fn restore_file(operation: &Operation) -> Result<(), RestoreFailure> {
        if !operation.new_path.exists() {
            return Err(RestoreFailure::Missing(operation.new_path.clone()));
        }

        if operation.original_path.exists() {
            let backup_path = Self::generate_backup_path(&operation.original_path);
            FileMover::move_file(&operation.original_path, &backup_path).map_err(|e| {
                RestoreFailure::Failed(
                    operation.original_path.clone(),
                    format!("Could not backup conflicting file: {}", e),
                )
            })?;
            tracing::debug!(backup = %backup_path.display(), "backed up conflicting file");
        }

        FileMover::move_file(&operation.new_path, &operation.original_path).map_err(|e| {
            RestoreFailure::Failed(
                operation.new_path.clone(),
                format!("Failed to restore file: {}", e),
            )
        })
    }

    /// Example: `cat.png` becomes `cat.png.bak.20251109-143052`.
    fn generate_backup_path(original_path: &Path) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let filename = original_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        original_path.with_file_name(format!("{}.bak.{}", filename, timestamp))
    }
}
