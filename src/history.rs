/// Journal of the renames and moves performed by the last mutating run.
///
/// The renamer and the blur filter record each file they touch so that
/// `undo` can put them back. The journal lives in the directory the run
/// operated on and is overwritten by the next run that changes anything.
use crate::error::{ToolError, ToolResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the journal inside the operated directory.
pub const HISTORY_FILE_NAME: &str = ".dataset-tools-history.json";

/// The kind of run a journal records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalAction {
    /// Files renamed in place by the renamer.
    Rename,
    /// Images moved into the blurry directory.
    MoveBlurry,
}

/// A single recorded rename or move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Where the file was before the run.
    pub original_path: PathBuf,
    /// Where the run put it.
    pub new_path: PathBuf,
}

/// All operations of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationLog {
    /// RFC 3339 timestamp of the run.
    pub timestamp: String,
    /// The directory the run operated on.
    pub base_path: PathBuf,
    /// What kind of run this was.
    pub action: JournalAction,
    /// Operations in the order they were performed.
    pub operations: Vec<Operation>,
}

impl OperationLog {
    /// Creates an empty log for a run over `base_path`.
    pub fn new(base_path: PathBuf, action: JournalAction) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_path,
            action,
            operations: Vec::new(),
        }
    }

    /// Appends an operation.
    pub fn add_operation(&mut self, operation: Operation) {
        self.operations.push(operation);
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Returns the journal path for a directory.
    pub fn history_file_path(base_path: &Path) -> PathBuf {
        base_path.join(HISTORY_FILE_NAME)
    }

    /// Writes this log as pretty JSON into `base_path`.
    pub fn save(&self, base_path: &Path) -> ToolResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            ToolError::HistoryWriteFailed {
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("JSON serialization failed: {}", e),
                ),
            }
        })?;

        let history_path = Self::history_file_path(base_path);
        fs::write(&history_path, json).map_err(|e| ToolError::HistoryWriteFailed { source: e })?;
        tracing::debug!(
            path = %history_path.display(),
            operations = self.operations.len(),
            "saved history journal"
        );
        Ok(())
    }

    /// Loads the journal from `base_path`, if there is one.
    pub fn load(base_path: &Path) -> ToolResult<Option<Self>> {
        let history_path = Self::history_file_path(base_path);
        if !history_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&history_path)
            .map_err(|e| ToolError::HistoryReadFailed { source: e })?;
        let log = serde_json::from_str(&json).map_err(|e| ToolError::InvalidHistoryFormat {
            reason: format!("JSON parse error: {}", e),
        })?;
        Ok(Some(log))
    }

    /// Deletes the journal in `base_path`, if present.
    pub fn delete(base_path: &Path) -> ToolResult<()> {
        let history_path = Self::history_file_path(base_path);
        if history_path.exists() {
            fs::remove_file(&history_path)
                .map_err(|e| ToolError::HistoryWriteFailed { source: e })?;
        }
        Ok(())
    }

    /// Saves the log if it recorded anything.
    ///
    /// An empty run leaves the previous journal in place so it can still be
    /// undone.
    pub fn save_if_nonempty(&self, base_path: &Path) -> ToolResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        self.save(base_path)
    }
}

/// Filesystem moves used by the dataset operations.
pub struct FileMover;

impl FileMover {
    /// Moves `file_path` into `destination_dir`, keeping its file name.
    ///
    /// The destination directory must already exist. An existing file with
    /// the same name in the destination is replaced. Falls back to copy and
    /// delete when the rename crosses filesystems.
    pub fn move_into_with_record(
        file_path: &Path,
        destination_dir: &Path,
    ) -> ToolResult<Operation> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| ToolError::MoveFailed {
                from: file_path.to_path_buf(),
                to: destination_dir.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;
        let destination_path = destination_dir.join(file_name);

        Self::move_file(file_path, &destination_path).map_err(|e| ToolError::MoveFailed {
            from: file_path.to_path_buf(),
            to: destination_path.clone(),
            source: e,
        })?;

        Ok(Operation {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
        })
    }

    /// Renames `from` to `to` within a directory and records the operation.
    pub fn rename_with_record(from: &Path, to: &Path) -> ToolResult<Operation> {
        fs::rename(from, to).map_err(|e| ToolError::RenameFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })?;

        Ok(Operation {
            original_path: from.to_path_buf(),
            new_path: to.to_path_buf(),
        })
    }

    /// Moves a file, copying then removing it when a plain rename is not
    /// possible across devices.
    pub fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
                tracing::debug!(from = %from.display(), "rename crosses devices, copying");
                fs::copy(from, to)?;
                fs::remove_file(from)
            }
            Err(e) => Err(e),
        }
    }
}
