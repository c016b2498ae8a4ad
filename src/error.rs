//! Error types shared by every dataset operation.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// Errors that abort an operation.
///
/// Per-file compositing failures and unreadable images during blur scoring are
/// not represented here: they are recorded in the report and never stop a run.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// The input path does not exist or is not a directory. `hint` tells the
    /// user what to do next and differs between actions.
    #[error("Invalid directory {}. {hint}", .path.display())]
    InvalidDirectory { path: PathBuf, hint: &'static str },

    /// The compositor's input folder does not exist or is not a directory.
    #[error("Input folder {} does not exist.", .path.display())]
    InputFolderMissing { path: PathBuf },

    /// Listing the directory failed.
    #[error("Error reading directory {}: {source}", .path.display())]
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A generated rename target already exists.
    #[error(
        "Cannot rename {} to {}: target already exists (renamed {renamed} file(s) before stopping)",
        .source_path.display(),
        .target.display()
    )]
    RenameCollision {
        source_path: PathBuf,
        target: PathBuf,
        renamed: usize,
    },

    /// The rename primitive failed.
    #[error("Failed to rename {} to {}: {source}", .from.display(), .to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Moving a file into its destination directory failed.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the history journal.
    #[error("Failed to write history file: {source}")]
    HistoryWriteFailed { source: std::io::Error },

    /// Failed to read the history journal.
    #[error("Failed to read history file: {source}")]
    HistoryReadFailed { source: std::io::Error },

    /// The history journal could not be parsed.
    #[error("Invalid history file format: {reason}")]
    InvalidHistoryFormat { reason: String },

    /// There is no journal to undo in the directory.
    #[error("No previous operation found to undo in {}", .path.display())]
    NothingToUndo { path: PathBuf },

    /// Configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for dataset operations.
pub type ToolResult<T> = Result<T, ToolError>;

impl ToolError {
    /// Invalid input directory of the blur filter and of undo.
    pub(crate) fn invalid_directory(path: &Path) -> Self {
        Self::InvalidDirectory {
            path: path.to_path_buf(),
            hint: "Please enter a valid path.",
        }
    }

    /// Invalid directory given to the renamer.
    pub(crate) fn invalid_rename_directory(path: &Path) -> Self {
        Self::InvalidDirectory {
            path: path.to_path_buf(),
            hint: "Please try again.",
        }
    }
}
