//! Command layer for dataset-tools.
//!
//! Each action is a plain function from its inputs to a report plus whatever
//! the action does to the filesystem. This module maps parsed commands onto
//! those functions, applying configuration defaults:
//! - `rename`: sequential renaming
//! - `whiten`: flattening onto a white background
//! - `blur`: moving blurry images aside
//! - `undo`: reverting the last rename or move

use crate::blur_filter::{BlurOptions, BlurReport, move_blurry_images};
use crate::compositor::{CompositeOptions, CompositeReport, add_white_backgrounds};
use crate::config::ToolsConfig;
use crate::error::{ToolError, ToolResult};
use crate::renamer::{RenameOptions, RenameReport, rename_files};
use crate::undo::{UndoManager, UndoReport};
use clap::{ArgAction, Parser, Subcommand};
use std::fmt;
use std::path::{Path, PathBuf};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "dataset-tools", version)]
#[command(about = "Quick tools for preparing image datasets")]
pub struct Cli {
    /// Configuration file (defaults to ./.dataset-tools.toml, then the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: ToolCommand,
}

/// A dataset action to execute.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ToolCommand {
    /// Rename every file in a directory to <WORD>_<index>.<ext>
    Rename {
        /// Directory whose files are renamed
        directory: PathBuf,
        /// New base name; spaces become underscores
        word: String,
        /// Show the planned names without renaming anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Composite images onto a white background
    Whiten {
        /// Folder containing the images
        input: PathBuf,
        /// Output folder (defaults to the input folder, overwriting originals)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Move images with low edge density to <DIRECTORY>_blurry
    Blur {
        /// Directory containing the images
        directory: PathBuf,
        /// Edge density threshold; images strictly below it are moved
        #[arg(short, long, allow_negative_numbers = true)]
        threshold: Option<f64>,
        /// Score images without moving anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Revert the last rename or blurry move performed in a directory
    Undo {
        /// Directory the previous run operated on
        directory: PathBuf,
    },
}

impl ToolCommand {
    /// True for commands that only report what they would do.
    pub fn is_dry_run(&self) -> bool {
        matches!(
            self,
            ToolCommand::Rename { dry_run: true, .. } | ToolCommand::Blur { dry_run: true, .. }
        )
    }
}

/// The report of whichever action ran.
#[derive(Debug)]
pub enum Report {
    Rename(RenameReport),
    Composite(CompositeReport),
    Blur(BlurReport),
    Undo(UndoReport),
}

impl Report {
    /// True if the action ran but some files could not be handled.
    pub fn has_problems(&self) -> bool {
        match self {
            Report::Composite(report) => report.failed_count() > 0,
            Report::Undo(report) => !report.is_complete_success(),
            Report::Rename(_) | Report::Blur(_) => false,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Rename(report) => fmt::Display::fmt(report, f),
            Report::Composite(report) => fmt::Display::fmt(report, f),
            Report::Blur(report) => fmt::Display::fmt(report, f),
            Report::Undo(report) => fmt::Display::fmt(report, f),
        }
    }
}

/// Executes `command` with the given configuration.
///
/// # Errors
///
/// Propagates the action's error: an invalid directory, a rename collision,
/// a failed move, an unreadable journal or an invalid filter pattern.
pub fn execute(command: &ToolCommand, config: &ToolsConfig) -> ToolResult<Report> {
    let filters = config.compile_filters()?;

    match command {
        ToolCommand::Rename {
            directory,
            word,
            dry_run,
        } => {
            let options = RenameOptions {
                pad_width: config.rename.pad_width,
                dry_run: *dry_run,
                record_history: config.history.enabled,
                filters,
            };
            rename_files(directory, word, &options).map(Report::Rename)
        }
        ToolCommand::Whiten { input, output } => {
            let options = CompositeOptions { filters };
            add_white_backgrounds(input, output.as_deref(), &options).map(Report::Composite)
        }
        ToolCommand::Blur {
            directory,
            threshold,
            dry_run,
        } => {
            let threshold = threshold.unwrap_or(config.blur.default_threshold);
            let options = BlurOptions {
                dry_run: *dry_run,
                record_history: config.history.enabled,
                filters,
            };
            move_blurry_images(directory, threshold, &options).map(Report::Blur)
        }
        ToolCommand::Undo { directory } => UndoManager::undo(directory).map(Report::Undo),
    }
}

/// Runs `command` and renders the outcome, success or failure, as text.
///
/// Configuration is looked up as described in [`ToolsConfig::load`]; a
/// configuration problem is rendered like any other error.
///
/// # Examples
///
/// ```no_run
/// use dataset_tools::cli::{ToolCommand, run_cli};
/// use std::path::PathBuf;
///
/// let text = run_cli(
///     &ToolCommand::Blur { directory: PathBuf::from("dataset"), threshold: None, dry_run: true },
///     None,
/// );
/// println!("{text}");
/// ```
pub fn run_cli(command: &ToolCommand, config_path: Option<&Path>) -> String {
    let outcome = ToolsConfig::load(config_path)
        .map_err(ToolError::from)
        .and_then(|config| execute(command, &config));

    match outcome {
        Ok(report) => report.to_string(),
        Err(e) => e.to_string(),
    }
}
