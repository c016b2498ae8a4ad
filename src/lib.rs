//! dataset-tools - quick tools for preparing image datasets
//!
//! This library renames dataset files sequentially, flattens transparent
//! images onto a white background, and moves low-detail ("blurry") images
//! into a sibling directory based on their Canny edge density. Renames and
//! moves can optionally be journaled so the last run in a directory can be
//! undone.

pub mod blur_filter;
pub mod cli;
pub mod compositor;
pub mod config;
pub mod edge_density;
pub mod error;
pub mod history;
pub mod image_files;
pub mod output;
pub mod renamer;
pub mod undo;

pub use blur_filter::{BlurOptions, BlurReport, is_blurry, move_blurry_images};
pub use compositor::{CompositeOptions, CompositeReport, add_white_backgrounds};
pub use config::{CompiledFilters, ConfigError, ToolsConfig};
pub use edge_density::edge_density;
pub use error::{ToolError, ToolResult};
pub use renamer::{RenameOptions, RenameReport, rename_files};
pub use undo::{UndoManager, UndoReport};

pub use cli::{Report, ToolCommand, execute, run_cli};
