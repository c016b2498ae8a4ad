//! Moving low-detail ("blurry") images out of a dataset directory.
//!
//! Every recognized image in the input directory is scored with
//! [`edge_density`]. Images scoring strictly below the threshold are moved,
//! under the same file name, into the sibling directory `<input_dir>_blurry`.
//! Sharp images are left untouched.

use crate::config::CompiledFilters;
use crate::edge_density::edge_density;
use crate::error::{ToolError, ToolResult};
use crate::history::{FileMover, JournalAction, OperationLog};
use crate::image_files::{ensure_directory, list_images};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the input directory name to form the blurry directory.
pub const BLURRY_DIR_SUFFIX: &str = "_blurry";

/// Options for [`move_blurry_images`].
#[derive(Debug, Clone)]
pub struct BlurOptions {
    /// Score and report without creating the blurry directory or moving files.
    pub dry_run: bool,
    /// Record moves in the history journal of the input directory. Off by
    /// default: the move is then the only change made to the filesystem.
    pub record_history: bool,
    /// Files to leave out of the scan.
    pub filters: CompiledFilters,
}

impl Default for BlurOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            record_history: false,
            filters: CompiledFilters::default(),
        }
    }
}

/// The score of one image and what happened to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredImage {
    /// File name inside the input directory.
    pub name: String,
    /// Edge density; `0` if the image could not be decoded.
    pub score: u64,
    /// Whether the image was (or, in a dry run, would be) moved.
    pub moved: bool,
}

/// Outcome of a blur filter run.
#[derive(Debug, Clone)]
pub struct BlurReport {
    /// The directory blurry images go to.
    pub blurry_dir: PathBuf,
    /// Threshold the scores were compared against.
    pub threshold: f64,
    /// Every scanned image, in processing order.
    pub images: Vec<ScoredImage>,
    /// True if nothing was touched.
    pub dry_run: bool,
}

impl BlurReport {
    /// Number of images classified as blurry.
    pub fn moved_count(&self) -> usize {
        self.images.iter().filter(|image| image.moved).count()
    }

    /// Names of the images classified as blurry.
    pub fn moved_files(&self) -> Vec<&str> {
        self.images
            .iter()
            .filter(|image| image.moved)
            .map(|image| image.name.as_str())
            .collect()
    }

    /// The per-file `<filename>: <score>` lines.
    pub fn log_lines(&self) -> Vec<String> {
        self.images
            .iter()
            .map(|image| format!("{}: {}", image.name, image.score))
            .collect()
    }
}

impl fmt::Display for BlurReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moved = self.moved_count();
        if moved == 0 {
            write!(f, "No blurry images found.")?;
        } else if self.dry_run {
            write!(
                f,
                "[dry run] Would move {} blurry images to {}",
                moved,
                self.blurry_dir.display()
            )?;
        } else {
            write!(
                f,
                "Moved {} blurry images to {}",
                moved,
                self.blurry_dir.display()
            )?;
        }
        write!(f, "\n\nEdge Density Log:\n{}", self.log_lines().join("\n"))
    }
}

/// Strict less-than: an image scoring exactly the threshold is sharp.
///
/// Scores are non-negative, so a zero or negative threshold never classifies
/// anything as blurry.
pub fn is_blurry(score: u64, threshold: f64) -> bool {
    (score as f64) < threshold
}

/// Returns the sibling directory blurry images of `input_dir` are moved to.
///
/// Trailing separators and relative names such as `.` are resolved first, so
/// the result never lands inside the input directory itself.
pub fn blurry_dir_for(input_dir: &Path) -> PathBuf {
    let resolved = match input_dir.file_name() {
        Some(_) => input_dir.to_path_buf(),
        None => input_dir
            .canonicalize()
            .unwrap_or_else(|_| input_dir.to_path_buf()),
    };

    match resolved.file_name() {
        Some(name) => {
            let mut blurry_name = name.to_os_string();
            blurry_name.push(BLURRY_DIR_SUFFIX);
            resolved.with_file_name(blurry_name)
        }
        None => {
            let mut raw = resolved.into_os_string();
            raw.push(BLURRY_DIR_SUFFIX);
            PathBuf::from(raw)
        }
    }
}

/// Scores every image in `input_dir` and moves those below `threshold`.
///
/// Images are processed one at a time in filename order; each decoded buffer
/// is released before the next file is read. A failed move aborts the run,
/// leaving earlier moves in place (they are journaled when history is on).
///
/// # Errors
///
/// Returns [`ToolError::InvalidDirectory`] without side effects if
/// `input_dir` is not a directory, and propagates directory creation and
/// move failures.
///
/// # Examples
///
/// ```no_run
/// use dataset_tools::blur_filter::{BlurOptions, move_blurry_images};
/// use std::path::Path;
///
/// let report = move_blurry_images(Path::new("dataset"), 1000.0, &BlurOptions::default())?;
/// println!("{report}");
/// # Ok::<(), dataset_tools::ToolError>(())
/// ```
pub fn move_blurry_images(
    input_dir: &Path,
    threshold: f64,
    options: &BlurOptions,
) -> ToolResult<BlurReport> {
    ensure_directory(input_dir)?;

    let blurry_dir = blurry_dir_for(input_dir);
    if !options.dry_run {
        fs::create_dir_all(&blurry_dir).map_err(|e| ToolError::DirectoryCreationFailed {
            path: blurry_dir.clone(),
            source: e,
        })?;
    }

    let images = list_images(input_dir, &options.filters)?;
    tracing::info!(
        directory = %input_dir.display(),
        images = images.len(),
        threshold,
        "scanning for blurry images"
    );

    let mut journal = OperationLog::new(input_dir.to_path_buf(), JournalAction::MoveBlurry);
    let mut scored = Vec::with_capacity(images.len());

    for entry in images {
        let score = edge_density(&entry.path);
        let blurry = is_blurry(score, threshold);
        tracing::debug!(file = %entry.name, score, blurry, "scored image");

        if blurry && !options.dry_run {
            match FileMover::move_into_with_record(&entry.path, &blurry_dir) {
                Ok(operation) => journal.add_operation(operation),
                Err(e) => {
                    if options.record_history {
                        journal.save_if_nonempty(input_dir)?;
                    }
                    return Err(e);
                }
            }
        }

        scored.push(ScoredImage {
            name: entry.name,
            score,
            moved: blurry,
        });
    }

    if options.record_history && !options.dry_run {
        journal.save_if_nonempty(input_dir)?;
    }

    let report = BlurReport {
        blurry_dir,
        threshold,
        images: scored,
        dry_run: options.dry_run,
    };
    tracing::info!(moved = report.moved_count(), "blur filter finished");
    Ok(report)
}
