//! Flattening transparent images onto a white background.

use crate::config::CompiledFilters;
use crate::error::{ToolError, ToolResult};
use crate::image_files::{FileEntry, ImageKind, decode_image, is_valid_directory, list_images};
use image::{DynamicImage, Rgb, RgbImage};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for [`add_white_backgrounds`].
#[derive(Debug, Clone, Default)]
pub struct CompositeOptions {
    /// Files to leave out of the scan.
    pub filters: CompiledFilters,
}

/// Result of compositing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompositeOutcome {
    /// The flattened image was written to this path.
    Processed { output: PathBuf },
    /// The file could not be processed; the run continued.
    Failed { input: PathBuf, reason: String },
}

impl fmt::Display for CompositeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed { output } => write!(f, "Processed: {}", output.display()),
            Self::Failed { input, reason } => {
                write!(f, "Error processing {}: {}", input.display(), reason)
            }
        }
    }
}

/// Outcome of a compositing run, one entry per image.
#[derive(Debug, Clone, Default)]
pub struct CompositeReport {
    pub outcomes: Vec<CompositeOutcome>,
}

impl CompositeReport {
    /// Number of images written successfully.
    pub fn processed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, CompositeOutcome::Processed { .. }))
            .count()
    }

    /// Number of images that failed.
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.processed_count()
    }
}

impl fmt::Display for CompositeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.outcomes.iter().map(ToString::to_string).collect();
        write!(f, "{}", lines.join("\n"))
    }
}

/// Lays `image` over an opaque white canvas of the same size and drops alpha.
///
/// Each 8-bit channel becomes `round((c * a + 255 * (255 - a)) / 255)`, so
/// opaque pixels are unchanged and fully transparent pixels turn white.
pub fn composite_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        Rgb([over_white(r, a), over_white(g, a), over_white(b, a)])
    })
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = u32::from(channel);
    let a = u32::from(alpha);
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Flattens every recognized image in `input_folder` onto white.
///
/// Results are saved under the original file names in `output_folder`, or in
/// `input_folder` itself when no output folder (or an empty path) is given,
/// which overwrites the originals. The output folder is created if missing.
/// A failure on one file is recorded in the report and processing continues.
///
/// # Errors
///
/// Returns [`ToolError::InputFolderMissing`] if `input_folder` is not a
/// directory; nothing is written in that case.
pub fn add_white_backgrounds(
    input_folder: &Path,
    output_folder: Option<&Path>,
    options: &CompositeOptions,
) -> ToolResult<CompositeReport> {
    if !is_valid_directory(input_folder) {
        return Err(ToolError::InputFolderMissing {
            path: input_folder.to_path_buf(),
        });
    }

    let output_folder = output_folder
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(input_folder);

    let images = list_images(input_folder, &options.filters)?;
    tracing::info!(
        input = %input_folder.display(),
        output = %output_folder.display(),
        images = images.len(),
        "adding white backgrounds"
    );

    let mut report = CompositeReport::default();
    for entry in &images {
        let outcome = match composite_file(entry, output_folder) {
            Ok(output) => CompositeOutcome::Processed { output },
            Err(reason) => {
                tracing::warn!(file = %entry.path.display(), %reason, "failed to composite image");
                CompositeOutcome::Failed {
                    input: entry.path.clone(),
                    reason,
                }
            }
        };
        report.outcomes.push(outcome);
    }

    tracing::info!(
        processed = report.processed_count(),
        failed = report.failed_count(),
        "compositing finished"
    );
    Ok(report)
}

fn composite_file(entry: &FileEntry, output_folder: &Path) -> Result<PathBuf, String> {
    if !output_folder.exists() {
        fs::create_dir_all(output_folder).map_err(|e| {
            ToolError::DirectoryCreationFailed {
                path: output_folder.to_path_buf(),
                source: e,
            }
            .to_string()
        })?;
    }

    let kind = ImageKind::from_path(&entry.path)
        .ok_or_else(|| format!("unrecognized image extension: {}", entry.name))?;
    let image = decode_image(&entry.path).map_err(|e| e.to_string())?;
    let flattened = composite_onto_white(&image);
    let output_path = output_folder.join(&entry.file_name);
    flattened
        .save_with_format(&output_path, kind.format())
        .map_err(|e| e.to_string())?;
    Ok(output_path)
}
