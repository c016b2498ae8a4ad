//! Recognizing and listing the files the dataset tools operate on.
//!
//! Only three extensions are treated as images, compared case-insensitively:
//! `png`, `jpg` and `jpeg`.
//!
//! # Examples
//!
//! ```
//! use dataset_tools::image_files::{ImageKind, is_recognized_image};
//! use std::path::Path;
//!
//! assert_eq!(ImageKind::from_extension("JPEG"), Some(ImageKind::Jpeg));
//! assert!(is_recognized_image(Path::new("cat.PNG")));
//! assert!(!is_recognized_image(Path::new("notes.txt")));
//! ```

use crate::config::CompiledFilters;
use crate::error::{ToolError, ToolResult};
use crate::history::HISTORY_FILE_NAME;
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Image kinds recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageKind {
    /// `.png`
    Png,
    /// `.jpg` / `.jpeg`
    Jpeg,
}

impl ImageKind {
    /// Maps a file extension (without the dot) to an image kind.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageKind::Png),
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }

    /// The encoder format files of this kind are written with.
    pub fn format(self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpeg => ImageFormat::Jpeg,
        }
    }

    /// Maps a path to an image kind by the end of its file name.
    ///
    /// The name only has to end in `.png`, `.jpg` or `.jpeg`, so a file
    /// called just `.png` counts as an image too.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// Returns true if the file name ends in a recognized image extension.
pub fn is_recognized_image(path: &Path) -> bool {
    ImageKind::from_path(path).is_some()
}

/// A regular file found in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// The file name for reports; lossy if the name is not valid UTF-8.
    pub name: String,
    /// The file name exactly as stored on disk.
    pub file_name: OsString,
    /// The full path to the file.
    pub path: PathBuf,
}

/// Returns true if `path` exists and is a directory.
pub fn is_valid_directory(path: &Path) -> bool {
    path.is_dir()
}

/// Fails with [`ToolError::InvalidDirectory`] unless `path` is a directory.
pub fn ensure_directory(path: &Path) -> ToolResult<()> {
    if is_valid_directory(path) {
        Ok(())
    } else {
        Err(ToolError::invalid_directory(path))
    }
}

/// Lists regular files directly inside `directory`, sorted by filename.
///
/// Hidden files are included. The history journal and any file rejected by
/// `filters` are left out. Sorting compares the raw names, so names that are
/// not valid UTF-8 keep their place and their bytes.
pub fn list_regular_files(
    directory: &Path,
    filters: &CompiledFilters,
) -> ToolResult<Vec<FileEntry>> {
    let entries = fs::read_dir(directory).map_err(|e| ToolError::ReadDirFailed {
        path: directory.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry in entries.flatten() {
        // Follows symlinks, so a link to a regular file counts as one.
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy().to_string();
        if file_name == HISTORY_FILE_NAME || !filters.should_include(&name) {
            tracing::trace!(file = %name, "skipping excluded file");
            continue;
        }
        files.push(FileEntry {
            name,
            file_name,
            path,
        });
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// Lists regular files with a recognized image extension, sorted by filename.
pub fn list_images(directory: &Path, filters: &CompiledFilters) -> ToolResult<Vec<FileEntry>> {
    let files = list_regular_files(directory, filters)?;
    Ok(files
        .into_iter()
        .filter(|entry| is_recognized_image(&entry.path))
        .collect())
}

/// Decodes an image, detecting its format from the file content rather than
/// the extension.
pub fn decode_image(path: &Path) -> ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(ImageKind::from_extension("png"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_extension("jpg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("jpeg"), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::from_extension("gif"), None);
        assert_eq!(ImageKind::from_extension("webp"), None);
    }

    #[test]
    fn test_extension_mapping_case_insensitive() {
        assert_eq!(ImageKind::from_extension("PNG"), Some(ImageKind::Png));
        assert_eq!(ImageKind::from_extension("JpEg"), Some(ImageKind::Jpeg));
        assert!(is_recognized_image(Path::new("dir/Photo.JPG")));
    }

    #[test]
    fn test_recognition_by_name_suffix() {
        assert!(!is_recognized_image(Path::new("png")));
        assert!(is_recognized_image(Path::new(".png")));
        assert!(is_recognized_image(Path::new("dir/.JPEG")));
        assert!(is_recognized_image(Path::new("archive.zip.png")));
        assert!(!is_recognized_image(Path::new("archive.png.zip")));
        assert!(!is_recognized_image(Path::new("photo.")));
    }

    #[test]
    fn test_list_regular_files_sorted_and_includes_hidden() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("b.txt"), "b").unwrap();
        fs::write(dir.join("a.png"), "a").unwrap();
        fs::write(dir.join(".hidden"), "h").unwrap();
        fs::create_dir(dir.join("sub")).unwrap();

        let files = list_regular_files(dir, &CompiledFilters::default()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![".hidden", "a.png", "b.txt"]);
    }

    #[test]
    fn test_list_skips_history_journal() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join(HISTORY_FILE_NAME), "{}").unwrap();
        fs::write(dir.join("a.png"), "a").unwrap();

        let files = list_regular_files(dir, &CompiledFilters::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.png");
    }

    #[test]
    fn test_list_images_filters_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("a.PNG"), "a").unwrap();
        fs::write(dir.join("b.jpeg"), "b").unwrap();
        fs::write(dir.join("c.gif"), "c").unwrap();
        fs::create_dir(dir.join("d.png")).unwrap();

        let images = list_images(dir, &CompiledFilters::default()).unwrap();
        let names: Vec<_> = images.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.PNG", "b.jpeg"]);
    }

    #[test]
    fn test_list_images_includes_bare_extension_name() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join(".png"), "p").unwrap();
        fs::write(dir.join(".bashrc"), "b").unwrap();

        let images = list_images(dir, &CompiledFilters::default()).unwrap();
        let names: Vec<_> = images.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![".png"]);
    }

    // Linux file systems accept arbitrary bytes in names; APFS does not.
    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_kept_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let raw = std::ffi::OsStr::from_bytes(b"caf\xe9.png");
        fs::write(dir.join(raw), "c").unwrap();
        fs::write(dir.join("cafe.png"), "e").unwrap();

        let files = list_regular_files(dir, &CompiledFilters::default()).unwrap();
        assert_eq!(files.len(), 2);
        // b"cafe" sorts before b"caf\xe9".
        assert_eq!(files[0].file_name, "cafe.png");
        assert_eq!(files[1].file_name.as_bytes(), b"caf\xe9.png");
        assert_eq!(files[1].path, dir.join(raw));
        assert!(files[1].path.exists());
        assert_eq!(files[1].name, "caf\u{FFFD}.png");
    }

    #[test]
    fn test_ensure_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(ensure_directory(temp_dir.path()).is_ok());
        assert!(matches!(
            ensure_directory(&file),
            Err(ToolError::InvalidDirectory { .. })
        ));
        assert!(ensure_directory(Path::new("/non/existent/path")).is_err());
    }

    #[test]
    fn test_decode_sniffs_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("actually_png.jpg");
        image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]))
            .save_with_format(&path, image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&path).unwrap();
        assert_eq!(decoded.width(), 2);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.png");
        fs::write(&path, b"not an image").unwrap();
        assert!(decode_image(&path).is_err());
    }
}
