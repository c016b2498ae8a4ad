//! Sequential batch renaming.
//!
//! Every regular file of a directory becomes `<word>_<index><ext>`, with
//! indices assigned from 1 in filename order and zero-padded to at least three
//! digits: `cat_001.png`, `cat_002.jpg`, ... `cat_1000.png`.

use crate::config::{CompiledFilters, DEFAULT_PAD_WIDTH};
use crate::error::{ToolError, ToolResult};
use crate::history::{FileMover, JournalAction, OperationLog};
use crate::image_files::{is_valid_directory, list_regular_files};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// Options for [`rename_files`].
#[derive(Debug, Clone)]
pub struct RenameOptions {
    /// Minimum number of digits in the index.
    pub pad_width: usize,
    /// Report the plan without renaming anything.
    pub dry_run: bool,
    /// Record renames in the history journal of the directory. Off by default.
    pub record_history: bool,
    /// Files to leave out of the listing.
    pub filters: CompiledFilters,
}

impl Default for RenameOptions {
    fn default() -> Self {
        Self {
            pad_width: DEFAULT_PAD_WIDTH,
            dry_run: false,
            record_history: false,
            filters: CompiledFilters::default(),
        }
    }
}

/// One planned or performed rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedFile {
    /// Original name, lossy if it is not valid UTF-8.
    pub from: String,
    /// New name, lossy if the kept extension is not valid UTF-8.
    pub to: String,
    source_name: OsString,
    target_name: OsString,
}

/// Outcome of a rename run.
#[derive(Debug, Clone)]
pub struct RenameReport {
    /// The directory whose files were renamed.
    pub directory: PathBuf,
    /// Every file in index order.
    pub files: Vec<RenamedFile>,
    /// True if nothing was touched.
    pub dry_run: bool,
}

impl RenameReport {
    /// Number of files renamed (or that would be).
    pub fn renamed_count(&self) -> usize {
        self.files.len()
    }
}

impl fmt::Display for RenameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.dry_run {
            return write!(
                f,
                "Renamed {} files in {}.",
                self.renamed_count(),
                self.directory.display()
            );
        }

        write!(
            f,
            "[dry run] Would rename {} files in {}.",
            self.renamed_count(),
            self.directory.display()
        )?;
        for file in &self.files {
            write!(f, "\n  {} -> {}", file.from, file.to)?;
        }
        Ok(())
    }
}

/// Replaces every space with an underscore. Nothing else is changed.
pub fn sanitize_word(word: &str) -> String {
    word.replace(' ', "_")
}

/// Builds the new name for the file at 1-based `index`.
///
/// The original extension is kept verbatim: `photo.JPG` keeps `.JPG`,
/// `archive.tar.gz` keeps `.gz`, `.bashrc` and `README` get none, and a name
/// ending in a dot keeps that dot.
pub fn numbered_name(
    sanitized_word: &str,
    index: usize,
    pad_width: usize,
    original: impl AsRef<OsStr>,
) -> OsString {
    let mut name = OsString::from(format!(
        "{}_{:0width$}",
        sanitized_word,
        index,
        width = pad_width
    ));
    if let Some(ext) = Path::new(original.as_ref()).extension() {
        name.push(".");
        name.push(ext);
    }
    name
}

/// Renames every regular file in `directory` to `<word>_<index><ext>`.
///
/// Hidden files are included; subdirectories are not touched. Files are
/// renamed one by one and nothing is rolled back if a rename fails.
///
/// A generated name that already belongs to another file stops the run with
/// [`ToolError::RenameCollision`]; renames done before that point stay done.
/// With `record_history` they are journaled so they can be undone.
///
/// # Examples
///
/// ```no_run
/// use dataset_tools::renamer::{RenameOptions, rename_files};
/// use std::path::Path;
///
/// let report = rename_files(Path::new("dataset"), "red cat", &RenameOptions::default())?;
/// assert_eq!(report.to_string(), format!("Renamed {} files in dataset.", report.renamed_count()));
/// # Ok::<(), dataset_tools::ToolError>(())
/// ```
pub fn rename_files(
    directory: &Path,
    word: &str,
    options: &RenameOptions,
) -> ToolResult<RenameReport> {
    if !is_valid_directory(directory) {
        return Err(ToolError::invalid_rename_directory(directory));
    }

    let sanitized = sanitize_word(word);
    let pad_width = options.pad_width.max(1);
    let entries = list_regular_files(directory, &options.filters)?;

    let plan: Vec<RenamedFile> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let target_name = numbered_name(&sanitized, i + 1, pad_width, &entry.file_name);
            RenamedFile {
                from: entry.name.clone(),
                to: target_name.to_string_lossy().to_string(),
                source_name: entry.file_name.clone(),
                target_name,
            }
        })
        .collect();

    tracing::info!(
        directory = %directory.display(),
        files = plan.len(),
        dry_run = options.dry_run,
        "renaming files"
    );

    if !options.dry_run {
        let mut journal = OperationLog::new(directory.to_path_buf(), JournalAction::Rename);
        let result = apply_plan(directory, &plan, &mut journal);
        if options.record_history {
            journal.save_if_nonempty(directory)?;
        }
        result?;
    }

    Ok(RenameReport {
        directory: directory.to_path_buf(),
        files: plan,
        dry_run: options.dry_run,
    })
}

fn apply_plan(
    directory: &Path,
    plan: &[RenamedFile],
    journal: &mut OperationLog,
) -> ToolResult<()> {
    for (done, file) in plan.iter().enumerate() {
        if file.source_name == file.target_name {
            tracing::debug!(file = %file.from, "already named, skipping");
            continue;
        }

        let from = directory.join(&file.source_name);
        let to = directory.join(&file.target_name);
        if to.exists() {
            return Err(ToolError::RenameCollision {
                source_path: from,
                target: to,
                renamed: done,
            });
        }

        let operation = FileMover::rename_with_record(&from, &to)?;
        tracing::debug!(from = %file.from, to = %file.to, "renamed");
        journal.add_operation(operation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HISTORY_FILE_NAME;
    use std::fs;
    use tempfile::TempDir;

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name != HISTORY_FILE_NAME)
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_sanitize_word() {
        assert_eq!(sanitize_word("red cat"), "red_cat");
        assert_eq!(sanitize_word("  a "), "__a_");
        assert_eq!(sanitize_word("x/y"), "x/y");
        assert_eq!(sanitize_word(""), "");
    }

    #[test]
    fn test_numbered_name_extensions() {
        assert_eq!(numbered_name("cat", 1, 3, "photo.JPG"), "cat_001.JPG");
        assert_eq!(numbered_name("cat", 12, 3, "archive.tar.gz"), "cat_012.gz");
        assert_eq!(numbered_name("cat", 3, 3, ".bashrc"), "cat_003");
        assert_eq!(numbered_name("cat", 4, 3, "README"), "cat_004");
        assert_eq!(numbered_name("cat", 5, 3, "odd."), "cat_005.");
    }

    #[test]
    fn test_numbered_name_padding_grows() {
        assert_eq!(numbered_name("w", 999, 3, "a.png"), "w_999.png");
        assert_eq!(numbered_name("w", 1000, 3, "a.png"), "w_1000.png");
        assert_eq!(numbered_name("", 7, 3, "a.png"), "_007.png");
    }

    #[test]
    fn test_rename_in_sorted_order() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("zebra.jpg"), "z").unwrap();
        fs::write(dir.join("apple.png"), "a").unwrap();
        fs::write(dir.join(".hidden"), "h").unwrap();

        let report = rename_files(dir, "fruit basket", &RenameOptions::default()).unwrap();

        assert_eq!(report.renamed_count(), 3);
        assert_eq!(
            names_in(dir),
            vec!["fruit_basket_001", "fruit_basket_002.png", "fruit_basket_003.jpg"]
        );
        assert_eq!(fs::read_to_string(dir.join("fruit_basket_002.png")).unwrap(), "a");
        assert_eq!(
            report.to_string(),
            format!("Renamed 3 files in {}.", dir.display())
        );
    }

    #[test]
    fn test_subdirectories_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::create_dir(dir.join("nested")).unwrap();
        fs::write(dir.join("a.txt"), "a").unwrap();

        let report = rename_files(dir, "x", &RenameOptions::default()).unwrap();
        assert_eq!(report.renamed_count(), 1);
        assert!(dir.join("nested").is_dir());
        assert!(dir.join("x_001.txt").exists());
    }

    #[test]
    fn test_already_named_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("cat_001.png"), "1").unwrap();

        let report = rename_files(dir, "cat", &RenameOptions::default()).unwrap();
        assert_eq!(report.renamed_count(), 1);
        assert_eq!(names_in(dir), vec!["cat_001.png"]);
    }

    #[test]
    fn test_collision_fails_loudly() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("b.png"), "b").unwrap();
        fs::write(dir.join("cat_001.png"), "existing").unwrap();

        let result = rename_files(dir, "cat", &RenameOptions::default());

        assert!(matches!(result, Err(ToolError::RenameCollision { renamed: 0, .. })));
        assert_eq!(fs::read_to_string(dir.join("cat_001.png")).unwrap(), "existing");
        assert!(dir.join("b.png").exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("one.png"), "1").unwrap();

        let options = RenameOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = rename_files(dir, "cat", &options).unwrap();

        assert!(dir.join("one.png").exists());
        assert!(!dir.join(HISTORY_FILE_NAME).exists());
        assert!(report.to_string().ends_with("\n  one.png -> cat_001.png"));
    }

    #[test]
    fn test_custom_pad_width() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("one.png"), "1").unwrap();

        let options = RenameOptions {
            pad_width: 5,
            ..Default::default()
        };
        rename_files(dir, "cat", &options).unwrap();
        assert!(dir.join("cat_00001.png").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_name_is_renamed() {
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let raw = OsStr::from_bytes(b"caf\xe9.png");
        fs::write(dir.join(raw), "pixels").unwrap();

        let report = rename_files(dir, "cat", &RenameOptions::default()).unwrap();

        assert_eq!(report.renamed_count(), 1);
        assert_eq!(names_in(dir), vec!["cat_001.png"]);
        assert_eq!(fs::read_to_string(dir.join("cat_001.png")).unwrap(), "pixels");
        assert_eq!(report.files[0].from, "caf\u{FFFD}.png");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_extension_kept_verbatim() {
        use std::os::unix::ffi::OsStrExt;

        let name = numbered_name("cat", 1, 3, OsStr::from_bytes(b"a.p\xffg"));
        assert_eq!(name.as_bytes(), b"cat_001.p\xffg");
    }

    #[test]
    fn test_invalid_directory() {
        let result = rename_files(Path::new("/non/existent/path"), "x", &RenameOptions::default());
        assert!(matches!(result, Err(ToolError::InvalidDirectory { .. })));
    }

    #[test]
    fn test_no_journal_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("one.png"), "1").unwrap();

        rename_files(dir, "cat", &RenameOptions::default()).unwrap();
        assert!(!dir.join(HISTORY_FILE_NAME).exists());
    }

    #[test]
    fn test_journal_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("one.png"), "1").unwrap();
        fs::write(dir.join("two.png"), "2").unwrap();

        let options = RenameOptions {
            record_history: true,
            ..Default::default()
        };
        rename_files(dir, "cat", &options).unwrap();

        let journal = OperationLog::load(dir).unwrap().expect("journal written");
        assert_eq!(journal.action, JournalAction::Rename);
        assert_eq!(journal.operations.len(), 2);
        assert_eq!(journal.operations[0].original_path, dir.join("one.png"));
    }
}
