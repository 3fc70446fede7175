/// File categorization by extension key.
///
/// This module maps lowercased extension keys (".jpg", ".txt", "" ...) to a
/// small fixed set of categories and to the folder each category lands in
/// under the `Organized/` root.
///
/// # Examples
///
/// ```
/// use typecrawler::file_category::{Category, CategoryTable};
///
/// let table = CategoryTable::standard();
/// assert_eq!(table.categorize(".png"), Category::Images);
/// assert_eq!(table.categorize(".flac"), Category::Audio);
/// assert_eq!(table.categorize(".rs"), Category::Others);
/// ```
use crate::scanner::{extension_key, lowercase_extension};
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Folder under `Organized/` that holds uncategorized extensions.
pub const MIX_DIR_NAME: &str = "Mix";

/// Folder name used inside `Mix/` for files without an extension.
pub const NO_EXTENSION_DIR_NAME: &str = "no_extension";

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, ...)
    Images,
    /// Video files (MP4, MKV, AVI, ...)
    Videos,
    /// Audio files (MP3, WAV, FLAC, AAC)
    Audio,
    /// Documents and office files (PDF, DOCX, XLSX, TXT, ...)
    Docs,
    /// Anything not listed above. These go to `Mix/<ext>`.
    Others,
}

/// Category membership in lookup priority order.
const CATEGORY_EXTENSIONS: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff"],
    ),
    (Category::Videos, &[".mp4", ".avi", ".mov", ".mkv", ".wmv"]),
    (Category::Audio, &[".mp3", ".wav", ".flac", ".aac"]),
    (
        Category::Docs,
        &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".txt"],
    ),
];

static STANDARD_TABLE: LazyLock<CategoryTable> = LazyLock::new(CategoryTable::build);

impl Category {
    /// Returns the label of this category, which is also its folder name for
    /// the recognized categories.
    ///
    /// ```
    /// use typecrawler::file_category::Category;
    ///
    /// assert_eq!(Category::Images.label(), "images");
    /// assert_eq!(Category::Docs.label(), "docs");
    /// assert_eq!(Category::Others.label(), "others");
    /// ```
    pub fn label(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Videos => "videos",
            Category::Audio => "audio",
            Category::Docs => "docs",
            Category::Others => "others",
        }
    }

    /// Returns true for the categories that get a folder of their own.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Category::Others)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Static mapping from extension key to category.
///
/// The table is built once per process and never changes. Lookups are exact
/// on the lowercased key, so callers pass keys produced by
/// [`crate::scanner::extension_key`].
#[derive(Debug)]
pub struct CategoryTable {
    extension_map: HashMap<&'static str, Category>,
}

impl CategoryTable {
    /// Returns the process-wide category table.
    pub fn standard() -> &'static CategoryTable {
        &STANDARD_TABLE
    }

    fn build() -> Self {
        let mut extension_map = HashMap::new();
        for (category, extensions) in CATEGORY_EXTENSIONS {
            for ext in extensions.iter() {
                // First category in priority order wins.
                extension_map.entry(*ext).or_insert(*category);
            }
        }
        Self { extension_map }
    }

    /// Returns the category of an extension key, or `Category::Others`.
    pub fn categorize(&self, ext_key: &str) -> Category {
        self.extension_map
            .get(ext_key)
            .copied()
            .unwrap_or(Category::Others)
    }

    /// Returns the destination folder of a file, relative to the
    /// `Organized/` root.
    ///
    /// Uncategorized files go to `Mix/` under their raw lowercased
    /// extension, which may contain bytes that are not valid UTF-8.
    ///
    /// ```
    /// use std::path::{Path, PathBuf};
    /// use typecrawler::file_category::CategoryTable;
    ///
    /// let table = CategoryTable::standard();
    /// assert_eq!(table.destination_subdir(Path::new("a.JPG")), PathBuf::from("images"));
    /// assert_eq!(table.destination_subdir(Path::new("main.RS")), PathBuf::from("Mix/rs"));
    /// assert_eq!(table.destination_subdir(Path::new("c")), PathBuf::from("Mix/no_extension"));
    /// ```
    pub fn destination_subdir(&self, file_path: &Path) -> PathBuf {
        let category = self.categorize(&extension_key(file_path));
        if category.is_recognized() {
            return PathBuf::from(category.label());
        }

        let mut folder = PathBuf::from(MIX_DIR_NAME);
        match lowercase_extension(file_path) {
            Some(ext) => folder.push(mix_folder_name(&ext)),
            None => folder.push(NO_EXTENSION_DIR_NAME),
        }
        folder
    }
}

/// Returns the `Mix/` subfolder name for a raw extension (without its dot).
/// An empty extension, as in `file.`, maps to `no_extension`.
pub fn mix_folder_name(ext: &OsStr) -> OsString {
    if ext.is_empty() {
        OsString::from(NO_EXTENSION_DIR_NAME)
    } else {
        ext.to_os_string()
    }
}
