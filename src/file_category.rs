/// File categorization by extension.
///
/// This module holds the fixed, ordered table that maps file extensions to the
/// category folders files are sorted into.
///
/// # Examples
///
/// ```
/// use dirsort::file_category::{Category, CategoryRegistry};
///
/// let registry = CategoryRegistry::default();
/// assert_eq!(registry.classify(".JPG"), Category::Images);
/// assert_eq!(registry.classify("mp3"), Category::Audio);
/// assert_eq!(registry.classify(".xyz"), Category::Unknown);
/// ```
use serde::Serialize;

/// Represents a file category.
///
/// Every category except `Unknown` has a folder of the same name that files
/// are moved into. `Unknown` files stay where they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Image files (JPG, PNG, SVG, etc.)
    Images,
    /// Document files (PDF, DOCX, TXT, etc.)
    Documents,
    /// Archive files (ZIP, TAR, GZ, etc.)
    Archives,
    /// Audio files (MP3, WAV, OGG, etc.)
    Audio,
    /// Video files (MP4, MKV, AVI, etc.)
    Video,
    /// Files with an unrecognized extension
    Unknown,
}

impl Category {
    /// All categories in declaration order, `Unknown` last.
    pub const ALL: [Category; 6] = [
        Category::Images,
        Category::Documents,
        Category::Archives,
        Category::Audio,
        Category::Video,
        Category::Unknown,
    ];

    /// Returns the lowercase name of this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.name(), "images");
    /// assert_eq!(Category::Unknown.name(), "unknown");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Category::Images => "images",
            Category::Documents => "documents",
            Category::Archives => "archives",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Unknown => "unknown",
        }
    }

    /// Returns the folder name for this category, or `None` for `Unknown`.
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            Category::Unknown => None,
            other => Some(other.name()),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One category together with the extensions it recognizes.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub category: Category,
    /// Lowercase extensions with their leading dot, in declaration order.
    pub extensions: Vec<&'static str>,
}

/// Maps file extensions to categories.
///
/// Rules are checked in declaration order and the first match wins. The
/// registry is built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CategoryRegistry {
    rules: Vec<CategoryRule>,
}

impl CategoryRegistry {
    /// Creates the registry with the standard rule table.
    pub fn new() -> Self {
        let rules = vec![
            CategoryRule {
                category: Category::Images,
                extensions: vec![
                    ".jpg", ".jpeg", ".png", ".gif", ".tiff", ".ico", ".bmp", ".webp", ".svg",
                ],
            },
            CategoryRule {
                category: Category::Documents,
                extensions: vec![
                    ".pdf", ".md", ".epub", ".txt", ".docx", ".doc", ".ods", ".odt", ".dotx",
                    ".docm", ".dox", ".rvg", ".rtf", ".rtfd", ".wpd", ".xls", ".xlsx", ".ppt",
                    ".pptx", ".csv", ".xml", ".html", ".htm", ".xhtml", ".py", ".pyw", ".pyc",
                ],
            },
            CategoryRule {
                category: Category::Archives,
                extensions: vec![".iso", ".tar", ".gz", ".7z", ".dmg", ".rar", ".zip"],
            },
            CategoryRule {
                category: Category::Audio,
                extensions: vec![
                    ".aac", ".m4a", ".mp3", ".ogg", ".raw", ".wav", ".wma", ".amr",
                ],
            },
            CategoryRule {
                category: Category::Video,
                extensions: vec![
                    ".avi", ".flv", ".wmv", ".mov", ".mp4", ".webm", ".vob", ".mpg", ".mpeg",
                    ".3gp", ".mkv",
                ],
            },
        ];
        Self { rules }
    }

    /// Returns the category for an extension, with or without its leading dot.
    ///
    /// Matching is case-insensitive. An empty extension is always `Unknown`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dirsort::file_category::{Category, CategoryRegistry};
    ///
    /// let registry = CategoryRegistry::default();
    /// assert_eq!(registry.classify(".PDF"), Category::Documents);
    /// assert_eq!(registry.classify(""), Category::Unknown);
    /// ```
    pub fn classify(&self, extension: &str) -> Category {
        let trimmed = extension.strip_prefix('.').unwrap_or(extension);
        if trimmed.is_empty() {
            return Category::Unknown;
        }
        let dotted = format!(".{}", trimmed.to_lowercase());

        self.rules
            .iter()
            .find(|rule| rule.extensions.iter().any(|ext| *ext == dotted))
            .map(|rule| rule.category)
            .unwrap_or(Category::Unknown)
    }

    /// Returns the rules in declaration order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Returns every recognized extension in declaration order.
    pub fn all_extensions(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .flat_map(|rule| rule.extensions.iter().copied())
            .collect()
    }

    /// Returns true if `name` is one of the category folder names.
    ///
    /// The sorter never descends into folders with these names.
    pub fn is_reserved_dir_name(&self, name: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.category.dir_name() == Some(name))
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
