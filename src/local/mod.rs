//! Local documentation tree reader.
//!
//! Layout, at most two levels below a category:
//!
//! ```text
//! root/
//! +- category/
//!    +- doc1.md
//!    +- 2 - doc2.md
//!    +- group/
//!       +- index.md
//!       +- child.md
//! ```
//!
//! Dotfiles are ignored at every level. Directory listings are sorted by
//! name so every walk visits entries in the same order.

pub mod frontmatter;

use std::fs::{self, FileType};
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::naming::{self, INDEX_FILE};

pub use frontmatter::{FrontMatter, FrontMatterError, ParsedDocument};

/// A raw directory entry: name, full path and (unfollowed) file type.
#[derive(Debug, Clone)]
pub struct DirItem {
    pub name: String,
    pub path: PathBuf,
    pub file_type: FileType,
}

/// List a directory, skipping dotfiles, sorted by name.
pub fn read_dir_sorted(dir: &Path) -> io::Result<Vec<DirItem>> {
    let mut items = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        items.push(DirItem {
            name,
            path: entry.path(),
            file_type: entry.file_type()?,
        });
    }

    items.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(items)
}

/// What a local entry stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// A leaf document file.
    Document,

    /// A directory: its index file (if present) is the parent document,
    /// the other documents are its children.
    Group {
        index: Option<PathBuf>,
        children: Vec<LocalEntry>,
    },

    /// Anything else (wrong extension, special file). Skipped by sync.
    Other,
}

/// A file or directory found while walking a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Raw file or directory name, order prefix included.
    pub name: String,
    pub path: PathBuf,
    pub slug: String,
    pub order: Option<i64>,
    pub kind: EntryKind,
}

impl LocalEntry {
    fn document(item: &DirItem) -> Self {
        let stem = naming::document_stem(&item.name);
        Self {
            name: item.name.clone(),
            path: item.path.clone(),
            slug: naming::document_slug(&item.name),
            order: naming::order_from_name(stem),
            kind: EntryKind::Document,
        }
    }

    fn other(item: &DirItem) -> Self {
        Self {
            name: item.name.clone(),
            path: item.path.clone(),
            slug: naming::slugify(naming::name_without_order(&item.name)),
            order: naming::order_from_name(&item.name),
            kind: EntryKind::Other,
        }
    }

    fn group(item: &DirItem) -> io::Result<Self> {
        let mut index = None;
        let mut children = Vec::new();

        for child in read_dir_sorted(&item.path)? {
            if !child.file_type.is_file() {
                warn!(path = %child.path.display(), "Ignoring nested entry inside group");
                continue;
            }
            if child.name == INDEX_FILE {
                index = Some(child.path.clone());
            } else if naming::is_document(&child.name) {
                children.push(LocalEntry::document(&child));
            } else {
                children.push(LocalEntry::other(&child));
            }
        }

        Ok(Self {
            name: item.name.clone(),
            path: item.path.clone(),
            slug: naming::group_slug(&item.name),
            order: naming::order_from_name(&item.name),
            kind: EntryKind::Group { index, children },
        })
    }

    pub fn is_document(&self) -> bool {
        matches!(self.kind, EntryKind::Document)
    }
}

/// Walk one category directory into ordered local entries.
pub fn read_category(dir: &Path) -> io::Result<Vec<LocalEntry>> {
    let mut entries = Vec::new();

    for item in read_dir_sorted(dir)? {
        let entry = if item.file_type.is_dir() {
            LocalEntry::group(&item)?
        } else if item.file_type.is_file() && naming::is_document(&item.name) {
            LocalEntry::document(&item)
        } else {
            LocalEntry::other(&item)
        };
        entries.push(entry);
    }

    Ok(entries)
}

/// A top-level category directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCategory {
    pub name: String,
    pub slug: String,
    pub path: PathBuf,
}

/// List the category directories under the docs root.
///
/// Non-directories are skipped. With an allow-list, only categories whose
/// slug matches the slug of a listed name are returned.
pub fn list_categories(root: &Path, allow: Option<&[String]>) -> io::Result<Vec<LocalCategory>> {
    let allowed: Option<Vec<String>> =
        allow.map(|names| names.iter().map(|n| naming::slugify(n)).collect());

    let mut categories = Vec::new();
    for item in read_dir_sorted(root)? {
        if !item.file_type.is_dir() {
            continue;
        }

        let slug = naming::slugify(&item.name);
        if let Some(allowed) = &allowed {
            if !allowed.contains(&slug) {
                continue;
            }
        }

        categories.push(LocalCategory {
            name: item.name,
            slug,
            path: item.path,
        });
    }

    Ok(categories)
}

/// Read and parse a document file.
pub fn read_document(path: &Path) -> Result<ParsedDocument, ReadError> {
    let content = fs::read_to_string(path)?;
    Ok(frontmatter::parse_document(&content)?)
}

/// Failure reading a document during sync.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    FrontMatter(#[from] FrontMatterError),
}
