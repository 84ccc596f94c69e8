//! Pre-flight validation of the local documentation tree.
//!
//! Runs before any network activity and collects every violation rather
//! than stopping at the first one. Depths are counted from the docs root:
//! 0 = category, 1 = document or group, 2 = child of a group.
//!
//! Structural rules: only files and directories, `.md` files only, nothing
//! at depth 3 or deeper, every group has an `index.md`, every name yields a
//! non-empty slug.
//! Content rules: unique slugs, well-formed front matter, resolvable
//! `[text](doc:slug)` links.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{error, info};
use walkdir::{DirEntry, WalkDir};

use crate::local::frontmatter::{self, FrontMatterError};
use crate::naming::{self, DOC_EXTENSION, INDEX_FILE};

/// Deepest level an entry may sit at.
pub const MAX_DEPTH: usize = 2;

static DOC_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\(doc:([^)#\s]+)(?:#[^)\s]*)?\)").expect("valid link pattern")
});

/// Which family a violation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueClass {
    Structural,
    Content,
}

impl fmt::Display for IssueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural => write!(f, "structural"),
            Self::Content => write!(f, "content"),
        }
    }
}

/// A single rule violation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("only regular files and directories are allowed")]
    UnsupportedEntryType,

    #[error("file does not have the .{} extension", DOC_EXTENSION)]
    WrongExtension,

    #[error("nested too deeply (depth {depth}, maximum is {})", MAX_DEPTH)]
    TooDeep { depth: usize },

    #[error("group directory requires an {} page", INDEX_FILE)]
    MissingIndex,

    #[error("name does not produce a slug; use at least one ASCII letter or digit")]
    EmptySlug,

    #[error("slug `{slug}` is already used by {}", .first.display())]
    DuplicateSlug { slug: String, first: PathBuf },

    #[error("{0}")]
    FrontMatter(FrontMatterError),

    #[error("link `{text}` points to unknown document `{target}`")]
    BrokenLink { text: String, target: String },

    #[error("unreadable document: {0}")]
    Unreadable(String),
}

impl ValidationError {
    pub fn class(&self) -> IssueClass {
        match self {
            Self::UnsupportedEntryType
            | Self::WrongExtension
            | Self::TooDeep { .. }
            | Self::MissingIndex
            | Self::EmptySlug => IssueClass::Structural,
            Self::DuplicateSlug { .. }
            | Self::FrontMatter(_)
            | Self::BrokenLink { .. }
            | Self::Unreadable(_) => IssueClass::Content,
        }
    }
}

/// A violation tied to the offending path.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: PathBuf,
    pub error: ValidationError,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Outcome of validating a tree.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub documents: usize,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn of_class(&self, class: IssueClass) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.error.class() == class)
    }

    /// Log every issue, then a summary line.
    pub fn log(&self) {
        for issue in &self.issues {
            error!(
                class = %issue.error.class(),
                path = %issue.path.display(),
                "{}",
                issue.error
            );
        }

        if self.is_ok() {
            info!(documents = self.documents, "Validation passed");
        } else {
            error!(
                documents = self.documents,
                structural = self.of_class(IssueClass::Structural).count(),
                content = self.of_class(IssueClass::Content).count(),
                "Validation failed"
            );
        }
    }
}

/// A document collected during the walk, checked once the walk finishes.
struct CollectedDoc {
    path: PathBuf,
    content: String,
}

#[derive(Default)]
struct Walk {
    issues: Vec<ValidationIssue>,
    slugs: HashMap<String, PathBuf>,
    docs: Vec<CollectedDoc>,
}

impl Walk {
    fn push(&mut self, path: &Path, error: ValidationError) {
        self.issues.push(ValidationIssue {
            path: path.to_path_buf(),
            error,
        });
    }

    fn register_slug(&mut self, slug: String, path: &Path) {
        if slug.is_empty() {
            self.push(path, ValidationError::EmptySlug);
            return;
        }

        match self.slugs.get(&slug) {
            Some(first) => {
                let first = first.clone();
                self.push(path, ValidationError::DuplicateSlug { slug, first });
            }
            None => {
                self.slugs.insert(slug, path.to_path_buf());
            }
        }
    }

    fn collect_doc(&mut self, path: &Path) {
        match fs::read_to_string(path) {
            Ok(content) => self.docs.push(CollectedDoc {
                path: path.to_path_buf(),
                content,
            }),
            Err(e) => self.push(path, ValidationError::Unreadable(e.to_string())),
        }
    }

    fn visit(&mut self, entry: &DirEntry) {
        // Depth 0 is a category directory.
        let depth = entry.depth() - 1;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy();

        if depth > MAX_DEPTH {
            self.push(path, ValidationError::TooDeep { depth });
            return;
        }

        let ft = entry.file_type();
        if !ft.is_file() && !ft.is_dir() {
            self.push(path, ValidationError::UnsupportedEntryType);
            return;
        }

        if ft.is_file() {
            if !naming::is_document(&name) {
                self.push(path, ValidationError::WrongExtension);
                return;
            }
            match depth {
                // Loose files next to the categories are not synced.
                0 => {}
                _ if depth > 1 && name == INDEX_FILE => self.collect_doc(path),
                _ => {
                    self.register_slug(naming::document_slug(&name), path);
                    self.collect_doc(path);
                }
            }
            return;
        }

        match depth {
            0 => {
                if naming::slugify(&name).is_empty() {
                    self.push(path, ValidationError::EmptySlug);
                }
            }
            1 => {
                if !path.join(INDEX_FILE).is_file() {
                    self.push(path, ValidationError::MissingIndex);
                }
                self.register_slug(naming::group_slug(&name), path);
            }
            _ => {}
        }
    }

    fn check_documents(&mut self) {
        let known: BTreeSet<&str> = self.slugs.keys().map(String::as_str).collect();
        let mut issues = Vec::new();

        for doc in &self.docs {
            for problem in frontmatter::check_front_matter(&doc.content) {
                issues.push(ValidationIssue {
                    path: doc.path.clone(),
                    error: ValidationError::FrontMatter(problem),
                });
            }

            for (text, target) in doc_links(&doc.content) {
                if !known.contains(target) {
                    issues.push(ValidationIssue {
                        path: doc.path.clone(),
                        error: ValidationError::BrokenLink {
                            text: text.to_string(),
                            target: target.to_string(),
                        },
                    });
                }
            }
        }

        self.issues.extend(issues);
    }
}

/// Dotfiles and dot-directories below the root are skipped, with their contents.
fn is_dotfile(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Every `[text](doc:slug)` link in a document as (full link text, target slug).
pub fn doc_links(content: &str) -> Vec<(&str, &str)> {
    DOC_LINK
        .captures_iter(content)
        .filter_map(|caps| {
            let full = caps.get(0)?.as_str();
            let target = caps.get(2)?.as_str();
            Some((full, target))
        })
        .collect()
}

/// Validate the whole tree under `root`.
///
/// I/O failures while listing directories abort with an error; everything
/// else is reported in the returned [`ValidationReport`].
pub fn validate_tree(root: &Path) -> io::Result<ValidationReport> {
    let entries = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_DEPTH + 2)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_dotfile(e));

    let mut walk = Walk::default();
    for entry in entries {
        walk.visit(&entry?);
    }
    walk.check_documents();

    Ok(ValidationReport {
        documents: walk.docs.len(),
        issues: walk.issues,
    })
}
