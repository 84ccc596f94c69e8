//! Reconciliation engine.
//!
//! For each local category the engine walks the entries depth-first and
//! upserts them one at a time, then deletes remote documents that no longer
//! have a local file:
//!
//! ```text
//! fetch category + doc tree (all categories concurrently)
//!        │
//!        ▼
//! build mirror ──► upsert docs / groups (sequential) ──► deletion pass
//!                    │  find slug in mirror
//!                    │  update or create
//!                    └► move / insert node in mirror
//! ```
//!
//! The mirror is updated after every call instead of re-fetching, because a
//! re-query is not guaranteed to reflect calls already issued in this run.
//! Any remote rejection aborts the run: the mirror can no longer be trusted.

pub mod config;


use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::client::{ClientError, Doc, DocApi, DocForm, RemoteValidationError};
use crate::local::{self, EntryKind, LocalCategory, LocalEntry, ReadError};
use crate::naming::INDEX_FILE;
use crate::tree::{
    add_doc_under_slug, find_slug_in_tree, remove_slug_from_tree, RemoteTree, RemoteTreeDoc,
    RemoteTreeEntry,
};

pub use config::SyncConfig;

/// Errors that abort a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Categories missing on the remote store (create them manually): {}", .0.join(", "))]
    CategoriesNotFound(Vec<String>),

    #[error("Remote store rejected `{slug}`: {rejection}")]
    Rejected {
        slug: String,
        rejection: RemoteValidationError,
    },

    #[error("Requested slug `{requested}` but the remote store assigned `{assigned}`")]
    SlugMismatch { requested: String, assigned: String },

    #[error("Requested category `{requested}` but the remote store returned `{returned}`")]
    CategoryMismatch { requested: String, returned: String },

    #[error("Mirror has no parent `{parent}` for `{slug}`")]
    MirrorInconsistent { slug: String, parent: String },

    #[error("Category `{0}` is not in the remote tree")]
    UnknownCategory(String),

    #[error("Cannot read {}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Client(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// What a run did, slug by slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub deleted: Vec<String>,
    /// Group directories skipped because they have no index page.
    pub skipped_groups: Vec<PathBuf>,
}

impl SyncReport {
    /// True when nothing was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped_groups.is_empty()
    }
}

/// Run-scoped mutable state threaded through every reconciliation call.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub tree: RemoteTree,
    pub report: SyncReport,
}

impl SyncContext {
    pub fn new(tree: RemoteTree) -> Self {
        Self {
            tree,
            report: SyncReport::default(),
        }
    }

    fn entry(&self, category: &str) -> Result<&RemoteTreeEntry> {
        self.tree
            .get(category)
            .ok_or_else(|| SyncError::UnknownCategory(category.to_string()))
    }

    fn entry_mut(&mut self, category: &str) -> Result<&mut RemoteTreeEntry> {
        self.tree
            .get_mut(category)
            .ok_or_else(|| SyncError::UnknownCategory(category.to_string()))
    }
}

/// Fetch every category and its doc tree, concurrently.
///
/// Fails closed: if any category is missing remotely, every missing one is
/// logged and the whole run stops before any mutation.
pub async fn build_remote_tree<C>(client: &C, categories: &[LocalCategory]) -> Result<RemoteTree>
where
    C: DocApi + ?Sized,
{
    info!(count = categories.len(), "Fetching categories");

    let fetches = categories.iter().map(|category| async move {
        let result = tokio::try_join!(
            client.get_category(&category.slug),
            client.get_category_docs(&category.slug),
        );
        (category, result)
    });

    let mut tree = RemoteTree::new();
    let mut missing = Vec::new();

    for (local, result) in join_all(fetches).await {
        match result {
            Ok((category, docs)) => {
                if category.slug != local.slug {
                    return Err(SyncError::CategoryMismatch {
                        requested: local.slug.clone(),
                        returned: category.slug,
                    });
                }
                info!(category = %local.name, docs = docs.len(), "Got category");
                tree.insert(local.slug.clone(), RemoteTreeEntry::new(category, &docs));
            }
            Err(ClientError::CategoryNotFound(_)) => {
                error!(
                    category = %local.name,
                    slug = %local.slug,
                    "Category does not exist remotely and cannot be created, create it first"
                );
                missing.push(local.slug.clone());
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !missing.is_empty() {
        return Err(SyncError::CategoriesNotFound(missing));
    }

    debug!(tree = ?tree, "Remote tree");
    Ok(tree)
}

/// Where an upsert lands: slug, order and optional parent identity.
#[derive(Debug, Clone, Copy)]
struct Target<'a> {
    slug: &'a str,
    order: Option<i64>,
    parent: Option<&'a Doc>,
}

/// Drives one sync run against a [`DocApi`].
pub struct Syncer<'a, C: ?Sized> {
    client: &'a C,
    config: &'a SyncConfig,
}

impl<'a, C> Syncer<'a, C>
where
    C: DocApi + ?Sized,
{
    pub fn new(client: &'a C, config: &'a SyncConfig) -> Self {
        Self { client, config }
    }

    /// Sync every selected category. The local tree is assumed validated.
    pub async fn run(&self) -> Result<SyncReport> {
        let categories = self.categories()?;
        let tree = build_remote_tree(self.client, &categories).await?;

        let mut ctx = SyncContext::new(tree);
        for category in &categories {
            self.sync_category(&mut ctx, category).await?;
        }

        info!(
            created = ctx.report.created.len(),
            updated = ctx.report.updated.len(),
            deleted = ctx.report.deleted.len(),
            skipped_groups = ctx.report.skipped_groups.len(),
            dry_run = self.config.dry_run,
            "Sync complete"
        );

        Ok(ctx.report)
    }

    /// Local categories selected by the config.
    pub fn categories(&self) -> Result<Vec<LocalCategory>> {
        let categories = local::list_categories(
            &self.config.docs_root,
            self.config.categories.as_deref(),
        )?;

        if let Some(wanted) = &self.config.categories {
            for name in wanted {
                let slug = crate::naming::slugify(name);
                if !categories.iter().any(|c| c.slug == slug) {
                    warn!(category = %name, "Requested category has no local directory");
                }
            }
        }

        Ok(categories)
    }

    /// Upsert every local entry of a category, then run its deletion pass.
    pub async fn sync_category(
        &self,
        ctx: &mut SyncContext,
        category: &LocalCategory,
    ) -> Result<()> {
        info!(category = %category.name, "Syncing category");

        for entry in local::read_category(&category.path)? {
            match &entry.kind {
                EntryKind::Document => {
                    let target = Target {
                        slug: &entry.slug,
                        order: entry.order,
                        parent: None,
                    };
                    self.upsert(ctx, category, &entry.path, target).await?;
                }
                EntryKind::Group { index, children } => {
                    self.upsert_group(ctx, category, &entry, index.as_deref(), children)
                        .await?;
                }
                EntryKind::Other => {
                    warn!(path = %entry.path.display(), "Skipping non-document entry");
                }
            }
        }

        self.delete_not_present(ctx, category).await
    }

    /// Upsert a group: its index page first, then the children under it.
    async fn upsert_group(
        &self,
        ctx: &mut SyncContext,
        category: &LocalCategory,
        group: &LocalEntry,
        index: Option<&Path>,
        children: &[LocalEntry],
    ) -> Result<()> {
        let Some(index) = index else {
            error!(
                path = %group.path.display(),
                "Group requires an {} page, skipping",
                INDEX_FILE
            );
            ctx.report.skipped_groups.push(group.path.clone());
            return Ok(());
        };

        let parent = self
            .upsert(
                ctx,
                category,
                index,
                Target {
                    slug: &group.slug,
                    order: group.order,
                    parent: None,
                },
            )
            .await?;

        for child in children {
            if !child.is_document() {
                warn!(path = %child.path.display(), "Skipping non-document entry");
                continue;
            }

            let target = Target {
                slug: &child.slug,
                order: child.order,
                parent: Some(&parent),
            };
            self.upsert(ctx, category, &child.path, target).await?;
        }

        Ok(())
    }

    /// Create or update one document and keep the mirror in step.
    ///
    /// Returns the resulting document so children can be parented on it.
    async fn upsert(
        &self,
        ctx: &mut SyncContext,
        category: &LocalCategory,
        path: &Path,
        target: Target<'_>,
    ) -> Result<Doc> {
        let entry = ctx.entry(&category.slug)?;
        let existing = find_slug_in_tree(entry, target.slug).is_some();

        let parsed = local::read_document(path).map_err(|source| SyncError::Document {
            path: path.to_path_buf(),
            source,
        })?;

        let form = DocForm {
            slug: target.slug.to_string(),
            title: parsed.front_matter.title,
            body: parsed.body,
            excerpt: parsed.front_matter.excerpt,
            order: target.order,
            category: entry.category.id.clone(),
            parent_doc: target.parent.map(|p| p.id.clone()),
            hidden: parsed.front_matter.hidden,
        };

        let destination = match target.parent {
            Some(parent) => {
                format!("{} / {} / {}", entry.category.title, parent.title, form.title)
            }
            None => format!("{} / {}", entry.category.title, form.title),
        };

        let dry_run = self.config.dry_run;
        let doc = if existing {
            info!(path = %path.display(), destination = %destination, dry_run, "Updating");
            if dry_run {
                dry_run_doc(&form)
            } else {
                self.client
                    .update_doc(target.slug, &form)
                    .await
                    .map_err(|e| remote_failure(target.slug, e))?
            }
        } else {
            info!(path = %path.display(), destination = %destination, dry_run, "Creating");
            if dry_run {
                dry_run_doc(&form)
            } else {
                self.client
                    .create_doc(&form)
                    .await
                    .map_err(|e| remote_failure(target.slug, e))?
            }
        };

        if doc.slug != target.slug {
            error!(
                requested = %target.slug,
                assigned = %doc.slug,
                "Remote store assigned a different slug"
            );
            return Err(SyncError::SlugMismatch {
                requested: target.slug.to_string(),
                assigned: doc.slug,
            });
        }

        if !dry_run {
            let parent_slug = target.parent.map(|p| p.slug.as_str());
            place_in_mirror(ctx.entry_mut(&category.slug)?, target.slug, parent_slug, existing)?;
        }

        if existing {
            ctx.report.updated.push(target.slug.to_string());
        } else {
            ctx.report.created.push(target.slug.to_string());
        }

        Ok(doc)
    }

    /// Delete remote documents of a category that have no local file.
    ///
    /// Re-scans the category directory. Children are checked against their
    /// group directory independently of whether the parent survives, and are
    /// deleted before their parent. Surviving children of a deleted parent
    /// move to the top level of the mirror.
    ///
    /// In dry-run the mirror was never updated, so documents upserted earlier
    /// in the run may still sit at their old position; they are not deleted.
    async fn delete_not_present(
        &self,
        ctx: &mut SyncContext,
        category: &LocalCategory,
    ) -> Result<()> {
        let local = LocalSlugs::from_entries(&local::read_category(&category.path)?);
        let entry = ctx.entry(&category.slug)?;
        let mut deletions = plan_deletions(entry, &local);
        let category_title = entry.category.title.clone();

        let dry_run = self.config.dry_run;
        if dry_run {
            let report = &ctx.report;
            deletions
                .retain(|d| !report.created.contains(&d.slug) && !report.updated.contains(&d.slug));
        }

        for deletion in deletions {
            let remote = match &deletion.parent {
                Some(parent) => format!("{} / {} / {}", category_title, parent, deletion.slug),
                None => format!("{} / {}", category_title, deletion.slug),
            };
            info!(remote = %remote, dry_run, "Deleting remote document");

            if !dry_run {
                self.client.delete_doc(&deletion.slug).await?;
                remove_from_mirror(ctx.entry_mut(&category.slug)?, &deletion.slug);
            }
            ctx.report.deleted.push(deletion.slug);
        }

        Ok(())
    }
}

/// Move an upserted document to its parent in the mirror, or insert it.
fn place_in_mirror(
    entry: &mut RemoteTreeEntry,
    slug: &str,
    parent_slug: Option<&str>,
    existing: bool,
) -> Result<()> {
    let node = if existing {
        remove_slug_from_tree(entry, slug).unwrap_or_else(|| RemoteTreeDoc::new(slug))
    } else {
        RemoteTreeDoc::new(slug)
    };

    if !add_doc_under_slug(entry, node, parent_slug) {
        return Err(SyncError::MirrorInconsistent {
            slug: slug.to_string(),
            parent: parent_slug.unwrap_or_default().to_string(),
        });
    }

    Ok(())
}

/// Drop a deleted document from the mirror.
///
/// Its remaining children were not deleted remotely, so they stay in the
/// mirror at the top level.
fn remove_from_mirror(entry: &mut RemoteTreeEntry, slug: &str) {
    if let Some(node) = remove_slug_from_tree(entry, slug) {
        for child in node.children {
            add_doc_under_slug(entry, child, None);
        }
    }
}

/// Identity handed back for create/update in dry-run mode.
fn dry_run_doc(form: &DocForm) -> Doc {
    Doc {
        id: format!("dry-run:{}", form.slug),
        slug: form.slug.clone(),
        title: form.title.clone(),
        body: String::new(),
        category: form.category.clone(),
        hidden: form.hidden,
        parent_doc: form.parent_doc.clone(),
    }
}

/// Log a failed create/update in full and turn it into a run error.
fn remote_failure(slug: &str, err: ClientError) -> SyncError {
    match err {
        ClientError::Rejected(rejection) => {
            error!(
                slug = %slug,
                code = %rejection.code,
                description = %rejection.description,
                "Remote store rejected document"
            );
            if let Some(errors) = &rejection.errors {
                for (field, problem) in errors {
                    error!(slug = %slug, field = %field, problem = %problem, "Field error");
                }
            }
            SyncError::Rejected {
                slug: slug.to_string(),
                rejection,
            }
        }
        other => SyncError::Client(other),
    }
}

/// Slugs present locally in one category, as seen by the deletion pass.
#[derive(Debug, Clone, Default)]
pub struct LocalSlugs {
    documents: HashSet<String>,
    groups: HashMap<String, LocalGroup>,
}

#[derive(Debug, Clone, Default)]
struct LocalGroup {
    has_index: bool,
    children: HashSet<String>,
}

impl LocalSlugs {
    pub fn from_entries(entries: &[LocalEntry]) -> Self {
        let mut slugs = Self::default();

        for entry in entries {
            match &entry.kind {
                EntryKind::Document => {
                    slugs.documents.insert(entry.slug.clone());
                }
                EntryKind::Group { index, children } => {
                    let group = LocalGroup {
                        has_index: index.is_some(),
                        children: children
                            .iter()
                            .filter(|c| c.is_document())
                            .map(|c| c.slug.clone())
                            .collect(),
                    };
                    slugs.groups.insert(entry.slug.clone(), group);
                }
                EntryKind::Other => {}
            }
        }

        slugs
    }

    /// A top-level document or a group with an index page maps to `slug`.
    pub fn has_parent(&self, slug: &str) -> bool {
        self.documents.contains(slug) || self.groups.get(slug).is_some_and(|g| g.has_index)
    }

    /// The group `parent` holds a document mapping to `child`.
    pub fn has_child(&self, parent: &str, child: &str) -> bool {
        self.groups
            .get(parent)
            .is_some_and(|g| g.children.contains(child))
    }
}

/// A remote document with no local counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deletion {
    pub slug: String,
    pub parent: Option<String>,
}

/// Decide which mirrored documents to delete, children before their parent.
pub fn plan_deletions(entry: &RemoteTreeEntry, local: &LocalSlugs) -> Vec<Deletion> {
    let mut deletions = Vec::new();

    for doc in &entry.docs {
        for child in &doc.children {
            if !local.has_child(&doc.slug, &child.slug) {
                deletions.push(Deletion {
                    slug: child.slug.clone(),
                    parent: Some(doc.slug.clone()),
                });
            }
        }

        if !local.has_parent(&doc.slug) {
            deletions.push(Deletion {
                slug: doc.slug.clone(),
                parent: None,
            });
        }
    }

    deletions
}
