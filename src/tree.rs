//! In-memory mirror of the remote document hierarchy.
//!
//! The remote API gives no guarantee that a re-query reflects a mutation
//! issued earlier in the same run, so the engine keeps this mirror in
//! lockstep with every create, update and delete instead of re-fetching.
//!
//! Nodes are owned values identified by slug. A node lives in exactly one
//! list at a time: either its category's top-level list or its parent's
//! children. Moving a node means removing it first and re-adding it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::client::{Category, DocSummaryChild, DocSummaryParent};

/// A document node in the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTreeDoc {
    pub slug: String,
    #[serde(default)]
    pub children: Vec<RemoteTreeDoc>,
}

impl RemoteTreeDoc {
    /// A node with no children.
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            children: Vec::new(),
        }
    }

    /// A node owning the given children.
    pub fn with_children(slug: impl Into<String>, children: Vec<RemoteTreeDoc>) -> Self {
        Self {
            slug: slug.into(),
            children,
        }
    }
}

impl From<&DocSummaryChild> for RemoteTreeDoc {
    fn from(child: &DocSummaryChild) -> Self {
        Self::new(child.slug.clone())
    }
}

impl From<&DocSummaryParent> for RemoteTreeDoc {
    fn from(parent: &DocSummaryParent) -> Self {
        Self::with_children(
            parent.slug.clone(),
            parent.children.iter().map(RemoteTreeDoc::from).collect(),
        )
    }
}

/// One category's metadata and its top-level documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteTreeEntry {
    pub category: Category,
    pub docs: Vec<RemoteTreeDoc>,
}

impl RemoteTreeEntry {
    /// Build an entry from the category record and the fetched doc summaries.
    pub fn new(category: Category, docs: &[DocSummaryParent]) -> Self {
        Self {
            category,
            docs: docs.iter().map(RemoteTreeDoc::from).collect(),
        }
    }

    /// Every slug in the entry, in pre-order.
    pub fn slugs(&self) -> Vec<&str> {
        fn collect<'a>(docs: &'a [RemoteTreeDoc], out: &mut Vec<&'a str>) {
            for doc in docs {
                out.push(&doc.slug);
                collect(&doc.children, out);
            }
        }

        let mut out = Vec::new();
        collect(&self.docs, &mut out);
        out
    }
}

/// Category slug -> mirrored category. The whole mutable remote state of a run.
pub type RemoteTree = BTreeMap<String, RemoteTreeEntry>;

/// Find a node by slug, depth-first in pre-order.
///
/// Top-level list order first, then each node's children in list order.
pub fn find_slug_in_tree<'a>(entry: &'a RemoteTreeEntry, slug: &str) -> Option<&'a RemoteTreeDoc> {
    find_in(&entry.docs, slug)
}

fn find_in<'a>(docs: &'a [RemoteTreeDoc], slug: &str) -> Option<&'a RemoteTreeDoc> {
    for doc in docs {
        if doc.slug == slug {
            return Some(doc);
        }
        if let Some(found) = find_in(&doc.children, slug) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(docs: &'a mut [RemoteTreeDoc], slug: &str) -> Option<&'a mut RemoteTreeDoc> {
    for doc in docs.iter_mut() {
        if doc.slug == slug {
            return Some(doc);
        }
        if let Some(found) = find_in_mut(&mut doc.children, slug) {
            return Some(found);
        }
    }
    None
}

/// Detach a node (with its children) from wherever it sits.
///
/// Each list is checked before descending into its members, so a top-level
/// match wins over a nested one.
pub fn remove_slug_from_tree(entry: &mut RemoteTreeEntry, slug: &str) -> Option<RemoteTreeDoc> {
    remove_from(&mut entry.docs, slug)
}

fn remove_from(docs: &mut Vec<RemoteTreeDoc>, slug: &str) -> Option<RemoteTreeDoc> {
    if let Some(pos) = docs.iter().position(|doc| doc.slug == slug) {
        return Some(docs.remove(pos));
    }
    docs.iter_mut().find_map(|doc| remove_from(&mut doc.children, slug))
}

/// Append a node under `parent_slug`, or at the top level when `None`.
///
/// Returns `false` and leaves the tree untouched if the parent is unknown.
pub fn add_doc_under_slug(
    entry: &mut RemoteTreeEntry,
    doc: RemoteTreeDoc,
    parent_slug: Option<&str>,
) -> bool {
    match parent_slug {
        None => {
            entry.docs.push(doc);
            true
        }
        Some(parent_slug) => match find_in_mut(&mut entry.docs, parent_slug) {
            Some(parent) => {
                parent.children.push(doc);
                true
            }
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(docs: Vec<RemoteTreeDoc>) -> RemoteTreeEntry {
        RemoteTreeEntry {
            category: Category::with_slug("cat-id", "category-a"),
            docs,
        }
    }

    fn nested() -> RemoteTreeEntry {
        entry(vec![RemoteTreeDoc::with_children(
            "a",
            vec![RemoteTreeDoc::with_children(
                "b",
                vec![RemoteTreeDoc::new("c"), RemoteTreeDoc::new("target")],
            )],
        )])
    }

    #[test]
    fn test_find_top_level() {
        let tree = entry(vec![RemoteTreeDoc::new("slug")]);
        assert_eq!(find_slug_in_tree(&tree, "slug"), Some(&RemoteTreeDoc::new("slug")));
    }

    #[test]
    fn test_find_nested() {
        let tree = nested();
        assert_eq!(
            find_slug_in_tree(&tree, "target"),
            Some(&RemoteTreeDoc::new("target"))
        );
        assert!(find_slug_in_tree(&tree, "missing").is_none());
    }

    #[test]
    fn test_find_is_preorder() {
        // Same slug twice: the earlier pre-order position wins.
        let tree = entry(vec![
            RemoteTreeDoc::with_children(
                "a",
                vec![RemoteTreeDoc::with_children("dup", vec![RemoteTreeDoc::new("x")])],
            ),
            RemoteTreeDoc::new("dup"),
        ]);
        let found = find_slug_in_tree(&tree, "dup").unwrap();
        assert_eq!(found.children.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut tree = entry(vec![RemoteTreeDoc::with_children(
            "a",
            vec![RemoteTreeDoc::new("b")],
        )]);

        assert!(remove_slug_from_tree(&mut tree, "d").is_none());

        assert_eq!(remove_slug_from_tree(&mut tree, "b"), Some(RemoteTreeDoc::new("b")));
        assert!(tree.docs[0].children.is_empty());

        assert_eq!(remove_slug_from_tree(&mut tree, "a"), Some(RemoteTreeDoc::new("a")));
        assert!(tree.docs.is_empty());
    }

    #[test]
    fn test_remove_keeps_children() {
        let mut tree = nested();
        let removed = remove_slug_from_tree(&mut tree, "b").unwrap();
        assert_eq!(removed.children.len(), 2);
        assert!(find_slug_in_tree(&tree, "b").is_none());
        assert!(find_slug_in_tree(&tree, "target").is_none());
        assert_eq!(tree.docs, vec![RemoteTreeDoc::new("a")]);
    }

    #[test]
    fn test_add_under_slug() {
        let mut tree = entry(vec![RemoteTreeDoc::with_children(
            "a",
            vec![RemoteTreeDoc::new("b"), RemoteTreeDoc::new("c")],
        )]);

        assert!(add_doc_under_slug(&mut tree, RemoteTreeDoc::new("d"), Some("c")));
        assert_eq!(tree.docs[0].children[1].children[0].slug, "d");

        assert!(add_doc_under_slug(&mut tree, RemoteTreeDoc::new("x"), None));
        assert_eq!(tree.docs[1].slug, "x");
    }

    #[test]
    fn test_add_under_unknown_parent_is_noop() {
        let mut tree = nested();
        let before = tree.clone();

        assert!(!add_doc_under_slug(&mut tree, RemoteTreeDoc::new("x"), Some("nonexistent")));
        assert_eq!(tree, before);
        assert_eq!(
            serde_json::to_string(&tree).unwrap(),
            serde_json::to_string(&before).unwrap()
        );
    }

    #[test]
    fn test_move_subtree_round_trip() {
        let mut tree = entry(vec![
            RemoteTreeDoc::with_children(
                "a",
                vec![RemoteTreeDoc::with_children("b", vec![RemoteTreeDoc::new("c")])],
            ),
            RemoteTreeDoc::new("z"),
        ]);

        let b = remove_slug_from_tree(&mut tree, "b").unwrap();
        assert!(add_doc_under_slug(&mut tree, b, Some("z")));

        assert_eq!(tree.slugs().iter().filter(|s| **s == "b").count(), 1);
        assert!(tree.docs[0].children.is_empty());
        assert_eq!(
            tree.docs[1],
            RemoteTreeDoc::with_children(
                "z",
                vec![RemoteTreeDoc::with_children("b", vec![RemoteTreeDoc::new("c")])]
            )
        );
    }

    #[test]
    fn test_entry_from_summaries() {
        let summaries: Vec<DocSummaryParent> = serde_json::from_value(serde_json::json!([
            {
                "_id": "1", "slug": "setup", "title": "Setup", "hidden": false, "order": 0,
                "children": [
                    { "_id": "2", "slug": "config", "title": "Config", "hidden": false, "order": 0 }
                ]
            },
            {
                "_id": "3", "slug": "faq", "title": "FAQ", "hidden": true, "order": 1,
                "children": []
            }
        ]))
        .unwrap();

        let tree = RemoteTreeEntry::new(Category::with_slug("cat-id", "category-a"), &summaries);
        assert_eq!(tree.slugs(), vec!["setup", "config", "faq"]);
    }
}
