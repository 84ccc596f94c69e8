//! Slug and order derivation from filesystem names.
//!
//! A local file or directory name maps to exactly one remote slug. Authors
//! can prefix a name with `"<digits> - "` to control display order without
//! affecting the slug:
//!
//! ```text
//! "10 - Getting Started.md"  ->  slug "getting-started", order 10
//! "FAQ.md"                   ->  slug "faq", no order
//! ```

use std::path::Path;

/// Extension every document file must carry.
pub const DOC_EXTENSION: &str = "md";

/// File inside a group directory that becomes the group's parent document.
pub const INDEX_FILE: &str = "index.md";

const ORDER_SEPARATOR: &str = " - ";

/// Canonicalize a name into a URL-safe slug.
///
/// Lowercases, replaces anything outside `[a-z0-9-]` with `-`, collapses
/// runs of `-` and trims them from both ends.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());

    for c in name.to_lowercase().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }

    slug.trim_matches('-').to_string()
}

/// Split an optional `"<digits> - "` prefix off a name.
///
/// Returns the remaining name and the parsed order. Names without the
/// prefix (or whose number does not fit) come back unchanged.
pub fn parse_order(name: &str) -> (&str, Option<i64>) {
    let Some((prefix, rest)) = name.split_once(ORDER_SEPARATOR) else {
        return (name, None);
    };

    if prefix.is_empty() || rest.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return (name, None);
    }

    match prefix.parse::<i64>() {
        Ok(order) => (rest, Some(order)),
        Err(_) => (name, None),
    }
}

/// The name with any order prefix removed.
pub fn name_without_order(name: &str) -> &str {
    parse_order(name).0
}

/// The explicit order carried by a name, if any.
pub fn order_from_name(name: &str) -> Option<i64> {
    parse_order(name).1
}

/// Whether a file name carries the document extension.
pub fn is_document(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext == DOC_EXTENSION)
        .unwrap_or(false)
}

/// File name without the document extension.
pub fn document_stem(name: &str) -> &str {
    name.strip_suffix(DOC_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(name)
}

/// Slug of a document file (`"2 - Install Guide.md"` -> `"install-guide"`).
pub fn document_slug(file_name: &str) -> String {
    slugify(name_without_order(document_stem(file_name)))
}

/// Slug of a group directory; the directory name, not its index file, names the group.
pub fn group_slug(dir_name: &str) -> String {
    slugify(name_without_order(dir_name))
}
