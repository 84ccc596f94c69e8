//! Document front matter.
//!
//! A document is a `---` delimited YAML block followed by the body:
//!
//! ```text
//! ---
//! title: Getting Started
//! hidden: false
//! excerpt: First steps
//! ---
//! Body text...
//! ```
//!
//! Only `title` (required string), `hidden` (optional bool) and `excerpt`
//! (optional string) are recognized.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

/// Keys allowed in a document's front matter.
pub const KNOWN_KEYS: &[&str] = &["title", "hidden", "excerpt"];

/// Problems with a document's front matter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontMatterError {
    #[error("invalid YAML: {0}")]
    Yaml(String),

    #[error("front matter must be a mapping")]
    NotMapping,

    #[error("invalid front matter key `{0}`")]
    UnknownKey(String),

    #[error("title missing or invalid")]
    MissingTitle,

    #[error("`{key}` must be {expected}")]
    InvalidType { key: &'static str, expected: &'static str },
}

/// Recognized metadata of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub hidden: bool,
    pub excerpt: Option<String>,
}

/// A document split into metadata and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub front_matter: FrontMatter,
    pub body: String,
}

/// Split content into the raw YAML block and the body.
///
/// Returns `None` when the content does not open with a `---` line or the
/// block is never closed; the whole content is then the body.
pub fn split_front_matter(content: &str) -> Option<(&str, &str)> {
    let content = content.trim_start_matches('\u{feff}');
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }

    None
}

/// Parse the YAML block into a mapping. A missing or empty block is an empty mapping.
fn parse_mapping(content: &str) -> Result<(Mapping, &str), FrontMatterError> {
    let Some((yaml, body)) = split_front_matter(content) else {
        return Ok((Mapping::new(), content));
    };

    if yaml.trim().is_empty() {
        return Ok((Mapping::new(), body));
    }

    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(map)) => Ok((map, body)),
        Ok(Value::Null) => Ok((Mapping::new(), body)),
        Ok(_) => Err(FrontMatterError::NotMapping),
        Err(e) => Err(FrontMatterError::Yaml(e.to_string())),
    }
}

/// Every front matter problem in a document, in key order.
pub fn check_front_matter(content: &str) -> Vec<FrontMatterError> {
    let map = match parse_mapping(content) {
        Ok((map, _)) => map,
        Err(e) => return vec![e],
    };

    let mut problems = Vec::new();

    for key in map.keys() {
        match key.as_str() {
            Some(k) if KNOWN_KEYS.contains(&k) => {}
            Some(k) => problems.push(FrontMatterError::UnknownKey(k.to_string())),
            None => problems.push(FrontMatterError::UnknownKey(format!("{:?}", key))),
        }
    }

    if !matches!(map.get("title"), Some(Value::String(_))) {
        problems.push(FrontMatterError::MissingTitle);
    }

    match map.get("hidden") {
        None | Some(Value::Null) | Some(Value::Bool(_)) => {}
        Some(_) => problems.push(FrontMatterError::InvalidType {
            key: "hidden",
            expected: "true or false",
        }),
    }

    match map.get("excerpt") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => problems.push(FrontMatterError::InvalidType {
            key: "excerpt",
            expected: "a string",
        }),
    }

    problems
}

/// Parse a document, failing on the first front matter problem.
pub fn parse_document(content: &str) -> Result<ParsedDocument, FrontMatterError> {
    if let Some(problem) = check_front_matter(content).into_iter().next() {
        return Err(problem);
    }

    let (map, body) = parse_mapping(content)?;

    let title = match map.get("title") {
        Some(Value::String(title)) => title.clone(),
        _ => return Err(FrontMatterError::MissingTitle),
    };
    let hidden = map.get("hidden").and_then(Value::as_bool).unwrap_or(false);
    let excerpt = map.get("excerpt").and_then(Value::as_str).map(str::to_string);

    Ok(ParsedDocument {
        front_matter: FrontMatter { title, hidden, excerpt },
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let content = "---\ntitle: Doc 1\nhidden: true\nexcerpt: Short\n---\n# Heading\nBody\n";
        let doc = parse_document(content).unwrap();
        assert_eq!(doc.front_matter.title, "Doc 1");
        assert!(doc.front_matter.hidden);
        assert_eq!(doc.front_matter.excerpt.as_deref(), Some("Short"));
        assert_eq!(doc.body, "# Heading\nBody\n");
    }

    #[test]
    fn test_defaults() {
        let doc = parse_document("---\ntitle: Doc\n---\nBody").unwrap();
        assert!(!doc.front_matter.hidden);
        assert!(doc.front_matter.excerpt.is_none());
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_bom_and_crlf() {
        let doc = parse_document("\u{feff}---\r\ntitle: Doc\r\n---\r\nBody").unwrap();
        assert_eq!(doc.front_matter.title, "Doc");
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn test_no_front_matter() {
        assert_eq!(check_front_matter("# Just a body"), vec![FrontMatterError::MissingTitle]);
        assert_eq!(parse_document("# Just a body"), Err(FrontMatterError::MissingTitle));
    }

    #[test]
    fn test_unclosed_block_is_body() {
        assert!(split_front_matter("---\ntitle: Doc\n").is_none());
    }

    #[test]
    fn test_collects_every_problem() {
        let problems = check_front_matter("---\ntitle: 5\nhidden: maybe\nauthor: me\n---\n");
        assert_eq!(
            problems,
            vec![
                FrontMatterError::UnknownKey("author".to_string()),
                FrontMatterError::MissingTitle,
                FrontMatterError::InvalidType { key: "hidden", expected: "true or false" },
            ]
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let problems = check_front_matter("---\ntitle: [unclosed\n---\n");
        assert!(matches!(problems.as_slice(), [FrontMatterError::Yaml(_)]));
    }

    #[test]
    fn test_not_mapping() {
        assert_eq!(check_front_matter("---\n- a\n- b\n---\n"), vec![FrontMatterError::NotMapping]);
    }

    #[test]
    fn test_excerpt_type() {
        let problems = check_front_matter("---\ntitle: Doc\nexcerpt: 3\n---\n");
        assert_eq!(
            problems,
            vec![FrontMatterError::InvalidType { key: "excerpt", expected: "a string" }]
        );
    }
}
