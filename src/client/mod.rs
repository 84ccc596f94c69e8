//! Remote document store client.
//!
//! The engine only talks to the store through [`DocApi`]: fetch a category
//! and its doc tree, then create, update or delete single documents by slug.
//! [`ReadmeClient`] is the HTTP implementation.

pub mod config;
pub mod readme;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::ClientConfig;
pub use readme::ReadmeClient;

/// Errors returned by the remote client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Rejected by remote store: {0}")]
    Rejected(RemoteValidationError),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Structured rejection returned for an invalid create or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteValidationError {
    #[serde(alias = "error")]
    pub code: String,

    #[serde(alias = "message", default)]
    pub description: String,

    /// Per-field problems, keyed by field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, serde_json::Value>>,
}

impl fmt::Display for RemoteValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)?;
        if let Some(errors) = &self.errors {
            for (field, problem) in errors {
                match problem {
                    serde_json::Value::String(s) => write!(f, "; {}: {}", field, s)?,
                    other => write!(f, "; {}: {}", field, other)?,
                }
            }
        }
        Ok(())
    }
}

/// Remote category record. Read-only from our side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub reference: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Category {
    /// Minimal category record, titled after its slug.
    pub fn with_slug(id: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id: id.into(),
            title: slug.clone(),
            slug,
            version: String::new(),
            order: 0,
            reference: false,
            created_at: None,
        }
    }
}

/// A document as returned by create/update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doc {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub parent_doc: Option<String>,
}

/// Child entry of the category doc listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSummaryChild {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub order: i64,
}

/// Top-level entry of the category doc listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocSummaryParent {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub children: Vec<DocSummaryChild>,
}

/// Create/update payload.
///
/// `parent_doc` is always serialized; `null` places the document at the
/// top level of its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocForm {
    pub slug: String,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    pub category: String,
    pub parent_doc: Option<String>,
    pub hidden: bool,
}

/// The remote operations the sync engine depends on.
#[async_trait]
pub trait DocApi: Send + Sync {
    /// Fetch a category by slug; `ClientError::CategoryNotFound` if absent.
    async fn get_category(&self, slug: &str) -> Result<Category, ClientError>;

    /// Fetch the ordered doc tree of a category.
    async fn get_category_docs(&self, slug: &str) -> Result<Vec<DocSummaryParent>, ClientError>;

    async fn create_doc(&self, form: &DocForm) -> Result<Doc, ClientError>;

    async fn update_doc(&self, slug: &str, form: &DocForm) -> Result<Doc, ClientError>;

    async fn delete_doc(&self, slug: &str) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_form_serializes_null_parent() {
        let form = DocForm {
            slug: "doc1".to_string(),
            title: "Doc 1".to_string(),
            body: "Body".to_string(),
            excerpt: None,
            order: None,
            category: "cat-id".to_string(),
            parent_doc: None,
            hidden: false,
        };

        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["parentDoc"], serde_json::Value::Null);
        assert!(value.get("excerpt").is_none());
        assert!(value.get("order").is_none());
        assert_eq!(value["category"], "cat-id");
    }

    #[test]
    fn test_doc_form_serializes_optional_fields() {
        let form = DocForm {
            slug: "config".to_string(),
            title: "Config".to_string(),
            body: String::new(),
            excerpt: Some("Short".to_string()),
            order: Some(3),
            category: "cat-id".to_string(),
            parent_doc: Some("parent-id".to_string()),
            hidden: true,
        };

        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["parentDoc"], "parent-id");
        assert_eq!(value["excerpt"], "Short");
        assert_eq!(value["order"], 3);
        assert_eq!(value["hidden"], true);
    }

    #[test]
    fn test_category_deserializes_remote_shape() {
        let category: Category = serde_json::from_value(serde_json::json!({
            "_id": "5f1",
            "version": "v1.0",
            "project": "p1",
            "slug": "guides",
            "title": "Guides",
            "reference": false,
            "order": 2,
            "createdAt": "2020-01-01T00:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(category.id, "5f1");
        assert_eq!(category.order, 2);
        assert_eq!(category.created_at.as_deref(), Some("2020-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_remote_validation_error_display() {
        let err: RemoteValidationError = serde_json::from_value(serde_json::json!({
            "error": "DOC_INVALID",
            "message": "We couldn't save this doc",
            "errors": { "title": "required", "slug": { "kind": "unique" } }
        }))
        .unwrap();

        assert_eq!(err.code, "DOC_INVALID");
        assert_eq!(
            err.to_string(),
            "DOC_INVALID: We couldn't save this doc; slug: {\"kind\":\"unique\"}; title: required"
        );
    }
}
