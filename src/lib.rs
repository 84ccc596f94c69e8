//! docsync - push a local Markdown docs tree to a slug-addressed document store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        LOCAL DOCS TREE                          │
//! │  root/category/[group/]doc.md  (YAML front matter + body)       │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ validate (no network)
//! ┌───────────────────────────────┴─────────────────────────────────┐
//! │                        SYNC ENGINE                              │
//! │  Mirror of the remote tree, kept in lockstep with every call    │
//! │  Upsert depth-first, then delete what has no local file         │
//! └───────────────────────────────┬─────────────────────────────────┘
//!                                 │ DocApi
//! ┌───────────────────────────────┴─────────────────────────────────┐
//! │                      REMOTE DOCUMENT STORE                      │
//! │  categories (read-only), docs by slug: create / update / delete │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Properties
//!
//! - **Validate first**: a tree with any structural or content problem
//!   never reaches the network
//! - **Fail closed**: a missing category or a rejected document stops the run
//! - **Idempotent**: a second run over an unchanged tree only issues updates

// === Core Modules ===

/// File and directory names to slugs and order.
pub mod naming;

/// In-memory mirror of the remote doc tree.
pub mod tree;

/// Local docs tree reader.
pub mod local;

/// Pre-flight validation gate.
pub mod validate;

/// Reconciliation engine.
pub mod sync;

// === External Service Clients ===

/// Remote document store client.
pub mod client;

// === Re-exports ===

pub use client::{ClientConfig, ClientError, DocApi, ReadmeClient};
pub use sync::{SyncConfig, SyncError, SyncReport, Syncer};
pub use validate::{validate_tree, ValidationReport};
