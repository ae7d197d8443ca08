//! Version layer for dependency update detection
//!
//! This module provides version parsing, update classification, upstream
//! lookups, and the persistent ledger of notifications already sent.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Registry  │────▶│   Checker   │────▶│   Ledger    │
//! │  (latest)   │     │ (classify)  │     │  (dedupe)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │
//!        ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐
//! │  Registries │     │   Semver    │
//! │    (npm)    │     │  (parse)    │
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`checker`]: Update classification (none / minor / major)
//! - [`error`]: Error types for ledger and fetch operations
//! - [`ledger`]: SQLite-backed notification ledger
//! - [`registry`]: Registry trait for fetching the latest upstream version
//! - [`registries`]: Concrete registry implementations
//! - [`semver`]: `SemanticVersion` and version string parsing

pub mod checker;
pub mod error;
pub mod ledger;
pub mod registries;
pub mod registry;
pub mod semver;
