//! # srcml-data
//!
//! Incremental program-data model over srcML: scope trees, declarations,
//! name resolution and a concurrently queryable working set.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide      → Typed queries, sync and async execution
//!   ↓
//! project  → Working set, configuration, file events, bulk loading
//!   ↓
//! hir      → Scope trees, builder, global merge, resolution, diagnostics
//!   ↓
//! syntax   → srcML syntax trees and the srcML reader
//!   ↓
//! base     → Primitives (FileId, LineCol, SourceLocation)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use srcdata::{SourceLocation, WorkingSet, WorkingSetConfig};
//!
//! let ws = WorkingSet::new(WorkingSetConfig::default());
//! ws.initialize_from_directory("project/srcml".as_ref())?;
//! let decl = ws.declaration_for_variable(&SourceLocation::new("main.cpp", 12, 9))?;
//! ```

/// Foundation types: FileId, LineCol, SourceLocation
pub mod base;

/// Crate error type
pub mod error;

/// Parsed translation units and the srcML reader
pub mod syntax;

/// Program-data model: scope trees, merge and resolution
pub mod hir;

/// Working set management
pub mod project;

/// Query layer
pub mod ide;

pub use base::{FileId, LineCol, LineIndex, SourceLocation, TextSize};
pub use error::{Error, LockAccess, MergeConflict, ParseError, Result};
pub use project::{WorkingSet, WorkingSetConfig};
pub use syntax::{Language, ParsedUnit};
