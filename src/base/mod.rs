//! Foundation types for the program-data model.
//!
//! - [`FileId`] - handles for loaded translation units
//! - [`LineCol`], [`LineIndex`] - line/column conversion
//! - [`SourceLocation`] - the addressing unit for scopes, declarations and uses
//!
//! This module has NO dependencies on other crate modules.

mod file_id;
mod location;

pub use file_id::FileId;
pub use location::{LineCol, LineIndex, SourceLocation};

// Re-export text-size types for convenience
pub use text_size::TextSize;
