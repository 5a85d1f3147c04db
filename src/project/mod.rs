//! Project management: the working set and what feeds it.
//!
//! The [`WorkingSet`] owns the merged scope tree of one project. Files reach
//! it as parsed units, either in bulk ([`WorkingSet::initialize`], the
//! [`loader`] for directories of srcML files) or one at a time through
//! [`FileEvent`]s and a [`UnitProvider`].

mod config;
mod events;
#[cfg(feature = "srcml")]
pub mod loader;
mod statistics;
mod working_set;

pub use config::WorkingSetConfig;
pub use events::{FileChangeKind, FileEvent, MemoryProvider, UnitProvider};
pub use statistics::{FileEventCounts, Statistics};
pub use working_set::{LoadReport, WorkingSet};
