//! Query layer: typed reads of a [`WorkingSet`](crate::project::WorkingSet).
//!
//! Each query is a small value implementing [`Query`]. Running it takes the
//! working set's read lock, traverses the tree and returns owned data, so no
//! reference into the tree outlives the lock.
//!
//! ## Usage
//!
//! ```ignore
//! use srcdata::ide::{DefinitionsForMethodCall, QueryExt};
//!
//! let query = DefinitionsForMethodCall::new(location).map(|targets| targets.len());
//! let count = working_set.execute(&query, Some(Duration::from_millis(100)))?;
//! let targets = working_set
//!     .execute_async(DefinitionsForMethodCall::new(location), None, token)
//!     .await?;
//! ```

mod execute;
mod location;
mod query;
mod resolution;

pub use location::{
    FindMethodCallsAtLocation, FindScopesByName, ScopeForLocation, ScopeInfo, StatementForLocation,
};
pub use query::{FnQuery, Map, Query, QueryContext, QueryExt, query_fn};
pub use resolution::{CallTarget, DeclarationForVariableUse, DefinitionsForMethodCall};
