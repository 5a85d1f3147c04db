//! Running queries against a [`WorkingSet`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::location::{ScopeForLocation, ScopeInfo};
use super::query::{Query, QueryContext};
use super::resolution::{CallTarget, DeclarationForVariableUse, DefinitionsForMethodCall};
use crate::base::SourceLocation;
use crate::error::{Error, Result};
use crate::hir::VariableDeclaration;
use crate::project::WorkingSet;

impl WorkingSet {
    /// Run `query` under the read lock on the calling thread.
    ///
    /// `timeout` overrides the configured read lock timeout.
    pub fn execute<Q: Query>(&self, query: &Q, timeout: Option<Duration>) -> Result<Q::Output> {
        debug!(query = std::any::type_name::<Q>(), "executing query");
        self.read_with(timeout, None, |tree, files| {
            query.run(&QueryContext::new(tree, files))
        })?
    }

    /// Run `query` on tokio's blocking pool.
    ///
    /// `cancel` is observed while waiting for the read lock and at the query's
    /// checkpoints. A cancelled call resolves to [`Error::Cancelled`]
    /// immediately; the background task drops its guard at its next
    /// checkpoint. Dropping the returned future cancels the background task
    /// the same way, without touching `cancel` itself.
    pub async fn execute_async<Q>(
        self: &Arc<Self>,
        query: Q,
        timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<Q::Output>
    where
        Q: Query + Send + 'static,
        Q::Output: Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        debug!(query = std::any::type_name::<Q>(), "executing query in background");

        let working_set = Arc::clone(self);
        let token = cancel.child_token();
        let _abandon = token.clone().drop_guard();
        let background = token.clone();
        let task = tokio::task::spawn_blocking(move || {
            let token = background;
            working_set.read_with(timeout, Some(&token), |tree, files| {
                let ctx = QueryContext::new(tree, files).with_cancellation(&token);
                ctx.checkpoint()?;
                query.run(&ctx)
            })?
        });

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(Error::Cancelled),
            joined = task => joined.map_err(|e| Error::Background(e.to_string()))?,
        }
    }

    /// The innermost scope containing `location`.
    pub fn find_scope(&self, location: &SourceLocation) -> Result<Option<ScopeInfo>> {
        self.execute(&ScopeForLocation::new(location.clone()), None)
    }

    /// The declaration of the variable used at `location`.
    ///
    /// When several declarations match equally, the first by location is
    /// returned; use [`DeclarationForVariableUse`] to see all of them.
    pub fn declaration_for_variable(
        &self,
        location: &SourceLocation,
    ) -> Result<Option<VariableDeclaration>> {
        let mut found = self.execute(&DeclarationForVariableUse::new(location.clone()), None)?;
        found.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(found.into_iter().next())
    }

    /// Candidate definitions for the call at `location`, best match first.
    pub fn definitions_for_call(&self, location: &SourceLocation) -> Result<Vec<CallTarget>> {
        self.execute(&DefinitionsForMethodCall::new(location.clone()), None)
    }
}
