//! The query abstraction: typed, composable reads of the working set.

use tokio_util::sync::CancellationToken;

use crate::base::SourceLocation;
use crate::error::{Error, Result};
use crate::hir::{FileSet, ScopeTree};

/// What a query sees while it runs: the read-locked tree and the files in it.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    tree: &'a ScopeTree,
    files: &'a FileSet,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> QueryContext<'a> {
    pub fn new(tree: &'a ScopeTree, files: &'a FileSet) -> Self {
        Self {
            tree,
            files,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn tree(&self) -> &'a ScopeTree {
        self.tree
    }

    pub fn files(&self) -> &'a FileSet {
        self.files
    }

    /// Fails with [`Error::Cancelled`] once the query's token has fired.
    ///
    /// Long traversals call this between units of work.
    pub fn checkpoint(&self) -> Result<()> {
        match self.cancel {
            Some(token) if token.is_cancelled() => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }

    /// Reject locations in files the working set has not loaded.
    pub fn require_loaded(&self, location: &SourceLocation) -> Result<()> {
        if self.files.contains(location.file()) {
            Ok(())
        } else {
            Err(Error::invalid_input(format!(
                "{} is not part of the loaded project",
                location.file()
            )))
        }
    }
}

/// A read-only computation over the working set.
///
/// Implementations return owned data; nothing borrowed from the context may
/// escape, since the read lock is released when `run` returns.
pub trait Query {
    type Output;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output>;
}

impl<Q: Query + ?Sized> Query for &Q {
    type Output = Q::Output;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<Self::Output> {
        (**self).run(ctx)
    }
}

/// Combinators for [`Query`].
pub trait QueryExt: Query + Sized {
    /// Post-process the output of this query.
    fn map<F, U>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Output) -> U,
    {
        Map { query: self, f }
    }
}

impl<Q: Query> QueryExt for Q {}

/// See [`QueryExt::map`].
#[derive(Clone, Debug)]
pub struct Map<Q, F> {
    query: Q,
    f: F,
}

impl<Q, F, U> Query for Map<Q, F>
where
    Q: Query,
    F: Fn(Q::Output) -> U,
{
    type Output = U;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<U> {
        self.query.run(ctx).map(&self.f)
    }
}

/// A query from a closure.
pub fn query_fn<F, T>(f: F) -> FnQuery<F>
where
    F: Fn(&QueryContext<'_>) -> Result<T>,
{
    FnQuery { f }
}

/// See [`query_fn`].
#[derive(Clone, Debug)]
pub struct FnQuery<F> {
    f: F,
}

impl<F, T> Query for FnQuery<F>
where
    F: Fn(&QueryContext<'_>) -> Result<T>,
{
    type Output = T;

    fn run(&self, ctx: &QueryContext<'_>) -> Result<T> {
        (self.f)(ctx)
    }
}
