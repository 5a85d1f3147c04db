//! The working set: the mutable, queryable aggregate of every loaded file.
//!
//! One writer at a time mutates the global [`ScopeTree`]; any number of
//! readers traverse it under a shared lock. Per-file scope trees are built
//! outside the lock so the exclusive section covers only the structural merge.
//!
//! Lock acquisition takes an optional timeout. Running out of time is reported
//! as [`Error::LockTimeout`], never as an empty result. When a cancellation
//! token is supplied the wait is sliced by
//! [`WorkingSetConfig::cancellation_poll_interval`] so a cancelled caller gives
//! up promptly without ever holding the lock.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use rayon::prelude::*;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::WorkingSetConfig;
use super::events::{FileChangeKind, FileEvent, UnitProvider};
use super::statistics::{FileEventCounts, Statistics};
use crate::base::SourceLocation;
use crate::error::{Error, LockAccess, MergeConflict, ParseError, Result};
use crate::hir::{
    Diagnostic, DiagnosticCollector, FileSet, ScopeTree, Severity, build, check_calls, merge_file,
    remove_file,
};
use crate::syntax::ParsedUnit;

/// Outcome of a bulk load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Units merged into the tree.
    pub loaded: usize,
    pub parse_errors: Vec<ParseError>,
    pub conflicts: Vec<MergeConflict>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.parse_errors.is_empty() && self.conflicts.is_empty()
    }
}

/// The program-data model of one project.
///
/// Explicitly constructed and explicitly torn down with [`dispose`]. Share it
/// between threads behind an `Arc`.
///
/// [`dispose`]: WorkingSet::dispose
#[derive(Debug)]
pub struct WorkingSet {
    config: WorkingSetConfig,
    tree: RwLock<ScopeTree>,
    files: FileSet,
    diagnostics: Mutex<DiagnosticCollector>,
    events: Mutex<FileEventCounts>,
    version: watch::Sender<u64>,
    disposed: AtomicBool,
    monitor: Mutex<Option<CancellationToken>>,
}

impl Default for WorkingSet {
    fn default() -> Self {
        Self::new(WorkingSetConfig::default())
    }
}

impl WorkingSet {
    pub fn new(config: WorkingSetConfig) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            config,
            tree: RwLock::new(ScopeTree::new()),
            files: FileSet::new(),
            diagnostics: Mutex::new(DiagnosticCollector::new()),
            events: Mutex::new(FileEventCounts::default()),
            version,
            disposed: AtomicBool::new(false),
            monitor: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &WorkingSetConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Locking
    // ------------------------------------------------------------------------

    fn ensure_live(&self) -> Result<()> {
        if self.disposed.load(Ordering::Acquire) {
            Err(Error::Disposed)
        } else {
            Ok(())
        }
    }

    fn acquire<G>(
        &self,
        access: LockAccess,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
        try_for: impl Fn(Duration) -> Option<G>,
        block: impl FnOnce() -> G,
    ) -> Result<G> {
        let timed_out = |timeout: Duration| {
            warn!(%access, ?timeout, "lock acquisition timed out");
            Error::LockTimeout { access, timeout }
        };

        let Some(token) = cancel else {
            return match timeout {
                None => Ok(block()),
                Some(timeout) => try_for(timeout).ok_or_else(|| timed_out(timeout)),
            };
        };

        let poll = self.config.cancellation_poll_interval;
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if token.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let slice = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()).min(poll),
                None => poll,
            };
            if let Some(guard) = try_for(slice) {
                return Ok(guard);
            }
            if let (Some(deadline), Some(timeout)) = (deadline, timeout) {
                if Instant::now() >= deadline {
                    return Err(timed_out(timeout));
                }
            }
        }
    }

    fn read_guard(
        &self,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
    ) -> Result<RwLockReadGuard<'_, ScopeTree>> {
        self.ensure_live()?;
        self.acquire(
            LockAccess::Read,
            timeout.or(self.config.read_lock_timeout),
            cancel,
            |t| self.tree.try_read_for(t),
            || self.tree.read(),
        )
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ScopeTree>> {
        self.ensure_live()?;
        self.acquire(
            LockAccess::Write,
            self.config.write_lock_timeout,
            None,
            |t| self.tree.try_write_for(t),
            || self.tree.write(),
        )
    }

    /// Run `f` against the global tree under the read lock.
    ///
    /// `timeout` overrides [`WorkingSetConfig::read_lock_timeout`]. The lock
    /// is released before the result is returned, so `f` should produce owned
    /// data.
    pub fn read<R>(&self, timeout: Option<Duration>, f: impl FnOnce(&ScopeTree) -> R) -> Result<R> {
        let tree = self.read_guard(timeout, None)?;
        Ok(f(&tree))
    }

    pub(crate) fn read_with<R>(
        &self,
        timeout: Option<Duration>,
        cancel: Option<&CancellationToken>,
        f: impl FnOnce(&ScopeTree, &FileSet) -> R,
    ) -> Result<R> {
        let tree = self.read_guard(timeout, cancel)?;
        Ok(f(&tree, &self.files))
    }

    // ------------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------------

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }

    fn record(&self, file: &str, diagnostic: Diagnostic) {
        let mut diagnostics = self.diagnostics.lock();
        diagnostics.clear_file(file);
        diagnostics.add(diagnostic);
    }

    /// Build `unit` and merge it into the global tree, replacing any earlier
    /// contribution of the same file.
    ///
    /// On a parse error or merge conflict the file's previous contribution is
    /// kept and the error is recorded in [`diagnostics`](Self::diagnostics).
    pub fn add_or_update_file(&self, unit: &ParsedUnit) -> Result<()> {
        self.ensure_live()?;
        let incoming = match build(unit) {
            Ok(tree) => tree,
            Err(err) => {
                warn!(file = %unit.path, reason = %err.reason, "failed to build scope tree");
                self.record(&unit.path, Diagnostic::from(&err));
                return Err(err.into());
            }
        };

        let mut tree = self.write_guard()?;
        match merge_file(&mut tree, &incoming, &unit.path) {
            Ok(added) => {
                self.files.insert(&unit.path, unit.language);
                self.diagnostics.lock().clear_file(&unit.path);
                drop(tree);
                debug!(file = %unit.path, added, "updated file");
                self.bump_version();
                Ok(())
            }
            Err(conflict) => {
                drop(tree);
                warn!(file = %unit.path, name = %conflict.qualified_name, "merge conflict");
                self.record(&unit.path, Diagnostic::from(&conflict));
                Err(conflict.into())
            }
        }
    }

    /// Take every declaration, scope and use site of `path` out of the tree.
    ///
    /// Returns whether the file was loaded.
    pub fn remove_file(&self, path: &str) -> Result<bool> {
        let mut tree = self.write_guard()?;
        let removed = remove_file(&mut tree, path);
        let was_loaded = self.files.remove(path).is_some();
        self.diagnostics.lock().clear_file(path);
        drop(tree);

        debug!(file = path, scopes = removed, was_loaded, "removed file");
        if was_loaded {
            self.bump_version();
        }
        Ok(was_loaded)
    }

    /// Move a file: its old contribution is removed, then `unit` is added.
    ///
    /// When `unit` fails to build or merge, the old path stays removed.
    pub fn rename_file(&self, old_path: &str, unit: &ParsedUnit) -> Result<()> {
        self.remove_file(old_path)?;
        self.add_or_update_file(unit)
    }

    /// Replace the whole tree with `units`.
    ///
    /// Units are built in parallel when [`WorkingSetConfig::parallel_load`] is
    /// set and merged in order. Units that fail are reported and skipped.
    pub fn initialize(&self, units: &[ParsedUnit]) -> Result<LoadReport> {
        self.ensure_live()?;
        let built: Vec<Result<ScopeTree, ParseError>> = if self.config.parallel_load {
            units.par_iter().map(build).collect()
        } else {
            units.iter().map(build).collect()
        };

        let mut report = LoadReport::default();
        let mut tree = self.write_guard()?;
        *tree = ScopeTree::new();
        self.files.clear();
        {
            let mut diagnostics = self.diagnostics.lock();
            diagnostics.clear();
            for (unit, result) in units.iter().zip(built) {
                let incoming = match result {
                    Ok(incoming) => incoming,
                    Err(err) => {
                        warn!(file = %unit.path, reason = %err.reason, "failed to build scope tree");
                        diagnostics.add(Diagnostic::from(&err));
                        report.parse_errors.push(err);
                        continue;
                    }
                };
                match merge_file(&mut tree, &incoming, &unit.path) {
                    Ok(_) => {
                        self.files.insert(&unit.path, unit.language);
                        report.loaded += 1;
                    }
                    Err(conflict) => {
                        warn!(file = %unit.path, name = %conflict.qualified_name, "merge conflict");
                        diagnostics.add(Diagnostic::from(&conflict));
                        report.conflicts.push(conflict);
                    }
                }
            }
        }
        let scopes = tree.len();
        drop(tree);

        info!(
            files = report.loaded,
            scopes,
            parse_errors = report.parse_errors.len(),
            conflicts = report.conflicts.len(),
            "initialized working set"
        );
        self.bump_version();
        Ok(report)
    }

    /// Load every srcML file below `root` and [`initialize`](Self::initialize)
    /// from them.
    #[cfg(feature = "srcml")]
    pub fn initialize_from_directory(&self, root: &std::path::Path) -> Result<LoadReport> {
        self.ensure_live()?;
        let loaded = super::loader::load_directory(root, &self.config)?;
        let mut report = self.initialize(&loaded.units)?;

        let mut diagnostics = self.diagnostics.lock();
        for err in &loaded.errors {
            diagnostics.add(Diagnostic::from(err));
        }
        drop(diagnostics);
        let mut parse_errors = loaded.errors;
        parse_errors.append(&mut report.parse_errors);
        report.parse_errors = parse_errors;
        Ok(report)
    }

    /// Drop every file, keeping the working set usable.
    pub fn clear(&self) -> Result<()> {
        let mut tree = self.write_guard()?;
        *tree = ScopeTree::new();
        self.files.clear();
        self.diagnostics.lock().clear();
        drop(tree);

        info!("cleared working set");
        self.bump_version();
        Ok(())
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    /// Loaded file paths, in load order.
    pub fn files(&self) -> Vec<Arc<str>> {
        self.files.paths()
    }

    pub fn file_set(&self) -> &FileSet {
        &self.files
    }

    // ------------------------------------------------------------------------
    // File events
    // ------------------------------------------------------------------------

    /// Apply one file event, fetching new units from `provider`.
    pub fn process_event(&self, event: &FileEvent, provider: &dyn UnitProvider) -> Result<()> {
        self.ensure_live()?;
        self.events.lock().record(&event.kind);
        debug!(file = %event.path, kind = %event.kind, "processing file event");

        match &event.kind {
            FileChangeKind::Added | FileChangeKind::Modified => {
                for unit in provider.units(&event.path)? {
                    self.add_or_update_file(&unit)?;
                }
            }
            FileChangeKind::Deleted => {
                self.remove_file(&event.path)?;
            }
            FileChangeKind::Renamed { old_path } => {
                let units = provider.units(&event.path)?;
                self.remove_file(old_path)?;
                for unit in &units {
                    self.add_or_update_file(unit)?;
                }
            }
        }
        Ok(())
    }

    /// Consume `events` in order on a background task until the channel
    /// closes, `cancel` fires, or [`stop_monitoring`](Self::stop_monitoring)
    /// is called.
    ///
    /// Must be called from within a tokio runtime. Errors of individual events
    /// are logged and do not stop the monitor.
    pub fn monitor(
        self: &Arc<Self>,
        mut events: mpsc::Receiver<FileEvent>,
        provider: Arc<dyn UnitProvider>,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<()>> {
        self.ensure_live()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Background(e.to_string()))?;

        let token = cancel.child_token();
        if let Some(previous) = self.monitor.lock().replace(token.clone()) {
            previous.cancel();
        }

        let working_set = Arc::clone(self);
        Ok(runtime.spawn(async move {
            info!("monitoring file events");
            loop {
                let event = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    event = events.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };

                let path = event.path.clone();
                let ws = Arc::clone(&working_set);
                let provider = Arc::clone(&provider);
                match tokio::task::spawn_blocking(move || ws.process_event(&event, provider.as_ref()))
                    .await
                {
                    Ok(Ok(())) => {}
                    Ok(Err(Error::Disposed)) => break,
                    Ok(Err(err)) => warn!(file = %path, error = %err, "failed to process file event"),
                    Err(err) => warn!(file = %path, error = ?err, "file event task panicked"),
                }
            }
            info!("stopped monitoring file events");
        }))
    }

    /// Stop the running monitor, if any. Returns whether one was running.
    pub fn stop_monitoring(&self) -> bool {
        match self.monitor.lock().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Stop monitoring and drop the tree. Every later call fails with
    /// [`Error::Disposed`]. Calling it again has no effect.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.stop_monitoring();
        let mut tree = self.tree.write();
        *tree = ScopeTree::new();
        self.files.clear();
        self.diagnostics.lock().clear();
        drop(tree);
        info!("disposed working set");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------------

    /// Receives the version after every successful mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn statistics(&self) -> Result<Statistics> {
        let tree = self.read_guard(None, None)?;
        let mut stats = Statistics::from_tree(&tree);
        drop(tree);
        stats.files = self.files.len();
        stats.error_count = self.diagnostics.lock().error_count();
        stats.file_events = *self.events.lock();
        Ok(stats)
    }

    /// Parse errors and merge conflicts recorded so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().diagnostics().to_vec()
    }

    /// Distinct error reasons with the locations they were reported at.
    pub fn errors(&self) -> IndexMap<Arc<str>, Vec<SourceLocation>> {
        let mut out: IndexMap<Arc<str>, Vec<SourceLocation>> = IndexMap::new();
        for diagnostic in self.diagnostics.lock().diagnostics() {
            if diagnostic.severity == Severity::Error {
                out.entry(diagnostic.message.clone())
                    .or_default()
                    .push(diagnostic.location.clone());
            }
        }
        out
    }

    pub fn error_locations(&self, reason: &str) -> Vec<SourceLocation> {
        self.errors().shift_remove(reason).unwrap_or_default()
    }

    /// Unresolved and ambiguous method calls in `file`.
    pub fn check_calls(&self, file: &str) -> Result<Vec<Diagnostic>> {
        self.read(None, |tree| check_calls(tree, file))
    }
}
