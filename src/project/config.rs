//! Working set configuration.

use std::time::Duration;

/// Configuration for a [`WorkingSet`](super::WorkingSet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingSetConfig {
    /// How long queries wait for the read lock (default: forever)
    pub read_lock_timeout: Option<Duration>,
    /// How long updates wait for the write lock (default: forever)
    pub write_lock_timeout: Option<Duration>,
    /// Slice length used to wait for a lock while a cancellation token is active
    pub cancellation_poll_interval: Duration,
    /// Build per-file scope trees in parallel during bulk initialization
    pub parallel_load: bool,
    /// File extensions the directory loader treats as srcML
    pub srcml_extensions: Vec<String>,
}

impl Default for WorkingSetConfig {
    fn default() -> Self {
        Self {
            read_lock_timeout: None,
            write_lock_timeout: None,
            cancellation_poll_interval: Duration::from_millis(10),
            parallel_load: true,
            srcml_extensions: vec!["xml".to_string(), "srcml".to_string()],
        }
    }
}

impl WorkingSetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_lock_timeout(mut self, timeout: Duration) -> Self {
        self.read_lock_timeout = Some(timeout);
        self
    }

    pub fn with_write_lock_timeout(mut self, timeout: Duration) -> Self {
        self.write_lock_timeout = Some(timeout);
        self
    }

    /// Use the same timeout for both sides of the lock.
    pub fn with_lock_timeout(self, timeout: Duration) -> Self {
        self.with_read_lock_timeout(timeout)
            .with_write_lock_timeout(timeout)
    }

    pub fn with_cancellation_poll_interval(mut self, interval: Duration) -> Self {
        // A zero slice would spin.
        self.cancellation_poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn with_parallel_load(mut self, parallel: bool) -> Self {
        self.parallel_load = parallel;
        self
    }

    pub fn with_srcml_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.srcml_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `extension` (without the dot) names a srcML file.
    pub fn is_srcml_extension(&self, extension: &str) -> bool {
        self.srcml_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}
