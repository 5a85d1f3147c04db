//! Bulk loading of srcML files from a directory.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::config::WorkingSetConfig;
use crate::error::{Error, ParseError, Result};
use crate::syntax::ParsedUnit;
use crate::syntax::srcml;

/// Units read from a directory plus the files that could not be read.
#[derive(Debug, Default)]
pub struct LoadedUnits {
    pub units: Vec<ParsedUnit>,
    pub errors: Vec<ParseError>,
}

/// Collect srcML files below `root`, sorted by path.
///
/// Hidden directories are skipped.
pub fn collect_srcml_files(root: &Path, config: &WorkingSetConfig) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::Io {
            path: root.to_owned(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
        });
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry.map_err(|e| Error::Io {
            path: e.path().map(Path::to_owned).unwrap_or_else(|| root.to_owned()),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_srcml = entry
            .path()
            .extension()
            .is_some_and(|ext| config.is_srcml_extension(&ext.to_string_lossy()));
        if is_srcml {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read every srcML file below `root`, in parallel when configured.
///
/// A file that cannot be read or parsed is reported in
/// [`LoadedUnits::errors`] and does not stop the others.
pub fn load_directory(root: &Path, config: &WorkingSetConfig) -> Result<LoadedUnits> {
    let paths = collect_srcml_files(root, config)?;
    debug!(root = %root.display(), files = paths.len(), "collected srcML files");

    let read = |path: &PathBuf| srcml::parse_file(path).map_err(|e| into_parse_error(path, e));
    let results: Vec<_> = if config.parallel_load {
        paths.par_iter().map(read).collect()
    } else {
        paths.iter().map(read).collect()
    };

    let mut loaded = LoadedUnits::default();
    for result in results {
        match result {
            Ok(units) => loaded.units.extend(units),
            Err(err) => {
                warn!(file = %err.file, reason = %err.reason, "failed to read srcML file");
                loaded.errors.push(err);
            }
        }
    }
    Ok(loaded)
}

fn into_parse_error(path: &Path, err: Error) -> ParseError {
    match err {
        Error::Parse(err) => err,
        other => ParseError::new(path.to_string_lossy().as_ref(), other.to_string()),
    }
}
