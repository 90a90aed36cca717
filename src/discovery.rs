//! Finds the source files a command should operate on.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{build_error, io_error, unspanned, ErrorKind, RetrofitError, SourceContext};

/// Resolves `root` into a sorted list of source files.
///
/// A file path is returned as-is regardless of its extension. A directory is
/// walked recursively and only files whose extension is in `extensions` are
/// kept; the list is sorted so output order is deterministic.
pub fn discover_sources<P: AsRef<Path>>(
    root: P,
    extensions: &[String],
) -> Result<Vec<PathBuf>, RetrofitError> {
    let root = root.as_ref();
    let metadata = root.metadata().map_err(|e| io_error(root, &e))?;
    if metadata.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(io) => io_error(&path, &io),
                None => {
                    let path = path.display().to_string();
                    build_error(
                        &SourceContext::fallback(&path),
                        "io",
                        ErrorKind::Io {
                            path: path.clone(),
                            message: "filesystem loop detected".into(),
                        },
                        unspanned(),
                    )
                }
            }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !has_extension(path, extensions) {
            continue;
        }

        files.push(path.to_path_buf());
    }
    files.sort();
    tracing::debug!(root = %root.display(), count = files.len(), "discovered sources");
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}
