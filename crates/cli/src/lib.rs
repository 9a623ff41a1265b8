use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flowdoc_core::normalize::{normalize_id, FALLBACK_UNIT_ID};
use tracing_subscriber::EnvFilter;

pub mod commands;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Try to canonicalize; if it fails (e.g., path does not yet exist),
        // join it with the current dir to get an absolute path.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Install the stderr log subscriber.
///
/// `--verbose` forces `debug`; otherwise `RUST_LOG` is honored and defaults to `warn`.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Name of the unit's `.mmd` file inside a diagrams directory.
///
/// Unit ids are not unique across units, so the 1-based position prefixes the id.
/// Loaded documents are not validated, so the id is normalized to stay a plain
/// file name.
pub fn diagram_file_name(index: usize, unit_id: &str) -> String {
    format!("{:02}-{}.mmd", index + 1, normalize_id(unit_id, FALLBACK_UNIT_ID))
}
