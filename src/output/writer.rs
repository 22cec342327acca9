//! All-or-nothing output destinations.
//!
//! Every output is rendered to memory before any destination is touched.
//! Files are written to a temporary sibling and renamed over the target,
//! so a destination either holds a complete document or is left as it was.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Error writing an output destination.
#[derive(thiserror::Error, Debug)]
#[error("Failed to write {path}: {source}")]
pub struct WriteError {
    /// Destination being written
    pub path: PathBuf,
    /// Underlying error
    #[source]
    pub source: io::Error,
}

/// Where a rendered document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Standard output
    Stdout,
    /// A regular file, replaced atomically
    File(PathBuf),
    /// An executable script file, replaced atomically
    Script(PathBuf),
}

impl Destination {
    /// Standard output when `path` is `None` or `-`, a file otherwise.
    #[must_use]
    pub fn from_option(path: Option<&Path>) -> Self {
        match path {
            Some(p) if p != Path::new("-") => Self::File(p.to_path_buf()),
            _ => Self::Stdout,
        }
    }

    /// Write `contents` in full.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if the temporary file cannot be created,
    /// written or persisted.
    pub fn write(&self, contents: &[u8]) -> Result<(), WriteError> {
        match self {
            Self::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(contents)
                    .and_then(|()| stdout.flush())
                    .map_err(|source| WriteError {
                        path: PathBuf::from("<stdout>"),
                        source,
                    })
            }
            Self::File(path) => write_atomic(path, contents, false),
            Self::Script(path) => write_atomic(path, contents, true),
        }
    }
}

/// A rendered document paired with its destination.
#[derive(Debug, Clone)]
pub struct PendingOutput {
    /// Where the document goes
    pub destination: Destination,
    /// The full document
    pub contents: Vec<u8>,
}

/// Write every pending output, in order.
///
/// # Errors
///
/// Stops at the first destination that cannot be written.
pub fn write_all(outputs: &[PendingOutput]) -> Result<(), WriteError> {
    for output in outputs {
        output.destination.write(&output.contents)?;
        if let Destination::File(path) | Destination::Script(path) = &output.destination {
            log::info!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, contents: &[u8], executable: bool) -> Result<(), WriteError> {
    let wrap = |source: io::Error| WriteError {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut temp = NamedTempFile::new_in(&parent).map_err(wrap)?;
    temp.write_all(contents).map_err(wrap)?;
    temp.as_file().sync_all().map_err(wrap)?;

    if executable {
        set_executable(temp.path()).map_err(wrap)?;
    }

    temp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
