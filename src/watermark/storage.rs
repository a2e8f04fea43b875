//! Output persistence.
//!
//! Encoded bytes are written to a temp file inside the output directory and
//! persisted under their final name only once the write succeeded. A temp
//! file that is dropped early is deleted, so a failed request leaves nothing
//! behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::error::{MarkerError, MarkerResult};

const GENERATED_SUFFIX: &str = "_image_marker";

/// File name for an output image.
///
/// Without a filename a collision-resistant `<uuid>_image_marker.<ext>` is
/// generated. A filename that does not already end in `.png` or `.jpg` gets
/// `.<ext>` appended.
pub fn output_file_name(filename: Option<&str>, extension: &str) -> String {
    match filename.map(str::trim).filter(|f| !f.is_empty()) {
        None => format!("{}{}.{}", Uuid::new_v4(), GENERATED_SUFFIX, extension),
        Some(name) => {
            let lower = name.to_ascii_lowercase();
            if lower.ends_with(".png") || lower.ends_with(".jpg") {
                name.to_string()
            } else {
                format!("{}.{}", name, extension)
            }
        }
    }
}

/// Writes encoded images into one output directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `bytes` and return the final path.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created or written, and
    /// `InvalidParameter` for a filename that is not a plain file name.
    pub fn persist(&self, bytes: &[u8], filename: Option<&str>, extension: &str) -> MarkerResult<PathBuf> {
        let name = output_file_name(filename, extension);
        if Path::new(&name).file_name().map(|n| n != name.as_str()).unwrap_or(true) {
            return Err(MarkerError::invalid_parameter(
                "filename",
                format!("'{}' must be a plain file name", name),
            ));
        }

        std::fs::create_dir_all(&self.dir)?;
        let mut temp = NamedTempFile::new_in(&self.dir)?;
        temp.write_all(bytes)?;
        temp.flush()?;

        let target = self.dir.join(&name);
        temp.persist(&target).map_err(|e| MarkerError::Io(e.error))?;

        tracing::debug!(path = %target.display(), bytes = bytes.len(), "Persisted output image");
        Ok(target)
    }
}
