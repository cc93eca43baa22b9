//! Session-scoped storage for pipeline chart images
//!
//! Each fetched chart is written to its own file under the chart directory and
//! wrapped in a [`ChartHandle`]. Dropping the handle removes the file, so a
//! superseded chart is released as soon as the view model replaces it and the
//! last one goes away when the dashboard exits.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::error::Result;

const CHART_PREFIX: &str = "chart-";
const CHART_EXTENSION: &str = "png";
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Writes chart bytes into handle-owned files.
#[derive(Debug, Clone)]
pub struct ChartStore {
    dir: Arc<PathBuf>,
}

impl ChartStore {
    /// Open the store, creating the directory and removing charts left behind
    /// by a session that did not exit cleanly.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut swept = 0usize;
        for entry in std::fs::read_dir(&dir)?.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(CHART_PREFIX) && std::fs::remove_file(entry.path()).is_ok() {
                swept += 1;
            }
        }
        if swept > 0 {
            tracing::info!(dir = %dir.display(), swept, "Removed stale chart files");
        }

        Ok(Self { dir: Arc::new(dir) })
    }

    /// Directory holding chart files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store chart bytes in a new file and return its handle.
    pub fn store(&self, bytes: &[u8]) -> Result<ChartHandle> {
        let path = self.dir.join(format!(
            "{}{}.{}",
            CHART_PREFIX,
            uuid::Uuid::new_v4(),
            CHART_EXTENSION
        ));
        std::fs::write(&path, bytes)?;

        let digest = hex::encode(Sha256::digest(bytes));
        let handle = ChartHandle {
            path,
            digest,
            len: bytes.len(),
            dimensions: png_dimensions(bytes),
            fetched_at: Utc::now(),
        };

        tracing::debug!(
            path = %handle.path.display(),
            bytes = handle.len,
            digest = %handle.short_digest(),
            "Stored chart"
        );
        Ok(handle)
    }
}

/// Reference to one fetched chart image.
///
/// Not `Clone`: exactly one owner decides when the file is released.
#[derive(Debug)]
pub struct ChartHandle {
    path: PathBuf,
    digest: String,
    len: usize,
    dimensions: Option<(u32, u32)>,
    fetched_at: DateTime<Utc>,
}

impl ChartHandle {
    /// Local file holding the image
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// SHA-256 of the image bytes, hex encoded
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// First 12 hex characters of the digest
    pub fn short_digest(&self) -> &str {
        &self.digest[..self.digest.len().min(12)]
    }

    /// Image size in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Width and height when the image is a PNG
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// When the image was fetched
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

impl Drop for ChartHandle {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Released chart"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to release chart"
            ),
        }
    }
}

/// Read width and height from the IHDR chunk of a PNG.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    Some((width, height))
}
