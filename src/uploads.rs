//! Upload Store
//! Mission: Persist product images under the static root with collision-free names

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// URL prefix the static file service is mounted under
pub const PUBLIC_PREFIX: &str = "/uploads";

const FALLBACK_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 10;

/// Directory-backed image storage
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    /// Create the storage root if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create upload dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under a fresh name and return its public path
    pub async fn save(&self, original_filename: &str, bytes: &[u8]) -> Result<String> {
        let file_name = format!("{}.{}", Uuid::new_v4(), sanitize_extension(original_filename));
        let target = self.root.join(&file_name);

        tokio::fs::write(&target, bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", target.display()))?;

        debug!("📎 Stored upload {} ({} bytes)", file_name, bytes.len());
        Ok(format!("{}/{}", PUBLIC_PREFIX, file_name))
    }

    /// Best-effort removal of previously saved files
    pub async fn remove_all(&self, public_paths: &[String]) {
        for public_path in public_paths {
            let Some(target) = self.resolve(public_path) else {
                warn!("Refusing to remove unmanaged path {}", public_path);
                continue;
            };
            match tokio::fs::remove_file(&target).await {
                Ok(()) => debug!("Removed upload {}", target.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove upload {}: {}", target.display(), e),
            }
        }
    }

    /// Map "/uploads/<name>" back to a file under the root. Anything with a
    /// path separator in the name is not one of ours.
    fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX)?.strip_prefix('/')?;
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return None;
        }
        Some(self.root.join(name))
    }
}

/// Extension after the last '.', lower-cased, if short and alphanumeric
pub fn sanitize_extension(original_filename: &str) -> String {
    original_filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}
