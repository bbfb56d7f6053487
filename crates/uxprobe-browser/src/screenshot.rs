//! Screenshot capture to disk

use crate::driver::PageDriver;
use crate::error::{BrowserError, Result};
use chrono::Utc;
use std::path::Path;
use tokio::fs;
use tracing::info;
use uxprobe_core::Screenshot;

/// Capture the current viewport and write it as a PNG to `path`
pub async fn capture_screenshot<D: PageDriver + ?Sized>(driver: &D, path: &Path) -> Result<Screenshot> {
    info!("Taking screenshot {}", path.display());
    let data = driver.capture_png().await?;
    write_png(path, &data).await
}

/// Write PNG bytes to `path`, creating parent directories
pub async fn write_png(path: &Path, data: &[u8]) -> Result<Screenshot> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await.map_err(|e| {
            BrowserError::Screenshot(format!("Failed to create directory {}: {}", dir.display(), e))
        })?;
    }

    fs::write(path, data).await.map_err(|e| {
        BrowserError::Screenshot(format!("Failed to write {}: {}", path.display(), e))
    })?;

    let screenshot = Screenshot {
        path: path.to_path_buf(),
        size_bytes: data.len() as u64,
        captured_at: Utc::now(),
    };

    info!(
        "Screenshot stored: {} ({} bytes)",
        screenshot.path.display(),
        screenshot.size_bytes
    );

    Ok(screenshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[tokio::test]
    async fn test_write_png_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/verification/verify-ux.png");

        let shot = write_png(&path, PNG_MAGIC).await.unwrap();

        assert_eq!(shot.path, path);
        assert_eq!(shot.size_bytes, 8);
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC);
    }

    #[tokio::test]
    async fn test_write_png_overwrites_previous_capture() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error.png");

        write_png(&path, &[0u8; 32]).await.unwrap();
        let shot = write_png(&path, PNG_MAGIC).await.unwrap();

        assert_eq!(shot.size_bytes, 8);
        assert_eq!(std::fs::read(&path).unwrap().len(), 8);
    }
}
