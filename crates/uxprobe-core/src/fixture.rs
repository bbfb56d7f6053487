//! Activity-log fixture
//!
//! The application reads its activity log from `.cache/activity-logs.json`
//! under its working directory: a JSON array, newest entry first. Seeding that
//! file lets a run assert on log rendering without driving the app into
//! producing a log line itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{ProbeError, Result};

/// Location of the log file relative to the application root
pub const ACTIVITY_LOG_PATH: &str = ".cache/activity-logs.json";

/// Severity of a log entry as the application renders it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Error,
    Warn,
    Success,
}

/// One activity-log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Build an INFO entry with a fresh UUID that also appears in the message
    pub fn unique(message_prefix: &str) -> Self {
        let id = Uuid::new_v4().to_string();
        Self {
            message: format!("{} {}", message_prefix, id),
            id,
            timestamp: Utc::now(),
            level: LogLevel::Info,
            details: None,
        }
    }
}

/// Handle on the activity-log file of one application checkout
#[derive(Debug, Clone)]
pub struct ActivityLogFixture {
    path: PathBuf,
}

impl ActivityLogFixture {
    pub fn new(app_root: &Path) -> Self {
        Self {
            path: app_root.join(ACTIVITY_LOG_PATH),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the log with a single-element array holding `entry`
    pub async fn seed(&self, entry: &LogEntry) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).await.map_err(|e| {
                ProbeError::Fixture(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        let content = serde_json::to_string_pretty(&[entry])?;
        fs::write(&self.path, content).await.map_err(|e| {
            ProbeError::Fixture(format!("Failed to write {}: {}", self.path.display(), e))
        })?;

        info!("Seeded activity log {} with entry {}", self.path.display(), entry.id);
        Ok(())
    }

    /// Read the current entries
    ///
    /// A missing or unparseable file reads as an empty log, the same way the
    /// application treats it.
    pub async fn entries(&self) -> Result<Vec<LogEntry>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Activity log {} does not exist", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Activity log {} is corrupted: {}", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    /// Raw file contents, `None` if the file does not exist
    pub async fn snapshot(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Put back contents taken with [`snapshot`](Self::snapshot)
    pub async fn restore(&self, snapshot: Option<String>) -> Result<()> {
        match snapshot {
            Some(content) => {
                fs::write(&self.path, content).await?;
                debug!("Restored activity log {}", self.path.display());
                Ok(())
            }
            None => self.remove().await,
        }
    }

    /// Delete the log file if present
    pub async fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed activity log {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unique_entry_embeds_id() {
        let a = LogEntry::unique("uxprobe entry");
        let b = LogEntry::unique("uxprobe entry");

        assert_ne!(a.id, b.id);
        assert!(a.message.contains(&a.id));
        assert!(a.message.starts_with("uxprobe entry "));
        assert_eq!(a.level, LogLevel::Info);
    }

    #[test]
    fn test_entry_wire_format() {
        let entry = LogEntry::unique("x");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["level"], "INFO");
        assert!(json.get("details").is_none());
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn test_seed_writes_single_element_array() {
        let dir = TempDir::new().unwrap();
        let fixture = ActivityLogFixture::new(dir.path());
        let entry = LogEntry::unique("seeded");

        fixture.seed(&entry).await.unwrap();

        assert!(dir.path().join(".cache/activity-logs.json").exists());
        let raw = std::fs::read_to_string(fixture.path()).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["id"], entry.id.as_str());

        assert_eq!(fixture.entries().await.unwrap(), vec![entry]);
    }

    #[tokio::test]
    async fn test_seed_replaces_previous_entries() {
        let dir = TempDir::new().unwrap();
        let fixture = ActivityLogFixture::new(dir.path());

        fixture.seed(&LogEntry::unique("first")).await.unwrap();
        let second = LogEntry::unique("second");
        fixture.seed(&second).await.unwrap();

        assert_eq!(fixture.entries().await.unwrap(), vec![second]);
    }

    #[tokio::test]
    async fn test_missing_or_corrupt_file_reads_empty() {
        let dir = TempDir::new().unwrap();
        let fixture = ActivityLogFixture::new(dir.path());
        assert!(fixture.entries().await.unwrap().is_empty());

        std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
        std::fs::write(fixture.path(), "{not json").unwrap();
        assert!(fixture.entries().await.unwrap().is_empty());

        std::fs::write(fixture.path(), "[]").unwrap();
        assert!(fixture.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_puts_back_previous_log() {
        let dir = TempDir::new().unwrap();
        let fixture = ActivityLogFixture::new(dir.path());

        assert_eq!(fixture.snapshot().await.unwrap(), None);
        let original = LogEntry::unique("app wrote this");
        fixture.seed(&original).await.unwrap();

        let saved = fixture.snapshot().await.unwrap();
        fixture.seed(&LogEntry::unique("probe")).await.unwrap();
        fixture.restore(saved).await.unwrap();
        assert_eq!(fixture.entries().await.unwrap(), vec![original]);

        fixture.restore(None).await.unwrap();
        assert!(!fixture.path().exists());
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let fixture = ActivityLogFixture::new(dir.path());

        fixture.seed(&LogEntry::unique("gone")).await.unwrap();
        fixture.remove().await.unwrap();
        assert!(!fixture.path().exists());
        fixture.remove().await.unwrap();
    }
}
