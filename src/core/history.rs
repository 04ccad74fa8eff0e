use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::core::models::history::HistoryRecord;

/// Append-only NDJSON log of credit balances. Existing lines are never
/// rewritten; this client never reads the log back.
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` as a single line.
    pub fn append(&self, record: &HistoryRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create history directory: {}", parent.display())
            })?;
        }
        let mut line = serde_json::to_string(record).context("Failed to serialize history record")?;
        line.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history log {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), credits_left = record.credits_left, "appended history record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(credits_left: u64) -> HistoryRecord {
        HistoryRecord {
            timestamp: "2025-01-02-03-04-05".to_string(),
            credits_left,
        }
    }

    #[test]
    fn append_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let log = HistoryLog::new(dir.path().join("data").join("history.ndjson"));
        log.append(&record(10)).unwrap();
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(content, "{\"timestamp\":\"2025-01-02-03-04-05\",\"credits_left\":10}\n");
    }

    #[test]
    fn append_preserves_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.ndjson");
        std::fs::write(&path, "{\"timestamp\":\"old\",\"credits_left\":1}\n").unwrap();

        let log = HistoryLog::new(&path);
        log.append(&record(2)).unwrap();
        log.append(&record(3)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("\"old\""));
        let last: HistoryRecord = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(last.credits_left, 3);
    }
}
