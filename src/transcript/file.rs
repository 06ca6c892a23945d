//! Transcript persisted as one JSON file per room.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::traits::{tail, ConversationSink, TranscriptEntry};

pub struct FileTranscript {
    dir: PathBuf,
    write_gate: tokio::sync::Mutex<()>,
}

impl FileTranscript {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<stem>.json`, where the stem keeps `[A-Za-z0-9-]` and writes
    /// every other byte (`_` included) as `_xx` hex, so distinct ids never share a file.
    pub fn room_path(&self, room_id: &str) -> Result<PathBuf> {
        let room_id = room_id.trim();
        if room_id.is_empty() {
            anyhow::bail!("room id must not be empty");
        }
        Ok(self.dir.join(format!("{}.json", encode_file_stem(room_id))))
    }

    async fn load(path: &Path) -> Result<Vec<TranscriptEntry>> {
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse transcript {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => {
                Err(e).with_context(|| format!("Failed to read transcript {}", path.display()))
            }
        }
    }
}

fn encode_file_stem(room_id: &str) -> String {
    let mut stem = String::with_capacity(room_id.len());
    for byte in room_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("_{byte:02x}"));
        }
    }
    stem
}

#[async_trait]
impl ConversationSink for FileTranscript {
    async fn record(&self, entry: TranscriptEntry) -> Result<()> {
        let path = self.room_path(&entry.room_id)?;
        let _guard = self.write_gate.lock().await;

        let mut entries = Self::load(&path).await?;
        entries.push(entry);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let json = serde_json::to_string_pretty(&entries)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        tracing::debug!(path = %path.display(), count = entries.len(), "transcript saved");
        Ok(())
    }

    async fn history(&self, room_id: &str, limit: Option<usize>) -> Result<Vec<TranscriptEntry>> {
        let path = self.room_path(room_id)?;
        let room_id = room_id.trim();
        let entries = Self::load(&path)
            .await?
            .into_iter()
            .filter(|entry| entry.room_id.trim() == room_id)
            .collect();
        Ok(tail(entries, limit))
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn records_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("transcripts");
        {
            let sink = FileTranscript::new(&dir);
            assert_ok!(
                sink.record(TranscriptEntry::user("room-1", "u", "Alice", "first"))
                    .await
            );
            assert_ok!(
                sink.record(TranscriptEntry::user("room-1", "u", "Alice", "second"))
                    .await
            );
        }
        assert!(dir.join("room-1.json").exists());

        let sink = FileTranscript::new(&dir);
        let history = sink.history("room-1", None).await.unwrap();
        let contents: Vec<_> = history.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, ["first", "second"]);
        assert_eq!(sink.history("room-1", Some(1)).await.unwrap()[0].content, "second");
    }

    #[tokio::test]
    async fn missing_room_is_empty() {
        let tmp = TempDir::new().unwrap();
        let sink = FileTranscript::new(tmp.path());
        assert!(sink.history("room-404", None).await.unwrap().is_empty());
    }

    #[test]
    fn room_path_is_sanitized() {
        let sink = FileTranscript::new("/tmp/t");
        assert_eq!(
            sink.room_path("../etc/passwd").unwrap(),
            PathBuf::from("/tmp/t/_2e_2e_2fetc_2fpasswd.json")
        );
        assert_eq!(
            sink.room_path("room-1").unwrap(),
            PathBuf::from("/tmp/t/room-1.json")
        );
        assert!(sink.room_path("   ").is_err());
    }

    #[test]
    fn similar_room_ids_get_distinct_files() {
        let sink = FileTranscript::new("/tmp/t");
        let paths: Vec<_> = ["room 1", "room.1", "room_1", "room_201"]
            .iter()
            .map(|id| sink.room_path(id).unwrap())
            .collect();
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[tokio::test]
    async fn history_is_isolated_between_similar_room_ids() {
        let tmp = TempDir::new().unwrap();
        let sink = FileTranscript::new(tmp.path());
        assert_ok!(
            sink.record(TranscriptEntry::user("room 1", "u", "Alice", "secret in room 1"))
                .await
        );
        assert!(sink.history("room_1", None).await.unwrap().is_empty());
        assert!(sink.history("room.1", None).await.unwrap().is_empty());
        assert_eq!(sink.history("room 1", None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn history_skips_entries_from_other_rooms() {
        let tmp = TempDir::new().unwrap();
        let sink = FileTranscript::new(tmp.path());
        let stray = vec![
            TranscriptEntry::user("room-2", "u", "Bob", "stray"),
            TranscriptEntry::user("room-1", "u", "Alice", "mine"),
        ];
        std::fs::write(
            tmp.path().join("room-1.json"),
            serde_json::to_string(&stray).unwrap(),
        )
        .unwrap();

        let history = sink.history("room-1", None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "mine");
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("room-1.json"), "not json").unwrap();
        let sink = FileTranscript::new(tmp.path());
        let err = sink.history("room-1", None).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse transcript"));
    }
}
