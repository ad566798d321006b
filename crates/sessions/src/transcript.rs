//! Append-only JSONL conversation transcripts.
//!
//! Each conversation gets a `<conversation_id>.jsonl` file under the
//! transcripts directory, one serialized [`Turn`] per line plus the time it
//! was written.
//!
//! Includes an in-memory write-through cache so repeated reads do not hit
//! disk, and async wrappers that keep file I/O off the tokio runtime.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use dg_domain::error::{Error, Result};
use dg_domain::trace::TraceEvent;
use dg_domain::turn::Turn;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A single transcript line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub timestamp: String,
    #[serde(flatten)]
    pub turn: Turn,
}

impl TranscriptLine {
    /// Stamp `turn` with the current time.
    pub fn now(turn: Turn) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            turn,
        }
    }
}

pub struct TranscriptWriter {
    base_dir: PathBuf,
    cache: RwLock<HashMap<String, Vec<TranscriptLine>>>,
}

impl TranscriptWriter {
    /// Open the transcript directory, creating it if needed.
    pub fn new(base_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(base_dir).map_err(Error::Io)?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Append turns to a conversation's transcript (sync).
    ///
    /// Writes through to both disk and the in-memory cache.
    pub fn append(&self, conversation_id: &str, turns: &[Turn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }
        let lines = stamp(turns);

        // Disk first; the cache only reflects what was persisted.
        let buf = serialize_lines(&lines)?;
        append_file(&self.path_for(conversation_id)?, &buf)?;
        self.extend_cache(conversation_id, lines);
        Ok(())
    }

    /// Append turns to a conversation's transcript (async).
    pub async fn append_async(&self, conversation_id: &str, turns: &[Turn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }
        let lines = stamp(turns);
        let buf = serialize_lines(&lines)?;
        let path = self.path_for(conversation_id)?;

        tokio::task::spawn_blocking(move || append_file(&path, &buf))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        self.extend_cache(conversation_id, lines);
        Ok(())
    }

    /// Read back a transcript. Missing transcripts read as empty.
    pub fn read(&self, conversation_id: &str) -> Result<Vec<TranscriptLine>> {
        if let Some(lines) = self.cache.read().get(conversation_id) {
            return Ok(lines.clone());
        }

        let lines = read_jsonl_file(&self.path_for(conversation_id)?, conversation_id)?;
        self.cache
            .write()
            .insert(conversation_id.to_owned(), lines.clone());
        Ok(lines)
    }

    pub async fn read_async(&self, conversation_id: &str) -> Result<Vec<TranscriptLine>> {
        if let Some(lines) = self.cache.read().get(conversation_id) {
            return Ok(lines.clone());
        }

        let path = self.path_for(conversation_id)?;
        let cid = conversation_id.to_owned();
        let lines = tokio::task::spawn_blocking(move || read_jsonl_file(&path, &cid))
            .await
            .map_err(|e| Error::Other(format!("spawn_blocking join: {e}")))??;

        self.cache
            .write()
            .insert(conversation_id.to_owned(), lines.clone());
        Ok(lines)
    }

    /// Turns only, in stored order.
    pub fn read_turns(&self, conversation_id: &str) -> Result<Vec<Turn>> {
        Ok(self
            .read(conversation_id)?
            .into_iter()
            .map(|l| l.turn)
            .collect())
    }

    /// Remove a transcript file and its cache entry. Returns true if a file
    /// was removed.
    pub fn delete(&self, conversation_id: &str) -> Result<bool> {
        self.invalidate_cache(conversation_id);
        let path = self.path_for(conversation_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn invalidate_cache(&self, conversation_id: &str) {
        self.cache.write().remove(conversation_id);
    }

    // ── Private helpers ───────────────────────────────────────────────

    /// Conversation ids become file names; anything that could escape the
    /// directory is rejected.
    fn path_for(&self, conversation_id: &str) -> Result<PathBuf> {
        let valid = !conversation_id.is_empty()
            && conversation_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::NotFound(format!(
                "invalid conversation id: {conversation_id:?}"
            )));
        }
        Ok(self.base_dir.join(format!("{conversation_id}.jsonl")))
    }

    fn extend_cache(&self, conversation_id: &str, lines: Vec<TranscriptLine>) {
        let count = lines.len();
        self.cache
            .write()
            .entry(conversation_id.to_owned())
            .or_default()
            .extend(lines);

        TraceEvent::TranscriptAppend {
            conversation_id: conversation_id.to_owned(),
            lines: count,
        }
        .emit();
    }
}

fn stamp(turns: &[Turn]) -> Vec<TranscriptLine> {
    let timestamp = Utc::now().to_rfc3339();
    turns
        .iter()
        .map(|t| TranscriptLine {
            timestamp: timestamp.clone(),
            turn: t.clone(),
        })
        .collect()
}

fn serialize_lines(lines: &[TranscriptLine]) -> Result<String> {
    let mut buf = String::new();
    for line in lines {
        let json = serde_json::to_string(line)
            .map_err(|e| Error::Other(format!("serializing transcript line: {e}")))?;
        buf.push_str(&json);
        buf.push('\n');
    }
    Ok(buf)
}

fn append_file(path: &Path, buf: &str) -> Result<()> {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(Error::Io)?;
    file.write_all(buf.as_bytes()).map_err(Error::Io)?;
    Ok(())
}

fn read_jsonl_file(path: &Path, conversation_id: &str) -> Result<Vec<TranscriptLine>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
    let mut lines = Vec::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TranscriptLine>(line) {
            Ok(tl) => lines.push(tl),
            Err(e) => {
                tracing::warn!(
                    conversation_id,
                    error = %e,
                    "skipping malformed transcript line"
                );
            }
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dg_domain::turn::{DirectiveKind, Speaker};

    fn sample() -> Vec<Turn> {
        vec![
            Turn::utterance(0, Speaker::Psychologist, "Hola", None),
            Turn::directive(1, DirectiveKind::Episode, Speaker::Patient, "Pasó un día"),
            Turn::utterance(2, Speaker::Patient, "Estoy cansado", Some("ignore".into())),
        ]
    }

    #[test]
    fn append_then_read_from_fresh_writer() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path()).unwrap();
        writer.append("c1", &sample()).unwrap();

        let fresh = TranscriptWriter::new(dir.path()).unwrap();
        let turns = fresh.read_turns("c1").unwrap();
        assert_eq!(turns, sample());
    }

    #[test]
    fn line_format_is_flat() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path()).unwrap();
        writer.append("c1", &sample()[2..]).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("c1.jsonl")).unwrap();
        let v: serde_json::Value = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(v["speaker"], "patient");
        assert_eq!(v["text"], "Estoy cansado");
        assert_eq!(v["thought"], "ignore");
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn missing_transcript_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path()).unwrap();
        assert!(writer.read("nope").unwrap().is_empty());
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path()).unwrap();
        writer.append("c1", &sample()[..1]).unwrap();
        append_file(&dir.path().join("c1.jsonl"), "{not json\n\n").unwrap();
        writer.append("c1", &sample()[2..]).unwrap();

        let fresh = TranscriptWriter::new(dir.path()).unwrap();
        assert_eq!(fresh.read("c1").unwrap().len(), 2);
    }

    #[test]
    fn path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path()).unwrap();
        assert!(writer.append("../evil", &sample()).is_err());
        assert!(writer.read("a/b").is_err());
    }

    #[test]
    fn delete_removes_file_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path()).unwrap();
        writer.append("c1", &sample()).unwrap();
        assert!(writer.delete("c1").unwrap());
        assert!(!writer.delete("c1").unwrap());
        assert!(writer.read("c1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn async_append_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TranscriptWriter::new(dir.path()).unwrap();
        writer.append_async("c2", &sample()).await.unwrap();
        writer.invalidate_cache("c2");
        let lines = writer.read_async("c2").await.unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].turn.thought.as_deref(), Some("ignore"));
    }
}
