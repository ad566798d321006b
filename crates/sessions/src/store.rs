//! Index of simulated conversations.
//!
//! Persists one [`ConversationEntry`] per run in `conversations.json` under
//! the configured state path. Transcripts themselves live in the JSONL files
//! written by [`crate::TranscriptWriter`].

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use dg_domain::error::{Error, Result};
use dg_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation entry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub patient_model: String,
    pub psychologist_model: String,
    /// Final run status (`completed`, `failed`, `cancelled`).
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Turns in the stored transcript, directives included.
    #[serde(default)]
    pub turn_count: usize,
    #[serde(default)]
    pub rag_documents: Vec<String>,
}

/// Fields supplied by the caller when recording a finished run.
#[derive(Debug, Clone, Default)]
pub struct NewConversation {
    /// Pre-assigned id (e.g. the one used for the transcript). Minted when
    /// `None`.
    pub id: Option<String>,
    pub patient_id: String,
    pub patient_name: String,
    pub patient_model: String,
    pub psychologist_model: String,
    pub status: String,
    pub failure: Option<String>,
    pub turn_count: usize,
    pub rag_documents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationStats {
    pub total: usize,
    pub average_turns: f64,
    pub by_status: BTreeMap<String, usize>,
    pub by_patient: BTreeMap<String, usize>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Conversation store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct ConversationStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, ConversationEntry>>,
}

impl ConversationStore {
    /// Load or create the store at `state_path/conversations.json`.
    pub fn new(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;

        let path = state_path.join("conversations.json");
        let entries: HashMap<String, ConversationEntry> = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %path.display(), "conversation index unreadable, starting empty");
                HashMap::new()
            })
        } else {
            HashMap::new()
        };

        tracing::info!(
            conversations = entries.len(),
            path = %path.display(),
            "conversation store loaded"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Minted ids are valid transcript file names.
    pub fn mint_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn create(&self, new: NewConversation) -> ConversationEntry {
        let now = Utc::now();
        let id = new.id.unwrap_or_else(Self::mint_id);
        let entry = ConversationEntry {
            title: default_title(&new.patient_name, now),
            id: id.clone(),
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            created_at: now,
            updated_at: now,
            patient_model: new.patient_model,
            psychologist_model: new.psychologist_model,
            status: new.status,
            failure: new.failure,
            turn_count: new.turn_count,
            rag_documents: new.rag_documents,
        };
        self.entries.write().insert(id.clone(), entry.clone());

        TraceEvent::ConversationSaved {
            conversation_id: id,
            patient_id: entry.patient_id.clone(),
            turn_count: entry.turn_count,
        }
        .emit();

        entry
    }

    pub fn get(&self, id: &str) -> Option<ConversationEntry> {
        self.entries.read().get(id).cloned()
    }

    /// All entries, newest first.
    pub fn list(&self) -> Vec<ConversationEntry> {
        let mut all: Vec<_> = self.entries.read().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        all
    }

    pub fn by_patient(&self, patient_id: &str) -> Vec<ConversationEntry> {
        self.list()
            .into_iter()
            .filter(|e| e.patient_id == patient_id)
            .collect()
    }

    pub fn set_title(&self, id: &str, title: &str) -> Result<ConversationEntry> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Configuration("title must not be empty".into()));
        }
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("conversation {id}")))?;
        entry.title = title.to_owned();
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    /// Returns the removed entry, if any.
    pub fn delete(&self, id: &str) -> Option<ConversationEntry> {
        self.entries.write().remove(id)
    }

    pub fn stats(&self) -> ConversationStats {
        let entries = self.entries.read();
        let mut by_status = BTreeMap::new();
        let mut by_patient = BTreeMap::new();
        let mut turns = 0usize;
        for e in entries.values() {
            *by_status.entry(e.status.clone()).or_insert(0) += 1;
            *by_patient.entry(e.patient_id.clone()).or_insert(0) += 1;
            turns += e.turn_count;
        }
        let total = entries.len();
        ConversationStats {
            total,
            average_turns: if total == 0 {
                0.0
            } else {
                turns as f64 / total as f64
            },
            by_status,
            by_patient,
        }
    }

    /// Persist the current index to disk.
    pub fn flush(&self) -> Result<()> {
        let entries = self.entries.read();
        let json = serde_json::to_string_pretty(&*entries)
            .map_err(|e| Error::Other(format!("serializing conversations: {e}")))?;
        std::fs::write(&self.path, json).map_err(Error::Io)?;
        Ok(())
    }
}

fn default_title(patient_name: &str, at: DateTime<Utc>) -> String {
    let name = if patient_name.trim().is_empty() {
        "Conversación"
    } else {
        patient_name.trim()
    };
    format!("{name} - {}", at.format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_conv(patient: &str, turns: usize, status: &str) -> NewConversation {
        NewConversation {
            patient_id: patient.into(),
            patient_name: format!("{patient} name"),
            patient_model: "openai/gpt-oss-20b".into(),
            psychologist_model: "deepseek/deepseek-r1".into(),
            status: status.into(),
            turn_count: turns,
            ..NewConversation::default()
        }
    }

    #[test]
    fn create_get_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();
        let entry = store.create(new_conv("carlos_68", 5, "completed"));
        assert!(entry.title.starts_with("carlos_68 name - "));
        store.flush().unwrap();

        let reopened = ConversationStore::new(dir.path()).unwrap();
        let got = reopened.get(&entry.id).unwrap();
        assert_eq!(got.patient_id, "carlos_68");
        assert_eq!(got.turn_count, 5);
    }

    #[test]
    fn preassigned_id_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();
        let mut n = new_conv("p", 1, "failed");
        n.id = Some("fixed-id".into());
        n.failure = Some("model call failed".into());
        let entry = store.create(n);
        assert_eq!(entry.id, "fixed-id");
        assert_eq!(store.get("fixed-id").unwrap().failure.as_deref(), Some("model call failed"));
    }

    #[test]
    fn list_is_newest_first_and_filters_by_patient() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();
        let a = store.create(new_conv("a", 3, "completed"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let b = store.create(new_conv("b", 3, "completed"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let c = store.create(new_conv("a", 3, "completed"));

        let ids: Vec<_> = store.list().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![c.id.clone(), b.id, a.id.clone()]);

        let only_a: Vec<_> = store.by_patient("a").into_iter().map(|e| e.id).collect();
        assert_eq!(only_a, vec![c.id, a.id]);
    }

    #[test]
    fn set_title_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();
        let e = store.create(new_conv("a", 3, "completed"));

        let renamed = store.set_title(&e.id, "  Primera sesión ").unwrap();
        assert_eq!(renamed.title, "Primera sesión");
        assert!(matches!(store.set_title(&e.id, " "), Err(Error::Configuration(_))));
        assert!(matches!(store.set_title("missing", "x"), Err(Error::NotFound(_))));

        assert!(store.delete(&e.id).is_some());
        assert!(store.delete(&e.id).is_none());
        assert!(store.get(&e.id).is_none());
    }

    #[test]
    fn stats_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();
        assert_eq!(store.stats().total, 0);
        assert_eq!(store.stats().average_turns, 0.0);

        store.create(new_conv("a", 5, "completed"));
        store.create(new_conv("a", 2, "failed"));
        store.create(new_conv("b", 5, "completed"));

        let s = store.stats();
        assert_eq!(s.total, 3);
        assert_eq!(s.average_turns, 4.0);
        assert_eq!(s.by_status["completed"], 2);
        assert_eq!(s.by_status["failed"], 1);
        assert_eq!(s.by_patient["a"], 2);
    }

    #[test]
    fn corrupt_index_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("conversations.json"), "{oops").unwrap();
        let store = ConversationStore::new(dir.path()).unwrap();
        assert!(store.list().is_empty());
    }
}
