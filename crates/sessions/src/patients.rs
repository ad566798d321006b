//! Patient profile store.
//!
//! `patients.json` under the state path, seeded with the built-in roster the
//! first time it is opened. Profiles are editable; each record also
//! remembers the last conversation run for that patient.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use dg_domain::error::{Error, Result};
use dg_domain::persona::{builtin_roster, PersonaProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(flatten)]
    pub profile: PersonaProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_conversation_id: Option<String>,
}

pub struct PatientStore {
    path: PathBuf,
    // Keyed by profile id; BTreeMap gives a stable listing order.
    patients: RwLock<BTreeMap<String, PatientRecord>>,
}

impl PatientStore {
    /// Load `state_path/patients.json`, seeding it with the built-in roster
    /// when the file does not exist yet.
    pub fn new(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path).map_err(Error::Io)?;
        let path = state_path.join("patients.json");

        let (patients, seeded) = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(Error::Io)?;
            let list: Vec<PatientRecord> = serde_json::from_str(&raw)?;
            (index(list), false)
        } else {
            let list = builtin_roster()
                .into_iter()
                .map(|profile| PatientRecord {
                    profile,
                    last_conversation_id: None,
                })
                .collect();
            (index(list), true)
        };

        let store = Self {
            path,
            patients: RwLock::new(patients),
        };
        if seeded {
            store.flush()?;
        }
        tracing::info!(
            patients = store.patients.read().len(),
            seeded,
            path = %store.path.display(),
            "patient store loaded"
        );
        Ok(store)
    }

    pub fn list(&self) -> Vec<PatientRecord> {
        self.patients.read().values().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<PatientRecord> {
        self.patients.read().get(id).cloned()
    }

    /// Insert or replace a profile, keeping its last-conversation link.
    pub fn upsert(&self, profile: PersonaProfile) -> Result<PatientRecord> {
        if profile.id.trim().is_empty() {
            return Err(Error::Configuration("patient id must not be empty".into()));
        }
        if profile.name.trim().is_empty() {
            return Err(Error::Configuration("patient name must not be empty".into()));
        }
        let mut patients = self.patients.write();
        let last = patients
            .get(&profile.id)
            .and_then(|r| r.last_conversation_id.clone());
        let record = PatientRecord {
            profile,
            last_conversation_id: last,
        };
        patients.insert(record.profile.id.clone(), record.clone());
        Ok(record)
    }

    pub fn set_last_conversation(&self, id: &str, conversation_id: &str) -> Result<()> {
        let mut patients = self.patients.write();
        let record = patients
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(format!("patient {id}")))?;
        record.last_conversation_id = Some(conversation_id.to_owned());
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        let list: Vec<PatientRecord> = self.patients.read().values().cloned().collect();
        let json = serde_json::to_string_pretty(&list)
            .map_err(|e| Error::Other(format!("serializing patients: {e}")))?;
        std::fs::write(&self.path, json).map_err(Error::Io)?;
        Ok(())
    }
}

fn index(list: Vec<PatientRecord>) -> BTreeMap<String, PatientRecord> {
    list.into_iter()
        .map(|r| (r.profile.id.clone(), r))
        .collect()
}
