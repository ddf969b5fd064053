//! Key-value persistence for the durable part of the workout store.
//!
//! Only `history`, `plans` and `active_plan` are ever written. The workout in
//! progress lives in memory and is gone after a restart.

mod schema;
mod sqlite;

pub use sqlite::SqliteStorage;

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::models::{WorkoutPlan, WorkoutSession};

pub const PERSIST_VERSION: u32 = 1;

pub trait Storage: Send + Sync {
    fn load(&self, namespace: &str) -> Result<Option<String>>;
    fn save(&self, namespace: &str, value: &str) -> Result<()>;
    fn remove(&self, namespace: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, namespace: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(entries.get(namespace).cloned())
    }

    fn save(&self, namespace: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        entries.insert(namespace.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        entries.remove(namespace);
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub history: Vec<WorkoutSession>,
    #[serde(default)]
    pub plans: Vec<WorkoutPlan>,
    #[serde(default)]
    pub active_plan: Option<WorkoutPlan>,
}

/// Borrowed view used when writing, so a save does not clone the history.
#[derive(Serialize)]
pub struct PersistedStateRef<'a> {
    pub history: &'a [WorkoutSession],
    pub plans: &'a [WorkoutPlan],
    pub active_plan: Option<&'a WorkoutPlan>,
}

#[derive(Serialize)]
struct EnvelopeOut<'a> {
    version: u32,
    state: PersistedStateRef<'a>,
}

#[derive(Deserialize)]
struct EnvelopeIn {
    version: u32,
    state: PersistedState,
}

/// Reads the persisted subset. A missing, unreadable or foreign-version value
/// yields an empty state; only storage failures are errors.
pub fn load_state(storage: &dyn Storage, namespace: &str) -> Result<PersistedState> {
    let Some(raw) = storage.load(namespace)? else {
        debug!("No persisted state under '{}'", namespace);
        return Ok(PersistedState::default());
    };

    match serde_json::from_str::<EnvelopeIn>(&raw) {
        Ok(env) if env.version == PERSIST_VERSION => {
            debug!(
                "Loaded persisted state '{}': history={} plans={} active_plan={}",
                namespace,
                env.state.history.len(),
                env.state.plans.len(),
                env.state.active_plan.is_some()
            );
            Ok(env.state)
        }
        Ok(env) => {
            warn!(
                "Ignoring persisted state '{}' with version {} (expected {})",
                namespace, env.version, PERSIST_VERSION
            );
            Ok(PersistedState::default())
        }
        Err(e) => {
            warn!("Ignoring unreadable persisted state '{}': {}", namespace, e);
            Ok(PersistedState::default())
        }
    }
}

pub fn save_state(storage: &dyn Storage, namespace: &str, state: PersistedStateRef<'_>) -> Result<()> {
    let raw = serde_json::to_string(&EnvelopeOut {
        version: PERSIST_VERSION,
        state,
    })?;
    debug!("Persisting {} bytes under '{}'", raw.len(), namespace);
    storage.save(namespace, &raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::Utc;

    fn plan(id: &str) -> WorkoutPlan {
        WorkoutPlan {
            id: id.into(),
            name: "Push".into(),
            exercises: vec![],
            estimated_duration: 30,
            difficulty: Difficulty::Beginner,
            created_at: Utc::now(),
            is_active: true,
        }
    }

    #[test]
    fn missing_state_is_empty() {
        let storage = MemoryStorage::new();
        let state = load_state(&storage, "workout-storage").unwrap();
        assert_eq!(state, PersistedState::default());
    }

    #[test]
    fn saved_state_loads_back() {
        let storage = MemoryStorage::new();
        let plans = vec![plan("p1"), plan("p2")];
        save_state(
            &storage,
            "workout-storage",
            PersistedStateRef {
                history: &[],
                plans: &plans,
                active_plan: plans.get(1),
            },
        )
        .unwrap();

        let state = load_state(&storage, "workout-storage").unwrap();
        assert_eq!(state.plans, plans);
        assert_eq!(state.active_plan.map(|p| p.id), Some("p2".to_string()));
        assert!(state.history.is_empty());
    }

    #[test]
    fn foreign_version_and_garbage_are_ignored() {
        let storage = MemoryStorage::new();
        storage
            .save("ns", r#"{"version":99,"state":{"history":[],"plans":[]}}"#)
            .unwrap();
        assert_eq!(load_state(&storage, "ns").unwrap(), PersistedState::default());

        storage.save("ns", "not json").unwrap();
        assert_eq!(load_state(&storage, "ns").unwrap(), PersistedState::default());
    }

    #[test]
    fn namespaces_are_independent() {
        let storage = MemoryStorage::new();
        storage.save("a", "1").unwrap();
        storage.save("b", "2").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.load("a").unwrap(), None);
        assert_eq!(storage.load("b").unwrap().as_deref(), Some("2"));
    }
}
