use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use log::info;
use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::generator::PlanGenerator;
use crate::models::{SessionExercise, WorkoutPlan, WorkoutSession};
use crate::storage::{PersistedStateRef, Storage, load_state, save_state};

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    pub current_workout: Option<WorkoutSession>,
    pub current_exercise_index: usize,
    pub active_plan: Option<WorkoutPlan>,
    pub plans: Vec<WorkoutPlan>,
    pub history: Vec<WorkoutSession>,
    pub error: Option<String>,
}

impl StoreState {
    fn persisted(&self) -> PersistedStateRef<'_> {
        PersistedStateRef {
            history: &self.history,
            plans: &self.plans,
            active_plan: self.active_plan.as_ref(),
        }
    }
}

/// Point-in-time copy of everything a screen renders.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub current_workout: Option<WorkoutSession>,
    pub current_exercise_index: usize,
    pub active_plan: Option<WorkoutPlan>,
    pub plans: Vec<WorkoutPlan>,
    pub history: Vec<WorkoutSession>,
    pub is_generating: bool,
    pub error: Option<String>,
}

pub struct WorkoutStore {
    pub(crate) state: Mutex<StoreState>,
    pub(crate) storage: Arc<dyn Storage>,
    pub(crate) generator: PlanGenerator,
    pub(crate) config: StoreConfig,
    /// Bumped for every plan request; only the latest may apply its result.
    pub(crate) plan_request_seq: AtomicU64,
    /// Sequence number of the plan request in flight, 0 when idle.
    pub(crate) generating_seq: AtomicU64,
}

impl WorkoutStore {
    /// Builds the store and restores history, plans and the active plan from
    /// `storage`. There is never an active workout after opening.
    pub fn open(
        storage: Arc<dyn Storage>,
        generator: PlanGenerator,
        config: StoreConfig,
    ) -> Result<Self> {
        let persisted = load_state(storage.as_ref(), &config.namespace)?;
        info!(
            "Opened workout store namespace={} history={} plans={} generator={}",
            config.namespace,
            persisted.history.len(),
            persisted.plans.len(),
            generator.describe()
        );
        Ok(Self {
            state: Mutex::new(StoreState {
                active_plan: persisted.active_plan,
                plans: persisted.plans,
                history: persisted.history,
                ..Default::default()
            }),
            storage,
            generator,
            config,
            plan_request_seq: AtomicU64::new(0),
            generating_seq: AtomicU64::new(0),
        })
    }

    pub(crate) fn persist(&self, state: &StoreState) -> Result<()> {
        save_state(self.storage.as_ref(), &self.config.namespace, state.persisted())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub async fn current_workout(&self) -> Option<WorkoutSession> {
        self.state.lock().await.current_workout.clone()
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.current_workout.is_some()
    }

    pub async fn current_exercise_index(&self) -> usize {
        self.state.lock().await.current_exercise_index
    }

    pub async fn current_exercise(&self) -> Option<SessionExercise> {
        let state = self.state.lock().await;
        state
            .current_workout
            .as_ref()?
            .exercises
            .get(state.current_exercise_index)
            .cloned()
    }

    pub async fn active_plan(&self) -> Option<WorkoutPlan> {
        self.state.lock().await.active_plan.clone()
    }

    pub async fn plans(&self) -> Vec<WorkoutPlan> {
        self.state.lock().await.plans.clone()
    }

    /// Finished workouts, most recent first.
    pub async fn history(&self) -> Vec<WorkoutSession> {
        self.state.lock().await.history.clone()
    }

    pub async fn is_generating(&self) -> bool {
        self.generating_seq.load(Ordering::SeqCst) != 0
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.error.clone()
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.lock().await;
        StoreSnapshot {
            current_workout: state.current_workout.clone(),
            current_exercise_index: state.current_exercise_index,
            active_plan: state.active_plan.clone(),
            plans: state.plans.clone(),
            history: state.history.clone(),
            is_generating: self.generating_seq.load(Ordering::SeqCst) != 0,
            error: state.error.clone(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn open_restores_persisted_subset_only() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        {
            let store = store_with(storage.clone(), PlanGenerator::new_mock_fn(|_| {
                Ok(plan("g", &[("a", 1)]))
            }));
            store.start_workout(plan("p1", &[("a", 2)])).await.unwrap();
            store.complete_set("a", 1, Default::default()).await;
            store.end_workout().await.unwrap();
            store.start_workout(plan("p2", &[("b", 2)])).await.unwrap();
            assert!(store.is_active().await);
        }

        let reopened = store_with(storage, PlanGenerator::new_mock_fn(|_| {
            Ok(plan("g", &[("a", 1)]))
        }));
        let snapshot = reopened.snapshot().await;
        assert!(snapshot.current_workout.is_none());
        assert_eq!(snapshot.current_exercise_index, 0);
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.active_plan.map(|p| p.id), Some("p2".to_string()));
        assert!(!snapshot.is_generating);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn current_exercise_follows_pointer() {
        let store = store();
        assert!(store.current_exercise().await.is_none());
        store
            .start_workout(plan("p", &[("a", 1), ("b", 1)]))
            .await
            .unwrap();
        assert_eq!(store.current_exercise().await.unwrap().exercise_id, "a");
        store.next_exercise().await;
        assert_eq!(store.current_exercise().await.unwrap().exercise_id, "b");
    }
}
