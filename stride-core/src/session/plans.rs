//! Plan generation and selection.

use std::sync::atomic::Ordering;

use anyhow::Result;
use log::{info, warn};

use crate::generator::{PlanGenerationError, PlanRequest};
use crate::models::WorkoutPlan;
use crate::session::WorkoutStore;

/// Clears the in-flight marker when a plan request finishes or is dropped,
/// unless a newer request has taken it over.
struct GeneratingGuard<'a> {
    store: &'a WorkoutStore,
    seq: u64,
}

impl Drop for GeneratingGuard<'_> {
    fn drop(&mut self) {
        let _ = self.store.generating_seq.compare_exchange(
            self.seq,
            0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

impl WorkoutStore {
    /// Ask the generator for a plan. On success the plan is appended to the
    /// plan list and becomes the active plan; on failure the message is
    /// recorded in the error field and nothing else changes.
    ///
    /// Only the most recent request may apply its result. An older request
    /// that resolves later gets `PlanGenerationError::Superseded`.
    pub async fn generate_plan(&self, request: PlanRequest) -> Result<WorkoutPlan> {
        let seq = self.plan_request_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.generating_seq.store(seq, Ordering::SeqCst);
        let _guard = GeneratingGuard { store: self, seq };
        self.state.lock().await.error = None;

        let result = self.generator.generate(&request).await;

        let mut state = self.state.lock().await;
        if self.plan_request_seq.load(Ordering::SeqCst) != seq {
            warn!("Discarding result of plan request #{} (superseded)", seq);
            return Err(PlanGenerationError::Superseded.into());
        }
        match result {
            Ok(plan) => {
                info!("Plan '{}' ({}) is now active", plan.name, plan.id);
                state.plans.push(plan.clone());
                state.active_plan = Some(plan.clone());
                self.persist(&state)?;
                Ok(plan)
            }
            Err(e) => {
                warn!("Plan generation failed: {:#}", e);
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Make a stored plan the active plan. Returns `false` for unknown ids.
    pub async fn select_plan(&self, plan_id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(plan) = state.plans.iter().find(|p| p.id == plan_id).cloned() else {
            return Ok(false);
        };
        state.active_plan = Some(plan);
        self.persist(&state)?;
        Ok(true)
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.error = None;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::anyhow;

    use super::*;
    use crate::generator::PlanGenerator;
    use crate::models::{Difficulty, SetUpdate};
    use crate::session::session::fixtures::*;
    use crate::storage::{MemoryStorage, Storage};

    fn request(goal: &str) -> PlanRequest {
        PlanRequest {
            goals: vec![goal.to_string()],
            equipment: vec!["dumbbells".to_string()],
            duration_minutes: 30,
            difficulty: Difficulty::Intermediate,
        }
    }

    #[tokio::test]
    async fn success_appends_and_activates() {
        let storage = Arc::new(MemoryStorage::new());
        let store = store_with(
            storage.clone(),
            PlanGenerator::new_mock_fn(|req| {
                assert_eq!(req.duration_minutes, 30);
                Ok(plan("fresh", &[("a", 3)]))
            }),
        );
        let plan = store.generate_plan(request("strength")).await.unwrap();
        assert_eq!(plan.id, "fresh");

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.plans.len(), 1);
        assert_eq!(snapshot.active_plan.map(|p| p.id), Some("fresh".to_string()));
        assert!(snapshot.current_workout.is_none());
        assert!(!snapshot.is_generating);
        assert!(snapshot.error.is_none());

        let raw = storage.load("workout-storage").unwrap().unwrap();
        assert!(raw.contains("\"fresh\""));
    }

    #[tokio::test]
    async fn failure_records_error_and_keeps_state() {
        let store = store_with(
            Arc::new(MemoryStorage::new()),
            PlanGenerator::new_mock_fn(|_| Err(anyhow!("generator offline"))),
        );
        store.start_workout(plan("p", &[("a", 2)])).await.unwrap();
        store.complete_set("a", 1, SetUpdate::reps_weight(5, 20.0)).await;
        let before = store.snapshot().await;

        let err = store.generate_plan(request("strength")).await.unwrap_err();
        assert_eq!(err.to_string(), "generator offline");

        let after = store.snapshot().await;
        assert_eq!(after.error.as_deref(), Some("generator offline"));
        assert!(!after.is_generating);
        assert_eq!(after.current_workout, before.current_workout);
        assert_eq!(after.active_plan, before.active_plan);
        assert_eq!(after.plans, before.plans);

        store.clear_error().await;
        assert!(store.last_error().await.is_none());
    }

    #[tokio::test]
    async fn older_request_is_superseded() {
        let store = store_with(
            Arc::new(MemoryStorage::new()),
            PlanGenerator::catalog(Duration::from_millis(10)),
        );
        let (first, second) = tokio::join!(
            store.generate_plan(request("strength")),
            store.generate_plan(request("endurance")),
        );

        let err = first.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanGenerationError>(),
            Some(PlanGenerationError::Superseded)
        ));
        let winner = second.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.plans.len(), 1);
        assert_eq!(snapshot.active_plan.map(|p| p.id), Some(winner.id));
        assert!(!snapshot.is_generating);
    }

    #[tokio::test]
    async fn dropped_request_clears_generating_flag() {
        let store = store_with(
            Arc::new(MemoryStorage::new()),
            PlanGenerator::catalog(Duration::from_millis(200)),
        );
        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), store.generate_plan(request("strength")))
                .await;
        assert!(timed_out.is_err());
        assert!(!store.is_generating().await);
        assert!(store.plans().await.is_empty());
    }

    #[tokio::test]
    async fn select_plan_switches_active() {
        let store = store();
        let generated = store.generate_plan(request("strength")).await.unwrap();
        store.start_workout(plan("other", &[("a", 1)])).await.unwrap();

        assert!(!store.select_plan("nope").await.unwrap());
        assert_eq!(store.active_plan().await.unwrap().id, "other");

        assert!(store.select_plan(&generated.id).await.unwrap());
        assert_eq!(store.active_plan().await.unwrap().id, generated.id);
        assert!(store.is_active().await);
    }

    #[tokio::test]
    async fn example_session_walkthrough() {
        let store = store();
        store
            .start_workout(plan("p", &[("ex1", 3), ("ex2", 3)]))
            .await
            .unwrap();

        assert!(store.complete_set("ex1", 1, SetUpdate::reps_weight(12, 20.0)).await);
        let workout = store.current_workout().await.unwrap();
        let sets = &workout.exercises[0].sets;
        assert!(sets[0].completed);
        assert_eq!(sets[0].reps, 12);
        assert_eq!(sets[0].weight, Some(20.0));
        assert!(!sets[1].completed);
        assert!(!sets[2].completed);

        assert!(store.next_exercise().await);
        assert_eq!(store.current_exercise_index().await, 1);

        let history_before = store.history().await.len();
        store.end_workout().await.unwrap();
        assert_eq!(store.history().await.len(), history_before + 1);
        assert!(store.current_workout().await.is_none());
    }
}
