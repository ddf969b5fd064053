use std::sync::Arc;

use anyhow::anyhow;
use log::debug;

use crate::config::StrideConfig;
use crate::runtime::run_on_global;
use crate::session::WorkoutStore;
use crate::uniffi_interface::errors::StrideError;
use crate::uniffi_interface::objects::{
    PlanRequestRecord, SessionExerciseRecord, SetUpdateRecord, StoreSnapshotRecord,
    WorkoutPlanRecord, WorkoutProgressRecord, WorkoutSessionRecord,
};

#[derive(uniffi::Object)]
pub struct WorkoutStoreHandle {
    inner: Arc<WorkoutStore>,
}

#[uniffi::export]
impl WorkoutStoreHandle {
    /// Open the store backed by the sqlite file at `db_path`. The remaining
    /// settings come from the environment.
    #[uniffi::constructor]
    pub fn new(db_path: String) -> Result<Arc<Self>, StrideError> {
        let mut config = StrideConfig::from_env()?;
        config.db_path = db_path;
        debug!("Opening workout store at {}", config.db_path);
        let store = WorkoutStore::open(
            config.build_storage()?,
            config.build_generator()?,
            config.store,
        )?;
        Ok(Arc::new(Self {
            inner: Arc::new(store),
        }))
    }

    pub async fn snapshot(&self) -> Result<StoreSnapshotRecord, StrideError> {
        let store = self.inner.clone();
        let snapshot = run_on_global(async move { Ok(store.snapshot().await) }).await?;
        Ok(StoreSnapshotRecord::from(&snapshot))
    }

    pub async fn current_exercise(&self) -> Result<Option<SessionExerciseRecord>, StrideError> {
        let store = self.inner.clone();
        let exercise = run_on_global(async move { Ok(store.current_exercise().await) }).await?;
        Ok(exercise.as_ref().map(SessionExerciseRecord::from))
    }

    pub async fn progress(&self) -> Result<Option<WorkoutProgressRecord>, StrideError> {
        let store = self.inner.clone();
        let progress = run_on_global(async move { Ok(store.progress().await) }).await?;
        Ok(progress.map(WorkoutProgressRecord::from))
    }

    pub async fn generate_plan(
        &self,
        request: PlanRequestRecord,
    ) -> Result<WorkoutPlanRecord, StrideError> {
        let store = self.inner.clone();
        let plan = run_on_global(async move { store.generate_plan(request.into()).await }).await?;
        Ok(WorkoutPlanRecord::from(&plan))
    }

    pub async fn select_plan(&self, plan_id: String) -> Result<bool, StrideError> {
        let store = self.inner.clone();
        Ok(run_on_global(async move { store.select_plan(&plan_id).await }).await?)
    }

    pub async fn clear_error(&self) -> Result<(), StrideError> {
        let store = self.inner.clone();
        run_on_global(async move {
            store.clear_error().await;
            Ok(())
        })
        .await?;
        Ok(())
    }

    /// Start a workout from a stored plan.
    pub async fn start_workout(&self, plan_id: String) -> Result<(), StrideError> {
        let store = self.inner.clone();
        run_on_global(async move {
            let plan = store
                .plans()
                .await
                .into_iter()
                .find(|p| p.id == plan_id)
                .ok_or_else(|| anyhow!("unknown plan {}", plan_id))?;
            store.start_workout(plan).await
        })
        .await?;
        Ok(())
    }

    pub async fn start_active_plan(&self) -> Result<(), StrideError> {
        let store = self.inner.clone();
        run_on_global(async move { store.start_active_plan().await }).await?;
        Ok(())
    }

    pub async fn complete_set(
        &self,
        exercise_id: String,
        set_number: u32,
        update: SetUpdateRecord,
    ) -> Result<bool, StrideError> {
        let update = update.into_checked()?;
        let store = self.inner.clone();
        Ok(run_on_global(async move {
            Ok(store.complete_set(&exercise_id, set_number, update).await)
        })
        .await?)
    }

    pub async fn update_set(
        &self,
        exercise_id: String,
        set_number: u32,
        update: SetUpdateRecord,
    ) -> Result<bool, StrideError> {
        let update = update.into_checked()?;
        let store = self.inner.clone();
        Ok(run_on_global(async move {
            Ok(store.update_set(&exercise_id, set_number, update).await)
        })
        .await?)
    }

    pub async fn complete_exercise(&self, exercise_id: String) -> Result<bool, StrideError> {
        let store = self.inner.clone();
        Ok(run_on_global(async move { Ok(store.complete_exercise(&exercise_id).await) }).await?)
    }

    pub async fn next_exercise(&self) -> Result<bool, StrideError> {
        let store = self.inner.clone();
        Ok(run_on_global(async move { Ok(store.next_exercise().await) }).await?)
    }

    pub async fn previous_exercise(&self) -> Result<bool, StrideError> {
        let store = self.inner.clone();
        Ok(run_on_global(async move { Ok(store.previous_exercise().await) }).await?)
    }

    pub async fn set_workout_notes(&self, notes: Option<String>) -> Result<bool, StrideError> {
        let store = self.inner.clone();
        Ok(run_on_global(async move { Ok(store.set_workout_notes(notes).await) }).await?)
    }

    pub async fn end_workout(&self) -> Result<Option<WorkoutSessionRecord>, StrideError> {
        let store = self.inner.clone();
        let finished = run_on_global(async move { store.end_workout().await }).await?;
        Ok(finished.as_ref().map(WorkoutSessionRecord::from))
    }

    pub async fn clear_workout(&self) -> Result<bool, StrideError> {
        let store = self.inner.clone();
        Ok(run_on_global(async move { store.clear_workout().await }).await?)
    }
}
