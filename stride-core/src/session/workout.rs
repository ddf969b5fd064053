//! Workout lifecycle: start, finalize, abandon.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::models::{WorkoutPlan, WorkoutSession};
use crate::session::WorkoutStore;

/// Whole minutes between `start` and `now`; a clock that went backwards
/// counts as zero.
fn elapsed_minutes(start: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let ms = (now - start).num_milliseconds().max(0);
    u32::try_from(ms / 60_000).unwrap_or(u32::MAX)
}

impl WorkoutStore {
    /// Start a workout from `plan`, replacing any workout in progress.
    pub async fn start_workout(&self, plan: WorkoutPlan) -> Result<()> {
        self.start_workout_at(plan, Utc::now()).await
    }

    pub async fn start_workout_at(&self, plan: WorkoutPlan, start_time: DateTime<Utc>) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(previous) = &state.current_workout {
            debug!("Replacing workout {} in progress", previous.id);
        }
        let workout = WorkoutSession::from_plan(&plan, start_time);
        info!(
            "Started workout {} from plan '{}' with {} exercises",
            workout.id,
            plan.name,
            workout.exercises.len()
        );
        state.current_workout = Some(workout);
        state.current_exercise_index = 0;
        state.active_plan = Some(plan);
        self.persist(&state)
    }

    /// Start a workout from the active plan, generating one from the
    /// configured default request when no plan is active.
    pub async fn start_active_plan(&self) -> Result<()> {
        let plan = match self.active_plan().await {
            Some(plan) => plan,
            None => {
                debug!("No active plan, generating one from the default request");
                self.generate_plan(self.config.default_request.clone())
                    .await?
            }
        };
        self.start_workout(plan).await
    }

    /// Finish the workout in progress and move it to history. Returns the
    /// finished record, or `None` when no workout was active.
    pub async fn end_workout(&self) -> Result<Option<WorkoutSession>> {
        self.end_workout_at(Utc::now()).await
    }

    pub async fn end_workout_at(&self, now: DateTime<Utc>) -> Result<Option<WorkoutSession>> {
        let mut state = self.state.lock().await;
        let Some(mut workout) = state.current_workout.take() else {
            debug!("end_workout called with no active workout");
            return Ok(None);
        };

        workout.duration = elapsed_minutes(workout.start_time, now);
        workout.calories_burned =
            (workout.duration as f64 * self.config.calories_per_minute).round() as u32;
        workout.completed = true;
        info!(
            "Finished workout {} after {} min (~{} kcal)",
            workout.id, workout.duration, workout.calories_burned
        );

        state.history.insert(0, workout.clone());
        state.active_plan = None;
        state.current_exercise_index = 0;
        self.persist(&state)?;
        Ok(Some(workout))
    }

    /// Drop the workout in progress without recording it. Returns whether a
    /// workout was active.
    pub async fn clear_workout(&self) -> Result<bool> {
        let mut state = self.state.lock().await;
        let dropped = state.current_workout.take();
        if let Some(workout) = &dropped {
            info!("Abandoned workout {}", workout.id);
        }
        let had_plan = state.active_plan.take().is_some();
        state.current_exercise_index = 0;
        if had_plan {
            self.persist(&state)?;
        }
        Ok(dropped.is_some())
    }

    pub async fn set_workout_notes(&self, notes: Option<String>) -> bool {
        let mut state = self.state.lock().await;
        match state.current_workout.as_mut() {
            Some(workout) => {
                workout.notes = notes.filter(|n| !n.trim().is_empty());
                true
            }
            None => false,
        }
    }
}
