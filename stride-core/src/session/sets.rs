use log::debug;

use crate::models::SetUpdate;
use crate::session::WorkoutStore;

impl WorkoutStore {
    /// Merge `update` into the addressed set and mark it completed.
    ///
    /// Returns `false` and changes nothing when there is no active workout or
    /// the exercise/set does not exist.
    pub async fn complete_set(&self, exercise_id: &str, set_number: u32, update: SetUpdate) -> bool {
        self.modify_set(exercise_id, set_number, &update, true).await
    }

    /// Like `complete_set` but keeps the set's completed flag as it was.
    pub async fn update_set(&self, exercise_id: &str, set_number: u32, update: SetUpdate) -> bool {
        self.modify_set(exercise_id, set_number, &update, false).await
    }

    /// Mark an exercise completed. Its sets are not checked.
    pub async fn complete_exercise(&self, exercise_id: &str) -> bool {
        let mut state = self.state.lock().await;
        let Some(exercise) = state
            .current_workout
            .as_mut()
            .and_then(|w| w.exercise_mut(exercise_id))
        else {
            debug!("complete_exercise: no exercise {} in active workout", exercise_id);
            return false;
        };
        exercise.completed = true;
        true
    }

    async fn modify_set(
        &self,
        exercise_id: &str,
        set_number: u32,
        update: &SetUpdate,
        complete: bool,
    ) -> bool {
        let mut state = self.state.lock().await;
        let Some(set) = state
            .current_workout
            .as_mut()
            .and_then(|w| w.set_mut(exercise_id, set_number))
        else {
            debug!(
                "No set {} for exercise {} in active workout, ignoring",
                set_number, exercise_id
            );
            return false;
        };
        update.apply(set);
        if complete {
            set.completed = true;
        }
        true
    }
}
