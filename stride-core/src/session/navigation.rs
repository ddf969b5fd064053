use crate::session::WorkoutStore;

impl WorkoutStore {
    /// Move to the next exercise. Saturates at the last one.
    pub async fn next_exercise(&self) -> bool {
        let mut state = self.state.lock().await;
        let len = state
            .current_workout
            .as_ref()
            .map_or(0, |w| w.exercises.len());
        if state.current_exercise_index + 1 < len {
            state.current_exercise_index += 1;
            true
        } else {
            false
        }
    }

    /// Move to the previous exercise. Saturates at zero.
    pub async fn previous_exercise(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.current_workout.is_some() && state.current_exercise_index > 0 {
            state.current_exercise_index -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::session::session::fixtures::*;

    #[tokio::test]
    async fn pointer_saturates_at_both_ends() {
        let store = store();
        store
            .start_workout(plan("p", &[("a", 1), ("b", 1), ("c", 1)]))
            .await
            .unwrap();

        assert!(!store.previous_exercise().await);
        assert_eq!(store.current_exercise_index().await, 0);

        assert!(store.next_exercise().await);
        assert!(store.next_exercise().await);
        assert!(!store.next_exercise().await);
        assert_eq!(store.current_exercise_index().await, 2);

        assert!(store.previous_exercise().await);
        assert_eq!(store.current_exercise_index().await, 1);
    }

    #[tokio::test]
    async fn pointer_ignores_idle_and_empty_workouts() {
        let store = store();
        assert!(!store.next_exercise().await);
        assert!(!store.previous_exercise().await);

        store.start_workout(plan("empty", &[])).await.unwrap();
        assert!(!store.next_exercise().await);
        assert_eq!(store.current_exercise_index().await, 0);
    }
}
