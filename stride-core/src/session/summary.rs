//! Live progress figures for the workout in progress.

use crate::session::WorkoutStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkoutProgress {
    pub completed_sets: u32,
    pub total_sets: u32,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    /// Sum of reps * weight over completed sets, in kilograms.
    pub total_volume_kg: f64,
    /// Completed sets that reach the plan's rep or time prescription.
    pub sets_on_target: u32,
}

impl WorkoutStore {
    pub async fn progress(&self) -> Option<WorkoutProgress> {
        let state = self.state.lock().await;
        let workout = state.current_workout.as_ref()?;

        let mut progress = WorkoutProgress {
            total_exercises: workout.exercises.len() as u32,
            ..Default::default()
        };
        for exercise in &workout.exercises {
            let target = exercise.rep_target();
            if exercise.completed {
                progress.completed_exercises += 1;
            }
            progress.total_sets += exercise.sets.len() as u32;
            for set in exercise.sets.iter().filter(|s| s.completed) {
                progress.completed_sets += 1;
                progress.total_volume_kg += set.reps as f64 * set.weight.unwrap_or(0.0);
                if target.is_met_by(set) {
                    progress.sets_on_target += 1;
                }
            }
        }
        Some(progress)
    }
}
