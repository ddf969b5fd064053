//! Flat records handed across the FFI boundary.
//!
//! Timestamps are milliseconds since the Unix epoch. Exercise alternatives are
//! reduced to their names.

use crate::generator::PlanRequest;
use crate::models::{
    Difficulty, Exercise, SessionExercise, SessionSet, SetUpdate, WorkoutPlan, WorkoutSession,
};
use crate::session::{StoreSnapshot, WorkoutProgress};

#[derive(Debug, Clone, uniffi::Record)]
pub struct ExerciseRecord {
    pub id: String,
    pub name: String,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<String>,
    pub difficulty: Difficulty,
    pub sets: u32,
    pub reps: String,
    pub rep_target: String,
    pub is_timed: bool,
    pub rest_time: u32,
    pub video_url: Option<String>,
    pub instructions: Vec<String>,
    pub tips: Vec<String>,
    pub alternatives: Vec<String>,
}

impl From<&Exercise> for ExerciseRecord {
    fn from(e: &Exercise) -> Self {
        let target = e.rep_target();
        ExerciseRecord {
            id: e.id.clone(),
            name: e.name.clone(),
            muscle_groups: e.muscle_groups.iter().cloned().collect(),
            equipment: e.equipment.iter().cloned().collect(),
            difficulty: e.difficulty,
            sets: e.sets,
            reps: e.reps.clone(),
            rep_target: target.to_string(),
            is_timed: target.is_timed(),
            rest_time: e.rest_time,
            video_url: e.video_url.clone(),
            instructions: e.instructions.clone(),
            tips: e.tips.clone(),
            alternatives: e.alternatives.iter().map(|a| a.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct WorkoutPlanRecord {
    pub id: String,
    pub name: String,
    pub exercises: Vec<ExerciseRecord>,
    pub estimated_duration: u32,
    pub difficulty: Difficulty,
    pub created_at_ms: i64,
    pub is_active: bool,
}

impl From<&WorkoutPlan> for WorkoutPlanRecord {
    fn from(p: &WorkoutPlan) -> Self {
        WorkoutPlanRecord {
            id: p.id.clone(),
            name: p.name.clone(),
            exercises: p.exercises.iter().map(ExerciseRecord::from).collect(),
            estimated_duration: p.estimated_duration,
            difficulty: p.difficulty,
            created_at_ms: p.created_at.timestamp_millis(),
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct SessionSetRecord {
    pub set_number: u32,
    pub reps: u32,
    pub weight: Option<f64>,
    pub duration: Option<u32>,
    pub completed: bool,
    pub notes: Option<String>,
}

impl From<&SessionSet> for SessionSetRecord {
    fn from(s: &SessionSet) -> Self {
        SessionSetRecord {
            set_number: s.set_number,
            reps: s.reps,
            weight: s.weight,
            duration: s.duration,
            completed: s.completed,
            notes: s.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct SessionExerciseRecord {
    pub exercise_id: String,
    pub name: String,
    pub target_reps: String,
    pub sets: Vec<SessionSetRecord>,
    pub rest_time: u32,
    pub completed: bool,
    pub video_url: Option<String>,
}

impl From<&SessionExercise> for SessionExerciseRecord {
    fn from(e: &SessionExercise) -> Self {
        SessionExerciseRecord {
            exercise_id: e.exercise_id.clone(),
            name: e.name.clone(),
            target_reps: e.target_reps.clone(),
            sets: e.sets.iter().map(SessionSetRecord::from).collect(),
            rest_time: e.rest_time,
            completed: e.completed,
            video_url: e.video_url.clone(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct WorkoutSessionRecord {
    pub id: String,
    pub start_time_ms: i64,
    pub duration: u32,
    pub exercises: Vec<SessionExerciseRecord>,
    pub calories_burned: u32,
    pub notes: Option<String>,
    pub completed: bool,
}

impl From<&WorkoutSession> for WorkoutSessionRecord {
    fn from(w: &WorkoutSession) -> Self {
        WorkoutSessionRecord {
            id: w.id.clone(),
            start_time_ms: w.start_time.timestamp_millis(),
            duration: w.duration,
            exercises: w.exercises.iter().map(SessionExerciseRecord::from).collect(),
            calories_burned: w.calories_burned,
            notes: w.notes.clone(),
            completed: w.completed,
        }
    }
}

#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct SetUpdateRecord {
    #[uniffi(default = None)]
    pub reps: Option<u32>,
    #[uniffi(default = None)]
    pub weight: Option<f64>,
    #[uniffi(default = None)]
    pub duration: Option<u32>,
    #[uniffi(default = None)]
    pub notes: Option<String>,
}

impl SetUpdateRecord {
    pub fn into_checked(self) -> anyhow::Result<SetUpdate> {
        let update = SetUpdate {
            reps: self.reps,
            weight: self.weight,
            duration: self.duration,
            notes: self.notes,
        };
        update.validate()?;
        Ok(update)
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct PlanRequestRecord {
    pub goals: Vec<String>,
    pub equipment: Vec<String>,
    pub duration_minutes: u32,
    pub difficulty: Difficulty,
}

impl From<PlanRequestRecord> for PlanRequest {
    fn from(r: PlanRequestRecord) -> Self {
        PlanRequest {
            goals: r.goals,
            equipment: r.equipment,
            duration_minutes: r.duration_minutes,
            difficulty: r.difficulty,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct WorkoutProgressRecord {
    pub completed_sets: u32,
    pub total_sets: u32,
    pub completed_exercises: u32,
    pub total_exercises: u32,
    pub total_volume_kg: f64,
    pub sets_on_target: u32,
}

impl From<WorkoutProgress> for WorkoutProgressRecord {
    fn from(p: WorkoutProgress) -> Self {
        WorkoutProgressRecord {
            completed_sets: p.completed_sets,
            total_sets: p.total_sets,
            completed_exercises: p.completed_exercises,
            total_exercises: p.total_exercises,
            total_volume_kg: p.total_volume_kg,
            sets_on_target: p.sets_on_target,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct StoreSnapshotRecord {
    pub current_workout: Option<WorkoutSessionRecord>,
    pub current_exercise_index: u32,
    pub active_plan: Option<WorkoutPlanRecord>,
    pub plans: Vec<WorkoutPlanRecord>,
    pub history: Vec<WorkoutSessionRecord>,
    pub is_generating: bool,
    pub error: Option<String>,
}

impl From<&StoreSnapshot> for StoreSnapshotRecord {
    fn from(s: &StoreSnapshot) -> Self {
        StoreSnapshotRecord {
            current_workout: s.current_workout.as_ref().map(WorkoutSessionRecord::from),
            current_exercise_index: s.current_exercise_index as u32,
            active_plan: s.active_plan.as_ref().map(WorkoutPlanRecord::from),
            plans: s.plans.iter().map(WorkoutPlanRecord::from).collect(),
            history: s.history.iter().map(WorkoutSessionRecord::from).collect(),
            is_generating: s.is_generating,
            error: s.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeSet;

    fn exercise(id: &str, name: &str, reps: &str) -> Exercise {
        Exercise {
            id: id.into(),
            name: name.into(),
            muscle_groups: BTreeSet::new(),
            equipment: BTreeSet::new(),
            difficulty: Difficulty::Beginner,
            sets: 3,
            reps: reps.into(),
            rest_time: 45,
            video_url: None,
            instructions: vec![],
            tips: vec![],
            alternatives: vec![],
        }
    }

    #[test]
    fn set_update_record_rejects_bad_weight() {
        let record = SetUpdateRecord {
            reps: Some(8),
            weight: Some(f64::NAN),
            ..Default::default()
        };
        assert!(record.into_checked().is_err());

        let record = SetUpdateRecord {
            weight: Some(62.5),
            ..Default::default()
        };
        assert_eq!(record.into_checked().unwrap().weight, Some(62.5));
    }

    #[test]
    fn plan_record_flattens_alternatives_and_time() {
        let mut plank = exercise("plank", "Plank", "30 seconds");
        plank.alternatives = vec![exercise("dead-bug", "Dead Bug", "10 each side")];
        let plan = WorkoutPlan {
            id: "p".into(),
            name: "Core".into(),
            exercises: vec![plank],
            estimated_duration: 10,
            difficulty: Difficulty::Beginner,
            created_at: Utc.timestamp_millis_opt(1_760_600_000_000).unwrap(),
            is_active: true,
        };

        let record = WorkoutPlanRecord::from(&plan);
        assert_eq!(record.created_at_ms, 1_760_600_000_000);
        assert_eq!(record.exercises[0].alternatives, vec!["Dead Bug"]);
        assert!(record.exercises[0].is_timed);
        assert_eq!(record.exercises[0].rep_target, "30s");
    }
}
