use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "uniffi", derive(uniffi::Enum))]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            _ => Err(anyhow!("Invalid difficulty: {}", s)),
        }
    }
}

/// One exercise entry of a plan.
///
/// `alternatives` holds owned copies of substitute exercises. Nothing checks
/// for cycles; generators only ever build them one level deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub muscle_groups: BTreeSet<String>,
    #[serde(default)]
    pub equipment: BTreeSet<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    pub sets: u32,
    pub reps: String,
    pub rest_time: u32,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<Exercise>,
}

impl Exercise {
    pub fn rep_target(&self) -> RepTarget {
        RepTarget::parse(&self.reps)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPlan {
    pub id: String,
    pub name: String,
    pub exercises: Vec<Exercise>,
    pub estimated_duration: u32,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSet {
    pub set_number: u32,
    pub reps: u32,
    pub weight: Option<f64>,
    pub duration: Option<u32>,
    pub completed: bool,
    pub notes: Option<String>,
}

impl SessionSet {
    pub fn pending(set_number: u32) -> Self {
        Self {
            set_number,
            reps: 0,
            weight: Some(0.0),
            duration: None,
            completed: false,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExercise {
    pub exercise_id: String,
    pub name: String,
    /// Rep descriptor prescribed by the plan the workout started from.
    #[serde(default)]
    pub target_reps: String,
    pub sets: Vec<SessionSet>,
    pub rest_time: u32,
    pub completed: bool,
    pub video_url: Option<String>,
}

impl SessionExercise {
    pub fn rep_target(&self) -> RepTarget {
        RepTarget::parse(&self.target_reps)
    }
}

impl From<&Exercise> for SessionExercise {
    fn from(e: &Exercise) -> Self {
        SessionExercise {
            exercise_id: e.id.clone(),
            name: e.name.clone(),
            target_reps: e.reps.clone(),
            sets: (1..=e.sets).map(SessionSet::pending).collect(),
            rest_time: e.rest_time,
            completed: false,
            video_url: e.video_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub duration: u32,
    pub exercises: Vec<SessionExercise>,
    pub calories_burned: u32,
    pub notes: Option<String>,
    pub completed: bool,
}

impl WorkoutSession {
    pub fn from_plan(plan: &WorkoutPlan, start_time: DateTime<Utc>) -> Self {
        WorkoutSession {
            id: Uuid::new_v4().to_string(),
            start_time,
            duration: 0,
            exercises: plan.exercises.iter().map(SessionExercise::from).collect(),
            calories_burned: 0,
            notes: None,
            completed: false,
        }
    }

    pub fn exercise_mut(&mut self, exercise_id: &str) -> Option<&mut SessionExercise> {
        self.exercises
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
    }

    pub fn set_mut(&mut self, exercise_id: &str, set_number: u32) -> Option<&mut SessionSet> {
        self.exercise_mut(exercise_id)?
            .sets
            .iter_mut()
            .find(|s| s.set_number == set_number)
    }
}

/// Partial set result reported by the user. `None` fields leave the stored
/// value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetUpdate {
    pub reps: Option<u32>,
    pub weight: Option<f64>,
    pub duration: Option<u32>,
    pub notes: Option<String>,
}

impl SetUpdate {
    pub fn reps_weight(reps: u32, weight: f64) -> Self {
        Self {
            reps: Some(reps),
            weight: Some(weight),
            ..Default::default()
        }
    }

    /// Rejects weights that are negative or not finite.
    pub fn validate(&self) -> Result<()> {
        match self.weight {
            Some(w) if !w.is_finite() || w < 0.0 => Err(anyhow!("invalid weight: {}", w)),
            _ => Ok(()),
        }
    }

    pub fn apply(&self, set: &mut SessionSet) {
        if let Some(r) = self.reps {
            set.reps = r;
        }
        if let Some(w) = self.weight {
            set.weight = Some(w);
        }
        if let Some(d) = self.duration {
            set.duration = Some(d);
        }
        if let Some(n) = &self.notes {
            set.notes = Some(n.clone());
        }
    }
}

/// Parsed form of the free-form `Exercise::reps` descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepTarget {
    Fixed(u32),
    Range { min: u32, max: u32 },
    Timed { seconds: u32 },
    Open(String),
}

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(?:-|–|to)\s*(\d+)\s*(?:reps?)?(?:\s+(?:each|per)\s+\w+)?\s*$")
        .unwrap()
});
static FIXED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(?:reps?)?(?:\s+(?:each|per)\s+\w+)?\s*$").unwrap()
});
static TIMED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*(seconds?|secs?|s|minutes?|mins?|m)\b").unwrap()
});

impl RepTarget {
    pub fn parse(descriptor: &str) -> RepTarget {
        if let Some(caps) = RANGE_RE.captures(descriptor) {
            let a: u32 = caps[1].parse().unwrap_or(0);
            let b: u32 = caps[2].parse().unwrap_or(0);
            return RepTarget::Range {
                min: a.min(b),
                max: a.max(b),
            };
        }
        if let Some(caps) = FIXED_RE.captures(descriptor) {
            return RepTarget::Fixed(caps[1].parse().unwrap_or(0));
        }
        if let Some(caps) = TIMED_RE.captures(descriptor) {
            let value: u32 = caps[1].parse().unwrap_or(0);
            let seconds = if caps[2].to_lowercase().starts_with('m') {
                value.saturating_mul(60)
            } else {
                value
            };
            return RepTarget::Timed { seconds };
        }
        RepTarget::Open(descriptor.trim().to_string())
    }

    pub fn is_timed(&self) -> bool {
        matches!(self, RepTarget::Timed { .. })
    }

    /// Whether a logged set reaches the prescription. Ranges count from the
    /// lower bound.
    pub fn is_met_by(&self, set: &SessionSet) -> bool {
        match self {
            RepTarget::Fixed(n) => set.reps >= *n,
            RepTarget::Range { min, .. } => set.reps >= *min,
            RepTarget::Timed { seconds } => set.duration.unwrap_or(0) >= *seconds,
            RepTarget::Open(_) => set.reps > 0 || set.duration.unwrap_or(0) > 0,
        }
    }
}

impl fmt::Display for RepTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepTarget::Fixed(n) => write!(f, "{} reps", n),
            RepTarget::Range { min, max } => write!(f, "{}-{} reps", min, max),
            RepTarget::Timed { seconds } => write!(f, "{}s", seconds),
            RepTarget::Open(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: &str, sets: u32) -> Exercise {
        Exercise {
            id: id.into(),
            name: format!("Exercise {}", id),
            muscle_groups: BTreeSet::from(["chest".to_string()]),
            equipment: BTreeSet::new(),
            difficulty: Difficulty::Beginner,
            sets,
            reps: "8-12".into(),
            rest_time: 60,
            video_url: Some("https://example.com/v.mp4".into()),
            instructions: vec![],
            tips: vec![],
            alternatives: vec![],
        }
    }

    #[test]
    fn rep_target_descriptors() {
        assert_eq!(RepTarget::parse("8-12"), RepTarget::Range { min: 8, max: 12 });
        assert_eq!(RepTarget::parse("12 to 8 reps"), RepTarget::Range { min: 8, max: 12 });
        assert_eq!(RepTarget::parse("10"), RepTarget::Fixed(10));
        assert_eq!(RepTarget::parse("10 each side"), RepTarget::Fixed(10));
        assert_eq!(RepTarget::parse("30 seconds"), RepTarget::Timed { seconds: 30 });
        assert_eq!(RepTarget::parse("45 sec"), RepTarget::Timed { seconds: 45 });
        assert_eq!(RepTarget::parse("1 minute"), RepTarget::Timed { seconds: 60 });
        assert_eq!(RepTarget::parse(" AMRAP "), RepTarget::Open("AMRAP".into()));
    }

    #[test]
    fn rep_target_met() {
        let mut set = SessionSet::pending(1);
        let range = RepTarget::parse("8-12");
        assert!(!range.is_met_by(&set));
        set.reps = 8;
        assert!(range.is_met_by(&set));

        let timed = RepTarget::parse("30 seconds");
        assert!(timed.is_timed());
        assert!(!timed.is_met_by(&set));
        set.duration = Some(30);
        assert!(timed.is_met_by(&set));
    }

    #[test]
    fn session_exercise_prefills_sets() {
        let se = SessionExercise::from(&exercise("a", 4));
        assert_eq!(se.sets.len(), 4);
        assert_eq!(
            se.sets.iter().map(|s| s.set_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(se.sets.iter().all(|s| !s.completed && s.reps == 0));
        assert_eq!(se.video_url.as_deref(), Some("https://example.com/v.mp4"));
        assert_eq!(se.rep_target(), RepTarget::Range { min: 8, max: 12 });
    }

    #[test]
    fn set_update_merges_only_supplied_fields() {
        let mut set = SessionSet::pending(2);
        set.notes = Some("felt easy".into());
        SetUpdate {
            reps: Some(10),
            ..Default::default()
        }
        .apply(&mut set);
        assert_eq!(set.reps, 10);
        assert_eq!(set.weight, Some(0.0));
        assert_eq!(set.notes.as_deref(), Some("felt easy"));
        assert!(!set.completed);
    }

    #[test]
    fn set_update_rejects_bad_weights() {
        assert!(SetUpdate::reps_weight(5, 0.0).validate().is_ok());
        assert!(SetUpdate::default().validate().is_ok());
        assert!(SetUpdate::reps_weight(5, -2.5).validate().is_err());
        assert!(SetUpdate::reps_weight(5, f64::NAN).validate().is_err());
        assert!(SetUpdate::reps_weight(5, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn difficulty_parse_and_order() {
        assert_eq!("Advanced".parse::<Difficulty>().unwrap(), Difficulty::Advanced);
        assert!("expert".parse::<Difficulty>().is_err());
        assert!(Difficulty::Beginner < Difficulty::Intermediate);
        let json = serde_json::to_string(&Difficulty::Intermediate).unwrap();
        assert_eq!(json, "\"intermediate\"");
    }
}
