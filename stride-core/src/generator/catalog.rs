//! Built-in exercise catalog and the canned plan builder on top of it.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::Utc;
use log::debug;
use uuid::Uuid;

use super::{PlanGenerationError, PlanRequest};
use crate::models::{Difficulty, Exercise, WorkoutPlan};

const BODYWEIGHT: &str = "bodyweight";
const MINUTES_PER_EXERCISE: u32 = 8;
const MIN_EXERCISES: usize = 3;
const MAX_EXERCISES: usize = 8;
const WORK_SECONDS_PER_SET: u32 = 40;

struct Entry {
    id: &'static str,
    name: &'static str,
    muscles: &'static [&'static str],
    equipment: &'static [&'static str],
    goals: &'static [&'static str],
    difficulty: Difficulty,
    sets: u32,
    reps: &'static str,
    rest: u32,
    instructions: &'static [&'static str],
    tips: &'static [&'static str],
    alternatives: &'static [&'static str],
}

use Difficulty::{Advanced, Beginner, Intermediate};

const CATALOG: &[Entry] = &[
    Entry {
        id: "push-up",
        name: "Push-Up",
        muscles: &["chest", "triceps", "shoulders"],
        equipment: &[BODYWEIGHT],
        goals: &["strength", "hypertrophy", "general"],
        difficulty: Beginner,
        sets: 3,
        reps: "10-15",
        rest: 60,
        instructions: &[
            "Start in a high plank with hands under shoulders",
            "Lower your chest until it nearly touches the floor",
            "Press back up to full arm extension",
        ],
        tips: &["Keep your body in a straight line", "Drop to your knees if form breaks down"],
        alternatives: &["incline-push-up", "dumbbell-bench-press"],
    },
    Entry {
        id: "incline-push-up",
        name: "Incline Push-Up",
        muscles: &["chest", "triceps"],
        equipment: &[BODYWEIGHT],
        goals: &["strength", "general"],
        difficulty: Beginner,
        sets: 3,
        reps: "12-15",
        rest: 45,
        instructions: &[
            "Place hands on a bench or sturdy surface",
            "Lower your chest toward the edge",
            "Push back to the start",
        ],
        tips: &["The higher the surface, the easier the movement"],
        alternatives: &["push-up"],
    },
    Entry {
        id: "bodyweight-squat",
        name: "Bodyweight Squat",
        muscles: &["quads", "glutes"],
        equipment: &[BODYWEIGHT],
        goals: &["general", "fat_loss", "endurance"],
        difficulty: Beginner,
        sets: 3,
        reps: "15-20",
        rest: 45,
        instructions: &[
            "Stand with feet shoulder-width apart",
            "Sit back and down until thighs are parallel to the floor",
            "Drive through your heels to stand",
        ],
        tips: &["Keep your chest up", "Knees track over toes"],
        alternatives: &["goblet-squat"],
    },
    Entry {
        id: "goblet-squat",
        name: "Goblet Squat",
        muscles: &["quads", "glutes", "core"],
        equipment: &["dumbbells"],
        goals: &["strength", "hypertrophy"],
        difficulty: Intermediate,
        sets: 4,
        reps: "8-12",
        rest: 90,
        instructions: &[
            "Hold a dumbbell vertically at your chest",
            "Squat down between your knees",
            "Stand back up keeping the weight close",
        ],
        tips: &["Elbows brush the inside of your knees at the bottom"],
        alternatives: &["bodyweight-squat", "barbell-back-squat"],
    },
    Entry {
        id: "barbell-back-squat",
        name: "Barbell Back Squat",
        muscles: &["quads", "glutes", "hamstrings"],
        equipment: &["barbell"],
        goals: &["strength", "hypertrophy"],
        difficulty: Advanced,
        sets: 5,
        reps: "5",
        rest: 150,
        instructions: &[
            "Set the bar across your upper back",
            "Brace and squat to at least parallel",
            "Drive up while keeping the bar over mid-foot",
        ],
        tips: &["Use safety pins", "Breathe and brace before each rep"],
        alternatives: &["goblet-squat"],
    },
    Entry {
        id: "dumbbell-bench-press",
        name: "Dumbbell Bench Press",
        muscles: &["chest", "triceps", "shoulders"],
        equipment: &["dumbbells", "bench"],
        goals: &["strength", "hypertrophy"],
        difficulty: Intermediate,
        sets: 4,
        reps: "8-12",
        rest: 90,
        instructions: &[
            "Lie on the bench holding dumbbells above your chest",
            "Lower them to the sides of your chest",
            "Press back up until arms are straight",
        ],
        tips: &["Keep your shoulder blades pinched together"],
        alternatives: &["push-up"],
    },
    Entry {
        id: "dumbbell-row",
        name: "Dumbbell Row",
        muscles: &["back", "biceps"],
        equipment: &["dumbbells"],
        goals: &["strength", "hypertrophy", "general"],
        difficulty: Beginner,
        sets: 3,
        reps: "10-12",
        rest: 60,
        instructions: &[
            "Hinge forward with one hand supported",
            "Pull the dumbbell toward your hip",
            "Lower under control",
        ],
        tips: &["Lead with the elbow, not the hand"],
        alternatives: &["resistance-band-row"],
    },
    Entry {
        id: "resistance-band-row",
        name: "Resistance Band Row",
        muscles: &["back", "biceps"],
        equipment: &["resistance bands"],
        goals: &["general", "endurance"],
        difficulty: Beginner,
        sets: 3,
        reps: "12-15",
        rest: 45,
        instructions: &[
            "Anchor the band at chest height",
            "Pull the handles toward your ribs",
            "Return slowly",
        ],
        tips: &["Squeeze your shoulder blades at the end of each rep"],
        alternatives: &["dumbbell-row"],
    },
    Entry {
        id: "pull-up",
        name: "Pull-Up",
        muscles: &["back", "biceps"],
        equipment: &["pull-up bar"],
        goals: &["strength", "hypertrophy"],
        difficulty: Advanced,
        sets: 4,
        reps: "5-8",
        rest: 120,
        instructions: &[
            "Hang from the bar with an overhand grip",
            "Pull until your chin clears the bar",
            "Lower to a full hang",
        ],
        tips: &["Avoid kipping", "Use a band for assistance if needed"],
        alternatives: &["dumbbell-row", "resistance-band-row"],
    },
    Entry {
        id: "dumbbell-shoulder-press",
        name: "Dumbbell Shoulder Press",
        muscles: &["shoulders", "triceps"],
        equipment: &["dumbbells"],
        goals: &["strength", "hypertrophy"],
        difficulty: Intermediate,
        sets: 3,
        reps: "8-10",
        rest: 90,
        instructions: &[
            "Hold dumbbells at shoulder height",
            "Press overhead until arms are straight",
            "Lower back to the shoulders",
        ],
        tips: &["Do not arch your lower back"],
        alternatives: &["pike-push-up"],
    },
    Entry {
        id: "pike-push-up",
        name: "Pike Push-Up",
        muscles: &["shoulders", "triceps"],
        equipment: &[BODYWEIGHT],
        goals: &["strength"],
        difficulty: Intermediate,
        sets: 3,
        reps: "8-10",
        rest: 60,
        instructions: &[
            "Start in a downward dog position",
            "Bend your elbows to lower your head toward the floor",
            "Press back up",
        ],
        tips: &["Elevate your feet to make it harder"],
        alternatives: &["dumbbell-shoulder-press"],
    },
    Entry {
        id: "glute-bridge",
        name: "Glute Bridge",
        muscles: &["glutes", "hamstrings"],
        equipment: &[BODYWEIGHT],
        goals: &["general", "mobility", "hypertrophy"],
        difficulty: Beginner,
        sets: 3,
        reps: "12-15",
        rest: 45,
        instructions: &[
            "Lie on your back with knees bent",
            "Drive your hips up by squeezing the glutes",
            "Lower slowly",
        ],
        tips: &["Pause for a second at the top"],
        alternatives: &["romanian-deadlift"],
    },
    Entry {
        id: "romanian-deadlift",
        name: "Romanian Deadlift",
        muscles: &["hamstrings", "glutes", "back"],
        equipment: &["dumbbells"],
        goals: &["strength", "hypertrophy"],
        difficulty: Intermediate,
        sets: 3,
        reps: "8-10",
        rest: 90,
        instructions: &[
            "Hold dumbbells in front of your thighs",
            "Hinge at the hips with soft knees",
            "Return to standing by driving the hips forward",
        ],
        tips: &["Keep the weights close to your legs"],
        alternatives: &["glute-bridge"],
    },
    Entry {
        id: "plank",
        name: "Plank",
        muscles: &["core"],
        equipment: &[BODYWEIGHT],
        goals: &["general", "endurance", "mobility"],
        difficulty: Beginner,
        sets: 3,
        reps: "30 seconds",
        rest: 30,
        instructions: &[
            "Rest on your forearms and toes",
            "Hold your body in a straight line",
        ],
        tips: &["Squeeze glutes and brace your abs"],
        alternatives: &["dead-bug"],
    },
    Entry {
        id: "dead-bug",
        name: "Dead Bug",
        muscles: &["core"],
        equipment: &[BODYWEIGHT],
        goals: &["general", "mobility"],
        difficulty: Beginner,
        sets: 3,
        reps: "10 each side",
        rest: 30,
        instructions: &[
            "Lie on your back with arms and knees up",
            "Extend the opposite arm and leg",
            "Return and switch sides",
        ],
        tips: &["Keep your lower back pressed into the floor"],
        alternatives: &["plank"],
    },
    Entry {
        id: "jumping-jacks",
        name: "Jumping Jacks",
        muscles: &["full body"],
        equipment: &[BODYWEIGHT],
        goals: &["fat_loss", "endurance"],
        difficulty: Beginner,
        sets: 3,
        reps: "45 seconds",
        rest: 30,
        instructions: &[
            "Jump your feet out while raising your arms",
            "Jump back to the start",
        ],
        tips: &["Land softly"],
        alternatives: &["mountain-climbers"],
    },
    Entry {
        id: "mountain-climbers",
        name: "Mountain Climbers",
        muscles: &["core", "full body"],
        equipment: &[BODYWEIGHT],
        goals: &["fat_loss", "endurance"],
        difficulty: Intermediate,
        sets: 3,
        reps: "30 seconds",
        rest: 30,
        instructions: &[
            "Start in a high plank",
            "Drive your knees toward your chest one at a time",
        ],
        tips: &["Keep your hips level"],
        alternatives: &["jumping-jacks"],
    },
    Entry {
        id: "kettlebell-swing",
        name: "Kettlebell Swing",
        muscles: &["glutes", "hamstrings", "full body"],
        equipment: &["kettlebell"],
        goals: &["fat_loss", "endurance", "strength"],
        difficulty: Intermediate,
        sets: 4,
        reps: "15",
        rest: 60,
        instructions: &[
            "Hinge and hike the kettlebell between your legs",
            "Snap your hips forward to swing it to chest height",
            "Let it fall back into the next hinge",
        ],
        tips: &["The power comes from the hips, not the arms"],
        alternatives: &["glute-bridge"],
    },
    Entry {
        id: "burpee",
        name: "Burpee",
        muscles: &["full body"],
        equipment: &[BODYWEIGHT],
        goals: &["fat_loss", "endurance"],
        difficulty: Advanced,
        sets: 4,
        reps: "10",
        rest: 60,
        instructions: &[
            "Drop into a squat and place hands on the floor",
            "Jump feet back to a plank and do a push-up",
            "Jump feet in and explode upward",
        ],
        tips: &["Pace yourself across all sets"],
        alternatives: &["mountain-climbers", "jumping-jacks"],
    },
];

fn strings(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn to_exercise(entry: &Entry) -> Exercise {
    Exercise {
        id: entry.id.to_string(),
        name: entry.name.to_string(),
        muscle_groups: strings(entry.muscles),
        equipment: strings(entry.equipment),
        difficulty: entry.difficulty,
        sets: entry.sets,
        reps: entry.reps.to_string(),
        rest_time: entry.rest,
        video_url: Some(format!("https://videos.stride.app/exercises/{}.mp4", entry.id)),
        instructions: entry.instructions.iter().map(|s| s.to_string()).collect(),
        tips: entry.tips.iter().map(|s| s.to_string()).collect(),
        alternatives: vec![],
    }
}

pub fn catalog_exercises() -> Vec<Exercise> {
    CATALOG.iter().map(to_exercise).collect()
}

/// Maps a free-text goal onto the catalog's goal tags. Goals that name a
/// muscle group instead are matched in `score`.
fn goal_tag(goal: &str) -> Option<&'static str> {
    let g = goal.to_lowercase();
    if g.contains("strength") || g.contains("strong") || g.contains("power") {
        Some("strength")
    } else if g.contains("muscle") || g.contains("hypertrophy") || g.contains("build") {
        Some("hypertrophy")
    } else if g.contains("weight") || g.contains("fat") || g.contains("lose") || g.contains("cardio")
    {
        Some("fat_loss")
    } else if g.contains("endurance") || g.contains("stamina") {
        Some("endurance")
    } else if g.contains("flexib") || g.contains("mobility") || g.contains("stretch") {
        Some("mobility")
    } else if g.contains("general") || g.contains("fitness") || g.contains("health") {
        Some("general")
    } else {
        None
    }
}

fn score(entry: &Entry, goals: &[String]) -> usize {
    goals
        .iter()
        .filter(|goal| {
            let lowered = goal.trim().to_lowercase();
            goal_tag(goal).is_some_and(|tag| entry.goals.contains(&tag))
                || entry.muscles.contains(&lowered.as_str())
        })
        .count()
}

fn is_available(entry: &Entry, equipment: &BTreeSet<String>) -> bool {
    entry
        .equipment
        .iter()
        .all(|e| *e == BODYWEIGHT || equipment.contains(*e))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn build_plan(request: &PlanRequest) -> Result<WorkoutPlan> {
    let equipment: BTreeSet<String> = request
        .equipment
        .iter()
        .map(|e| e.trim().to_lowercase())
        .collect();

    let mut candidates: Vec<(usize, &Entry)> = CATALOG
        .iter()
        .filter(|e| e.difficulty <= request.difficulty && is_available(e, &equipment))
        .map(|e| (score(e, &request.goals), e))
        .collect();
    // stable: ties keep catalog order
    candidates.sort_by(|a, b| b.0.cmp(&a.0));

    let wanted = ((request.duration_minutes / MINUTES_PER_EXERCISE) as usize)
        .clamp(MIN_EXERCISES, MAX_EXERCISES);
    debug!(
        "catalog: {} candidates for {} slots",
        candidates.len(),
        wanted
    );

    let exercises: Vec<Exercise> = candidates
        .into_iter()
        .take(wanted)
        .map(|(_, entry)| {
            let mut exercise = to_exercise(entry);
            exercise.alternatives = entry
                .alternatives
                .iter()
                .filter_map(|id| CATALOG.iter().find(|c| c.id == *id))
                .filter(|c| is_available(c, &equipment))
                .map(to_exercise)
                .collect();
            exercise
        })
        .collect();

    if exercises.is_empty() {
        return Err(PlanGenerationError::EmptyPlan.into());
    }

    let work_seconds: u32 = exercises
        .iter()
        .map(|e| e.sets * (WORK_SECONDS_PER_SET + e.rest_time))
        .sum();
    let focus = request
        .goals
        .first()
        .map(|g| title_case(g.trim()))
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| "Full Body".to_string());

    Ok(WorkoutPlan {
        id: Uuid::new_v4().to_string(),
        name: format!("{} {} Workout", title_case(request.difficulty.as_str()), focus),
        exercises,
        estimated_duration: work_seconds.div_ceil(60),
        difficulty: request.difficulty,
        created_at: Utc::now(),
        is_active: true,
    })
}
