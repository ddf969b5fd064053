//! Prompting and response mapping for LLM-generated workout plans.

use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::LlmInterface;
use crate::generator::{PlanGenerationError, PlanRequest};
use crate::models::{Difficulty, Exercise, WorkoutPlan};

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrFloat {
        Int(u32),
        Float(f64),
        Text(String),
    }

    match Option::<IntOrFloat>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrFloat::Int(i)) => Ok(Some(i)),
        Some(IntOrFloat::Float(f)) => {
            if f.is_finite() && f >= 0.0 {
                Ok(Some(f.round() as u32))
            } else {
                Err(Error::custom(format!("invalid count value: {}", f)))
            }
        }
        Some(IntOrFloat::Text(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| Error::custom(format!("invalid count value: {:?}", s))),
    }
}

fn rep_descriptor<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(f64),
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Number(n) => format!("{}", n.round() as i64),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedExercise {
    pub name: String,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub sets: Option<u32>,
    #[serde(deserialize_with = "rep_descriptor")]
    pub reps: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub rest_time: Option<u32>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub alternatives: Vec<GeneratedExercise>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedPlan {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub exercises: Vec<GeneratedExercise>,
}

const DEFAULT_SETS: u32 = 3;
/// Upper bound on prescribed sets accepted from a model reply.
const MAX_SETS: u32 = 20;
const DEFAULT_REST_SECONDS: u32 = 60;

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut dash = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

fn parse_difficulty(raw: Option<&str>, fallback: Difficulty) -> Difficulty {
    match raw {
        Some(s) => s.parse().unwrap_or_else(|_| {
            warn!("Unknown difficulty {:?} from generator, using {}", s, fallback);
            fallback
        }),
        None => fallback,
    }
}

impl GeneratedExercise {
    fn into_exercise(self, fallback: Difficulty, index: usize) -> Exercise {
        let difficulty = parse_difficulty(self.difficulty.as_deref(), fallback);
        let sets = match self.sets {
            Some(0) | None => DEFAULT_SETS,
            Some(n) if n > MAX_SETS => {
                warn!("Clamping {} sets for '{}' to {}", n, self.name, MAX_SETS);
                MAX_SETS
            }
            Some(n) => n,
        };
        let base = slug(&self.name);
        let id = if base.is_empty() {
            format!("exercise-{}", index + 1)
        } else {
            base
        };
        Exercise {
            id,
            name: self.name.trim().to_string(),
            muscle_groups: self
                .muscle_groups
                .iter()
                .map(|m| m.trim().to_lowercase())
                .collect(),
            equipment: self
                .equipment
                .iter()
                .map(|e| e.trim().to_lowercase())
                .collect(),
            difficulty,
            sets,
            reps: self.reps.trim().to_string(),
            rest_time: self.rest_time.unwrap_or(DEFAULT_REST_SECONDS),
            video_url: self.video_url,
            instructions: self.instructions,
            tips: self.tips,
            alternatives: self
                .alternatives
                .into_iter()
                .enumerate()
                .map(|(i, alt)| alt.into_exercise(difficulty, i))
                .collect(),
        }
    }
}

impl GeneratedPlan {
    pub fn into_plan(self, request: &PlanRequest) -> Result<WorkoutPlan> {
        let exercises: Vec<Exercise> = self
            .exercises
            .into_iter()
            .filter(|e| !e.name.trim().is_empty())
            .enumerate()
            .map(|(i, e)| e.into_exercise(request.difficulty, i))
            .collect();
        if exercises.is_empty() {
            return Err(PlanGenerationError::EmptyPlan.into());
        }
        Ok(WorkoutPlan {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            exercises,
            estimated_duration: self
                .estimated_duration
                .unwrap_or(request.duration_minutes),
            difficulty: parse_difficulty(self.difficulty.as_deref(), request.difficulty),
            created_at: Utc::now(),
            is_active: true,
        })
    }
}

#[derive(Clone)]
pub struct PromptContext {
    pub known_exercises: Vec<String>,
    pub max_exercises: usize,
}

impl Default for PromptContext {
    fn default() -> Self {
        Self {
            known_exercises: vec![],
            max_exercises: 8,
        }
    }
}

pub struct PromptBuilder {
    ctx: PromptContext,
}

impl PromptBuilder {
    pub fn new(ctx: PromptContext) -> Self {
        debug!(
            "PromptBuilder::new created with known_exercises={}",
            ctx.known_exercises.len()
        );
        Self { ctx }
    }

    pub fn system_plan_prompt(&self) -> String {
        r#"You are an experienced strength and conditioning coach building a single workout session.
Return only a JSON object with this shape:
{"name": string, "estimated_duration": integer (minutes), "difficulty": "beginner"|"intermediate"|"advanced",
 "exercises": [{"name": string, "muscle_groups": [string], "equipment": [string], "difficulty": string,
   "sets": integer, "reps": string (e.g. "8-12" or "30 seconds"), "rest_time": integer (seconds),
   "instructions": [string], "tips": [string], "alternatives": [same exercise shape, without alternatives]}]}
Only use equipment the user has; "bodyweight" is always available. 'sets' and 'rest_time' must be integers."#
            .to_string()
    }

    pub fn user_plan_prompt(&self, request: &PlanRequest) -> String {
        let goals = if request.goals.is_empty() {
            "general fitness".to_string()
        } else {
            request.goals.join(", ")
        };
        let equipment = if request.equipment.is_empty() {
            "bodyweight only".to_string()
        } else {
            request.equipment.join(", ")
        };
        let known = if self.ctx.known_exercises.is_empty() {
            String::new()
        } else {
            format!(
                "\nPrefer these known exercises when they fit: {}\n",
                self.ctx.known_exercises.join(", ")
            )
        };
        format!(
            "Goals: {}\nAvailable equipment: {}\nTarget duration: {} minutes\nDifficulty: {}\nUse at most {} exercises.{}\nReturn only valid JSON.",
            goals,
            equipment,
            request.duration_minutes,
            request.difficulty,
            self.ctx.max_exercises,
            known
        )
    }
}

pub async fn generate_workout_plan(
    llm: &LlmInterface,
    builder: &PromptBuilder,
    request: &PlanRequest,
) -> Result<WorkoutPlan> {
    debug!(
        "generate_workout_plan called goals={:?} equipment={:?}",
        request.goals, request.equipment
    );
    let system = builder.system_plan_prompt();
    let user = builder.user_plan_prompt(request);
    let raw = llm.call(&system, &user).await?;
    let stripped = super::strip_code_fences(&raw);
    let generated: GeneratedPlan = serde_json::from_str(stripped).map_err(|e| {
        warn!("Cannot parse generated plan: {} -- error: {}", stripped, e);
        PlanGenerationError::InvalidResponse(e.to_string())
    })?;
    let plan = generated.into_plan(request)?;
    info!(
        "generate_workout_plan produced '{}' with {} exercises",
        plan.name,
        plan.exercises.len()
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlanRequest {
        PlanRequest {
            goals: vec!["strength".into()],
            equipment: vec!["dumbbells".into()],
            duration_minutes: 40,
            difficulty: Difficulty::Intermediate,
        }
    }

    #[tokio::test]
    async fn mock_plan_generation() {
        let reply = r#"```json
        {"name":"Dumbbell Strength","estimated_duration":42.0,"exercises":[
          {"name":"Goblet Squat","muscle_groups":["Quads","glutes"],"equipment":["Dumbbells"],
           "sets":4.0,"reps":"8-10","rest_time":"90","tips":["Chest up"],
           "alternatives":[{"name":"Bodyweight Squat","reps":15}]},
          {"name":"Plank","sets":3,"reps":"30 seconds"}
        ]}
        ```"#;
        let llm = LlmInterface::new_mock_fn(move |_s, _u| reply.to_string());
        let builder = PromptBuilder::new(PromptContext::default());
        let plan = generate_workout_plan(&llm, &builder, &request()).await.unwrap();

        assert_eq!(plan.name, "Dumbbell Strength");
        assert_eq!(plan.estimated_duration, 42);
        assert_eq!(plan.difficulty, Difficulty::Intermediate);
        assert_eq!(plan.exercises.len(), 2);

        let squat = &plan.exercises[0];
        assert_eq!(squat.id, "goblet-squat");
        assert_eq!(squat.sets, 4);
        assert_eq!(squat.rest_time, 90);
        assert!(squat.muscle_groups.contains("quads"));
        assert!(squat.equipment.contains("dumbbells"));
        assert_eq!(squat.alternatives.len(), 1);
        assert_eq!(squat.alternatives[0].reps, "15");
        assert_eq!(squat.alternatives[0].sets, DEFAULT_SETS);

        let plank = &plan.exercises[1];
        assert_eq!(plank.rest_time, DEFAULT_REST_SECONDS);
        assert!(plank.rep_target().is_timed());
    }

    #[tokio::test]
    async fn empty_or_invalid_responses_fail() {
        let builder = PromptBuilder::new(PromptContext::default());

        let empty = LlmInterface::new_mock_fn(|_s, _u| r#"{"name":"Nothing","exercises":[]}"#.into());
        let err = generate_workout_plan(&empty, &builder, &request())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanGenerationError>(),
            Some(PlanGenerationError::EmptyPlan)
        ));

        let garbage = LlmInterface::new_mock_fn(|_s, _u| "I can't help with that".into());
        let err = generate_workout_plan(&garbage, &builder, &request())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanGenerationError>(),
            Some(PlanGenerationError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn oversized_set_counts_are_clamped() {
        let llm = LlmInterface::new_mock_fn(|_s, _u| {
            r#"{"name":"X","exercises":[
              {"name":"Push-Up","sets":1e12,"reps":"10"},
              {"name":"Dip","sets":"25","reps":"8"},
              {"name":"Row","sets":0,"reps":"12"}
            ]}"#
            .into()
        });
        let builder = PromptBuilder::new(PromptContext::default());
        let plan = generate_workout_plan(&llm, &builder, &request()).await.unwrap();
        let sets: Vec<u32> = plan.exercises.iter().map(|e| e.sets).collect();
        assert_eq!(sets, vec![MAX_SETS, MAX_SETS, DEFAULT_SETS]);
    }

    #[test]
    fn user_prompt_mentions_request() {
        let builder = PromptBuilder::new(PromptContext {
            known_exercises: vec!["Push-Up".into()],
            ..Default::default()
        });
        let prompt = builder.user_plan_prompt(&request());
        assert!(prompt.contains("strength"));
        assert!(prompt.contains("dumbbells"));
        assert!(prompt.contains("40 minutes"));
        assert!(prompt.contains("intermediate"));
        assert!(prompt.contains("Push-Up"));
    }

    #[test]
    fn slugs() {
        assert_eq!(slug("Goblet Squat"), "goblet-squat");
        assert_eq!(slug("  Push-Up (knees) "), "push-up-knees");
        assert_eq!(slug("!!!"), "");
    }
}
