//! Workout plan generation.
//!
//! `PlanGenerator` hides which backend produces plans: the built-in catalog
//! (canned exercises after an artificial delay), an LLM, or a test responder.

mod catalog;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{debug, info};
use thiserror::Error;
use tokio::time::sleep;

use crate::llm::{LlmInterface, PromptBuilder, PromptContext, generate_workout_plan};
use crate::models::{Difficulty, WorkoutPlan};

pub use catalog::catalog_exercises;

#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub goals: Vec<String>,
    pub equipment: Vec<String>,
    pub duration_minutes: u32,
    pub difficulty: Difficulty,
}

#[derive(Debug, Error)]
pub enum PlanGenerationError {
    #[error("plan request was superseded by a newer request")]
    Superseded,
    #[error("plan generator returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("no exercises match the requested equipment and difficulty")]
    EmptyPlan,
}

type MockPlanFn = Arc<dyn Fn(&PlanRequest) -> Result<WorkoutPlan> + Send + Sync>;

enum GeneratorBackend {
    Catalog { delay: Duration },
    Llm { llm: LlmInterface },
    Mock { responder: MockPlanFn },
}

pub struct PlanGenerator {
    backend: GeneratorBackend,
}

impl PlanGenerator {
    pub fn catalog(delay: Duration) -> Self {
        Self {
            backend: GeneratorBackend::Catalog { delay },
        }
    }

    pub fn llm(llm: LlmInterface) -> Self {
        Self {
            backend: GeneratorBackend::Llm { llm },
        }
    }

    pub fn new_mock_fn(
        f: impl Fn(&PlanRequest) -> Result<WorkoutPlan> + Send + Sync + 'static,
    ) -> Self {
        Self {
            backend: GeneratorBackend::Mock {
                responder: Arc::new(f),
            },
        }
    }

    pub fn describe(&self) -> String {
        match &self.backend {
            GeneratorBackend::Catalog { delay } => format!("catalog({}ms)", delay.as_millis()),
            GeneratorBackend::Llm { llm } => format!("llm:{}", llm.describe()),
            GeneratorBackend::Mock { .. } => "mock".to_string(),
        }
    }

    pub async fn generate(&self, request: &PlanRequest) -> Result<WorkoutPlan> {
        debug!(
            "PlanGenerator::generate backend={} goals={:?} equipment={:?} duration={} difficulty={}",
            self.describe(),
            request.goals,
            request.equipment,
            request.duration_minutes,
            request.difficulty
        );
        let plan = match &self.backend {
            GeneratorBackend::Catalog { delay } => {
                if !delay.is_zero() {
                    sleep(*delay).await;
                }
                catalog::build_plan(request)?
            }
            GeneratorBackend::Llm { llm } => {
                let ctx = PromptContext {
                    known_exercises: catalog_exercises().into_iter().map(|e| e.name).collect(),
                    ..Default::default()
                };
                generate_workout_plan(llm, &PromptBuilder::new(ctx), request).await?
            }
            GeneratorBackend::Mock { responder } => responder(request)?,
        };
        info!(
            "Generated plan '{}' ({} exercises, ~{} min)",
            plan.name,
            plan.exercises.len(),
            plan.estimated_duration
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    fn request() -> PlanRequest {
        PlanRequest {
            goals: vec!["strength".into()],
            equipment: vec![],
            duration_minutes: 30,
            difficulty: Difficulty::Beginner,
        }
    }

    #[tokio::test]
    async fn catalog_backend_produces_plan() {
        let generator = PlanGenerator::catalog(Duration::from_millis(5));
        let plan = generator.generate(&request()).await.unwrap();
        assert!(!plan.exercises.is_empty());
        assert_eq!(generator.describe(), "catalog(5ms)");
    }

    #[tokio::test]
    async fn mock_backend_errors_pass_through() {
        let generator = PlanGenerator::new_mock_fn(|_| Err(anyhow!("model offline")));
        let err = generator.generate(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "model offline");
    }

    #[tokio::test]
    async fn llm_backend_uses_prompted_response() {
        let llm = LlmInterface::new_mock_fn(|_s, user| {
            assert!(user.contains("Goals: strength"));
            r#"{"name":"Bodyweight Basics","exercises":[{"name":"Push-Up","sets":3,"reps":"10"}]}"#
                .to_string()
        });
        let generator = PlanGenerator::llm(llm);
        let plan = generator.generate(&request()).await.unwrap();
        assert_eq!(plan.name, "Bodyweight Basics");
        assert_eq!(plan.exercises[0].id, "push-up");
        assert_eq!(generator.describe(), "llm:mock");
    }
}
