pub mod config;
pub mod generator;
pub mod llm;
pub mod models;
pub mod session;
pub mod storage;

#[cfg(feature = "uniffi")]
mod runtime;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
#[cfg(feature = "uniffi")]
pub mod uniffi_interface;

pub use config::{StoreConfig, StrideConfig};
pub use generator::{PlanGenerationError, PlanGenerator, PlanRequest};
pub use models::{
    Difficulty, Exercise, RepTarget, SessionExercise, SessionSet, SetUpdate, WorkoutPlan,
    WorkoutSession,
};
pub use session::{StoreSnapshot, WorkoutProgress, WorkoutStore};
pub use storage::{MemoryStorage, SqliteStorage, Storage};
