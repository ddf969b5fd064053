//! Workout session management.
//!
//! `WorkoutStore` owns the single active workout, the generated plans and the
//! finished-workout history. Operations are split by concern across the
//! submodules, all as `impl WorkoutStore` blocks.

mod navigation;
mod plans;
mod session;
mod sets;
mod summary;
mod workout;

pub use session::{StoreSnapshot, WorkoutStore};
pub use summary::WorkoutProgress;
