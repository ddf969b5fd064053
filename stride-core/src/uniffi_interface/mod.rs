//! Foreign-language bindings.
//!
//! Exposes the workout store as a uniffi object plus flat record types. All
//! async methods run on the crate's global tokio runtime.

pub mod errors;
pub mod logging;
pub mod objects;
pub mod store;

#[uniffi::export]
fn stride_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
