//! Shared types and domain logic for the Weather Ensemble Platform
//!
//! This crate contains the pure ensemble/verification math and the wire
//! models shared between the backend and other components of the system.

pub mod ensemble;
pub mod models;
pub mod scoring;
pub mod types;
pub mod validation;

pub use ensemble::*;
pub use models::*;
pub use scoring::*;
pub use types::*;
pub use validation::*;
