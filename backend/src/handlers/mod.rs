//! HTTP handlers for the Weather Ensemble Platform

pub mod accuracy;
pub mod forecast;
pub mod health;
pub mod locations;

pub use accuracy::*;
pub use forecast::*;
pub use health::*;
pub use locations::*;
