//! Wire models for the Weather Ensemble Platform

pub mod accuracy;
pub mod forecast;
pub mod location;

pub use accuracy::*;
pub use forecast::*;
pub use location::*;
