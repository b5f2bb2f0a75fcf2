//! Business logic services for the Weather Ensemble Platform

pub mod accuracy;
pub mod ensemble;
pub mod location;

pub use accuracy::AccuracyService;
pub use ensemble::EnsembleService;
pub use location::LocationService;
