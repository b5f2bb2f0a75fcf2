//! Saved location models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{validate_latitude, validate_longitude};

/// Input for saving a location for quick access.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLocationInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom = "validate_latitude")]
    pub latitude: Decimal,
    #[validate(custom = "validate_longitude")]
    pub longitude: Decimal,
    #[validate(length(min = 1, max = 100))]
    pub timezone: String,
    pub country: Option<String>,
}
