//! Validation helpers shared across the platform

use rust_decimal::Decimal;
use validator::ValidationError;

/// Latitude must be within [-90, 90] degrees.
pub fn validate_latitude(latitude: &Decimal) -> Result<(), ValidationError> {
    if *latitude < Decimal::from(-90) || *latitude > Decimal::from(90) {
        return Err(ValidationError::new("latitude_out_of_range"));
    }
    Ok(())
}

/// Longitude must be within [-180, 180] degrees.
pub fn validate_longitude(longitude: &Decimal) -> Result<(), ValidationError> {
    if *longitude < Decimal::from(-180) || *longitude > Decimal::from(180) {
        return Err(ValidationError::new("longitude_out_of_range"));
    }
    Ok(())
}

/// Coordinate check for raw query parameters.
pub fn coordinates_in_range(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude_bounds() {
        assert!(validate_latitude(&Decimal::from(90)).is_ok());
        assert!(validate_latitude(&Decimal::from(-90)).is_ok());
        assert!(validate_latitude(&Decimal::from(91)).is_err());
        assert!(validate_latitude(&Decimal::from(-91)).is_err());
    }

    #[test]
    fn test_validate_longitude_bounds() {
        assert!(validate_longitude(&Decimal::from(180)).is_ok());
        assert!(validate_longitude(&Decimal::from(-180)).is_ok());
        assert!(validate_longitude(&Decimal::from(181)).is_err());
        assert!(validate_longitude(&Decimal::from(-181)).is_err());
    }

    #[test]
    fn test_coordinates_in_range() {
        assert!(coordinates_in_range(40.7, -74.0));
        assert!(coordinates_in_range(-90.0, 180.0));
        assert!(!coordinates_in_range(90.5, 0.0));
        assert!(!coordinates_in_range(0.0, -180.5));
    }
}
