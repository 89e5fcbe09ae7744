//! Validation rules for apple records
//!
//! Applied before every write so that a stored row always satisfies the
//! lifecycle invariants.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::AppleStatus;

/// Two fractional digits, matching the `NUMERIC(5,2)` column
pub const PERCENT_SCALE: u32 = 2;

/// Validate a percent fits storage precision without rounding
pub fn validate_percent_precision(percent: Decimal) -> Result<(), &'static str> {
    if percent.normalize().scale() > PERCENT_SCALE {
        return Err("Percent can have at most two decimal places");
    }
    Ok(())
}

/// Validate a cumulative eaten percent is within 0-100
pub fn validate_eaten_percent(eaten: Decimal) -> Result<(), &'static str> {
    if eaten < Decimal::ZERO || eaten > Decimal::ONE_HUNDRED {
        return Err("Eaten percent must be between 0 and 100");
    }
    Ok(())
}

/// Validate a single bite is within (0, 100]
pub fn validate_bite_percent(percent: Decimal) -> Result<(), &'static str> {
    if percent <= Decimal::ZERO {
        return Err("Percent must be a positive number");
    }
    if percent > Decimal::ONE_HUNDRED {
        return Err("Percent must be between 1 and 100");
    }
    Ok(())
}

/// Validate the fall date is not before the apple appeared
pub fn validate_fall_date(
    appearance_date: DateTime<Utc>,
    fall_date: Option<DateTime<Utc>>,
) -> Result<(), &'static str> {
    match fall_date {
        Some(fall) if fall < appearance_date => {
            Err("Fall date cannot be earlier than appearance date")
        }
        _ => Ok(()),
    }
}

/// Validate an apple only rots after it has fallen
pub fn validate_rotten_date(
    fall_date: Option<DateTime<Utc>>,
    rotten_date: Option<DateTime<Utc>>,
) -> Result<(), &'static str> {
    match (fall_date, rotten_date) {
        (_, None) => Ok(()),
        (None, Some(_)) => Err("An apple cannot rot before it has fallen"),
        (Some(fall), Some(rotten)) if rotten < fall => {
            Err("Rotten date cannot be earlier than fall date")
        }
        _ => Ok(()),
    }
}

/// Validate the date columns that must be present for a given status
pub fn validate_status_dates(
    status: AppleStatus,
    fall_date: Option<DateTime<Utc>>,
    rotten_date: Option<DateTime<Utc>>,
) -> Result<(), &'static str> {
    let fallen = matches!(status, AppleStatus::OnGround | AppleStatus::Rotten);
    if fallen != fall_date.is_some() {
        return Err("Fall date must be set exactly when the apple is off the tree");
    }
    if (status == AppleStatus::Rotten) != rotten_date.is_some() {
        return Err("Rotten date must be set exactly when the apple is rotten");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_percent_precision() {
        assert!(validate_percent_precision(dec("33.33")).is_ok());
        assert!(validate_percent_precision(dec("12.500")).is_ok());
        assert!(validate_percent_precision(dec("100")).is_ok());
        assert!(validate_percent_precision(dec("33.333")).is_err());
        assert!(validate_percent_precision(dec("99.996")).is_err());
        assert!(validate_percent_precision(dec("0.004")).is_err());
    }

    #[test]
    fn test_eaten_percent_bounds() {
        assert!(validate_eaten_percent(Decimal::ZERO).is_ok());
        assert!(validate_eaten_percent(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_eaten_percent(dec("-0.01")).is_err());
        assert!(validate_eaten_percent(dec("100.01")).is_err());
    }

    #[test]
    fn test_bite_percent_bounds() {
        assert!(validate_bite_percent(dec("0.01")).is_ok());
        assert!(validate_bite_percent(Decimal::ONE_HUNDRED).is_ok());
        assert!(validate_bite_percent(Decimal::ZERO).is_err());
        assert!(validate_bite_percent(dec("-5")).is_err());
        assert!(validate_bite_percent(dec("100.5")).is_err());
    }

    #[test]
    fn test_fall_date_after_appearance() {
        assert!(validate_fall_date(at(100), None).is_ok());
        assert!(validate_fall_date(at(100), Some(at(100))).is_ok());
        assert!(validate_fall_date(at(100), Some(at(99))).is_err());
    }

    #[test]
    fn test_rotten_date_requires_fall() {
        assert!(validate_rotten_date(None, None).is_ok());
        assert!(validate_rotten_date(None, Some(at(10))).is_err());
        assert!(validate_rotten_date(Some(at(10)), Some(at(9))).is_err());
        assert!(validate_rotten_date(Some(at(10)), Some(at(10))).is_ok());
    }

    #[test]
    fn test_status_dates() {
        assert!(validate_status_dates(AppleStatus::OnTree, None, None).is_ok());
        assert!(validate_status_dates(AppleStatus::OnTree, Some(at(1)), None).is_err());
        assert!(validate_status_dates(AppleStatus::OnGround, Some(at(1)), None).is_ok());
        assert!(validate_status_dates(AppleStatus::OnGround, None, None).is_err());
        assert!(validate_status_dates(AppleStatus::OnGround, Some(at(1)), Some(at(2))).is_err());
        assert!(validate_status_dates(AppleStatus::Rotten, Some(at(1)), Some(at(2))).is_ok());
        assert!(validate_status_dates(AppleStatus::Rotten, Some(at(1)), None).is_err());
    }
}
