// src/common/validation.rs

use rust_decimal::Decimal;
use validator::ValidationError;

// Funções `custom` do validator. O código do erro vira a chave "validation.<code>".

pub fn not_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("not_negative"));
    }
    Ok(())
}

pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("not_negative"));
    }
    Ok(())
}

pub fn min_not_over_max(min: Decimal, max: Option<Decimal>) -> Result<(), ValidationError> {
    match max {
        Some(max) if min > max => Err(ValidationError::new("min_over_max")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_rules() {
        assert!(not_negative(&Decimal::ZERO).is_ok());
        assert!(not_negative(&Decimal::new(-1, 2)).is_err());
        assert!(positive(&Decimal::ZERO).is_err());
        assert!(positive(&Decimal::new(5, 1)).is_ok());
        assert!(min_not_over_max(Decimal::from(5), Some(Decimal::from(3))).is_err());
        assert!(min_not_over_max(Decimal::from(5), None).is_ok());
    }
}
