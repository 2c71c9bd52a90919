//! Field validators shared by request inputs.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use validator::ValidationError;

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(failure("non_negative", "Must be a positive number"));
    }
    Ok(())
}

pub fn percentage(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > dec!(100) {
        return Err(failure("percentage", "Must be between 0 and 100"));
    }
    Ok(())
}

pub fn price(value: &Decimal) -> Result<(), ValidationError> {
    non_negative(value).map_err(|_| failure("price", "Price must be a numeric value"))
}

pub fn royalty(value: &Decimal) -> Result<(), ValidationError> {
    non_negative(value).map_err(|_| failure("royalty", "Royalty must be a positive number"))
}

pub fn royalty_percent(value: &Decimal) -> Result<(), ValidationError> {
    percentage(value).map_err(|_| failure("percent", "Percent must be a positive number"))
}

pub fn benefits(values: &[String]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(failure("benefits", "Benefits must be an array of strings"));
    }
    Ok(())
}
