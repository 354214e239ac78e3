use rust_decimal::{Decimal, prelude::ToPrimitive};
use time::Date;

use crate::constants::*;
use crate::error::{Error, Result};

pub fn validate_string_length(value: &str, field_name: &str, max_length: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field_name} cannot be empty")));
    }
    if value.trim().chars().count() > max_length {
        return Err(Error::validation(format!(
            "{field_name} must be at most {max_length} characters"
        )));
    }
    Ok(())
}

/// Treats a blank form value as if the field had been left out.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn parse_date(value: &str) -> Result<Date> {
    if value.trim().is_empty() {
        return Err(Error::validation("Date is required"));
    }

    Date::parse(value.trim(), DATE_FORMAT)
        .map_err(|_| Error::validation(format!("Invalid date '{}'", value.trim())))
}

pub fn parse_optional_date(value: Option<&str>) -> Result<Option<Date>> {
    non_blank(value).map(parse_date).transpose()
}

pub fn format_date(date: Date) -> Result<String> {
    date.format(DATE_FORMAT)
        .map_err(|e| Error::persistence("failed to format date", e))
}

pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation("Amount must be greater than 0"));
    }
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(Error::validation(format!(
            "Amount cannot have more than {MAX_AMOUNT_SCALE} decimal places"
        )));
    }
    amount_to_cents(amount)?;
    Ok(())
}

pub fn validate_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(Error::validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LENGTH} characters"
        ))),
        _ => Ok(()),
    }
}

/// Amounts are stored as whole cents so that SQL ordering is numeric and exact.
pub fn amount_to_cents(amount: Decimal) -> Result<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_i64())
        .ok_or_else(|| Error::validation("Amount is too large"))
}

pub fn cents_to_amount(cents: i64) -> Decimal {
    Decimal::new(cents, MAX_AMOUNT_SCALE)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use time::macros::date;

    use super::*;

    #[test]
    fn blank_values_are_absent() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" 42 ")), Some("42"));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2024-02-29").unwrap(), date!(2024 - 02 - 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("29/02/2024").is_err());
        assert!(parse_date("").is_err());
        assert_eq!(parse_optional_date(Some("")).unwrap(), None);
    }

    #[test]
    fn amount_must_be_positive_with_two_decimals() {
        assert!(validate_amount(Decimal::new(1250, 2)).is_ok());
        assert!(validate_amount(Decimal::new(12500, 3)).is_ok());
        assert!(validate_amount(Decimal::ZERO).is_err());
        assert!(validate_amount(Decimal::new(-5, 0)).is_err());
        assert!(validate_amount(Decimal::new(12345, 3)).is_err());
    }

    #[test]
    fn cents_conversion_is_exact() {
        let amount = Decimal::new(1999, 2);
        assert_eq!(amount_to_cents(amount).unwrap(), 1999);
        assert_eq!(cents_to_amount(1999), amount);
    }

    #[test]
    fn amounts_beyond_cent_range_are_rejected() {
        assert!(amount_to_cents(Decimal::MAX).is_err());
        assert!(validate_amount(Decimal::MAX).is_err());
        assert!(validate_amount(Decimal::from(i64::MAX)).is_err());
        assert!(validate_amount(Decimal::new(i64::MAX, 2)).is_ok());
    }

    #[test]
    fn description_length_is_bounded() {
        let long = "x".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_description(Some(&long)).is_err());
        assert!(validate_description(Some("lunch")).is_ok());
        assert!(validate_description(None).is_ok());
    }

    #[test]
    fn string_length_counts_characters() {
        assert!(validate_string_length("Café", "Category name", 4).is_ok());
        assert!(validate_string_length("   ", "Category name", 4).is_err());
    }
}
