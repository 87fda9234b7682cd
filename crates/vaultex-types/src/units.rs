//! Conversion between human-readable quantities and base units.
//!
//! `parse_units(100, 18)` is `100 * 10^18`, the same scaling a wallet applies
//! before talking to a token with 18 decimals.

use rust_decimal::Decimal;

use crate::{Amount, Result, VaultexError, constants};

fn check_decimals(decimals: u32) -> Result<()> {
    if decimals > constants::MAX_DECIMALS {
        return Err(VaultexError::Configuration(format!(
            "decimals {decimals} exceeds maximum {}",
            constants::MAX_DECIMALS
        )));
    }
    Ok(())
}

/// Scale a human quantity to base units.
///
/// # Errors
/// - `Configuration` if `decimals` is out of range
/// - `Serialization` if the value is negative or has more fractional digits
///   than `decimals`
/// - `ArithmeticOverflow` if the result does not fit an [`Amount`]
pub fn parse_units(value: Decimal, decimals: u32) -> Result<Amount> {
    check_decimals(decimals)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(VaultexError::Serialization(format!(
            "negative quantity {value}"
        )));
    }

    let value = value.normalize();
    let scale = value.scale();
    if scale > decimals {
        return Err(VaultexError::Serialization(format!(
            "{value} has more than {decimals} fractional digits"
        )));
    }

    let mantissa: Amount = value.mantissa().unsigned_abs();
    let factor = 10u128
        .checked_pow(decimals - scale)
        .ok_or(VaultexError::ArithmeticOverflow)?;
    mantissa
        .checked_mul(factor)
        .ok_or(VaultexError::ArithmeticOverflow)
}

/// Render base units as a human quantity.
///
/// # Errors
/// - `Configuration` if `decimals` is out of range
/// - `ArithmeticOverflow` if the amount exceeds the 96-bit decimal mantissa
pub fn format_units(amount: Amount, decimals: u32) -> Result<Decimal> {
    check_decimals(decimals)?;
    let signed = i128::try_from(amount).map_err(|_| VaultexError::ArithmeticOverflow)?;
    Decimal::try_from_i128_with_scale(signed, decimals)
        .map(|d| d.normalize())
        .map_err(|_| VaultexError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEI: Amount = 1_000_000_000_000_000_000;

    #[test]
    fn parse_whole_tokens() {
        assert_eq!(parse_units(Decimal::new(100, 0), 18).unwrap(), 100 * WEI);
        assert_eq!(
            parse_units(Decimal::new(1_000_000, 0), 18).unwrap(),
            1_000_000 * WEI
        );
    }

    #[test]
    fn parse_fractional_tokens() {
        // 1.5 tokens
        assert_eq!(parse_units(Decimal::new(15, 1), 18).unwrap(), 15 * WEI / 10);
        // Trailing zeros beyond `decimals` are fine once normalized.
        assert_eq!(parse_units(Decimal::new(1200, 3), 1).unwrap(), 12);
    }

    #[test]
    fn parse_rejects_excess_precision() {
        let err = parse_units(Decimal::new(1, 3), 2).unwrap_err();
        assert!(matches!(err, VaultexError::Serialization(_)));
    }

    #[test]
    fn parse_rejects_negative() {
        assert!(parse_units(Decimal::new(-1, 0), 18).is_err());
        assert_eq!(parse_units(Decimal::ZERO, 18).unwrap(), 0);
    }

    #[test]
    fn decimals_bound_enforced() {
        assert!(matches!(
            parse_units(Decimal::ONE, 29),
            Err(VaultexError::Configuration(_))
        ));
    }

    #[test]
    fn format_roundtrips_display() {
        let human = format_units(999_900 * WEI, 18).unwrap();
        assert_eq!(human.to_string(), "999900");
        let half = format_units(WEI / 2, 18).unwrap();
        assert_eq!(half.to_string(), "0.5");
    }
}
