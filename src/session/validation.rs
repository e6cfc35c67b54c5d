//! Parse-and-validate boundary
//!
//! Raw strings from forms, query strings or JSON bodies are turned into typed,
//! already valid inputs here. Nothing downstream sees an unchecked number.

use super::types::BetResult;
use crate::errors::SessionError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;

/// Tolerance when checking that a bet is a whole number of base units
pub const MULTIPLE_TOLERANCE: Decimal = dec!(0.0001);

/// Parse a strictly positive decimal amount.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, SessionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SessionError::invalid_input(field, "a value is required"));
    }

    let value = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| SessionError::invalid_input(field, format!("'{}' is not a number", trimmed)))?;

    require_positive(field, value)
}

/// Parse a bet outcome, accepting `win` or `loss` in any case.
pub fn parse_result(raw: &str) -> Result<BetResult, SessionError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "win" => Ok(BetResult::Win),
        "loss" => Ok(BetResult::Loss),
        other => Err(SessionError::invalid_input(
            "result",
            format!("expected 'win' or 'loss', got '{}'", other),
        )),
    }
}

pub fn require_positive(field: &str, value: Decimal) -> Result<Decimal, SessionError> {
    if value <= Decimal::ZERO {
        return Err(SessionError::invalid_input(field, "must be a positive number"));
    }
    Ok(value)
}

/// Number of whole base units in `amount`, when `amount` is at least one unit
/// and within [`MULTIPLE_TOLERANCE`] of an integer multiple.
pub fn whole_units(amount: Decimal, base_bet: Decimal) -> Option<Decimal> {
    let quotient = amount.checked_div(base_bet)?;
    let units = quotient.round();
    (units >= Decimal::ONE && (units - quotient).abs() < MULTIPLE_TOLERANCE).then_some(units)
}

pub fn is_whole_multiple(amount: Decimal, base_bet: Decimal) -> bool {
    whole_units(amount, base_bet).is_some()
}

/// Validated session setup values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupInput {
    pub starting_bankroll: Decimal,
    pub base_bet: Decimal,
    pub profit_target: Decimal,
}

impl SetupInput {
    pub fn new(
        starting_bankroll: Decimal,
        base_bet: Decimal,
        profit_target: Decimal,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            starting_bankroll: require_positive("bankroll", starting_bankroll)?,
            base_bet: require_positive("base_bet", base_bet)?,
            profit_target: require_positive("profit_target", profit_target)?,
        })
    }

    pub fn parse(bankroll: &str, base_bet: &str, profit_target: &str) -> Result<Self, SessionError> {
        Ok(Self {
            starting_bankroll: parse_amount("bankroll", bankroll)?,
            base_bet: parse_amount("base_bet", base_bet)?,
            profit_target: parse_amount("profit_target", profit_target)?,
        })
    }
}

/// Validated bet submission. Multiple and bankroll checks need the session
/// and happen when the bet is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetInput {
    pub amount: Decimal,
    pub result: BetResult,
}

impl BetInput {
    pub fn new(amount: Decimal, result: BetResult) -> Result<Self, SessionError> {
        Ok(Self {
            amount: require_positive("bet_amount", amount)?,
            result,
        })
    }

    pub fn parse(bet_amount: &str, result: &str) -> Result<Self, SessionError> {
        Ok(Self {
            amount: parse_amount("bet_amount", bet_amount)?,
            result: parse_result(result)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("bankroll", "1000").unwrap(), dec!(1000));
        assert_eq!(parse_amount("bankroll", " 12.50 ").unwrap(), dec!(12.5));
        assert_eq!(parse_amount("bankroll", "1e3").unwrap(), dec!(1000));
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        for raw in ["", "   ", "abc", "NaN", "inf", "0", "-5", "0.000"] {
            let err = parse_amount("bankroll", raw).unwrap_err();
            assert!(
                matches!(err, SessionError::InvalidInput { ref field, .. } if field == "bankroll"),
                "expected invalid input for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_result() {
        assert_eq!(parse_result("win").unwrap(), BetResult::Win);
        assert_eq!(parse_result("LOSS").unwrap(), BetResult::Loss);
        assert!(parse_result("push").is_err());
        assert!(parse_result("").is_err());
    }

    #[test]
    fn test_whole_multiple() {
        assert!(is_whole_multiple(dec!(10), dec!(10)));
        assert!(is_whole_multiple(dec!(30), dec!(10)));
        assert!(is_whole_multiple(dec!(0.75), dec!(0.25)));
        assert!(!is_whole_multiple(dec!(15), dec!(10)));
        assert!(!is_whole_multiple(dec!(5), dec!(10)));
        // within tolerance of 3 units
        assert!(is_whole_multiple(dec!(30.0000001), dec!(10)));
        // close to zero units is never a valid bet
        assert!(!is_whole_multiple(dec!(0.0000001), dec!(10)));
    }

    #[test]
    fn test_whole_units_rounds_to_nearest_unit() {
        assert_eq!(whole_units(dec!(30.00001), dec!(10)), Some(dec!(3)));
        assert_eq!(whole_units(dec!(29.99999), dec!(10)), Some(dec!(3)));
        assert_eq!(whole_units(dec!(0.75), dec!(0.25)), Some(dec!(3)));
        assert_eq!(whole_units(dec!(15), dec!(10)), None);
        // quotient out of range
        assert_eq!(whole_units(Decimal::MAX, dec!(0.0000000001)), None);
    }

    #[test]
    fn test_setup_input() {
        let setup = SetupInput::parse("1000", "10", "100").unwrap();
        assert_eq!(setup.starting_bankroll, dec!(1000));
        assert_eq!(setup.base_bet, dec!(10));
        assert_eq!(setup.profit_target, dec!(100));

        let err = SetupInput::new(dec!(1000), dec!(0), dec!(100)).unwrap_err();
        assert!(matches!(err, SessionError::InvalidInput { ref field, .. } if field == "base_bet"));
    }

    #[test]
    fn test_bet_input() {
        let bet = BetInput::parse("20", "win").unwrap();
        assert_eq!(bet.amount, dec!(20));
        assert_eq!(bet.result, BetResult::Win);
        assert!(BetInput::parse("20", "draw").is_err());
        assert!(BetInput::new(dec!(-1), BetResult::Loss).is_err());
    }
}
