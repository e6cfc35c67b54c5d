//! Oscar's Grind staking rule
//!
//! Pure next-bet computation. Holds the stake flat after a loss, raises it by
//! one base unit after a win, and never lets a winning bet carry the bankroll
//! past one unit of profit above the peak. Once that level is banked the
//! progression restarts at the base unit.

use crate::session::BetResult;
use rust_decimal::Decimal;

/// The bet that was just settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastBet {
    pub amount: Decimal,
    pub result: BetResult,
}

impl LastBet {
    pub fn new(amount: Decimal, result: BetResult) -> Self {
        Self { amount, result }
    }
}

/// Compute the suggested stake for the next round.
///
/// `highest_bankroll` must already include `current_bankroll` in its
/// watermark. `last` is `None` only before the first round, in which case the
/// base bet is returned. Returns `None` when an intermediate amount falls
/// outside the representable decimal range.
pub fn compute_next_bet(
    current_bankroll: Decimal,
    highest_bankroll: Decimal,
    base_bet: Decimal,
    last: Option<LastBet>,
) -> Option<Decimal> {
    let Some(last) = last else {
        return Some(base_bet);
    };

    match last.result {
        BetResult::Loss => Some(last.amount),
        BetResult::Win => {
            let threshold = highest_bankroll.checked_add(base_bet)?;
            if current_bankroll >= threshold {
                return Some(base_bet);
            }

            let standard_next_bet = last.amount.checked_add(base_bet)?;
            if current_bankroll.checked_add(standard_next_bet)? > threshold {
                // Largest whole number of units that does not overshoot
                let adjusted_bet = threshold.checked_sub(current_bankroll)?;
                let multiplier = adjusted_bet.checked_div(base_bet)?.floor();
                return Some(multiplier.checked_mul(base_bet)?.max(base_bet));
            }

            Some(standard_next_bet)
        }
    }
}
