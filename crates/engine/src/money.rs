//! Money as integer cents.
//!
//! Bill balances, user aggregates, transaction amounts and the amount limit
//! are all [`MoneyCents`]. Balances may go negative (reversing an income can
//! overdraw a bill); transaction amounts never do, the ledger rejects them.

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A signed amount of cents.
///
/// Serialized as the bare integer, so a bill holding `1 250.50` is
/// `"balance": 125050` in JSON.
///
/// ```rust
/// use engine::MoneyCents;
///
/// let opening: MoneyCents = "1250,50".parse().unwrap();
/// let rent = MoneyCents::new(800_00);
/// assert_eq!((opening - rent).to_string(), "450.50");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}.{:02}", abs / 100, abs % 100)
    }
}

impl From<i64> for MoneyCents {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl From<MoneyCents> for i64 {
    fn from(money: MoneyCents) -> Self {
        money.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> MoneyCents {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        *self = *self + rhs;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> MoneyCents {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        *self = *self - rhs;
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> MoneyCents {
        Self(-self.0)
    }
}

impl Sum for MoneyCents {
    fn sum<I: Iterator<Item = MoneyCents>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

fn bad_amount(input: &str, reason: &str) -> EngineError {
    EngineError::InvalidInput(format!("amount `{input}`: {reason}"))
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Reads amounts as typed by a user: `1250`, `1250.5`, `1250,50`, with an
    /// optional sign. At most two decimals.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, text[1..].trim_start()),
            Some(b'+') => (false, text[1..].trim_start()),
            _ => (false, text),
        };
        if digits.is_empty() {
            return Err(bad_amount(input, "empty"));
        }

        let (whole, fraction) = match digits.split_once(['.', ',']) {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(bad_amount(input, "not a number"));
        }
        if fraction.len() > 2 {
            return Err(bad_amount(input, "more than two decimals"));
        }

        let too_large = || bad_amount(input, "too large");
        let whole: i64 = whole.parse().map_err(|_| too_large())?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| too_large())? * 10,
            _ => fraction.parse().map_err(|_| too_large())?,
        };
        let cents = whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .ok_or_else(too_large)?;
        Ok(Self(if negative { -cents } else { cents }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> MoneyCents {
        input.parse().unwrap()
    }

    #[test]
    fn balances_print_with_two_decimals() {
        assert_eq!(MoneyCents::ZERO.to_string(), "0.00");
        assert_eq!(MoneyCents::new(7).to_string(), "0.07");
        assert_eq!(MoneyCents::new(125_050).to_string(), "1250.50");
        // An overdrawn bill after an income was reversed.
        assert_eq!(MoneyCents::new(-4_990).to_string(), "-49.90");
    }

    #[test]
    fn typed_amounts_are_read_as_cents() {
        assert_eq!(parse("1250"), MoneyCents::new(125_000));
        assert_eq!(parse("1250.5"), MoneyCents::new(125_050));
        assert_eq!(parse("1250,50"), MoneyCents::new(125_050));
        assert_eq!(parse(" 12,05 "), MoneyCents::new(1_205));
        assert_eq!(parse("+3"), MoneyCents::new(300));
        assert_eq!(parse("-0.99"), MoneyCents::new(-99));
        assert_eq!(parse("7."), MoneyCents::new(700));
    }

    #[test]
    fn malformed_amounts_are_invalid_input() {
        for input in ["", " ", "-", "9.999", "1.2.3", "1,2,3", ".50", "ten", "1e3", "99999999999999999999"] {
            assert!(
                matches!(input.parse::<MoneyCents>(), Err(EngineError::InvalidInput(_))),
                "{input:?}"
            );
        }
    }

    #[test]
    fn overflowing_balances_are_detected() {
        let full = MoneyCents::new(i64::MAX);
        assert_eq!(full.checked_add(MoneyCents::new(1)), None);
        assert_eq!(
            MoneyCents::new(100).checked_sub(MoneyCents::new(250)),
            Some(MoneyCents::new(-150))
        );
    }

    #[test]
    fn bill_balances_sum_to_the_user_aggregate() {
        let bills = [MoneyCents::new(1_000), MoneyCents::new(250), MoneyCents::new(-50)];
        assert_eq!(bills.into_iter().sum::<MoneyCents>(), MoneyCents::new(1_200));
    }
}
