use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Signed euro amount represented as **integer cents**.
///
/// Every price, total and VAT amount stored by the ledger is a plain `i64` of
/// minor units; this wrapper is what the outer surfaces use to parse operator
/// input and to print amounts the way the shop shows them on receipts.
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!(Money::new(7_50).to_string(), "7,50 €");
/// assert_eq!("2,5".parse::<Money>().unwrap().cents(), 250);
/// assert!("1.234".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Rounds up to the next whole euro (`12,01 €` becomes `13,00 €`).
    #[must_use]
    pub fn ceil_to_euro(self) -> Money {
        let rem = self.0.rem_euclid(100);
        if rem == 0 {
            self
        } else {
            Money(self.0 - rem + 100)
        }
    }

    #[must_use]
    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{},{:02} €", abs / 100, abs % 100)
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses `12`, `12.5`, `12,50` or `-0,01` (optionally followed by `€`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EngineError::validation("amount", reason);

        let trimmed = s.trim().trim_end_matches('€').trim_end();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if digits.is_empty() {
            return Err(invalid("empty amount"));
        }

        let (whole, frac) = match digits.split_once([',', '.']) {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(invalid("not a decimal number"));
        }

        let euros: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
        let cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid("not a decimal number"))? * 10,
            2 => frac.parse().map_err(|_| invalid("not a decimal number"))?,
            _ => return Err(invalid("too many decimals")),
        };

        let total = euros
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -total } else { total }))
    }
}
