//! German VAT rates and the gross-to-VAT split used on every revenue row.
//!
//! Prices are always gross. The VAT share of a gross amount `g` at rate `r`
//! is `g * r / (100 + r)`, rounded half away from zero to whole cents. The
//! rounding is symmetric so a storno carries exactly the negated VAT of the
//! sale it reverses.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VatRate {
    /// 7 %, cut flowers and plants.
    Reduced,
    /// 19 %, everything else.
    #[default]
    Standard,
}

impl VatRate {
    pub const ALL: [VatRate; 2] = [VatRate::Reduced, VatRate::Standard];

    pub const fn percent(self) -> u8 {
        match self {
            Self::Reduced => 7,
            Self::Standard => 19,
        }
    }

    /// VAT contained in `gross_minor`, in cents.
    pub fn vat_of(self, gross_minor: i64) -> i64 {
        let rate = i128::from(self.percent());
        let numerator = i128::from(gross_minor) * rate;
        let denominator = 100 + rate;

        let quotient = numerator / denominator;
        let remainder = numerator % denominator;
        let rounded = if 2 * remainder.abs() >= denominator {
            quotient + numerator.signum()
        } else {
            quotient
        };

        // |rounded| <= |gross_minor|, so the narrowing cannot fail.
        i64::try_from(rounded).unwrap_or(gross_minor)
    }

    pub(crate) fn from_stored(value: i32) -> Result<Self, EngineError> {
        u8::try_from(value)
            .map_err(|_| EngineError::validation("vat_rate", format!("unsupported rate {value}")))
            .and_then(Self::try_from)
    }

    pub(crate) fn stored(self) -> i32 {
        i32::from(self.percent())
    }
}

impl TryFrom<u8> for VatRate {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            7 => Ok(Self::Reduced),
            19 => Ok(Self::Standard),
            other => Err(EngineError::validation(
                "vat_rate",
                format!("unsupported rate {other}, expected 7 or 19"),
            )),
        }
    }
}

impl From<VatRate> for u8 {
    fn from(value: VatRate) -> Self {
        value.percent()
    }
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Gross amount split into its net and VAT parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatSplit {
    pub gross_minor: i64,
    pub net_minor: i64,
    pub vat_minor: i64,
}

impl VatSplit {
    pub fn of(gross_minor: i64, rate: VatRate) -> Self {
        let vat_minor = rate.vat_of(gross_minor);
        Self {
            gross_minor,
            net_minor: gross_minor - vat_minor,
            vat_minor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rate_rounds_to_cents() {
        // 7,50 € at 19 %: 1,197... € of VAT.
        assert_eq!(VatRate::Standard.vat_of(750), 120);
        assert_eq!(VatSplit::of(750, VatRate::Standard).net_minor, 630);
    }

    #[test]
    fn reduced_rate() {
        assert_eq!(VatRate::Reduced.vat_of(107), 7);
        assert_eq!(VatRate::Reduced.vat_of(1000), 65);
    }

    #[test]
    fn negation_is_symmetric() {
        for gross in [1, 99, 750, 1234, 99_999] {
            for rate in VatRate::ALL {
                assert_eq!(rate.vat_of(-gross), -rate.vat_of(gross));
            }
        }
    }

    #[test]
    fn zero_has_no_vat() {
        assert_eq!(VatRate::Standard.vat_of(0), 0);
    }

    #[test]
    fn rates_round_trip_through_storage() {
        for rate in VatRate::ALL {
            assert_eq!(VatRate::from_stored(rate.stored()).unwrap(), rate);
        }
        assert!(VatRate::from_stored(16).is_err());
        assert!(VatRate::from_stored(-7).is_err());
    }
}
