//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`] in major units.
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Indicates whether this [`Money`] amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Converts this [`Money`] into the smallest denomination of its
    /// [`Currency`] (paise, cents).
    ///
    /// [`None`] is returned if the amount is negative, has more fractional
    /// digits than the [`Currency`] allows, or doesn't fit into [`u64`].
    #[must_use]
    pub fn to_minor_units(&self) -> Option<u64> {
        let scaled = self
            .amount
            .checked_mul(Decimal::from(self.currency.minor_per_major()))?;
        if scaled.is_sign_negative() || !scaled.fract().is_zero() {
            return None;
        }
        scaled.to_u64()
    }

    /// Creates a new [`Money`] out of the provided amount in the smallest
    /// denomination of the [`Currency`].
    #[must_use]
    pub fn from_minor_units(minor: u64, currency: Currency) -> Self {
        Self {
            amount: Decimal::from_i128_with_scale(
                i128::from(minor),
                currency.exponent(),
            )
            .normalize(),
            currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        write!(f, "{}{}", amount.normalize(), currency.code())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 || !s.is_char_boundary(s.len() - 3) {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency = Currency::from_code(currency).ok_or("invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Indian Rupee."]
        Inr = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

impl Currency {
    /// Returns the [ISO 4217] code of this [`Currency`].
    ///
    /// [ISO 4217]: https://www.iso.org/iso-4217-currency-codes.html
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// Parses a [`Currency`] from its [ISO 4217] code.
    ///
    /// [ISO 4217]: https://www.iso.org/iso-4217-currency-codes.html
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// Number of fractional digits of this [`Currency`].
    #[must_use]
    pub const fn exponent(self) -> u32 {
        match self {
            Self::Inr | Self::Usd | Self::Eur => 2,
        }
    }

    /// Number of minor units in a single major unit of this [`Currency`].
    #[must_use]
    pub const fn minor_per_major(self) -> u64 {
        10_u64.pow(self.exponent())
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! Module providing integration with [`serde`] crate.

    use std::str::FromStr as _;

    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::Money;

    impl Serialize for Money {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Money {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let s = String::deserialize(d)?;
            Self::from_str(&s).map_err(|e| {
                de::Error::custom(format!("cannot parse `Money`: {e}"))
            })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn inr(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Inr,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("5000INR").unwrap(), inr("5000"));
        assert_eq!(Money::from_str("123.45inr").unwrap(), inr("123.45"));
        assert_eq!(
            Money::from_str("10.5USD").unwrap(),
            Money {
                amount: decimal("10.5"),
                currency: Currency::Usd,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Rs").is_err());
        assert!(Money::from_str("123.45RUB").is_err());
        assert!(Money::from_str("INR").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(inr("5000").to_string(), "5000INR");
        assert_eq!(inr("5000.00").to_string(), "5000INR");
        assert_eq!(inr("123.40").to_string(), "123.4INR");
    }

    #[test]
    fn converts_to_minor_units() {
        assert_eq!(inr("5000").to_minor_units(), Some(500_000));
        assert_eq!(inr("0.01").to_minor_units(), Some(1));
        assert_eq!(inr("19.99").to_minor_units(), Some(1999));
        assert_eq!(inr("0").to_minor_units(), Some(0));

        assert_eq!(inr("0.001").to_minor_units(), None);
        assert_eq!(inr("-1").to_minor_units(), None);
    }

    #[test]
    fn converts_from_minor_units() {
        assert_eq!(Money::from_minor_units(500_000, Currency::Inr), inr("5000"));
        assert_eq!(Money::from_minor_units(1999, Currency::Inr), inr("19.99"));
        assert_eq!(
            Money::from_minor_units(1999, Currency::Inr).to_minor_units(),
            Some(1999),
        );
    }
}
