use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Money is represented as integer cents to avoid floating-point precision issues.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a human-readable decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
///
/// More than two fractional digits is an error rather than a truncation.
pub fn parse_cents(input: &str) -> Result<Cents, AmountError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, fraction_str) = digits.split_once('.').unwrap_or((digits, ""));
    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(AmountError::InvalidFormat);
    }
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(units_str) || !all_digits(fraction_str) {
        return Err(AmountError::InvalidFormat);
    }
    if fraction_str.len() > 2 {
        return Err(AmountError::TooPrecise);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| AmountError::Overflow)?
    };
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        // "5" after the point means 50 cents
        1 => fraction_str.parse::<i64>().map_err(|_| AmountError::InvalidFormat)? * 10,
        _ => fraction_str.parse().map_err(|_| AmountError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or(AmountError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

/// Largest single amount accepted: 999,999,999.99.
/// Roughly 92 million expenses at this size still sum inside an `i64`.
pub const MAX_AMOUNT_CENTS: Cents = 99_999_999_999;

/// A non-negative amount of money in cents.
///
/// Construction goes through [`Amount::from_cents`] or [`str::parse`], both of
/// which enforce `0 <= cents <= MAX_AMOUNT_CENTS` for every `Amount` in the system.
/// Serialized as the same decimal text it is parsed from ("15.00"). Totals built
/// with [`Amount::checked_add`] may exceed the cap, so deserializing only
/// rejects negative values.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Cents);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn from_cents(cents: Cents) -> Result<Self, AmountError> {
        if cents < 0 {
            return Err(AmountError::Negative);
        }
        if cents > MAX_AMOUNT_CENTS {
            return Err(AmountError::Overflow);
        }
        Ok(Self(cents))
    }

    pub fn cents(self) -> Cents {
        self.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cents(parse_cents(s)?)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        match parse_cents(&text)? {
            cents if cents < 0 => Err(AmountError::Negative),
            cents => Ok(Self(cents)),
        }
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_cents(self.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    InvalidFormat,
    TooPrecise,
    Negative,
    Overflow,
}

impl fmt::Display for AmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::InvalidFormat => write!(f, "invalid money format"),
            AmountError::TooPrecise => write!(f, "at most two decimal places are allowed"),
            AmountError::Negative => write!(f, "amount must not be negative"),
            AmountError::Overflow => write!(f, "amount is too large"),
        }
    }
}

impl std::error::Error for AmountError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(i64::MIN), "-92233720368547758.08");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("7."), Ok(700));
        assert_eq!(parse_cents(" 3.07 "), Ok(307));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert_eq!(parse_cents("abc"), Err(AmountError::InvalidFormat));
        assert_eq!(parse_cents(""), Err(AmountError::InvalidFormat));
        assert_eq!(parse_cents("."), Err(AmountError::InvalidFormat));
        assert_eq!(parse_cents("12.34.56"), Err(AmountError::InvalidFormat));
        assert_eq!(parse_cents("+5"), Err(AmountError::InvalidFormat));
        assert_eq!(parse_cents("1e3"), Err(AmountError::InvalidFormat));
        assert_eq!(parse_cents("100.999"), Err(AmountError::TooPrecise));
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn test_amount_rejects_negative() {
        assert_eq!("-0.01".parse::<Amount>(), Err(AmountError::Negative));
        assert_eq!(Amount::from_cents(-1), Err(AmountError::Negative));
        assert_eq!("0".parse::<Amount>(), Ok(Amount::ZERO));
    }

    #[test]
    fn test_amount_upper_bound() {
        assert_eq!(
            "999999999.99".parse::<Amount>().map(Amount::cents),
            Ok(MAX_AMOUNT_CENTS)
        );
        assert_eq!("1000000000".parse::<Amount>(), Err(AmountError::Overflow));
        assert_eq!(
            "92233720368547758.07".parse::<Amount>(),
            Err(AmountError::Overflow)
        );
        assert_eq!(
            Amount::from_cents(MAX_AMOUNT_CENTS + 1),
            Err(AmountError::Overflow)
        );
    }

    #[test]
    fn test_amount_serializes_as_decimal_text() {
        let amount: Amount = "10.25".parse().unwrap();
        assert_eq!(serde_json::to_string(&amount).unwrap(), r#""10.25""#);
        assert_eq!(serde_json::from_str::<Amount>(r#""10.25""#).unwrap(), amount);
        assert!(serde_json::from_str::<Amount>(r#""-5""#).is_err());
        assert!(serde_json::from_str::<Amount>("1025").is_err());

        let total = Amount::from_cents(MAX_AMOUNT_CENTS)
            .unwrap()
            .checked_add(Amount::from_cents(MAX_AMOUNT_CENTS).unwrap())
            .unwrap();
        let json = serde_json::to_string(&total).unwrap();
        assert_eq!(serde_json::from_str::<Amount>(&json).unwrap(), total);
    }
}
