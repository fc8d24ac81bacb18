//! Currency codes attached to integer minor-unit amounts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raised when a currency code is not three upper-case ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("currency must be a three-letter ISO 4217 code, got {value:?}")]
pub struct InvalidCurrency {
    pub value: String,
}

/// ISO 4217 currency code.
///
/// Input is trimmed and upper-cased, so `"usd"` is accepted.
///
/// # Examples
/// ```
/// use academy_backend::domain::Currency;
///
/// assert_eq!(Currency::new("eur").expect("valid").as_str(), "EUR");
/// assert_eq!(Currency::default().as_str(), "USD");
/// assert!(Currency::new("EURO").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Validate a currency code.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidCurrency> {
        let code = raw.as_ref().trim().to_ascii_uppercase();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(InvalidCurrency {
                value: raw.as_ref().to_owned(),
            })
        }
    }

    /// Borrow the code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("USD".to_owned())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Currency {
    type Error = InvalidCurrency;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

/// Integer percentage of `part` over `whole`, rounded half-up; 0 when
/// `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    let scaled = (200 * u128::from(part) + u128::from(whole)) / (2 * u128::from(whole));
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("usd", Some("USD"))]
    #[case(" GBP ", Some("GBP"))]
    #[case("US", None)]
    #[case("U5D", None)]
    fn currency_codes(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(Currency::new(raw).ok().as_ref().map(Currency::as_str), expected);
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(1, 2, 50)]
    #[case(1, 3, 33)]
    #[case(2, 3, 67)]
    #[case(1, 8, 13)]
    #[case(5, 5, 100)]
    fn percentages_round_half_up(#[case] part: u64, #[case] whole: u64, #[case] expected: u32) {
        assert_eq!(percentage(part, whole), expected);
    }
}
