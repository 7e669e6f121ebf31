//! Mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input contains characters other than digits and separators.
    #[error("phone number may only contain digits")]
    NonDigit,
    /// The number does not start with the domestic mobile prefix.
    #[error("phone number must start with 09")]
    InvalidPrefix,
    /// The number has the wrong number of digits.
    #[error("phone number must be {expected} digits")]
    WrongLength {
        /// Required digit count after normalization.
        expected: usize,
    },
}

/// A domestic mobile phone number in normalized `09XXXXXXXXX` form.
///
/// This is the number orders and payment-gateway token requests are keyed
/// on, so it is parsed once at the shipping form and passed around as an
/// already-valid value.
///
/// ## Constraints
///
/// - Spaces and dashes are stripped before validation
/// - A leading `+98` or `0098` country code is normalized to `0`
/// - The normalized number must be exactly 11 digits starting with `09`
///
/// ## Examples
///
/// ```
/// use bazaar_core::Phone;
///
/// assert!(Phone::parse("09123456789").is_ok());
/// assert!(Phone::parse("+98 912 345 6789").is_ok());
///
/// assert!(Phone::parse("").is_err());            // empty
/// assert!(Phone::parse("0912345").is_err());     // too short
/// assert!(Phone::parse("02123456789").is_err()); // landline prefix
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Digit count of a normalized mobile number.
    pub const DIGITS: usize = 11;

    /// Parse a `Phone` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input:
    /// - Is empty
    /// - Contains non-digit characters (after stripping separators)
    /// - Does not normalize to 11 digits starting with `09`
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let stripped: String = s.chars().filter(|c| !matches!(c, ' ' | '-')).collect();

        if stripped.is_empty() {
            return Err(PhoneError::Empty);
        }

        let normalized = if let Some(rest) = stripped.strip_prefix("+98") {
            format!("0{rest}")
        } else if let Some(rest) = stripped.strip_prefix("0098") {
            format!("0{rest}")
        } else {
            stripped
        };

        if !normalized.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if !normalized.starts_with("09") {
            return Err(PhoneError::InvalidPrefix);
        }

        if normalized.len() != Self::DIGITS {
            return Err(PhoneError::WrongLength {
                expected: Self::DIGITS,
            });
        }

        Ok(Self(normalized))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
