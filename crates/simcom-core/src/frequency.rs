//! COM frequencies and the channel-name frequency tag
//!
//! Frequencies are held as integer hundredths of a MHz so that a tuned
//! frequency and a channel tag compare exactly: `118.300` is `11830`.
//!
//! # Tag grammar
//!
//! A channel name carries a frequency tag when the text after the **last**
//! `" - "` delimiter, trimmed, matches:
//!
//! ```text
//! tag      = mhz "." decimals
//! mhz      = 1*3DIGIT
//! decimals = 2*3DIGIT
//! ```
//!
//! The value is `mhz * 100` plus the first two decimals. A third decimal is
//! truncated: simulators report COM frequencies to two decimals, so a pilot
//! tuned to 119.125 reads as 119.12 and must land in `"App - 119.125"`.
//!
//! Names without the delimiter, or whose suffix does not match exactly
//! (one decimal, four decimals, signs, letters, trailing text), are untagged
//! grouping channels. That is never an error.
//!
//! ```rust
//! use simcom_core::frequency::parse_tag;
//!
//! assert_eq!(parse_tag("Tower - 118.300").map(|f| f.hundredths()), Some(11830));
//! assert_eq!(parse_tag("App - 119.125").map(|f| f.hundredths()), Some(11912));
//! assert_eq!(parse_tag("Lobby"), None);
//! assert_eq!(parse_tag("Tower - 118.3"), None);
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::FrequencyError;

/// Separator between a channel's label and its frequency suffix
pub const TAG_DELIMITER: &str = " - ";

/// A COM frequency in hundredths of a MHz
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Frequency(u32);

impl Frequency {
    /// Create from hundredths of a MHz (`11830` is 118.30)
    pub const fn from_hundredths(hundredths: u32) -> Self {
        Self(hundredths)
    }

    /// Get the raw value in hundredths of a MHz
    pub const fn hundredths(self) -> u32 {
        self.0
    }

    /// Absolute distance to another frequency, in hundredths
    pub fn abs_diff(self, other: Frequency) -> u32 {
        self.0.abs_diff(other.0)
    }

    /// Value in MHz, for display only
    pub fn as_mhz(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_numeric(s.trim())
    }
}

/// Extract the frequency tag from a channel name
///
/// Returns `None` for grouping channels and for any suffix that does not
/// follow the grammar in the module docs.
pub fn parse_tag(name: &str) -> Option<Frequency> {
    let (_, suffix) = name.rsplit_once(TAG_DELIMITER)?;
    parse_numeric(suffix.trim()).ok()
}

fn parse_numeric(text: &str) -> Result<Frequency, FrequencyError> {
    let (mhz, decimals) = text
        .split_once('.')
        .ok_or_else(|| FrequencyError::MissingDecimalPoint(text.to_string()))?;

    if mhz.is_empty() || mhz.len() > 3 || !all_digits(mhz) {
        return Err(FrequencyError::InvalidMegahertz(text.to_string()));
    }
    if !(2..=3).contains(&decimals.len()) || !all_digits(decimals) {
        return Err(FrequencyError::InvalidDecimals(text.to_string()));
    }

    let whole: u32 = mhz
        .parse()
        .map_err(|_| FrequencyError::InvalidMegahertz(text.to_string()))?;
    let hundredths: u32 = decimals[..2]
        .parse()
        .map_err(|_| FrequencyError::InvalidDecimals(text.to_string()))?;

    Ok(Frequency(whole * 100 + hundredths))
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_decimal_tag() {
        assert_eq!(parse_tag("Tower - 118.300"), Some(Frequency(11830)));
        assert_eq!(parse_tag("Ground - 121.900"), Some(Frequency(12190)));
    }

    #[test]
    fn test_third_decimal_truncated() {
        assert_eq!(parse_tag("F1 Dep - 119.125"), Some(Frequency(11912)));
        assert_eq!(parse_tag("Dep - 118.275"), Some(Frequency(11827)));
    }

    #[test]
    fn test_two_decimal_tag() {
        assert_eq!(parse_tag("Unicom - 122.80"), Some(Frequency(12280)));
    }

    #[test]
    fn test_last_delimiter_wins() {
        assert_eq!(
            parse_tag("Fly-in - Arrival - 124.350"),
            Some(Frequency(12435))
        );
        assert_eq!(parse_tag("Tower - 118.300 - spare"), None);
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        assert_eq!(parse_tag("Tower -   118.300  "), Some(Frequency(11830)));
    }

    #[test]
    fn test_untagged_names() {
        assert_eq!(parse_tag("Lobby"), None);
        assert_eq!(parse_tag("Fly-in 1"), None);
        assert_eq!(parse_tag("Tower 118.300"), None);
        assert_eq!(parse_tag("Tower-118.300"), None);
    }

    #[test]
    fn test_malformed_suffixes_are_untagged() {
        for name in [
            "Tower - 118.3",
            "Tower - 118.3000",
            "Tower - 1180.300",
            "Tower - .300",
            "Tower - 118.",
            "Tower - +18.300",
            "Tower - 118,300",
            "Tower - 118.30a",
            "Tower - 1e2.300",
            "Tower - ",
        ] {
            assert_eq!(parse_tag(name), None, "{name:?} should be untagged");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(Frequency(11830).to_string(), "118.30");
        assert_eq!(Frequency(12105).to_string(), "121.05");
        assert_eq!(Frequency(0).to_string(), "0.00");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("118.300".parse::<Frequency>(), Ok(Frequency(11830)));
        assert_eq!(" 121.90 ".parse::<Frequency>(), Ok(Frequency(12190)));
        assert_eq!(
            "118".parse::<Frequency>(),
            Err(FrequencyError::MissingDecimalPoint("118".to_string()))
        );
        assert_eq!(
            "118.3".parse::<Frequency>(),
            Err(FrequencyError::InvalidDecimals("118.3".to_string()))
        );
        assert_eq!(
            "x18.30".parse::<Frequency>(),
            Err(FrequencyError::InvalidMegahertz("x18.30".to_string()))
        );
    }

    #[test]
    fn test_abs_diff() {
        assert_eq!(Frequency(11830).abs_diff(Frequency(11835)), 5);
        assert_eq!(Frequency(11835).abs_diff(Frequency(11830)), 5);
    }
}
