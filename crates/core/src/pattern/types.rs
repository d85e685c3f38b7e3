//! Types for channel-name patterns.

use std::ops::Range;
use thiserror::Error;

/// Largest number of values a single range token may expand to.
pub const MAX_RANGE_VALUES: u64 = 10_000;

/// The two kinds of bracketed range a template may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// `[0-20]`, rendered back as decimal numbers.
    Integer { lo: u64, hi: u64 },
    /// `[A-C]`, rendered back as single characters.
    Character { lo: char, hi: char },
}

impl RangeKind {
    /// Classify the two bounds of a range token.
    ///
    /// Both bounds must be non-negative integers, or both must be single
    /// uppercase letters. Inverted bounds are rejected, as are ranges with
    /// more than [`MAX_RANGE_VALUES`] values.
    pub fn classify(lo: &str, hi: &str) -> Result<Self, PatternError> {
        let malformed = |reason: &str| PatternError::MalformedRange {
            token: format!("[{}-{}]", lo, hi),
            reason: reason.to_string(),
        };

        let kind = match (lo.parse::<u64>(), hi.parse::<u64>()) {
            (Ok(lo), Ok(hi)) => RangeKind::Integer { lo, hi },
            (Err(_), Err(_)) => match (single_letter(lo), single_letter(hi)) {
                (Some(lo), Some(hi)) => RangeKind::Character { lo, hi },
                _ => return Err(malformed("bounds must be single uppercase letters or integers")),
            },
            _ => return Err(malformed("bounds mix integers and letters")),
        };

        if kind.is_inverted() {
            return Err(malformed("lower bound exceeds upper bound"));
        }
        if kind.width() >= MAX_RANGE_VALUES {
            return Err(malformed(&format!(
                "range expands to more than {} values",
                MAX_RANGE_VALUES
            )));
        }

        Ok(kind)
    }

    fn is_inverted(&self) -> bool {
        match *self {
            RangeKind::Integer { lo, hi } => lo > hi,
            RangeKind::Character { lo, hi } => lo > hi,
        }
    }

    // Distance between the bounds; only meaningful once not inverted.
    fn width(&self) -> u64 {
        match *self {
            RangeKind::Integer { lo, hi } => hi.saturating_sub(lo),
            RangeKind::Character { lo, hi } => u64::from(hi).saturating_sub(u64::from(lo)),
        }
    }

    /// Every value in the range, inclusive, in ascending order.
    pub fn values(&self) -> Box<dyn Iterator<Item = String>> {
        match *self {
            RangeKind::Integer { lo, hi } => Box::new((lo..=hi).map(|n| n.to_string())),
            RangeKind::Character { lo, hi } => Box::new((lo..=hi).map(String::from)),
        }
    }
}

fn single_letter(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => Some(c),
        _ => None,
    }
}

/// A range token located inside a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeToken {
    /// Byte span of the token, brackets included.
    pub span: Range<usize>,
    pub kind: RangeKind,
}

/// Errors that can occur while expanding a template.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("Malformed range {token}: {reason}")]
    MalformedRange { token: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_integer() {
        assert_eq!(
            RangeKind::classify("0", "20").unwrap(),
            RangeKind::Integer { lo: 0, hi: 20 }
        );
    }

    #[test]
    fn test_classify_character() {
        assert_eq!(
            RangeKind::classify("A", "C").unwrap(),
            RangeKind::Character { lo: 'A', hi: 'C' }
        );
    }

    #[test]
    fn test_classify_single_value() {
        let kind = RangeKind::classify("5", "5").unwrap();
        assert_eq!(kind.values().collect::<Vec<_>>(), vec!["5"]);
    }

    #[test]
    fn test_classify_mixed_fails() {
        let err = RangeKind::classify("A", "5").unwrap_err();
        assert!(err.to_string().contains("mix"));
    }

    #[test]
    fn test_classify_inverted_fails() {
        assert!(RangeKind::classify("20", "0").is_err());
        assert!(RangeKind::classify("C", "A").is_err());
    }

    #[test]
    fn test_classify_multi_letter_fails() {
        assert!(RangeKind::classify("AB", "C").is_err());
        assert!(RangeKind::classify("a", "c").is_err());
    }

    #[test]
    fn test_character_values() {
        let kind = RangeKind::Character { lo: 'X', hi: 'Z' };
        assert_eq!(kind.values().collect::<Vec<_>>(), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_classify_oversized_range_fails() {
        let err = RangeKind::classify("0", "18446744073709551615").unwrap_err();
        assert!(matches!(err, PatternError::MalformedRange { .. }));
        assert!(err.to_string().contains("more than 10000 values"));

        assert!(RangeKind::classify("0", "99999999999").is_err());
    }

    #[test]
    fn test_classify_range_at_cap() {
        let last = (MAX_RANGE_VALUES - 1).to_string();
        let kind = RangeKind::classify("0", &last).unwrap();
        assert_eq!(kind.values().count() as u64, MAX_RANGE_VALUES);

        assert!(RangeKind::classify("0", &MAX_RANGE_VALUES.to_string()).is_err());
    }

    #[test]
    fn test_values_is_lazy() {
        let kind = RangeKind::Integer { lo: u64::MAX - 2, hi: u64::MAX };
        let values: Vec<_> = kind.values().take(2).collect();
        assert_eq!(values, vec![(u64::MAX - 2).to_string(), (u64::MAX - 1).to_string()]);
    }
}
