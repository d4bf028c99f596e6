//! Module version value type.
//!
//! A version string has the shape `sequence[-pre][+build]`. Each part is a
//! list of tokens, where a token is either a run of digits or a run of other
//! characters. Tokens are separated by `.` (and by `-` inside the pre-release
//! and build parts).

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Token {
    /// Digits with leading zeros stripped (`"0"` for zero)
    Number(String),
    Text(String),
}

impl Token {
    fn is_zero(&self) -> bool {
        matches!(self, Token::Number(digits) if digits == "0")
    }

}

impl Ord for Token {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
            (Token::Text(a), Token::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Token {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed module version with defined equality and ordering
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    sequence: Vec<Token>,
    pre: Vec<Token>,
    build: Vec<Token>,
}

impl Version {
    /// Parse a version string
    pub fn parse(value: &str) -> Result<Self> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err(Error::invalid_version(value, "empty version string"));
        }
        if !raw.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Error::invalid_version(value, "does not start with a number"));
        }

        let (head, build) = match raw.split_once('+') {
            Some((head, build)) => (head, Some(build)),
            None => (raw, None),
        };
        let (sequence, pre) = match head.split_once('-') {
            Some((sequence, pre)) => (sequence, Some(pre)),
            None => (head, None),
        };

        let sequence = tokenize(sequence, &['.']);
        let pre = match pre {
            Some(pre) => {
                let tokens = tokenize(pre, &['.', '-']);
                if tokens.is_empty() {
                    return Err(Error::invalid_version(value, "empty pre-release"));
                }
                tokens
            }
            None => Vec::new(),
        };
        let build = match build {
            Some(build) => {
                let tokens = tokenize(build, &['.', '-', '+']);
                if tokens.is_empty() {
                    return Err(Error::invalid_version(value, "empty build"));
                }
                tokens
            }
            None => Vec::new(),
        };

        Ok(Self {
            raw: raw.to_string(),
            sequence,
            pre,
            build,
        })
    }

    /// The version string as it was given
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this version carries a pre-release part
    pub fn is_pre_release(&self) -> bool {
        !self.pre.is_empty()
    }

    fn normalized(tokens: &[Token]) -> &[Token] {
        let end = tokens
            .iter()
            .rposition(|token| !token.is_zero())
            .map_or(0, |index| index + 1);
        &tokens[..end]
    }
}

fn tokenize(part: &str, separators: &[char]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut digits = false;

    for c in part.chars() {
        if separators.contains(&c) {
            flush(&mut current, digits, &mut tokens);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != digits {
            flush(&mut current, digits, &mut tokens);
        }
        digits = is_digit;
        current.push(c);
    }
    flush(&mut current, digits, &mut tokens);
    tokens
}

fn flush(current: &mut String, digits: bool, tokens: &mut Vec<Token>) {
    if current.is_empty() {
        return;
    }
    let token = if digits {
        let trimmed = current.trim_start_matches('0');
        Token::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string())
    } else {
        Token::Text(current.clone())
    };
    tokens.push(token);
    current.clear();
}

fn compare_tokens(left: &[Token], right: &[Token]) -> Ordering {
    let shared = left.len().min(right.len());
    for (a, b) in left.iter().zip(right.iter()) {
        let ordering = a.cmp(b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    let rest = if left.len() > right.len() { left } else { right };
    if rest[shared..].iter().all(Token::is_zero) {
        return Ordering::Equal;
    }
    left.len().cmp(&right.len())
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let ordering = compare_tokens(&self.sequence, &other.sequence);
        if ordering != Ordering::Equal {
            return ordering;
        }
        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        compare_tokens(&self.pre, &other.pre)
            .then_with(|| compare_tokens(&self.build, &other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Self::normalized(&self.sequence).hash(state);
        Self::normalized(&self.pre).hash(state);
        Self::normalized(&self.build).hash(state);
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("1.2") < v("1.10"));
        assert!(v("2") > v("1.99.99"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        let set: BTreeSet<Version> = [v("1.0"), v("1.0.0")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_pre_release_sorts_before_release() {
        assert!(v("5.6.0-M1") < v("5.6.0"));
        assert!(v("5.6.0-M1") < v("5.6.0-M2"));
        assert!(v("1.0-alpha") < v("1.0-beta"));
        assert!(v("5.6.0-M1").is_pre_release());
    }

    #[test]
    fn test_build_part() {
        assert!(v("1.0+1") < v("1.0+2"));
        assert!(v("1.0") < v("1.0+1"));
        assert_eq!(v("1.0+b7").to_string(), "1.0+b7");
    }

    #[test]
    fn test_mixed_tokens() {
        let version = v("13.0.1a");
        assert!(version > v("13.0.1"));
        assert!(v("1.2.3") < v("1.2.b"));
    }

    #[test]
    fn test_invalid_versions() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("  ").is_err());
        assert!(Version::parse("v1").is_err());
        assert!(Version::parse("1.0-").is_err());
        assert!(Version::parse("1.0+").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let version: Version = "1.2.3".parse().unwrap();
        let as_string: String = version.clone().into();
        assert_eq!(as_string, "1.2.3");
        assert_eq!(Version::try_from(as_string).unwrap(), version);
    }

    proptest! {
        #[test]
        fn prop_ordering_is_consistent_with_numbers(a in 0u32..1000, b in 0u32..1000, c in 0u32..1000) {
            let left = v(&format!("{a}.{b}"));
            let right = v(&format!("{a}.{c}"));
            prop_assert_eq!(left.cmp(&right), b.cmp(&c));
        }

        #[test]
        fn prop_equal_versions_hash_equally(a in 0u32..100, zeros in 0usize..4) {
            use std::collections::hash_map::DefaultHasher;
            let padded = format!("{a}{}", ".0".repeat(zeros));
            let left = v(&a.to_string());
            let right = v(&padded);
            prop_assert_eq!(&left, &right);
            let mut h1 = DefaultHasher::new();
            let mut h2 = DefaultHasher::new();
            left.hash(&mut h1);
            right.hash(&mut h2);
            prop_assert_eq!(h1.finish(), h2.finish());
        }
    }
}
