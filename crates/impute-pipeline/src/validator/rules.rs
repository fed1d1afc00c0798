//! Per-column domain rules.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `<column> <= <number>` / `<column> >= <number>` / `<column> = <lo>..<hi>`
static RULE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_.]*)\s*(<=|>=|=)\s*(\S+?)\s*$")
        .expect("Invalid regex: domain rule")
});

static RANGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^.]+(?:\.\d+)?)\.\.(.+)$").expect("Invalid regex: range"));

/// The set of valid values for a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Bound {
    /// Valid when `value <= max`.
    AtMost(f64),
    /// Valid when `value >= min`.
    AtLeast(f64),
    /// Valid when `min <= value <= max`.
    Between(f64, f64),
}

impl Bound {
    /// Whether a value satisfies the bound.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        match *self {
            Bound::AtMost(max) => value <= max,
            Bound::AtLeast(min) => value >= min,
            Bound::Between(min, max) => value >= min && value <= max,
        }
    }

    /// Reject bounds that can never be satisfied or are not finite.
    pub fn check(&self) -> Result<(), String> {
        let finite = match *self {
            Bound::AtMost(v) | Bound::AtLeast(v) => v.is_finite(),
            Bound::Between(lo, hi) => lo.is_finite() && hi.is_finite(),
        };
        if !finite {
            return Err("bounds must be finite numbers".to_string());
        }
        if let Bound::Between(lo, hi) = *self
            && lo > hi
        {
            return Err(format!("empty range {}..{}", lo, hi));
        }
        Ok(())
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::AtMost(max) => write!(f, "<= {}", max),
            Bound::AtLeast(min) => write!(f, ">= {}", min),
            Bound::Between(min, max) => write!(f, "in {}..{}", min, max),
        }
    }
}

/// A validity predicate attached to one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRule {
    pub column: String,
    pub bound: Bound,
}

impl DomainRule {
    pub fn new(column: impl Into<String>, bound: Bound) -> Self {
        Self {
            column: column.into(),
            bound,
        }
    }

    /// `column <= max`
    pub fn at_most(column: impl Into<String>, max: f64) -> Self {
        Self::new(column, Bound::AtMost(max))
    }

    /// `column >= min`
    pub fn at_least(column: impl Into<String>, min: f64) -> Self {
        Self::new(column, Bound::AtLeast(min))
    }

    /// `min <= column <= max`
    pub fn between(column: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(column, Bound::Between(min, max))
    }
}

impl fmt::Display for DomainRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.bound)
    }
}

/// Error returned when a rule expression cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse domain rule '{input}': {reason}")]
pub struct RuleParseError {
    pub input: String,
    pub reason: String,
}

impl FromStr for DomainRule {
    type Err = RuleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| RuleParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let caps = RULE_PATTERN
            .captures(s)
            .ok_or_else(|| fail("expected '<column><=N', '<column>>=N' or '<column>=LO..HI'"))?;

        let column = &caps[1];
        let operand = &caps[3];
        let number = |text: &str| {
            text.trim()
                .parse::<f64>()
                .map_err(|_| fail(&format!("'{}' is not a number", text)))
        };

        let bound = match &caps[2] {
            "<=" => Bound::AtMost(number(operand)?),
            ">=" => Bound::AtLeast(number(operand)?),
            _ => {
                let range = RANGE_PATTERN
                    .captures(operand)
                    .ok_or_else(|| fail("expected a range 'LO..HI'"))?;
                Bound::Between(number(&range[1])?, number(&range[2])?)
            }
        };

        bound.check().map_err(|reason| fail(&reason))?;
        Ok(DomainRule::new(column, bound))
    }
}
