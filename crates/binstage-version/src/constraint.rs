//! Version constraints.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::version::Version;

static CONSTRAINT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?<op>~>|>=|<=|!=|=|>|<)?\s*(?<version>\S+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    /// `~>`: at least the given version, within the last written segment.
    Pessimistic,
}

impl Operator {
    fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "" | "=" => Some(Self::Equal),
            "!=" => Some(Self::NotEqual),
            ">" => Some(Self::Greater),
            "<" => Some(Self::Less),
            ">=" => Some(Self::GreaterOrEqual),
            "<=" => Some(Self::LessOrEqual),
            "~>" => Some(Self::Pessimistic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Pessimistic => "~>",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// A single operator constraint such as `>= 1.0.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    operator: Operator,
    version:  Version,
    original: String,
}

impl Constraint {
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let caps = CONSTRAINT_REGEX
            .captures(trimmed)
            .ok_or_else(|| Error::constraint(s, "expected [OPERATOR] VERSION"))?;

        let symbol = caps.name("op").map_or("", |m| m.as_str());
        let operator = Operator::from_symbol(symbol)
            .ok_or_else(|| Error::constraint(s, format!("unknown operator {symbol:?}")))?;
        let version = Version::parse(&caps["version"]).map_err(|e| Error::constraint(s, e.to_string()))?;

        Ok(Self {
            operator,
            version,
            original: trimmed.to_string(),
        })
    }

    pub fn operator(&self) -> Operator { self.operator }

    pub fn version(&self) -> &Version { &self.version }

    pub fn check(&self, v: &Version) -> bool {
        let c = &self.version;
        let ord = v.cmp_precedence(c);
        match self.operator {
            Operator::Equal => ord == Ordering::Equal,
            Operator::NotEqual => ord != Ordering::Equal,
            Operator::Greater => prerelease_check(v, c) && ord == Ordering::Greater,
            Operator::Less => prerelease_check(v, c) && ord == Ordering::Less,
            Operator::GreaterOrEqual => prerelease_check(v, c) && ord != Ordering::Less,
            Operator::LessOrEqual => prerelease_check(v, c) && ord != Ordering::Greater,
            Operator::Pessimistic => pessimistic_check(v, c, ord),
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(&self.original) }
}

impl std::str::FromStr for Constraint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Constraint::parse(s) }
}

/// Prereleases only match constraints written against a prerelease of the same
/// numeric version.
fn prerelease_check(v: &Version, c: &Version) -> bool {
    match (v.is_prerelease(), c.is_prerelease()) {
        (true, true) => v.same_segments(c),
        (true, false) => false,
        (false, _) => true,
    }
}

fn pessimistic_check(v: &Version, c: &Version, ord: Ordering) -> bool {
    if !prerelease_check(v, c) || (c.is_prerelease() && !v.is_prerelease()) {
        return false;
    }
    if ord == Ordering::Less {
        return false;
    }
    let fixed = c.specificity().saturating_sub(1);
    (0..fixed).all(|i| v.segment(i) == c.segment(i))
}

/// A conjunction of [`Constraint`]s. The empty set matches every version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Constraints(Vec<Constraint>);

impl Constraints {
    /// Parse a comma-separated constraint list. Blank input is rejected; use
    /// [`Constraints::any`] for "no restriction".
    pub fn parse(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(Error::constraint(s, "empty constraint"));
        }
        s.split(',')
            .map(|part| {
                if part.trim().is_empty() {
                    Err(Error::constraint(s, "empty constraint between commas"))
                } else {
                    Constraint::parse(part)
                }
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    pub fn any() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> std::slice::Iter<'_, Constraint> { self.0.iter() }

    pub fn check(&self, v: &Version) -> bool { self.0.iter().all(|c| c.check(v)) }
}

impl From<Vec<Constraint>> for Constraints {
    fn from(constraints: Vec<Constraint>) -> Self { Self(constraints) }
}

impl std::str::FromStr for Constraints {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Constraints::parse(s) }
}

impl std::fmt::Display for Constraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
