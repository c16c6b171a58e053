//! Version type and precedence rules.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use once_cell::sync::Lazy;
use regex::Regex;
use semver::{BuildMetadata, Prerelease};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

static VERSION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^v?(?<segments>[0-9]+(?:\.[0-9]+)*)(?:-(?<pre>[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?(?:\+(?<build>[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$").unwrap()
});

/// Versions always carry at least major, minor and patch.
const MIN_SEGMENTS: usize = 3;

/// A release version.
///
/// Parsing accepts an optional leading `v` and any number of numeric segments;
/// fewer than three are padded with zeros (`1.3` becomes `1.3.0`). The number of
/// segments actually written is kept as [`Version::specificity`] because the
/// pessimistic operator depends on it.
///
/// Equality and hashing cover segments, prerelease and build metadata.
/// Ordering ([`Version::cmp_precedence`]) ignores build metadata.
#[derive(Debug, Clone)]
pub struct Version {
    segments:    Vec<u64>,
    specificity: usize,
    pre:         Prerelease,
    build:       BuildMetadata,
}

impl Version {
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let caps = VERSION_REGEX
            .captures(trimmed)
            .ok_or_else(|| Error::version(s, "expected MAJOR[.MINOR[.PATCH...]][-PRERELEASE][+METADATA]"))?;

        let mut segments = caps["segments"]
            .split('.')
            .map(|seg| {
                seg.parse::<u64>()
                    .map_err(|_| Error::version(s, format!("segment {seg:?} out of range")))
            })
            .collect::<Result<Vec<_>>>()?;
        let specificity = segments.len();
        if segments.len() < MIN_SEGMENTS {
            segments.resize(MIN_SEGMENTS, 0);
        }

        let pre = match caps.name("pre") {
            Some(m) => Prerelease::new(m.as_str()).map_err(|e| Error::version(s, e.to_string()))?,
            None => Prerelease::EMPTY,
        };
        let build = match caps.name("build") {
            Some(m) => BuildMetadata::new(m.as_str()).map_err(|e| Error::version(s, e.to_string()))?,
            None => BuildMetadata::EMPTY,
        };

        Ok(Self {
            segments,
            specificity,
            pre,
            build,
        })
    }

    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            segments:    vec![major, minor, patch],
            specificity: MIN_SEGMENTS,
            pre:         Prerelease::EMPTY,
            build:       BuildMetadata::EMPTY,
        }
    }

    pub fn segments(&self) -> &[u64] { &self.segments }

    pub fn major(&self) -> u64 { self.segments[0] }

    pub fn minor(&self) -> u64 { self.segments[1] }

    pub fn patch(&self) -> u64 { self.segments[2] }

    /// Number of numeric segments written in the source string.
    pub fn specificity(&self) -> usize { self.specificity }

    /// Prerelease label, empty for final releases.
    pub fn prerelease(&self) -> &str { self.pre.as_str() }

    /// Build metadata, empty when absent.
    pub fn metadata(&self) -> &str { self.build.as_str() }

    pub fn is_prerelease(&self) -> bool { !self.pre.is_empty() }

    /// Returns a copy carrying `metadata` as its build metadata (empty clears it).
    pub fn with_metadata(&self, metadata: &str) -> Result<Self> {
        let build = if metadata.is_empty() {
            BuildMetadata::EMPTY
        } else {
            BuildMetadata::new(metadata)
                .map_err(|e| Error::version(&format!("{self}+{metadata}"), e.to_string()))?
        };
        Ok(Self {
            build,
            ..self.clone()
        })
    }

    /// The numeric segments alone, without prerelease or metadata.
    pub fn core(&self) -> Self {
        Self {
            segments:    self.segments.clone(),
            specificity: self.specificity,
            pre:         Prerelease::EMPTY,
            build:       BuildMetadata::EMPTY,
        }
    }

    /// Total precedence order.
    ///
    /// Numeric segments compare left to right (missing trailing segments count
    /// as zero). A final release sorts after any of its prereleases; two
    /// prereleases compare by SemVer identifier rules. Build metadata is ignored.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let ord = self.segment(i).cmp(&other.segment(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }

        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.pre.cmp(&other.pre),
        }
    }

    /// Whether both versions have the same numeric segments.
    pub fn same_segments(&self, other: &Self) -> bool {
        let len = self.segments.len().max(other.segments.len());
        (0..len).all(|i| self.segment(i) == other.segment(i))
    }

    pub(crate) fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.same_segments(other) && self.pre == other.pre && self.build == other.build
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let significant = self
            .segments
            .iter()
            .rposition(|&seg| seg != 0)
            .map_or(0, |last| last + 1);
        self.segments[..significant].hash(state);
        self.pre.hash(state);
        self.build.hash(state);
    }
}

impl std::str::FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> { Version::parse(s) }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Version::parse(&raw).map_err(serde::de::Error::custom)
    }
}
