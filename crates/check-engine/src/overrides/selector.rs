//! Application selectors used as override keys

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CheckError;
use crate::models::ApplicationId;

const GLOB_META: &[char] = &['*', '?', '['];

/// Key an override is stored under
///
/// Variants are ordered `Global < App < Pattern`; candidates for glob
/// matching are visited in that order, then by their string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApplicationSelector {
    /// Platform-wide scope
    Global,
    /// A single application
    App(ApplicationId),
    /// Glob over application id strings
    Pattern(GlobPattern),
}

impl ApplicationSelector {
    pub fn pattern(source: impl Into<String>) -> Self {
        ApplicationSelector::Pattern(GlobPattern::new(source))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, ApplicationSelector::Global)
    }

    /// Whether this selector applies to an application id string.
    /// The global selector never matches here.
    pub fn matches(&self, app: &str) -> bool {
        match self {
            ApplicationSelector::Global => false,
            ApplicationSelector::App(id) => !app.is_empty() && id.to_string() == app,
            ApplicationSelector::Pattern(pattern) => pattern.is_match(app),
        }
    }
}

impl From<ApplicationId> for ApplicationSelector {
    fn from(id: ApplicationId) -> Self {
        if id.is_zero() {
            ApplicationSelector::Global
        } else {
            ApplicationSelector::App(id)
        }
    }
}

impl fmt::Display for ApplicationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationSelector::Global => Ok(()),
            ApplicationSelector::App(id) => write!(f, "{}", id),
            ApplicationSelector::Pattern(pattern) => f.write_str(pattern.as_str()),
        }
    }
}

impl FromStr for ApplicationSelector {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(GLOB_META) {
            return Ok(Self::pattern(s));
        }
        Ok(s.parse::<ApplicationId>()?.into())
    }
}

impl Serialize for ApplicationSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApplicationSelector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compiled glob, compared by its source text
///
/// `*` also matches `:` so `shop:*` covers every application in a namespace.
/// An invalid glob is kept but never matches.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    matcher: Option<GlobMatcher>,
}

impl GlobPattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let matcher = match GlobBuilder::new(&source).literal_separator(false).build() {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                warn!(selector = %source, error = %e, "invalid selector pattern, it will never match");
                None
            }
        };
        Self { source, matcher }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.matcher
            .as_ref()
            .map(|m| m.is_match(candidate))
            .unwrap_or(false)
    }
}

impl PartialEq for GlobPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for GlobPattern {}

impl PartialOrd for GlobPattern {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GlobPattern {
    fn cmp(&self, other: &Self) -> Ordering {
        self.source.cmp(&other.source)
    }
}

impl Hash for GlobPattern {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

/// Glob match of an application id string against a selector pattern
pub fn glob_match(candidate: &str, pattern: &str) -> bool {
    GlobPattern::new(pattern).is_match(candidate)
}
