//! Route template matching.
//!
//! # Responsibilities
//! - Map a concrete request path to its configured route template
//! - Evaluate patterns in configured order, first match wins
//! - Fall back to the path itself when nothing matches
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Patterns are used exactly as written: `/api/user/[0-9]+` also matches
//!   `/v2/api/user/7/extra`. Add `^`/`$` in the configuration when a full
//!   match is intended.
//! - Compiled once at startup, immutable at runtime (no locking)

use regex::Regex;

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// Template as configured; this is the route key reported on a match.
    raw: String,
    regex: Regex,
}

impl PathPattern {
    /// Compile a single pattern.
    pub fn new(raw: impl Into<String>) -> Result<Self, regex::Error> {
        let raw = raw.into();
        let regex = Regex::new(&raw)?;
        Ok(Self { raw, regex })
    }

    /// Returns true if the pattern matches anywhere in `path`.
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Ordered list of route templates.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    patterns: Vec<PathPattern>,
}

impl PathMatcher {
    /// Compile all patterns, preserving their order.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(PathPattern::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Resolve the route key for `path`.
    pub fn route_key(&self, path: &str) -> String {
        self.patterns
            .iter()
            .find(|p| p.matches(path))
            .map(|p| p.raw.clone())
            .unwrap_or_else(|| path.to_string())
    }
}
