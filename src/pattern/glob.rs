//! Dot-separated wildcard patterns.
//!
//! A pattern such as `"pkg.db.*"` is compiled into the anchored regex
//! `^pkg\.db\..*$`: literal segments and dots match literally, `*` matches
//! any run of characters (dots included). A [`Glob`] is the disjunction of
//! its patterns and is backed by a single `RegexSet`.

use crate::utils::error::GlobError;
use regex::RegexSet;
use std::fmt;

/// Compiled disjunction of symbol-name patterns
///
/// The empty glob matches nothing and is the identity for "don't collapse".
#[derive(Clone)]
pub struct Glob {
    patterns: Vec<String>,
    set: RegexSet,
}

impl Glob {
    /// Compile a list of patterns
    ///
    /// # Errors
    /// * `GlobError::InvalidPattern` - empty pattern, whitespace, or an empty
    ///   dot segment (`"a..b"`, `".a"`, `"a."`)
    /// * `GlobError::Compile` - regex compilation failure
    pub fn new<I, S>(patterns: I) -> Result<Self, GlobError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();

        let mut regexes = Vec::with_capacity(patterns.len());
        for pattern in &patterns {
            validate_pattern(pattern)?;
            regexes.push(to_regex(pattern));
        }

        let set = RegexSet::new(&regexes)?;
        Ok(Self { patterns, set })
    }

    /// A glob that never matches
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: RegexSet::empty(),
        }
    }

    /// A glob that matches every symbol
    pub fn any() -> Self {
        Self {
            patterns: vec!["*".to_string()],
            set: RegexSet::new([to_regex("*")]).unwrap_or_else(|_| RegexSet::empty()),
        }
    }

    pub fn matches(&self, symbol: &str) -> bool {
        self.set.is_match(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for Glob {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.patterns == other.patterns
    }
}

impl fmt::Debug for Glob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Glob").field(&self.patterns).finish()
    }
}

fn validate_pattern(pattern: &str) -> Result<(), GlobError> {
    let invalid = |reason: &str| GlobError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if pattern.is_empty() {
        return Err(invalid("pattern is empty"));
    }
    if pattern.chars().any(char::is_whitespace) {
        return Err(invalid("pattern contains whitespace"));
    }
    if pattern.split('.').any(str::is_empty) {
        return Err(invalid("pattern has an empty segment"));
    }
    Ok(())
}

fn to_regex(pattern: &str) -> String {
    let body: Vec<String> = pattern.split('*').map(regex::escape).collect();
    format!("^{}$", body.join(".*"))
}
