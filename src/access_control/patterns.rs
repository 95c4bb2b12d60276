//! Regex filters for override rules

use crate::error::ConfigError;
use regex::Regex;

/// Any-of matcher over principal or object names.
///
/// An empty matcher matches nothing; callers decide whether "no patterns"
/// means "no filter".
#[derive(Debug, Default)]
pub struct PatternMatcher {
    patterns: Vec<Regex>,
}

impl PatternMatcher {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.find_match(name).is_some()
    }

    /// Source of the first pattern matching `name`
    pub fn find_match(&self, name: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|regex| regex.is_match(name))
            .map(Regex::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
