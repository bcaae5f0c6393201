use dashmap::DashMap;
use glob::{MatchOptions, Pattern};
use once_cell::sync::Lazy;

use crate::errors::{SearchError, SearchResult};

static PATTERN_CACHE: Lazy<DashMap<String, Pattern>> = Lazy::new(DashMap::new);

/// File names are matched per path segment: `*` never crosses a separator
/// and a leading dot must be spelled out, so `*` does not sweep up hidden
/// files.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Compiled glob patterns for one request, in priority order
#[derive(Debug, Clone)]
pub struct PatternSet {
    compiled: Vec<Pattern>,
}

impl PatternSet {
    /// Compiles the given patterns, reusing previously compiled ones from a
    /// process-wide cache so repeated interactive searches pay compilation
    /// once
    pub fn compile(patterns: &[String]) -> SearchResult<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let glob = if let Some(entry) = PATTERN_CACHE.get(pattern) {
                entry.clone()
            } else {
                let glob = Pattern::new(pattern)
                    .map_err(|e| SearchError::invalid_pattern(format!("{}: {}", pattern, e.msg)))?;
                PATTERN_CACHE.insert(pattern.clone(), glob.clone());
                glob
            };
            compiled.push(glob);
        }

        Ok(Self { compiled })
    }

    /// Iterates the compiled patterns in request order
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.compiled.iter()
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

/// Tests one file name against one compiled pattern
pub fn matches_file_name(pattern: &Pattern, name: &str) -> bool {
    pattern.matches_with(name, MATCH_OPTIONS)
}
