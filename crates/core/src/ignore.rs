use crate::replacer::{compile_pattern, RuleError, KIND_REGEX, KIND_STRING};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// An ignore pattern as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatternEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub pattern: String,
}

impl PatternEntry {
    pub fn string(pattern: &str) -> Self {
        Self {
            kind: KIND_STRING.to_string(),
            pattern: pattern.to_string(),
        }
    }

    pub fn regex(pattern: &str) -> Self {
        Self {
            kind: KIND_REGEX.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum IgnorePattern {
    Literal(String),
    Pattern(Regex),
}

impl IgnorePattern {
    pub fn literal(pattern: &str) -> Result<Self, RuleError> {
        if pattern.is_empty() {
            return Err(RuleError::EmptyPattern);
        }
        Ok(Self::Literal(pattern.to_string()))
    }

    pub fn pattern(pattern: &str) -> Result<Self, RuleError> {
        compile_pattern(pattern, RuleError::EmptyPattern).map(Self::Pattern)
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Literal(needle) => path.contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(path),
        }
    }
}

impl TryFrom<&PatternEntry> for IgnorePattern {
    type Error = RuleError;

    fn try_from(entry: &PatternEntry) -> Result<Self, Self::Error> {
        match entry.kind.as_str() {
            KIND_STRING => Self::literal(&entry.pattern),
            KIND_REGEX => Self::pattern(&entry.pattern),
            other => Err(RuleError::UnknownKind(other.to_string())),
        }
    }
}

/// Ordered list of ignore patterns; a path is filtered when any of them matches.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pattern(&mut self, pattern: IgnorePattern) {
        self.patterns.push(pattern);
    }

    /// Validates `entry` and appends it. A rejected entry leaves the filter untouched.
    pub fn add_entry(&mut self, entry: &PatternEntry) -> Result<(), RuleError> {
        let pattern = IgnorePattern::try_from(entry)?;
        self.patterns.push(pattern);
        Ok(())
    }

    pub fn is_path_filtered(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(entries: &[PatternEntry]) -> IgnoreFilter {
        let mut f = IgnoreFilter::new();
        for entry in entries {
            f.add_entry(entry).expect("valid pattern");
        }
        f
    }

    #[test]
    fn entry_validation() {
        let cases = [
            (PatternEntry::string(".git/"), true),
            (PatternEntry::string(""), false),
            (PatternEntry::regex("^.*[Ii][Cc][Oo]$"), true),
            (PatternEntry::regex("^(("), false),
            (PatternEntry::regex(""), false),
            (
                PatternEntry {
                    kind: "glob".to_string(),
                    pattern: "*.ico".to_string(),
                },
                false,
            ),
        ];
        for (entry, valid) in cases {
            assert_eq!(IgnorePattern::try_from(&entry).is_ok(), valid, "{entry:?}");
        }
    }

    #[test]
    fn rejected_entries_do_not_change_length() {
        let mut f = IgnoreFilter::new();
        f.add_entry(&PatternEntry::string(".git/")).expect("valid");
        assert_eq!(
            f.add_entry(&PatternEntry::string("")),
            Err(RuleError::EmptyPattern)
        );
        assert!(f.add_entry(&PatternEntry::regex("[")).is_err());
        assert_eq!(f.len(), 1);
    }

    #[test]
    fn empty_filter_passes_everything() {
        assert!(!IgnoreFilter::new().is_path_filtered("/photos/IMG_0001.JPG"));
    }

    #[test]
    fn literal_matches_substring() {
        let f = filter(&[PatternEntry::string(".git/")]);
        assert!(f.is_path_filtered("/photos/.git/objects/ab"));
        assert!(!f.is_path_filtered("/photos/git/IMG_0001.JPG"));
    }

    #[test]
    fn regex_matches_anywhere() {
        let f = filter(&[PatternEntry::regex("[Ii][Cc][Oo]$")]);
        assert!(f.is_path_filtered("/photos/favicon.ICO"));
        assert!(!f.is_path_filtered("/photos/icon.png"));
    }

    #[test]
    fn later_pattern_still_filters() {
        let f = filter(&[
            PatternEntry::string("/thumbs/"),
            PatternEntry::regex(r"\.xmp$"),
        ]);
        assert!(f.is_path_filtered("/photos/IMG_0001.xmp"));
        assert!(f.is_path_filtered("/photos/thumbs/IMG_0001.JPG"));
        assert!(!f.is_path_filtered("/photos/IMG_0001.JPG"));
    }
}
