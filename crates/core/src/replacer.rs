use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const KIND_STRING: &str = "string";
pub const KIND_REGEX: &str = "regex";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("the find term cannot be empty")]
    EmptyFind,
    #[error("the pattern cannot be empty")]
    EmptyPattern,
    #[error("'{pattern}' is not a valid regex: {reason}")]
    InvalidRegex { pattern: String, reason: String },
    #[error("invalid rule type '{0}'. valid types are 'string' or 'regex'")]
    UnknownKind(String),
}

/// A replace rule as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub find: String,
    #[serde(default)]
    pub replace_with: String,
}

impl RuleEntry {
    pub fn string(find: &str, replace_with: &str) -> Self {
        Self {
            kind: KIND_STRING.to_string(),
            find: find.to_string(),
            replace_with: replace_with.to_string(),
        }
    }

    pub fn regex(find: &str, replace_with: &str) -> Self {
        Self {
            kind: KIND_REGEX.to_string(),
            find: find.to_string(),
            replace_with: replace_with.to_string(),
        }
    }
}

/// A validated find/replace instruction.
#[derive(Debug, Clone)]
pub enum Rule {
    Literal { find: String, replace_with: String },
    Pattern { regex: Regex, replace_with: String },
}

impl Rule {
    pub fn literal(find: &str, replace_with: &str) -> Result<Self, RuleError> {
        if find.is_empty() {
            return Err(RuleError::EmptyFind);
        }
        Ok(Self::Literal {
            find: find.to_string(),
            replace_with: replace_with.to_string(),
        })
    }

    pub fn pattern(find: &str, replace_with: &str) -> Result<Self, RuleError> {
        Ok(Self::Pattern {
            regex: compile_pattern(find, RuleError::EmptyFind)?,
            replace_with: replace_with.to_string(),
        })
    }

    /// Replaces every occurrence (literal) or every match (pattern) in `input`.
    /// Pattern replacements expand `$1` / `${name}` capture references.
    pub fn apply(&self, input: &str) -> String {
        match self {
            Self::Literal { find, replace_with } => input.replace(find.as_str(), replace_with),
            Self::Pattern {
                regex,
                replace_with,
            } => regex.replace_all(input, replace_with.as_str()).into_owned(),
        }
    }
}

impl TryFrom<&RuleEntry> for Rule {
    type Error = RuleError;

    fn try_from(entry: &RuleEntry) -> Result<Self, Self::Error> {
        match entry.kind.as_str() {
            KIND_STRING => Self::literal(&entry.find, &entry.replace_with),
            KIND_REGEX => Self::pattern(&entry.find, &entry.replace_with),
            other => Err(RuleError::UnknownKind(other.to_string())),
        }
    }
}

pub(crate) fn compile_pattern(pattern: &str, empty: RuleError) -> Result<Regex, RuleError> {
    if pattern.is_empty() {
        return Err(empty);
    }
    Regex::new(pattern).map_err(|err| RuleError::InvalidRegex {
        pattern: pattern.to_string(),
        reason: err.to_string(),
    })
}

/// Ordered rule list. Rules run in insertion order, each on the previous output.
#[derive(Debug, Clone, Default)]
pub struct Replacer {
    rules: Vec<Rule>,
}

impl Replacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Validates `entry` and appends it. A rejected entry leaves the replacer untouched.
    pub fn add_entry(&mut self, entry: &RuleEntry) -> Result<(), RuleError> {
        let rule = Rule::try_from(entry)?;
        self.rules.push(rule);
        Ok(())
    }

    pub fn replace(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |output, rule| rule.apply(&output))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacer(entries: &[RuleEntry]) -> Replacer {
        let mut r = Replacer::new();
        for entry in entries {
            r.add_entry(entry).expect("valid rule");
        }
        r
    }

    #[test]
    fn entry_validation() {
        let cases = [
            (RuleEntry::string("findme", "x"), true),
            (RuleEntry::string("", "x"), false),
            (RuleEntry::regex("^$", "x"), true),
            (RuleEntry::regex("^((", "x"), false),
            (RuleEntry::regex("", "x"), false),
            (
                RuleEntry {
                    kind: "footypebar".to_string(),
                    find: "findme".to_string(),
                    replace_with: "x".to_string(),
                },
                false,
            ),
        ];
        for (entry, valid) in cases {
            assert_eq!(Rule::try_from(&entry).is_ok(), valid, "{entry:?}");
        }
    }

    #[test]
    fn rejected_entries_do_not_change_length() {
        let mut r = Replacer::new();
        r.add_entry(&RuleEntry::string("findme", "x")).expect("valid");
        assert_eq!(
            r.add_entry(&RuleEntry::string("", "x")),
            Err(RuleError::EmptyFind)
        );
        assert_eq!(r.len(), 1);

        r.add_entry(&RuleEntry::regex("^$", "x")).expect("valid");
        let err = r
            .add_entry(&RuleEntry::regex("^((", "x"))
            .expect_err("bad regex");
        assert!(matches!(err, RuleError::InvalidRegex { .. }));
        assert_eq!(r.len(), 2);

        let err = r
            .add_entry(&RuleEntry {
                kind: "strang".to_string(),
                find: "a".to_string(),
                replace_with: "b".to_string(),
            })
            .expect_err("unknown type");
        assert_eq!(err, RuleError::UnknownKind("strang".to_string()));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn empty_replacer_is_identity() {
        assert_eq!(Replacer::new().replace("Canon EOS 5D"), "Canon EOS 5D");
        assert_eq!(Replacer::new().replace(""), "");
    }

    #[test]
    fn literal_rules_replace_every_occurrence() {
        let r = replacer(&[
            RuleEntry::string(" ", "SPACE"),
            RuleEntry::string("\t", "TAB"),
            RuleEntry::string("%", "PERCENT"),
        ]);
        assert_eq!(r.replace("a b\tc%%"), "aSPACEbTABcPERCENTPERCENT");
        assert_eq!(r.replace("nothing"), "nothing");
    }

    #[test]
    fn rule_order_changes_result() {
        let forward = replacer(&[RuleEntry::string("a", "b"), RuleEntry::string("b", "c")]);
        let reversed = replacer(&[RuleEntry::string("b", "c"), RuleEntry::string("a", "b")]);
        assert_eq!(forward.replace("a"), "c");
        assert_eq!(reversed.replace("a"), "b");
    }

    #[test]
    fn cascading_rules_feed_each_other() {
        let r = replacer(&[
            RuleEntry::string("good", "bad"),
            RuleEntry::string("bad", "good"),
            RuleEntry::string("good", "great"),
        ]);
        assert_eq!(r.replace("this line is good"), "this line is great");
    }

    #[test]
    fn regex_rules_support_capture_groups() {
        let r = replacer(&[
            RuleEntry::regex(r"\s+", ""),
            RuleEntry::regex(r"^Canon(EOS)(\d+)D$", "C-${2}-$1"),
        ]);
        assert_eq!(r.replace("Canon EOS 800D"), "C-800-EOS");
    }

    #[test]
    fn model_mapping_literal() {
        let r = replacer(&[RuleEntry::string("Canon EOS Rebel T7i", "Canon800D")]);
        assert_eq!(r.replace("Canon EOS Rebel T7i"), "Canon800D");
        assert_eq!(r.replace("Canon EOS Rebel T6"), "Canon EOS Rebel T6");
    }

    #[test]
    fn replace_is_deterministic() {
        let r = replacer(&[RuleEntry::regex("[aeiou]", "_"), RuleEntry::string("_", "-")]);
        let first = r.replace("Pixel 7 Pro");
        for _ in 0..5 {
            assert_eq!(r.replace("Pixel 7 Pro"), first);
        }
        assert_eq!(first, "P-x-l 7 Pr-");
    }
}
