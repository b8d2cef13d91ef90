use crate::replacer::{Replacer, Rule};

const PATH_SEPARATORS: &[&str] = &["/", "\\"];

/// Replacer that makes a value safe to embed in a single path component.
/// It always runs after user rules so its output stays path-safe.
pub fn structural_sanitizer() -> Replacer {
    let mut replacer = Replacer::new();
    for separator in PATH_SEPARATORS {
        replacer.add_rule(Rule::Literal {
            find: (*separator).to_string(),
            replace_with: "_".to_string(),
        });
    }
    replacer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_both_separator_conventions() {
        let value = structural_sanitizer().replace(r"EOS/R5\II");
        assert_eq!(value, "EOS_R5_II");
    }

    #[test]
    fn leaves_other_characters_alone() {
        let value = structural_sanitizer().replace("Pixel 7 Pro: (GP4BC)");
        assert_eq!(value, "Pixel 7 Pro: (GP4BC)");
    }
}
