use crate::ignore::{IgnoreFilter, PatternEntry};
use crate::naming::{Naming, DEFAULT_MIME_TYPES};
use crate::replacer::{Replacer, RuleEntry, RuleError};
use crate::resolver::DEFAULT_MAX_SUFFIX;
use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.toml";
const SYSTEM_CONFIG_DIR: &str = "/etc/mediafiler";

pub const DEFAULT_CONFIG_TOML: &str = r#"debug = false
dry_run = false
exiftool_binary = "/usr/bin/exiftool"
supported_mime_types = ["image", "video"]
max_suffix = 1000
append_camera_serial = false
append_lens_serial = false

[[model_replace_rules]]
type = "string"
find = "FooBarMatic"
replace_with = "FBM"

[[model_replace_rules]]
type = "regex"
find = '\s+'
replace_with = ""

[[path_ignore_patterns]]
type = "string"
pattern = ".git/"

[[path_ignore_patterns]]
type = "string"
pattern = '.git\'

[[path_ignore_patterns]]
type = "regex"
pattern = '^.*[Ii][Cc][Oo]$'
"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub debug: bool,
    pub dry_run: bool,
    pub exiftool_binary: Option<String>,
    pub supported_mime_types: Vec<String>,
    pub max_suffix: usize,
    pub append_camera_serial: bool,
    pub append_lens_serial: bool,
    pub model_replace_rules: Vec<RuleEntry>,
    pub path_ignore_patterns: Vec<PatternEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            debug: false,
            dry_run: false,
            exiftool_binary: None,
            supported_mime_types: DEFAULT_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            max_suffix: DEFAULT_MAX_SUFFIX,
            append_camera_serial: false,
            append_lens_serial: false,
            model_replace_rules: Vec::new(),
            path_ignore_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: ConfigSource,
}

/// Configuration entries that failed validation, by position in their list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rejections {
    pub model_replace_rules: Vec<(usize, RuleError)>,
    pub path_ignore_patterns: Vec<(usize, RuleError)>,
}

impl Rejections {
    pub fn is_empty(&self) -> bool {
        self.model_replace_rules.is_empty() && self.path_ignore_patterns.is_empty()
    }
}

/// Validated rule sets ready for a batch.
#[derive(Debug, Clone)]
pub struct RuleSets {
    pub naming: Naming,
    pub ignore_filter: IgnoreFilter,
    pub rejections: Rejections,
}

/// Places searched when no config file is given explicitly, in order.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(proj) = ProjectDirs::from("", "", "mediafiler") {
        paths.push(proj.config_dir().join(CONFIG_FILE_NAME));
    }
    paths.push(Path::new(SYSTEM_CONFIG_DIR).join(CONFIG_FILE_NAME));
    paths
}

pub fn load_config(explicit: Option<&Path>, use_default: bool) -> Result<LoadedConfig> {
    load_config_from(explicit, &config_search_paths(), use_default)
}

pub fn load_config_from(
    explicit: Option<&Path>,
    search_paths: &[PathBuf],
    use_default: bool,
) -> Result<LoadedConfig> {
    // an explicit file that is missing never falls back to defaults
    if let Some(path) = explicit {
        if path.as_os_str().is_empty() {
            bail!("config file path is empty");
        }
        if !path.exists() {
            bail!("config file was not found: {}", path.display());
        }
        return read_config_file(path);
    }

    if let Some(path) = search_paths.iter().find(|path| path.is_file()) {
        return read_config_file(path);
    }

    if use_default {
        let config = parse_config(DEFAULT_CONFIG_TOML).context("default configuration is invalid")?;
        return Ok(LoadedConfig {
            config,
            source: ConfigSource::Defaults,
        });
    }

    bail!("config file could not be found using configured paths/files")
}

fn read_config_file(path: &Path) -> Result<LoadedConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file: {}", path.display()))?;
    let config = parse_config(&raw)
        .with_context(|| format!("could not parse config file: {}", path.display()))?;
    Ok(LoadedConfig {
        config,
        source: ConfigSource::File(path.to_path_buf()),
    })
}

pub fn parse_config(raw: &str) -> Result<AppConfig> {
    let config = toml::from_str::<AppConfig>(raw)?;
    if config.max_suffix == 0 {
        bail!("max_suffix must be at least 1");
    }
    Ok(config)
}

impl AppConfig {
    /// Builds the replacer and ignore filter. Invalid entries are skipped and
    /// reported; the valid ones are kept in their configured order.
    pub fn build_rule_sets(&self) -> RuleSets {
        let mut rejections = Rejections::default();

        let mut model_replacer = Replacer::new();
        for (index, entry) in self.model_replace_rules.iter().enumerate() {
            if let Err(err) = model_replacer.add_entry(entry) {
                warn!("error adding model replace rule #{index}: {err}");
                rejections.model_replace_rules.push((index, err));
            }
        }

        let mut ignore_filter = IgnoreFilter::new();
        for (index, entry) in self.path_ignore_patterns.iter().enumerate() {
            if let Err(err) = ignore_filter.add_entry(entry) {
                warn!("error adding path ignore pattern #{index}: {err}");
                rejections.path_ignore_patterns.push((index, err));
            }
        }

        let naming = Naming {
            supported_mime_types: self.supported_mime_types.clone(),
            append_camera_serial: self.append_camera_serial,
            append_lens_serial: self.append_lens_serial,
            ..Naming::new(model_replacer)
        };

        RuleSets {
            naming,
            ignore_filter,
            rejections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_config_parses_and_builds() {
        let config = parse_config(DEFAULT_CONFIG_TOML).expect("parse");
        assert_eq!(config.exiftool_binary.as_deref(), Some("/usr/bin/exiftool"));
        assert_eq!(config.max_suffix, 1000);
        assert_eq!(config.model_replace_rules.len(), 2);

        let sets = config.build_rule_sets();
        assert!(sets.rejections.is_empty());
        assert_eq!(sets.naming.model_replacer.len(), 2);
        assert_eq!(sets.ignore_filter.len(), 3);
        assert_eq!(sets.naming.model_replacer.replace("FooBarMatic 3000"), "FBM3000");
        assert!(sets.ignore_filter.is_path_filtered("/in/.git/HEAD"));
        assert!(sets.ignore_filter.is_path_filtered(r"C:\in\.git\HEAD"));
        assert!(sets.ignore_filter.is_path_filtered("/in/favicon.ico"));
    }

    #[test]
    fn missing_keys_use_defaults() {
        let config = parse_config("dry_run = true").expect("parse");
        assert!(config.dry_run);
        assert_eq!(config.supported_mime_types, vec!["image", "video"]);
        assert!(config.model_replace_rules.is_empty());
    }

    #[test]
    fn invalid_entries_are_rejected_individually() {
        let raw = r#"
[[model_replace_rules]]
type = "string"
find = "Canon EOS Rebel T7i"
replace_with = "Canon800D"

[[model_replace_rules]]
type = "regex"
find = "^(("
replace_with = "x"

[[model_replace_rules]]
type = "strang"
find = "a"

[[model_replace_rules]]
type = "regex"
find = '\s+'

[[path_ignore_patterns]]
type = "string"
pattern = ""

[[path_ignore_patterns]]
type = "regex"
pattern = '\.xmp$'
"#;
        let sets = parse_config(raw).expect("parse").build_rule_sets();
        assert_eq!(sets.naming.model_replacer.len(), 2);
        assert_eq!(sets.ignore_filter.len(), 1);

        let rejected: Vec<usize> = sets
            .rejections
            .model_replace_rules
            .iter()
            .map(|(index, _)| *index)
            .collect();
        assert_eq!(rejected, vec![1, 2]);
        assert_eq!(
            sets.rejections.model_replace_rules[1].1,
            RuleError::UnknownKind("strang".to_string())
        );
        assert_eq!(
            sets.rejections.path_ignore_patterns,
            vec![(0, RuleError::EmptyPattern)]
        );
        assert_eq!(
            sets.naming.model_replacer.replace("Canon EOS Rebel T7i"),
            "Canon800D"
        );
    }

    #[test]
    fn explicit_missing_file_does_not_fall_back() {
        let temp = tempdir().expect("tempdir");
        let err = load_config_from(Some(temp.path().join("nope.toml").as_path()), &[], true)
            .expect_err("missing explicit file");
        assert!(err.to_string().contains("config file was not found"));
    }

    #[test]
    fn search_paths_are_tried_in_order() {
        let temp = tempdir().expect("tempdir");
        let first = temp.path().join("first.toml");
        let second = temp.path().join("second.toml");
        fs::write(&second, "debug = true").expect("write");

        let loaded = load_config_from(None, &[first.clone(), second.clone()], false)
            .expect("load");
        assert_eq!(loaded.source, ConfigSource::File(second));
        assert!(loaded.config.debug);

        fs::write(&first, "dry_run = true").expect("write");
        let loaded = load_config_from(None, &[first.clone()], false).expect("load");
        assert_eq!(loaded.source, ConfigSource::File(first));
    }

    #[test]
    fn defaults_only_when_requested() {
        let temp = tempdir().expect("tempdir");
        let search = [temp.path().join("nope.toml")];

        let err = load_config_from(None, &search, false).expect_err("nothing found");
        assert!(err.to_string().contains("could not be found"));

        let loaded = load_config_from(None, &search, true).expect("defaults");
        assert_eq!(loaded.source, ConfigSource::Defaults);
        assert_eq!(loaded.config.path_ignore_patterns.len(), 3);
    }

    #[test]
    fn zero_max_suffix_is_rejected() {
        let err = parse_config("max_suffix = 0").expect_err("zero attempts");
        assert!(err.to_string().contains("max_suffix"));
        assert_eq!(parse_config("max_suffix = 1").expect("parse").max_suffix, 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "max_suffix = \"many\"").expect("write");
        assert!(load_config_from(Some(path.as_path()), &[], false).is_err());
    }
}
