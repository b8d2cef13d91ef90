mod apply;
mod config;
mod exiftool;
mod hash;
mod ignore;
mod metadata;
mod naming;
mod paths;
mod planner;
mod replacer;
mod resolver;
mod sanitize;

pub use apply::{move_file, place_file};
pub use config::{
    config_search_paths, load_config, load_config_from, parse_config, AppConfig, ConfigSource,
    LoadedConfig, Rejections, RuleSets, DEFAULT_CONFIG_TOML,
};
pub use exiftool::{exiftool_command, parse_exiftool_json, run_exiftool};
pub use hash::sha256_file;
pub use ignore::{IgnoreFilter, IgnorePattern, PatternEntry};
pub use metadata::MediaRecord;
pub use naming::{CandidatePath, DeriveError, Naming, TIMESTAMP_FIELDS};
pub use paths::{validate_directory, validate_file_or_directory, PathError};
pub use planner::{
    process_batch, process_record, BatchContext, BatchOptions, BatchReport, BatchStats,
    RecordOutcome, RecordReport,
};
pub use replacer::{Replacer, Rule, RuleEntry, RuleError};
pub use resolver::{
    DestinationResolver, FileFacts, FileIdentity, FileProbe, LocalFs, Resolution, ResolveError,
    DEFAULT_MAX_SUFFIX,
};
pub use sanitize::structural_sanitizer;
