use crate::metadata::MediaRecord;
use crate::replacer::Replacer;
use crate::sanitize::structural_sanitizer;
use chrono::{DateTime, Datelike, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Timestamp fields, most reliable first.
pub const TIMESTAMP_FIELDS: &[&str] = &[
    "SubSecDateTimeOriginal",
    "DateTimeOriginal",
    "CreateDate",
    "ModifyDate",
    "GPSDateTime",
];
const LOW_CONFIDENCE_TIMESTAMP: &str = "GPSDateTime";

pub const MODEL_FIELDS: &[&str] = &["Model", "AndroidModel"];
pub const UNKNOWN_MODEL: &str = "unknown";

const MIME_FIELD: &str = "MIMEType";
const EXTENSION_FIELD: &str = "FileTypeExtension";
const CAMERA_SERIAL_FIELD: &str = "SerialNumber";
const LENS_SERIAL_FIELD: &str = "LensSerialNumber";

pub const DEFAULT_MIME_TYPES: &[&str] = &["image", "video"];

#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeriveError {
    #[error("no timestamp field was found")]
    NoTimestamp,
    #[error("timestamp field '{field}' has a value that is not epoch milliseconds: '{value}'")]
    InvalidTimestamp { field: String, value: String },
    #[error("MIME type for this file was not found")]
    MissingMime,
    #[error("MIME type string '{0}' could not be split into type/subtype")]
    MalformedMime(String),
    #[error("MIME type ('{mime_type}') or subtype ('{mime_subtype}') cannot be empty")]
    EmptyMimePart {
        mime_type: String,
        mime_subtype: String,
    },
    #[error("the MIME type ('{0}') for this file is not supported")]
    UnsupportedMime(String),
    #[error("file metadata doesn't contain an extension")]
    MissingExtension,
}

/// Destination pieces derived from one record. Joined as
/// `root/path_suffix/file_name_base[-NNN].extension`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePath {
    pub path_suffix: String,
    pub file_name_base: String,
    pub extension: String,
}

impl CandidatePath {
    pub fn file_name(&self, suffix_index: usize) -> String {
        if suffix_index == 0 {
            format!("{}.{}", self.file_name_base, self.extension)
        } else {
            format!(
                "{}-{:03}.{}",
                self.file_name_base, suffix_index, self.extension
            )
        }
    }

    pub fn target_dir(&self, root: &Path) -> PathBuf {
        self.path_suffix
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(root.to_path_buf(), |dir, part| dir.join(part))
    }

    pub fn path(&self, root: &Path, suffix_index: usize) -> PathBuf {
        self.target_dir(root).join(self.file_name(suffix_index))
    }
}

/// Everything needed to turn a record into a [`CandidatePath`].
#[derive(Debug, Clone)]
pub struct Naming {
    pub model_replacer: Replacer,
    pub sanitizer: Replacer,
    pub supported_mime_types: Vec<String>,
    pub append_camera_serial: bool,
    pub append_lens_serial: bool,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(Replacer::new())
    }
}

impl Naming {
    pub fn new(model_replacer: Replacer) -> Self {
        Self {
            model_replacer,
            sanitizer: structural_sanitizer(),
            supported_mime_types: DEFAULT_MIME_TYPES.iter().map(|s| s.to_string()).collect(),
            append_camera_serial: false,
            append_lens_serial: false,
        }
    }

    pub fn derive(&self, record: &MediaRecord) -> Result<CandidatePath, DeriveError> {
        let extension = record
            .get(EXTENSION_FIELD)
            .ok_or(DeriveError::MissingExtension)?
            .to_lowercase();

        let (mime_type, mime_subtype) = self.classify_mime(record)?;
        let timestamp = pick_timestamp(record)?;
        let model = self.device_identifier(record);

        let camera_serial = record
            .get(CAMERA_SERIAL_FIELD)
            .map(|v| self.sanitizer.replace(&v))
            .unwrap_or_default();
        let lens_serial = record
            .get(LENS_SERIAL_FIELD)
            .map(|v| self.sanitizer.replace(&v))
            .unwrap_or_default();

        debug!("model: {model}");
        debug!("camera serial: {camera_serial}");
        debug!("lens serial: {lens_serial}");
        debug!("timestamp: {timestamp}");
        debug!("MIME: {mime_type} / {mime_subtype}");
        debug!("extension: {extension}");

        let path_suffix = format!(
            "{}/{}/{:04}/{:02}",
            mime_type,
            mime_subtype,
            timestamp.year(),
            timestamp.month()
        );

        let mut file_name_base = format!("{}-{}", timestamp.format("%Y%m%dT%H%M%S%.3fZ"), model);
        if self.append_camera_serial && !camera_serial.is_empty() {
            file_name_base.push_str("_CS");
            file_name_base.push_str(&camera_serial);
        }
        if self.append_lens_serial && !lens_serial.is_empty() {
            file_name_base.push_str("_LS");
            file_name_base.push_str(&lens_serial);
        }

        Ok(CandidatePath {
            path_suffix,
            file_name_base,
            extension,
        })
    }

    fn classify_mime(&self, record: &MediaRecord) -> Result<(String, String), DeriveError> {
        let mime = record.get(MIME_FIELD).ok_or(DeriveError::MissingMime)?;
        let (mime_type, mime_subtype) = mime
            .split_once('/')
            .ok_or_else(|| DeriveError::MalformedMime(mime.clone()))?;

        if mime_type.is_empty() || mime_subtype.is_empty() {
            return Err(DeriveError::EmptyMimePart {
                mime_type: mime_type.to_string(),
                mime_subtype: mime_subtype.to_string(),
            });
        }

        // both parts become directory names under the destination root
        if !is_plain_component(mime_type) || !is_plain_component(mime_subtype) {
            return Err(DeriveError::MalformedMime(mime.clone()));
        }

        if !self.supported_mime_types.iter().any(|t| t == mime_type) {
            return Err(DeriveError::UnsupportedMime(mime_type.to_string()));
        }

        Ok((mime_type.to_string(), mime_subtype.to_string()))
    }

    /// User rules run first on the raw model text; structural rules last.
    fn device_identifier(&self, record: &MediaRecord) -> String {
        let raw = record
            .first_present(MODEL_FIELDS)
            .map(|(_, value)| value)
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string());
        let replaced = self.model_replacer.replace(&raw);
        self.sanitizer.replace(&replaced)
    }
}

fn is_plain_component(part: &str) -> bool {
    part != "." && part != ".." && !part.contains(['/', '\\'])
}

fn pick_timestamp(record: &MediaRecord) -> Result<DateTime<Utc>, DeriveError> {
    let (field, value) = record
        .first_present(TIMESTAMP_FIELDS)
        .ok_or(DeriveError::NoTimestamp)?;

    let invalid = || DeriveError::InvalidTimestamp {
        field: field.to_string(),
        value: value.clone(),
    };
    let millis = value.trim().parse::<i64>().map_err(|_| invalid())?;
    let timestamp = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(invalid)?;

    debug!("timestamp ('{millis}') pulled from '{field}'");
    if field == LOW_CONFIDENCE_TIMESTAMP {
        info!("fell back to '{field}' for the timestamp, which is not necessarily accurate");
    }

    Ok(timestamp)
}
