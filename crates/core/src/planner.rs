use crate::apply::place_file;
use crate::ignore::IgnoreFilter;
use crate::metadata::MediaRecord;
use crate::naming::{DeriveError, Naming};
use crate::resolver::{DestinationResolver, FileProbe, LocalFs, Resolution, ResolveError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    pub dry_run: bool,
}

/// Read-only collaborators shared by every record of a batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchContext<'a, P = LocalFs> {
    pub naming: &'a Naming,
    pub ignore_filter: &'a IgnoreFilter,
    pub resolver: &'a DestinationResolver<P>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecordOutcome {
    Placed { destination: PathBuf },
    Planned { destination: PathBuf },
    Ignored,
    SourceMissing,
    Underivable { reason: DeriveError },
    SameFileAsSource { destination: PathBuf },
    Duplicate { existing: PathBuf },
    Exhausted { attempts: usize },
    ResolveFailed { reason: ResolveError },
    MoveFailed { destination: PathBuf, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub index: usize,
    pub source_file: Option<String>,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub processed: usize,
    pub placed: usize,
    pub planned: usize,
    pub ignored: usize,
    pub underivable: usize,
    pub same_file: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl BatchStats {
    fn count(&mut self, outcome: &RecordOutcome) {
        self.processed += 1;
        match outcome {
            RecordOutcome::Placed { .. } => self.placed += 1,
            RecordOutcome::Planned { .. } => self.planned += 1,
            RecordOutcome::Ignored => self.ignored += 1,
            RecordOutcome::SourceMissing | RecordOutcome::Underivable { .. } => {
                self.underivable += 1
            }
            RecordOutcome::SameFileAsSource { .. } => self.same_file += 1,
            RecordOutcome::Duplicate { .. } => self.duplicates += 1,
            RecordOutcome::Exhausted { .. }
            | RecordOutcome::ResolveFailed { .. }
            | RecordOutcome::MoveFailed { .. } => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BatchReport {
    pub records: Vec<RecordReport>,
    pub stats: BatchStats,
}

/// Files every record in order. A failing record is reported and skipped;
/// it never stops the batch.
pub fn process_batch<P: FileProbe>(
    records: &[MediaRecord],
    ctx: &BatchContext<'_, P>,
    options: &BatchOptions,
) -> BatchReport {
    let mut report = BatchReport::default();
    let total = records.len();

    for (index, record) in records.iter().enumerate() {
        let source_file = record.source_file();
        info!(
            "processing: {} ({} of {})",
            source_file.as_deref().unwrap_or("<unknown>"),
            index + 1,
            total
        );

        let outcome = process_record(record, ctx, options);
        report.stats.count(&outcome);
        report.records.push(RecordReport {
            index,
            source_file,
            outcome,
        });
    }

    report
}

pub fn process_record<P: FileProbe>(
    record: &MediaRecord,
    ctx: &BatchContext<'_, P>,
    options: &BatchOptions,
) -> RecordOutcome {
    let Some(source_file) = record.source_file() else {
        warn!("skip: record has no SourceFile field");
        return RecordOutcome::SourceMissing;
    };

    if ctx.ignore_filter.is_path_filtered(&source_file) {
        warn!("skip: {source_file} matches an ignore path pattern");
        return RecordOutcome::Ignored;
    }

    let candidate = match ctx.naming.derive(record) {
        Ok(candidate) => candidate,
        Err(reason) => {
            info!("skip: {source_file}: {reason}");
            return RecordOutcome::Underivable { reason };
        }
    };

    let source = Path::new(&source_file);
    match ctx.resolver.resolve(source, &candidate) {
        Ok(Resolution::Resolved(destination)) => {
            if options.dry_run {
                info!("dry-run: {source_file} >> {}", destination.display());
                return RecordOutcome::Planned { destination };
            }
            match place_file(source, &destination) {
                Ok(()) => {
                    info!("renamed: {source_file} >> {}", destination.display());
                    RecordOutcome::Placed { destination }
                }
                Err(err) => {
                    error!("could not move {source_file}: {err:#}");
                    RecordOutcome::MoveFailed {
                        destination,
                        reason: format!("{err:#}"),
                    }
                }
            }
        }
        Ok(Resolution::Duplicate(existing)) => {
            info!("duplicate: {source_file} already exists as {}", existing.display());
            RecordOutcome::Duplicate { existing }
        }
        Ok(Resolution::SameFileAsSource(destination)) => {
            warn!("skip: {source_file} is already in place");
            RecordOutcome::SameFileAsSource { destination }
        }
        Ok(Resolution::Exhausted { attempts }) => {
            error!("skip: no free name for {source_file} after {attempts} attempts");
            RecordOutcome::Exhausted { attempts }
        }
        Err(reason) => {
            error!("skip: {source_file}: {reason}");
            RecordOutcome::ResolveFailed { reason }
        }
    }
}
