//! Building the unified table of all valid sub-results runs in a
//! result directory.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use kstring::KString;
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::{
    error::{Diagnostic, InputError},
    naming::NamingConvention,
    record::{parse_sub_results, SubResultRecord},
    run_key::RunKey,
};

/// The record that a run writes when it finished successfully.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionMarker {
    pub message: KString,
    pub rank: u32,
}

impl Default for CompletionMarker {
    fn default() -> Self {
        Self {
            message: KString::from_static("received global tree"),
            rank: 0,
        }
    }
}

impl CompletionMarker {
    pub fn is_marker(&self, record: &SubResultRecord) -> bool {
        record.rank == self.rank && record.msg == self.message
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DatasetOptions<'c> {
    pub naming: &'c NamingConvention,
    pub completion_marker: &'c CompletionMarker,
    /// Set the completion marker's time to 0 for runs with 1 process
    /// and 1 thread. XX: unconfirmed whether this normalisation is
    /// wanted or was a workaround for a measurement artifact.
    pub zero_sequential_completion_time: bool,
}

/// A sub-results record tagged with its run.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub run: Arc<RunKey>,
    pub rank: u32,
    pub phase: KString,
    /// Seconds
    pub time: f64,
}

/// All rows from all valid runs. Immutable once built; row order
/// carries no meaning.
#[derive(Debug, Default)]
pub struct Dataset {
    rows: Vec<Row>,
}

impl Dataset {
    pub fn from_runs(runs: impl IntoIterator<Item = Vec<Row>>) -> Self {
        Self {
            rows: runs.into_iter().flatten().collect(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Check that a run completed, and turn its records into rows. An
/// incomplete run yields no rows at all.
pub fn validate_run(
    run: RunKey,
    records: Vec<SubResultRecord>,
    opts: &DatasetOptions,
) -> Result<Vec<Row>, InputError> {
    let marker = opts.completion_marker;
    if !records.iter().any(|r| marker.is_marker(r)) {
        return Err(InputError::IncompleteRun {
            message: marker.message.clone(),
            rank: marker.rank,
        });
    }
    let zero_marker = opts.zero_sequential_completion_time && run.configuration.is_sequential();
    let run = Arc::new(run);
    Ok(records
        .into_iter()
        .map(|record| {
            let time = if zero_marker && marker.is_marker(&record) {
                0.
            } else {
                record.time
            };
            Row {
                run: run.clone(),
                rank: record.rank,
                phase: record.msg,
                time,
            }
        })
        .collect())
}

#[derive(Debug)]
pub enum RunOutcome {
    Accepted {
        rows: Vec<Row>,
        dropped_rows: Vec<InputError>,
    },
    Discarded(InputError),
}

/// Read one result file. Problems with its name or content discard
/// the run; only failing to read it is an error.
pub fn load_run_file(path: &Path, file_name: &str, opts: &DatasetOptions) -> Result<RunOutcome> {
    let run = match RunKey::from_file_name(file_name, opts.naming) {
        Ok(run) => run,
        Err(e) => return Ok(RunOutcome::Discarded(e)),
    };
    let content = std::fs::read(path).with_context(|| anyhow!("reading result file {path:?}"))?;
    let body = match parse_sub_results(&content) {
        Ok(body) => body,
        Err(e) => return Ok(RunOutcome::Discarded(e)),
    };
    match validate_run(run, body.records, opts) {
        Ok(rows) => Ok(RunOutcome::Accepted {
            rows,
            dropped_rows: body.dropped,
        }),
        Err(e) => Ok(RunOutcome::Discarded(e)),
    }
}

#[derive(Debug, Default)]
pub struct DatasetBuild {
    pub dataset: Dataset,
    pub accepted: Vec<PathBuf>,
    pub discarded: Vec<Diagnostic>,
    pub dropped_rows: Vec<Diagnostic>,
}

/// Scan `dir` (not recursively) for files with the naming
/// convention's prefix and build the dataset from the valid ones.
pub fn build_dataset(dir: &Path, opts: &DatasetOptions) -> Result<DatasetBuild> {
    let metadata =
        std::fs::metadata(dir).with_context(|| anyhow!("opening result directory {dir:?}"))?;
    if !metadata.is_dir() {
        bail!("result path {dir:?} is not a directory")
    }

    let mut runs = Vec::new();
    let mut accepted = Vec::new();
    let mut discarded = Vec::new();
    let mut dropped_rows = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| anyhow!("listing result directory {dir:?}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(file_name) = entry.file_name().to_str() else {
            debug!("ignoring non-unicode file name {path:?}");
            continue;
        };
        if !opts.naming.matches_prefix(file_name) {
            debug!("ignoring {path:?}, not starting with {:?}", opts.naming.prefix);
            continue;
        }

        match load_run_file(path, file_name, opts)? {
            RunOutcome::Accepted {
                rows,
                dropped_rows: dropped,
            } => {
                debug!("accepted {path:?} with {} rows", rows.len());
                for error in dropped {
                    warn!("{path:?}: dropped {error}");
                    dropped_rows.push(Diagnostic {
                        path: path.to_owned(),
                        error,
                    });
                }
                runs.push(rows);
                accepted.push(path.to_owned());
            }
            RunOutcome::Discarded(error) => {
                warn!("{path:?}: discarded, {error}");
                discarded.push(Diagnostic {
                    path: path.to_owned(),
                    error,
                });
            }
        }
    }

    let dataset = Dataset::from_runs(runs);
    info!(
        "{dir:?}: {} runs accepted ({} rows), {} discarded, {} rows dropped",
        accepted.len(),
        dataset.len(),
        discarded.len(),
        dropped_rows.len()
    );
    Ok(DatasetBuild {
        dataset,
        accepted,
        discarded,
        dropped_rows,
    })
}
