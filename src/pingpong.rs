//! Pingpong measurement series: one file per series, one record per
//! packet size.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::{
    aggregate::SummaryTable,
    error::{Diagnostic, InputError},
    join::{keyval_inner_join_2, KeyVal},
    record::{parse_pingpong_lines, PingpongRecord},
    table_view::PINGPONG_COLUMNS,
};

/// File name endings of files in a pingpong directory that are not
/// series (plots and the benchmark's sources).
pub const DEFAULT_NON_DATA_SUFFIXES: &[&str] = &[".png", ".pdf", ".c", ".py"];

#[derive(Debug)]
pub struct PingpongSeries {
    /// The file name
    pub name: String,
    pub records: Vec<PingpongRecord>,
    /// Lines that weren't records
    pub dropped: Vec<InputError>,
}

impl PingpongSeries {
    pub fn from_str(name: &str, text: &str) -> Self {
        let (records, dropped) = parse_pingpong_lines(text);
        Self {
            name: name.to_owned(),
            records,
            dropped,
        }
    }

    pub fn read_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| anyhow!("reading pingpong series {path:?}"))?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("pingpong series path without file name: {path:?}"))?;
        let series = Self::from_str(name, &text);
        for error in &series.dropped {
            warn!(
                "{}",
                Diagnostic {
                    path: path.to_owned(),
                    error: error.clone(),
                }
            );
        }
        debug!(
            "{path:?}: {} records, {} lines dropped",
            series.records.len(),
            series.dropped.len()
        );
        Ok(series)
    }

    /// The records keyed by their position in the series (the x axis
    /// of the charts).
    pub fn table(&self) -> SummaryTable<usize, PingpongRecord> {
        SummaryTable::new(
            self.name.clone(),
            vec![Cow::Borrowed("index")],
            PINGPONG_COLUMNS.iter().map(|c| Cow::Borrowed(*c)).collect(),
            self.indexed().collect(),
        )
    }

    fn indexed(&self) -> impl Iterator<Item = KeyVal<usize, PingpongRecord>> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(key, record)| KeyVal { key, val: *record })
    }

    /// `<name>` for the chart of this series
    pub fn chart_stem(&self) -> &str {
        &self.name
    }
}

/// The bandwidths (MB/s) of two series side by side, by position.
/// Positions present in only one of the series are left out.
pub fn compare_bandwidth(a: &PingpongSeries, b: &PingpongSeries) -> SummaryTable<usize, (f64, f64)> {
    let bandwidths = |s: &PingpongSeries| {
        s.indexed()
            .map(|KeyVal { key, val }| KeyVal {
                key,
                val: val.bandwidth_mb_per_s(),
            })
            .collect::<Vec<_>>()
    };
    let (rows, a_only, b_only) = keyval_inner_join_2(bandwidths(a), bandwidths(b));
    if a_only + b_only > 0 {
        warn!(
            "series {:?} and {:?} differ in length ({} vs. {} records), \
             comparing the common part only",
            a.name,
            b.name,
            a.records.len(),
            b.records.len()
        );
    }
    SummaryTable::new(
        format!("Comparison {} {}", a.name, b.name),
        vec![Cow::Borrowed("index")],
        vec![
            Cow::Owned(format!("bandwidth {} (MB/s)", a.name)),
            Cow::Owned(format!("bandwidth {} (MB/s)", b.name)),
        ],
        rows,
    )
}

/// "<a>===<b>_compare"
pub fn compare_stem(a: &PingpongSeries, b: &PingpongSeries) -> String {
    format!("{}==={}_compare", a.name, b.name)
}

/// The series files in `dir` (not recursive), sorted by name. Hidden
/// files and those ending in one of `non_data_suffixes` are skipped.
pub fn series_files(dir: &Path, non_data_suffixes: &[impl AsRef<str>]) -> Result<Vec<PathBuf>> {
    let metadata =
        std::fs::metadata(dir).with_context(|| anyhow!("opening pingpong directory {dir:?}"))?;
    if !metadata.is_dir() {
        bail!("pingpong path {dir:?} is not a directory")
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| anyhow!("listing pingpong directory {dir:?}"))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            debug!("ignoring non-unicode file name {:?}", entry.path());
            continue;
        };
        if name.starts_with('.')
            || non_data_suffixes
                .iter()
                .any(|suffix| name.ends_with(suffix.as_ref()))
        {
            debug!("ignoring {:?}", entry.path());
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}
