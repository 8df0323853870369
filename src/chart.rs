//! What a chart shows, and the seam to whatever draws it.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use strum_macros::{EnumString, IntoStaticStr};

use crate::{
    params::{DefaultConfig, Parameter},
    table_view::TableView,
};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    EnumString,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Pdf,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        self.into()
    }
}

/// Everything a renderer needs for one chart. The data table is the
/// part that matters; its first key column is the x axis.
pub struct ChartSpec<'t> {
    /// File name without extension, e.g. "16_8_processes"
    pub stem: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub format: ImageFormat,
    pub data: &'t dyn TableView,
}

impl<'t> ChartSpec<'t> {
    /// `<stem>.<png|pdf>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.stem, self.format.extension())
    }
}

pub trait ChartRenderer {
    /// Produce the artifact for `chart`, returning its path. Charts
    /// with no data produce nothing and give `None`.
    fn render(&mut self, chart: &ChartSpec) -> Result<Option<PathBuf>>;
}

/// Nodes and cpus the charts are labeled with
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayNodes {
    pub nodes: u32,
    pub cpus: u32,
}

impl Default for DisplayNodes {
    fn default() -> Self {
        Self { nodes: 16, cpus: 8 }
    }
}

/// "Time with different number of processes\n(support=0.0001,
/// threads=8, density=0.6, nodes=16, cpu=8)"
pub fn vary_param_title(
    varying: Parameter,
    defaults: &DefaultConfig,
    display: DisplayNodes,
) -> String {
    let DisplayNodes { nodes, cpus } = display;
    let fixed = defaults.describe_except(varying);
    let sep = if fixed.is_empty() { "" } else { ", " };
    format!(
        "Time with different {}\n({fixed}{sep}nodes={nodes}, cpu={cpus})",
        varying.long()
    )
}

/// "<nodes>_<cpus>_<parameter>"
pub fn vary_param_stem(varying: Parameter, display: DisplayNodes) -> String {
    let DisplayNodes { nodes, cpus } = display;
    format!("{nodes}_{cpus}_{}", varying.name())
}

/// Writes each chart's data as CSV, `<stem>.<format>.csv`, for
/// plotting with external tools.
pub struct CsvDataRenderer {
    out_dir: PathBuf,
}

impl CsvDataRenderer {
    /// Creates `out_dir` if it doesn't exist.
    pub fn new(out_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(out_dir)
            .with_context(|| anyhow!("creating output directory {out_dir:?}"))?;
        Ok(Self {
            out_dir: out_dir.to_owned(),
        })
    }
}

impl ChartRenderer for CsvDataRenderer {
    fn render(&mut self, chart: &ChartSpec) -> Result<Option<PathBuf>> {
        if chart.data.table_is_empty() {
            info!("no data for chart {:?}, omitting it", chart.stem);
            return Ok(None);
        }
        let path = self.out_dir.join(format!("{}.csv", chart.file_name()));
        let mut writer =
            csv::Writer::from_path(&path).with_context(|| anyhow!("creating {path:?}"))?;
        let header = chart.data.table_view_header();
        writer
            .write_record(header.iter().map(|h| h.as_bytes()))
            .with_context(|| anyhow!("writing to {path:?}"))?;
        for row in chart.data.table_view_body() {
            writer
                .write_record(&row)
                .with_context(|| anyhow!("writing to {path:?}"))?;
        }
        writer.flush().with_context(|| anyhow!("writing to {path:?}"))?;
        debug!("wrote chart data {path:?}");
        Ok(Some(path))
    }
}
