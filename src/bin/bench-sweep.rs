use std::{
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Result};
use clap::Parser;
use kstring::KString;
use log::{info, warn};

use bench_sweep_evaluator::{
    aggregate::{
        count_runs, mean_over_repeats, per_phase_maxima, repetitions_missing, run_times,
        varying_parameters,
    },
    chart::{
        vary_param_stem, vary_param_title, ChartRenderer, ChartSpec, CsvDataRenderer, ImageFormat,
    },
    config::{AnalysisConfig, CheckedConfig, NamingChoice},
    config_file::{ConfigBackend, LoadConfigFile},
    dataset::{build_dataset, DatasetBuild},
    pingpong::{compare_bandwidth, compare_stem, series_files, PingpongSeries},
    table_view::TableView,
    terminal_table::print_table,
    utillib::logging::{init_logging, LogLevelOpt},
};

const PROGRAM_NAME: &str = "bench-sweep";

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct ConfigOpts {
    /// Path to the analysis config file (.json5, .json, .yml or
    /// .yaml). Without it, the built-in defaults are used.
    #[clap(short, long)]
    config: Option<PathBuf>,
}

impl ConfigOpts {
    fn load(&self) -> Result<CheckedConfig> {
        AnalysisConfig::load_config(self.config.as_ref())?.check()
    }
}

#[derive(clap::Args, Debug)]
struct OutputOpts {
    /// Directory to write the chart data files to (created if
    /// missing). Without it, tables are only printed.
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Print tables tab separated, without formatting
    #[clap(long)]
    tsv: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Print version
    Version,

    /// Print the built-in analysis config, as a starting point for a
    /// config file
    DefaultConfig {
        /// json5 or yaml
        #[clap(long, default_value = "json5")]
        format: String,
    },

    /// Evaluate a directory of sub-results files: per-run times,
    /// run counts, per-phase times, and the "vary one parameter"
    /// charts.
    SubResults {
        #[clap(flatten)]
        config_opts: ConfigOpts,
        #[clap(flatten)]
        output_opts: OutputOpts,

        /// Naming convention version of the result files (v1, v2,
        /// v3), overriding the config
        #[clap(long)]
        naming: Option<String>,

        /// The directory holding the `out_*` files
        dir: PathBuf,
    },

    /// Show how many runs are still missing per configuration
    Count {
        #[clap(flatten)]
        config_opts: ConfigOpts,

        /// Print tab separated
        #[clap(long)]
        tsv: bool,

        /// Wanted number of repetitions (default: from the config)
        #[clap(long)]
        target: Option<u32>,

        /// Naming convention version, overriding the config
        #[clap(long)]
        naming: Option<String>,

        dir: PathBuf,
    },

    /// Show pingpong series
    Pingpong {
        #[clap(flatten)]
        output_opts: OutputOpts,

        /// The series files
        paths: Vec<PathBuf>,
    },

    /// Compare the bandwidths of two pingpong series
    PingpongCompare {
        #[clap(flatten)]
        output_opts: OutputOpts,

        a: PathBuf,
        b: PathBuf,
    },

    /// Show every pingpong series in a directory
    PingpongDir {
        #[clap(flatten)]
        config_opts: ConfigOpts,
        #[clap(flatten)]
        output_opts: OutputOpts,

        dir: PathBuf,
    },
}

/// Prints tables and, if an output directory was given, renders
/// their charts.
struct Output {
    renderer: Option<CsvDataRenderer>,
    tsv: bool,
    stdout: std::io::Stdout,
}

impl Output {
    fn new(opts: &OutputOpts) -> Result<Self> {
        let renderer = opts
            .out
            .as_deref()
            .map(CsvDataRenderer::new)
            .transpose()?;
        Ok(Self {
            renderer,
            tsv: opts.tsv,
            stdout: std::io::stdout(),
        })
    }

    fn table(&mut self, table: &dyn TableView) -> Result<()> {
        let mut out = self.stdout.lock();
        print_table(table, self.tsv, &mut out)?;
        out.flush()?;
        Ok(())
    }

    fn chart(&mut self, chart: ChartSpec) -> Result<()> {
        self.table(chart.data)?;
        if let Some(renderer) = &mut self.renderer {
            if let Some(path) = renderer.render(&chart)? {
                info!("wrote {path:?}");
            }
        }
        Ok(())
    }
}

fn load_with_naming(config_opts: &ConfigOpts, naming: Option<String>) -> Result<CheckedConfig> {
    let config = config_opts.load()?;
    if let Some(version) = naming {
        config.with_naming(&NamingChoice::Builtin(KString::from_string(version)))
    } else {
        Ok(config)
    }
}

fn load_dataset(config: &CheckedConfig, dir: &Path) -> Result<DatasetBuild> {
    let build = build_dataset(dir, &config.dataset_options())?;
    if !build.discarded.is_empty() {
        warn!(
            "{} of {} result files discarded",
            build.discarded.len(),
            build.discarded.len() + build.accepted.len()
        );
    }
    Ok(build)
}

fn sub_results(config: &CheckedConfig, dir: &Path, output: &mut Output) -> Result<()> {
    let DatasetBuild { dataset, .. } = load_dataset(config, dir)?;
    let analysis = config.config();
    let display = analysis.display;

    let runs = run_times(&dataset);
    info!(
        "parameters varying between the runs: {:?}",
        varying_parameters(&runs)
    );
    output.table(&runs)?;
    output.table(&per_phase_maxima(&dataset))?;

    let counts = count_runs(&runs, &analysis.count_by);
    output.chart(ChartSpec {
        stem: format!("{}_{}_repetitions", display.nodes, display.cpus),
        title: "Repetitions per configuration".into(),
        x_label: "configuration".into(),
        y_label: "runs".into(),
        format: analysis.format,
        data: &counts,
    })?;

    for &varying in &analysis.vary {
        let table = mean_over_repeats(&runs, config.defaults(), varying);
        if table.is_empty() {
            warn!("no runs in the default configuration for varying {varying}");
        }
        output.chart(ChartSpec {
            stem: vary_param_stem(varying, display),
            title: vary_param_title(varying, config.defaults(), display),
            x_label: varying.name().into(),
            y_label: "time (s)".into(),
            format: analysis.format,
            data: &table,
        })?;
    }
    Ok(())
}

fn pingpong_series(path: &Path, output: &mut Output, format: ImageFormat) -> Result<()> {
    let series = PingpongSeries::read_file(path)?;
    let table = series.table();
    output.chart(ChartSpec {
        stem: series.chart_stem().to_owned(),
        title: series.name.clone(),
        x_label: "log(packet size)".into(),
        y_label: "time (ms), bandwidth (MB/s)".into(),
        format,
        data: &table,
    })
}

fn main() -> Result<()> {
    let Opts { log_level, command } = Opts::parse();
    init_logging(log_level.into());

    match command {
        Command::Version => println!("{PROGRAM_NAME} version {}", env!("CARGO_PKG_VERSION")),

        Command::DefaultConfig { format } => {
            let backend = match format.as_str() {
                "json5" | "json" => ConfigBackend::Json5,
                "yaml" | "yml" => ConfigBackend::Yaml,
                _ => bail!("unknown config format {format:?}, expecting json5 or yaml"),
            };
            println!("{}", backend.to_config_string(&AnalysisConfig::default())?);
        }

        Command::SubResults {
            config_opts,
            output_opts,
            naming,
            dir,
        } => {
            let config = load_with_naming(&config_opts, naming)?;
            let mut output = Output::new(&output_opts)?;
            sub_results(&config, &dir, &mut output)?;
        }

        Command::Count {
            config_opts,
            tsv,
            target,
            naming,
            dir,
        } => {
            let config = load_with_naming(&config_opts, naming)?;
            let target = target.unwrap_or(config.config().repetitions_target);
            let DatasetBuild { dataset, .. } = load_dataset(&config, &dir)?;
            let counts = count_runs(&run_times(&dataset), &config.config().count_by);
            let (missing, total) = repetitions_missing(&counts, target);
            let mut output = Output::new(&OutputOpts { out: None, tsv })?;
            output.table(&counts)?;
            output.table(&missing)?;
            println!("{total} runs missing in total");
        }

        Command::Pingpong { output_opts, paths } => {
            let mut output = Output::new(&output_opts)?;
            for path in &paths {
                pingpong_series(path, &mut output, ImageFormat::default())?;
            }
        }

        Command::PingpongCompare { output_opts, a, b } => {
            let mut output = Output::new(&output_opts)?;
            let a = PingpongSeries::read_file(&a)?;
            let b = PingpongSeries::read_file(&b)?;
            let table = compare_bandwidth(&a, &b);
            output.chart(ChartSpec {
                stem: compare_stem(&a, &b),
                title: format!("Comparison {} {}", a.name, b.name),
                x_label: "log(packet size)".into(),
                y_label: "bandwidth (MB/s)".into(),
                format: ImageFormat::default(),
                data: &table,
            })?;
        }

        Command::PingpongDir {
            config_opts,
            output_opts,
            dir,
        } => {
            let config = config_opts.load()?;
            let analysis = config.config();
            let mut output = Output::new(&output_opts)?;
            let files = series_files(&dir, &analysis.pingpong_non_data_suffixes)?;
            if files.is_empty() {
                warn!("no pingpong series found in {dir:?}");
            }
            for path in &files {
                pingpong_series(path, &mut output, analysis.format)?;
            }
        }
    }

    Ok(())
}
