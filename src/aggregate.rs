//! Reducing a `Dataset` (or a previous summary) along grouping keys
//! into `SummaryTable`s for charting.

//! Run times are computed in two steps: the phases of a rank are
//! summed up to the rank's total, then the slowest rank is taken as
//! the run's time, as a distributed run only finishes when its last
//! participant does.

use std::{borrow::Cow, collections::BTreeMap, sync::Arc};

use kstring::KString;
use strum::IntoEnumIterator;

use crate::{
    dataset::{Dataset, Row},
    join::KeyVal,
    params::{DefaultConfig, ParamValue, Parameter},
    run_key::RunKey,
    table_view::{Cells, TableView, RUN_KEY_COLUMNS},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Sum,
    Max,
    Mean,
    Count,
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    n: usize,
    sum: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            n: 0,
            sum: 0.,
            max: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, x: f64) {
        self.n += 1;
        self.sum += x;
        self.max = self.max.max(x);
    }

    /// Groups are only created with a value, thus n >= 1
    fn finish(self, reducer: Reducer) -> f64 {
        match reducer {
            Reducer::Sum => self.sum,
            Reducer::Max => self.max,
            Reducer::Mean => self.sum / self.n as f64,
            Reducer::Count => self.n as f64,
        }
    }
}

/// Group `items` by key and reduce the values of each group. The
/// result is ordered by key; no input gives no groups.
pub fn group_reduce<K: Ord>(
    items: impl IntoIterator<Item = (K, f64)>,
    reducer: Reducer,
) -> Vec<KeyVal<K, f64>> {
    let mut groups: BTreeMap<K, Accumulator> = BTreeMap::new();
    for (key, val) in items {
        groups.entry(key).or_insert_with(Accumulator::new).add(val);
    }
    groups
        .into_iter()
        .map(|(key, acc)| KeyVal {
            key,
            val: acc.finish(reducer),
        })
        .collect()
}

/// The chart-ready result of an aggregation. Never modified after
/// creation.
#[derive(Debug, Clone)]
pub struct SummaryTable<K, V = f64> {
    name: String,
    key_columns: Vec<Cow<'static, str>>,
    value_columns: Vec<Cow<'static, str>>,
    rows: Vec<KeyVal<K, V>>,
}

fn columns(names: &[&'static str]) -> Vec<Cow<'static, str>> {
    names.iter().map(|s| Cow::Borrowed(*s)).collect()
}

impl<K, V> SummaryTable<K, V> {
    pub fn new(
        name: impl Into<String>,
        key_columns: Vec<Cow<'static, str>>,
        value_columns: Vec<Cow<'static, str>>,
        rows: Vec<KeyVal<K, V>>,
    ) -> Self {
        Self {
            name: name.into(),
            key_columns,
            value_columns,
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_columns(&self) -> &[Cow<'static, str>] {
        &self.key_columns
    }

    pub fn rows(&self) -> &[KeyVal<K, V>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same columns, only the rows satisfying `pred`
    pub fn filtered(&self, name: impl Into<String>, pred: impl Fn(&K) -> bool) -> Self
    where
        K: Clone,
        V: Clone,
    {
        Self {
            name: name.into(),
            key_columns: self.key_columns.clone(),
            value_columns: self.value_columns.clone(),
            rows: self.rows.iter().filter(|kv| pred(&kv.key)).cloned().collect(),
        }
    }
}

impl<K> SummaryTable<K, f64> {
    /// Group this table's rows by a new key and reduce their values.
    pub fn regroup<K2: Ord>(
        &self,
        name: impl Into<String>,
        key_columns: Vec<Cow<'static, str>>,
        value_column: &'static str,
        key: impl Fn(&K) -> K2,
        reducer: Reducer,
    ) -> SummaryTable<K2, f64> {
        SummaryTable::new(
            name,
            key_columns,
            columns(&[value_column]),
            group_reduce(self.rows.iter().map(|kv| (key(&kv.key), kv.val)), reducer),
        )
    }
}

impl<K: Cells, V: Cells> TableView for SummaryTable<K, V> {
    fn table_name(&self) -> Cow<str> {
        Cow::Borrowed(&self.name)
    }

    fn table_view_header(&self) -> Vec<Cow<str>> {
        self.key_columns
            .iter()
            .chain(&self.value_columns)
            .map(|c| Cow::Borrowed(&**c))
            .collect()
    }

    fn table_view_body<'s>(&'s self) -> Box<dyn Iterator<Item = Vec<String>> + 's> {
        Box::new(self.rows.iter().map(|KeyVal { key, val }| {
            let mut cells = Vec::new();
            key.push_cells(&mut cells);
            val.push_cells(&mut cells);
            cells
        }))
    }

    fn table_is_empty(&self) -> bool {
        self.is_empty()
    }
}

impl Dataset {
    /// Group the rows by `key` and reduce their times.
    pub fn group_by<K: Ord>(
        &self,
        name: impl Into<String>,
        key_columns: Vec<Cow<'static, str>>,
        key: impl Fn(&Row) -> K,
        reducer: Reducer,
    ) -> SummaryTable<K, f64> {
        SummaryTable::new(
            name,
            key_columns,
            columns(&["time"]),
            group_reduce(self.rows().iter().map(|row| (key(row), row.time)), reducer),
        )
    }
}

pub type RankKey = (Arc<RunKey>, u32);

/// Total time of each rank in each run (sum over its phases).
pub fn per_rank_totals(dataset: &Dataset) -> SummaryTable<RankKey> {
    dataset.group_by(
        "time per rank",
        columns(&[RUN_KEY_COLUMNS[0], RUN_KEY_COLUMNS[1], "rank"]),
        |row| (row.run.clone(), row.rank),
        Reducer::Sum,
    )
}

/// Time of each run: its slowest rank.
pub fn per_run_totals(rank_totals: &SummaryTable<RankKey>) -> SummaryTable<Arc<RunKey>> {
    rank_totals.regroup(
        "time per run",
        columns(RUN_KEY_COLUMNS),
        "time",
        |(run, _rank)| run.clone(),
        Reducer::Max,
    )
}

/// `per_run_totals(per_rank_totals(dataset))`
pub fn run_times(dataset: &Dataset) -> SummaryTable<Arc<RunKey>> {
    per_run_totals(&per_rank_totals(dataset))
}

/// How long each phase took in each run, the slowest rank counting.
pub fn per_phase_maxima(dataset: &Dataset) -> SummaryTable<(Arc<RunKey>, KString)> {
    dataset.group_by(
        "time per phase",
        columns(&[RUN_KEY_COLUMNS[0], RUN_KEY_COLUMNS[1], "phase"]),
        |row| (row.run.clone(), row.phase.clone()),
        Reducer::Max,
    )
}

/// The runs whose parameters, other than `varying`, all have their
/// default values. Applying it to its own output changes nothing.
pub fn default_config_filter<V: Clone>(
    runs: &SummaryTable<Arc<RunKey>, V>,
    defaults: &DefaultConfig,
    varying: Parameter,
) -> SummaryTable<Arc<RunKey>, V> {
    runs.filtered(format!("{} (default configuration)", runs.name()), |run| {
        defaults.matches(&run.configuration, varying)
    })
}

/// The parameters present in any of the runs
fn present_parameters(runs: &[KeyVal<Arc<RunKey>, f64>]) -> Vec<Parameter> {
    Parameter::iter()
        .filter(|p| runs.iter().any(|kv| kv.key.configuration.get(*p).is_some()))
        .collect()
}

fn param_column_names(params: &[Parameter]) -> Vec<Cow<'static, str>> {
    params.iter().map(|p| Cow::Borrowed(p.name())).collect()
}

pub type ParamValues = Vec<Option<ParamValue>>;

/// For every value of `varying`, the mean run time over the repeated
/// runs in the default configuration, ordered numerically by that
/// value. Runs lacking `varying` (not part of their naming
/// convention) are left out.
pub fn mean_over_repeats(
    run_times: &SummaryTable<Arc<RunKey>>,
    defaults: &DefaultConfig,
    varying: Parameter,
) -> SummaryTable<ParamValues> {
    let filtered = default_config_filter(run_times, defaults, varying);
    let filtered = filtered.filtered(filtered.name(), |run| {
        run.configuration.get(varying).is_some()
    });
    let params = [varying];
    filtered.regroup(
        format!("time with different {}", varying.long()),
        param_column_names(&params),
        "mean time",
        |run| run.configuration.project(&params),
        Reducer::Mean,
    )
}

/// Number of valid runs per combination of `by`.
pub fn count_runs(
    run_times: &SummaryTable<Arc<RunKey>>,
    by: &[Parameter],
) -> SummaryTable<ParamValues> {
    run_times.regroup(
        "runs per configuration",
        param_column_names(by),
        "runs",
        |run| run.configuration.project(by),
        Reducer::Count,
    )
}

/// Runs still missing to reach `target` repetitions per
/// configuration in `counts`, and their total. Configurations that
/// have enough runs are left out.
pub fn repetitions_missing(
    counts: &SummaryTable<ParamValues>,
    target: u32,
) -> (SummaryTable<ParamValues>, u64) {
    let rows: Vec<KeyVal<ParamValues, f64>> = counts
        .rows()
        .iter()
        .filter_map(|kv| {
            let missing = f64::from(target) - kv.val;
            (missing > 0.).then(|| KeyVal {
                key: kv.key.clone(),
                val: missing,
            })
        })
        .collect();
    let total = rows.iter().map(|kv| kv.val as u64).sum();
    let table = SummaryTable::new(
        format!("runs missing for {target} repetitions"),
        counts.key_columns().to_vec(),
        columns(&["missing"]),
        rows,
    );
    (table, total)
}

/// The parameters that vary between the given runs, i.e. those having
/// more than one distinct value.
pub fn varying_parameters(run_times: &SummaryTable<Arc<RunKey>>) -> Vec<Parameter> {
    present_parameters(run_times.rows())
        .into_iter()
        .filter(|p| {
            let mut values = run_times
                .rows()
                .iter()
                .map(|kv| kv.key.configuration.get(*p));
            if let Some(first) = values.next() {
                values.any(|v| v != first)
            } else {
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::{
        dataset::{validate_run, CompletionMarker, DatasetOptions},
        naming::NamingConvention,
        record::SubResultRecord,
    };

    fn dataset(runs: &[(&str, &[(u32, &str, f64)])]) -> Result<Dataset> {
        dataset_named("v1", runs)
    }

    fn dataset_named(version: &str, runs: &[(&str, &[(u32, &str, f64)])]) -> Result<Dataset> {
        let naming = NamingConvention::builtin(version)?;
        let marker = CompletionMarker::default();
        let opts = DatasetOptions {
            naming: &naming,
            completion_marker: &marker,
            zero_sequential_completion_time: false,
        };
        let mut rows = Vec::new();
        for (name, records) in runs {
            let key = RunKey::from_file_name(name, &naming)?;
            let records = records
                .iter()
                .map(|(rank, msg, time)| SubResultRecord {
                    rank: *rank,
                    msg: KString::from_ref(msg),
                    time: *time,
                })
                .collect();
            rows.push(validate_run(key, records, &opts)?);
        }
        Ok(Dataset::from_runs(rows))
    }

    const DONE: &str = "received global tree";

    #[test]
    fn t_group_reduce() {
        let items = [("b", 1.), ("a", 2.), ("b", 3.), ("a", 4.), ("b", 5.)];
        let vals = |r| {
            group_reduce(items, r)
                .into_iter()
                .map(|kv| (kv.key, kv.val))
                .collect::<Vec<_>>()
        };
        assert_eq!(vals(Reducer::Sum), [("a", 6.), ("b", 9.)]);
        assert_eq!(vals(Reducer::Max), [("a", 4.), ("b", 5.)]);
        assert_eq!(vals(Reducer::Mean), [("a", 3.), ("b", 3.)]);
        assert_eq!(vals(Reducer::Count), [("a", 2.), ("b", 3.)]);
        assert!(group_reduce(Vec::<(u32, f64)>::new(), Reducer::Max).is_empty());
    }

    #[test]
    fn t_run_time_is_max_of_rank_sums() -> Result<()> {
        let ds = dataset(&[(
            "out_T1_msg_0.0001_16_8_0.6",
            &[
                (0, DONE, 1.0),
                (0, "mine", 0.5),
                (1, "x", 2.0),
                (1, "y", 0.25),
                (2, "x", 2.1),
            ],
        )])?;
        let ranks = per_rank_totals(&ds);
        assert_eq!(ranks.len(), 3);
        let runs = per_run_totals(&ranks);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs.rows()[0].val, 2.25);
        Ok(())
    }

    #[test]
    fn t_per_phase_maxima() -> Result<()> {
        let ds = dataset(&[(
            "out_T1_msg_0.0001_16_8_0.6",
            &[(0, DONE, 1.0), (0, "x", 0.5), (1, DONE, 3.0), (1, "x", 0.25)],
        )])?;
        let phases = per_phase_maxima(&ds);
        let vals: Vec<(&str, f64)> = phases
            .rows()
            .iter()
            .map(|kv| (kv.key.1.as_str(), kv.val))
            .collect();
        assert_eq!(vals, [(DONE, 3.0), ("x", 0.5)]);
        Ok(())
    }

    #[test]
    fn t_mean_over_repeats_numeric_order() -> Result<()> {
        let ds = dataset(&[
            ("out_A_m_0.0001_16_8_0.6", &[(0, DONE, 1.0)]),
            ("out_B_m_0.0001_16_8_0.6", &[(0, DONE, 3.0)]),
            ("out_C_m_0.0001_2_8_0.6", &[(0, DONE, 8.0)]),
            ("out_D_m_0.0001_8_8_0.6", &[(0, DONE, 4.0)]),
            // not in the default configuration for threads
            ("out_E_m_0.0001_8_4_0.6", &[(0, DONE, 100.0)]),
        ])?;
        let defaults: DefaultConfig =
            "support=0.0001,processes=16,threads=8,density=0.6".parse()?;
        let table = mean_over_repeats(&run_times(&ds), &defaults, Parameter::Processes);
        let vals: Vec<(String, f64)> = table
            .rows()
            .iter()
            .map(|kv| (kv.key[0].as_ref().expect("present").to_string(), kv.val))
            .collect();
        assert_eq!(
            vals,
            [
                ("2".to_string(), 8.0),
                ("8".to_string(), 4.0),
                ("16".to_string(), 2.0)
            ]
        );
        assert_eq!(table.key_columns(), ["processes"]);
        Ok(())
    }

    #[test]
    fn t_mean_over_repeats_one_point_per_value() -> Result<()> {
        let ds = dataset_named(
            "v2",
            &[
                ("out_A_m_0.0001_16_8_0.6_static", &[(0, DONE, 1.0)]),
                ("out_B_m_0.0001_16_8_0.6_dynamic", &[(0, DONE, 3.0)]),
                ("out_C_m_0.0001_8_8_0.6_static", &[(0, DONE, 5.0)]),
            ],
        )?;
        let defaults: DefaultConfig =
            "support=0.0001,processes=16,threads=8,density=0.6".parse()?;
        let table = mean_over_repeats(&run_times(&ds), &defaults, Parameter::Processes);
        let vals: Vec<(ParamValues, f64)> = table
            .rows()
            .iter()
            .map(|kv| (kv.key.clone(), kv.val))
            .collect();
        assert_eq!(
            vals,
            [
                (vec![Some(ParamValue::Count(8))], 5.0),
                (vec![Some(ParamValue::Count(16))], 2.0)
            ]
        );
        Ok(())
    }

    #[test]
    fn t_mean_over_absent_parameter_is_empty() -> Result<()> {
        let ds = dataset(&[("out_A_m_0.0001_16_8_0.6", &[(0, DONE, 1.0)])])?;
        let defaults: DefaultConfig = "processes=16".parse()?;
        let runs = run_times(&ds);
        assert!(mean_over_repeats(&runs, &defaults, Parameter::Schedule).is_empty());
        assert!(mean_over_repeats(&runs, &defaults, Parameter::Nodes).is_empty());
        assert_eq!(mean_over_repeats(&runs, &defaults, Parameter::Threads).len(), 1);
        Ok(())
    }

    #[test]
    fn t_default_filter_idempotent_and_empty() -> Result<()> {
        let ds = dataset(&[
            ("out_A_m_0.0001_16_8_0.6", &[(0, DONE, 1.0)]),
            ("out_B_m_0.0001_4_8_0.6", &[(0, DONE, 3.0)]),
            ("out_C_m_0.001_16_8_0.6", &[(0, DONE, 3.0)]),
        ])?;
        let defaults: DefaultConfig = "support=0.0001,processes=16".parse()?;
        let runs = run_times(&ds);
        let once = default_config_filter(&runs, &defaults, Parameter::Threads);
        let twice = default_config_filter(&once, &defaults, Parameter::Threads);
        assert_eq!(once.len(), 1);
        assert_eq!(once.rows(), twice.rows());

        let nothing: DefaultConfig = "support=0.5".parse()?;
        let table = mean_over_repeats(&runs, &nothing, Parameter::Processes);
        assert!(table.is_empty());
        assert!(table.table_view_body().next().is_none());
        Ok(())
    }

    #[test]
    fn t_count_and_missing() -> Result<()> {
        let ds = dataset(&[
            ("out_A_m_0.0001_16_8_0.6", &[(0, DONE, 1.0)]),
            ("out_B_m_0.0001_16_8_0.6", &[(0, DONE, 1.0)]),
            ("out_C_m_0.0001_4_8_0.6", &[(0, DONE, 1.0)]),
        ])?;
        let runs = run_times(&ds);
        let counts = count_runs(
            &runs,
            &[Parameter::Processes, Parameter::Threads, Parameter::Density],
        );
        let vals: Vec<f64> = counts.rows().iter().map(|kv| kv.val).collect();
        assert_eq!(vals, [1., 2.]);
        let (missing, total) = repetitions_missing(&counts, 2);
        assert_eq!(missing.len(), 1);
        assert_eq!(total, 1);
        assert_eq!(varying_parameters(&runs), [Parameter::Processes]);
        Ok(())
    }
}
