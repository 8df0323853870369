//! The parameters a sweep varies, their values, and the default
//! configuration that "vary one parameter" evaluations hold the other
//! parameters at.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use kstring::KString;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::{decimal::Decimal, run_key::Configuration};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    EnumIter,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    Support,
    Processes,
    Threads,
    Density,
    Schedule,
    Nodes,
    Cpus,
}

impl Parameter {
    /// Column name, as used in file names and table headers
    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn short(self) -> &'static str {
        match self {
            Parameter::Support => "S",
            Parameter::Processes => "P",
            Parameter::Threads => "T",
            Parameter::Density => "D",
            Parameter::Schedule => "O",
            Parameter::Nodes => "N",
            Parameter::Cpus => "C",
        }
    }

    /// Plural description for chart titles
    pub fn long(self) -> &'static str {
        match self {
            Parameter::Support => "supports",
            Parameter::Processes => "number of processes",
            Parameter::Threads => "number of threads",
            Parameter::Density => "frequent itemset densities",
            Parameter::Schedule => "loop schedules",
            Parameter::Nodes => "number of nodes",
            Parameter::Cpus => "number of cpus",
        }
    }

    pub fn parse_value(self, s: &str) -> Result<ParamValue> {
        let s = s.trim();
        match self {
            Parameter::Support | Parameter::Density => Ok(ParamValue::Decimal(s.parse()?)),
            Parameter::Processes | Parameter::Threads | Parameter::Nodes | Parameter::Cpus => {
                Ok(ParamValue::Count(s.parse().with_context(|| {
                    anyhow!("{} must be a non-negative integer, got {s:?}", self.name())
                })?))
            }
            Parameter::Schedule => Ok(ParamValue::Schedule(s.parse().map_err(|_| {
                anyhow!("unknown schedule {s:?}, expecting static|dynamic|guided")
            })?)),
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// OpenMP loop schedule of the benchmarked program
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    IntoStaticStr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    Static,
    Dynamic,
    Guided,
}

impl Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &'static str = (*self).into();
        f.write_str(s)
    }
}

/// A single parameter value. All values of one column share the same
/// variant, thus the derived ordering is the numeric one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamValue {
    Count(u32),
    Decimal(Decimal),
    Schedule(Schedule),
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Count(n) => write!(f, "{n}"),
            ParamValue::Decimal(d) => write!(f, "{d}"),
            ParamValue::Schedule(s) => write!(f, "{s}"),
        }
    }
}

/// The values that the non-varied parameters are held at. Immutable,
/// built once per invocation from the analysis config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultConfig {
    defaults: BTreeMap<Parameter, ParamValue>,
}

impl DefaultConfig {
    pub fn from_texts(texts: &BTreeMap<Parameter, KString>) -> Result<Self> {
        let defaults = texts
            .iter()
            .map(|(param, text)| -> Result<_> {
                let value = param
                    .parse_value(text)
                    .with_context(|| anyhow!("default value for parameter {param}"))?;
                Ok((*param, value))
            })
            .collect::<Result<_>>()?;
        Ok(Self { defaults })
    }

    pub fn get(&self, param: Parameter) -> Option<&ParamValue> {
        self.defaults.get(&param)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Parameter, &ParamValue)> {
        self.defaults.iter().map(|(p, v)| (*p, v))
    }

    /// Whether every defaulted parameter other than `varying` has its
    /// default value in `config`. A parameter missing from `config`
    /// does not match.
    pub fn matches(&self, config: &Configuration, varying: Parameter) -> bool {
        self.iter()
            .filter(|(param, _)| *param != varying)
            .all(|(param, default)| config.get(param).as_ref() == Some(default))
    }

    /// "support=0.0001, threads=8, density=0.6" (skipping `varying`)
    pub fn describe_except(&self, varying: Parameter) -> String {
        self.iter()
            .filter(|(param, _)| *param != varying)
            .map(|(param, value)| format!("{param}={value}"))
            .join(", ")
    }
}

impl FromStr for DefaultConfig {
    type Err = anyhow::Error;

    /// "processes=16,threads=8"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut texts = BTreeMap::new();
        for part in s.split(',').filter(|p| !p.trim().is_empty()) {
            let (name, value) = part
                .split_once('=')
                .ok_or_else(|| anyhow!("expecting name=value, got {part:?}"))?;
            let param: Parameter = name
                .trim()
                .parse()
                .map_err(|_| anyhow!("unknown parameter name {name:?}"))?;
            texts.insert(param, KString::from_ref(value.trim()));
        }
        Self::from_texts(&texts)
    }
}
