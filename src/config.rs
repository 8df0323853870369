//! The analysis configuration: how result files are named, what
//! marks a completed run, and which defaults the "vary one
//! parameter" charts hold the other parameters at.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use itertools::Itertools;
use kstring::KString;

use crate::{
    chart::{DisplayNodes, ImageFormat},
    config_file::LoadConfigFile,
    dataset::{CompletionMarker, DatasetOptions},
    naming::NamingConvention,
    params::{DefaultConfig, Parameter},
    pingpong::DEFAULT_NON_DATA_SUFFIXES,
};

/// Either the version of a built-in convention, "v1" etc., or a full
/// convention.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum NamingChoice {
    Builtin(KString),
    Explicit(NamingConvention),
}

impl NamingChoice {
    pub fn resolve(&self) -> Result<NamingConvention> {
        let convention = match self {
            NamingChoice::Builtin(version) => NamingConvention::builtin(version)?,
            NamingChoice::Explicit(convention) => convention.clone(),
        };
        convention.check()?;
        Ok(convention)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct AnalysisConfig {
    pub naming: NamingChoice,
    pub completion_marker: CompletionMarker,
    /// Values the parameters not being varied are held at
    pub defaults: BTreeMap<Parameter, KString>,
    /// Only used in chart titles and file names
    pub display: DisplayNodes,
    /// One chart per parameter listed here
    pub vary: Vec<Parameter>,
    pub format: ImageFormat,
    pub zero_sequential_completion_time: bool,
    /// The parameters that make up a configuration when counting runs
    pub count_by: Vec<Parameter>,
    /// How many repetitions of each configuration are wanted
    pub repetitions_target: u32,
    pub pingpong_non_data_suffixes: Vec<KString>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let defaults = [
            (Parameter::Support, "0.0001"),
            (Parameter::Processes, "16"),
            (Parameter::Threads, "8"),
            (Parameter::Density, "0.6"),
        ]
        .into_iter()
        .map(|(p, v)| (p, KString::from_static(v)))
        .collect();
        let sweep = vec![Parameter::Processes, Parameter::Threads, Parameter::Density];
        Self {
            naming: NamingChoice::Builtin(KString::from_static("v1")),
            completion_marker: CompletionMarker::default(),
            defaults,
            display: DisplayNodes::default(),
            vary: sweep.clone(),
            format: ImageFormat::default(),
            zero_sequential_completion_time: false,
            count_by: sweep,
            repetitions_target: 50,
            pingpong_non_data_suffixes: DEFAULT_NON_DATA_SUFFIXES
                .iter()
                .copied()
                .map(KString::from_static)
                .collect(),
        }
    }
}

impl LoadConfigFile for AnalysisConfig {}

impl AnalysisConfig {
    pub fn check(self) -> Result<CheckedConfig> {
        let naming = self.naming.resolve().context("naming convention")?;
        let defaults = DefaultConfig::from_texts(&self.defaults)?;
        for (name, params) in [("vary", &self.vary), ("count_by", &self.count_by)] {
            if let Some(dup) = params.iter().duplicates().next() {
                bail!("parameter {dup} listed more than once in `{name}`")
            }
        }
        if self.completion_marker.message.is_empty() {
            bail!("completion marker message must not be empty")
        }
        if self.count_by.is_empty() {
            bail!("`count_by` must list at least one parameter")
        }
        if self.pingpong_non_data_suffixes.iter().any(|s| s.is_empty()) {
            bail!("empty pingpong non-data suffix would ignore every file")
        }
        Ok(CheckedConfig {
            naming,
            defaults,
            config: self,
        })
    }
}

/// Using private fields, to enforce calling .check()
#[derive(Debug, Clone)]
pub struct CheckedConfig {
    naming: NamingConvention,
    defaults: DefaultConfig,
    config: AnalysisConfig,
}

impl CheckedConfig {
    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    pub fn defaults(&self) -> &DefaultConfig {
        &self.defaults
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn dataset_options(&self) -> DatasetOptions<'_> {
        DatasetOptions {
            naming: &self.naming,
            completion_marker: &self.config.completion_marker,
            zero_sequential_completion_time: self.config.zero_sequential_completion_time,
        }
    }

    /// Replace the naming convention, e.g. from the command line
    pub fn with_naming(mut self, naming: &NamingChoice) -> Result<Self> {
        self.naming = naming.resolve()?;
        self.config.naming = naming.clone();
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;
    use crate::{config_file::ConfigBackend, naming::FieldName, params::ParamValue};

    #[test]
    fn t_default_checks() -> Result<()> {
        let config = AnalysisConfig::default().check()?;
        assert_eq!(config.naming().version.as_str(), "v1");
        assert_eq!(
            config.defaults().get(Parameter::Processes),
            Some(&ParamValue::Count(16))
        );
        assert_eq!(config.config().repetitions_target, 50);
        Ok(())
    }

    #[test]
    fn t_json5() -> Result<()> {
        let config: AnalysisConfig = ConfigBackend::Json5.from_config_str(
            "{
                // newer harness
                naming: 'v3',
                defaults: { processes: '4', threads: '2' },
                vary: ['support'],
                format: 'pdf',
            }",
        )?;
        assert_eq!(config.naming, NamingChoice::Builtin("v3".into()));
        assert_eq!(config.format, ImageFormat::Pdf);
        assert_eq!(config.repetitions_target, 50);
        let config = config.check()?;
        assert_eq!(config.naming().fields.len(), 9);
        Ok(())
    }

    #[test]
    fn t_yaml_explicit_naming() -> Result<()> {
        let config: AnalysisConfig = ConfigBackend::Yaml.from_config_str(
            "naming:
  version: custom
  prefix: res-
  delimiter: '-'
  fields: [timestamp, processes, threads, support, density]
",
        )?;
        let config = config.check()?;
        assert_eq!(config.naming().delimiter, '-');
        assert_eq!(config.naming().fields[1], FieldName::Processes);
        Ok(())
    }

    #[test]
    fn t_check_rejects() -> Result<()> {
        let mut config = AnalysisConfig::default();
        config.vary.push(Parameter::Threads);
        assert!(config.check().is_err());

        let mut config = AnalysisConfig::default();
        config.naming = NamingChoice::Builtin("v9".into());
        assert!(config.check().is_err());

        let mut config = AnalysisConfig::default();
        config.defaults.insert(Parameter::Threads, "many".into());
        assert!(config.check().is_err());

        assert!(ConfigBackend::Json5
            .from_config_str::<AnalysisConfig>("{ colour: 'red' }")
            .is_err());
        Ok(())
    }

    #[test]
    fn t_config_string_round_trip() -> Result<()> {
        let config = AnalysisConfig::default();
        for backend in [ConfigBackend::Json5, ConfigBackend::Yaml] {
            let s = backend.to_config_string(&config)?;
            let back: AnalysisConfig = backend.from_config_str(&s)?;
            assert_eq!(back, config);
        }
        Ok(())
    }
}
