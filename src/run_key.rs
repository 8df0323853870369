//! The identity of a benchmark run, recovered from its result file
//! name.

use std::fmt::Display;

use itertools::Itertools;
use kstring::KString;

use crate::{
    decimal::Decimal,
    error::InputError,
    naming::{FieldName, NamingConvention},
    params::{ParamValue, Parameter, Schedule},
};

/// The parameters a run executed under. Fields that the active naming
/// convention doesn't carry are `None`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Configuration {
    pub support: Decimal,
    pub processes: u32,
    pub threads: u32,
    pub density: Decimal,
    pub schedule: Option<Schedule>,
    pub nodes: Option<u32>,
    pub cpus: Option<u32>,
}

impl Configuration {
    pub fn get(&self, param: Parameter) -> Option<ParamValue> {
        match param {
            Parameter::Support => Some(ParamValue::Decimal(self.support.clone())),
            Parameter::Processes => Some(ParamValue::Count(self.processes)),
            Parameter::Threads => Some(ParamValue::Count(self.threads)),
            Parameter::Density => Some(ParamValue::Decimal(self.density.clone())),
            Parameter::Schedule => self.schedule.map(ParamValue::Schedule),
            Parameter::Nodes => self.nodes.map(ParamValue::Count),
            Parameter::Cpus => self.cpus.map(ParamValue::Count),
        }
    }

    /// The values for `params`, in that order
    pub fn project(&self, params: &[Parameter]) -> Vec<Option<ParamValue>> {
        params.iter().map(|p| self.get(*p)).collect()
    }

    /// Single-process, single-thread runs
    pub fn is_sequential(&self) -> bool {
        self.processes == 1 && self.threads == 1
    }
}

impl Display for Configuration {
    /// "S=0.0001 P=16 T=8 D=0.6" plus the optional fields that are set
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = [
            Parameter::Support,
            Parameter::Processes,
            Parameter::Threads,
            Parameter::Density,
            Parameter::Schedule,
            Parameter::Nodes,
            Parameter::Cpus,
        ]
        .into_iter()
        .filter_map(|p| Some(format!("{}={}", p.short(), self.get(p)?)));
        write!(f, "{}", parts.format(" "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunKey {
    /// Run identity and sort key, e.g. "2021-06-09-12-20-39"
    pub timestamp: KString,
    pub token: Option<KString>,
    pub configuration: Configuration,
}

fn parse_field<T: std::str::FromStr>(
    name: &str,
    field: FieldName,
    value: &str,
) -> Result<T, InputError> {
    value.parse().map_err(|_| InputError::InvalidField {
        name: name.to_owned(),
        field,
        value: value.to_owned(),
        kind: field.kind(),
    })
}

impl RunKey {
    /// Recover the run key from a result file name (without
    /// directory). Fails on a token count mismatch or a field that
    /// doesn't validate, never assigns fields on a best effort basis.
    pub fn from_file_name(name: &str, convention: &NamingConvention) -> Result<Self, InputError> {
        let rest = name
            .strip_prefix(convention.prefix.as_str())
            .ok_or_else(|| InputError::MissingPrefix {
                name: name.to_owned(),
                prefix: convention.prefix.clone(),
            })?;
        let tokens: Vec<&str> = rest.split(convention.delimiter).collect();
        if tokens.len() != convention.fields.len() {
            return Err(InputError::FieldCount {
                name: name.to_owned(),
                delimiter: convention.delimiter,
                convention: convention.version.clone(),
                found: tokens.len(),
                expected: convention.fields.len(),
            });
        }

        let mut timestamp = None;
        let mut token = None;
        let mut support = None;
        let mut processes = None;
        let mut threads = None;
        let mut density = None;
        let mut schedule = None;
        let mut nodes = None;
        let mut cpus = None;

        for (field, value) in convention.fields.iter().copied().zip(tokens) {
            match field {
                FieldName::Timestamp | FieldName::Token => {
                    if value.is_empty() {
                        return Err(InputError::InvalidField {
                            name: name.to_owned(),
                            field,
                            value: value.to_owned(),
                            kind: field.kind(),
                        });
                    }
                    let value = Some(KString::from_ref(value));
                    if field == FieldName::Timestamp {
                        timestamp = value;
                    } else {
                        token = value;
                    }
                }
                FieldName::Support => support = Some(parse_field(name, field, value)?),
                FieldName::Density => density = Some(parse_field(name, field, value)?),
                FieldName::Processes => processes = Some(parse_field(name, field, value)?),
                FieldName::Threads => threads = Some(parse_field(name, field, value)?),
                FieldName::Nodes => nodes = Some(parse_field(name, field, value)?),
                FieldName::Cpus => cpus = Some(parse_field(name, field, value)?),
                FieldName::Schedule => schedule = Some(parse_field(name, field, value)?),
            }
        }

        let missing = |field| InputError::MissingField {
            name: name.to_owned(),
            convention: convention.version.clone(),
            field,
        };
        Ok(RunKey {
            timestamp: timestamp.ok_or_else(|| missing(FieldName::Timestamp))?,
            token,
            configuration: Configuration {
                support: support.ok_or_else(|| missing(FieldName::Support))?,
                processes: processes.ok_or_else(|| missing(FieldName::Processes))?,
                threads: threads.ok_or_else(|| missing(FieldName::Threads))?,
                density: density.ok_or_else(|| missing(FieldName::Density))?,
                schedule,
                nodes,
                cpus,
            },
        })
    }

    /// The file name this key would be recovered from. None if the
    /// convention needs a field this key doesn't have.
    pub fn to_file_name(&self, convention: &NamingConvention) -> Option<String> {
        let c = &self.configuration;
        let values = convention
            .fields
            .iter()
            .map(|field| -> Option<String> {
                Some(match field {
                    FieldName::Timestamp => self.timestamp.to_string(),
                    FieldName::Token => self.token.as_ref()?.to_string(),
                    FieldName::Support => c.support.to_string(),
                    FieldName::Processes => c.processes.to_string(),
                    FieldName::Threads => c.threads.to_string(),
                    FieldName::Density => c.density.to_string(),
                    FieldName::Schedule => c.schedule?.to_string(),
                    FieldName::Nodes => c.nodes?.to_string(),
                    FieldName::Cpus => c.cpus?.to_string(),
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(format!(
            "{}{}",
            convention.prefix,
            values.join(&convention.delimiter.to_string())
        ))
    }
}

impl Display for RunKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.timestamp, self.configuration)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn t_from_file_name_v1() -> Result<()> {
        let v1 = NamingConvention::builtin("v1")?;
        let key = RunKey::from_file_name("out_T1_msg_0.0001_16_8_0.6", &v1)?;
        assert_eq!(key.timestamp.as_str(), "T1");
        assert_eq!(key.configuration.support.as_str(), "0.0001");
        assert_eq!(key.configuration.processes, 16);
        assert_eq!(key.configuration.threads, 8);
        assert_eq!(key.configuration.density.as_str(), "0.6");
        assert_eq!(key.configuration.schedule, None);
        assert_eq!(key.to_string(), "T1 S=0.0001 P=16 T=8 D=0.6");
        Ok(())
    }

    #[test]
    fn t_from_file_name_v3() -> Result<()> {
        let v3 = NamingConvention::builtin("v3")?;
        let key = RunKey::from_file_name("out_T2_x_0.001_4_2_0.8_guided_16_8", &v3)?;
        assert_eq!(key.configuration.schedule, Some(Schedule::Guided));
        assert_eq!(key.configuration.nodes, Some(16));
        assert_eq!(key.configuration.cpus, Some(8));
        Ok(())
    }

    #[test]
    fn t_field_count_mismatch_fails() -> Result<()> {
        let v1 = NamingConvention::builtin("v1")?;
        let v2 = NamingConvention::builtin("v2")?;
        let name = "out_T1_msg_0.0001_16_8_0.6_static";
        assert!(matches!(
            RunKey::from_file_name(name, &v1),
            Err(InputError::FieldCount {
                found: 7,
                expected: 6,
                ..
            })
        ));
        assert!(RunKey::from_file_name(name, &v2).is_ok());
        Ok(())
    }

    #[test]
    fn t_invalid_fields() -> Result<()> {
        let v2 = NamingConvention::builtin("v2")?;
        for name in [
            "out_T1_msg_x_16_8_0.6_static",
            "out_T1_msg_0.1_sixteen_8_0.6_static",
            "out_T1_msg_0.1_16_8_0.6_auto",
            "out__msg_0.1_16_8_0.6_static",
        ] {
            assert!(
                matches!(
                    RunKey::from_file_name(name, &v2),
                    Err(InputError::InvalidField { .. })
                ),
                "{name}"
            );
        }
        assert!(matches!(
            RunKey::from_file_name("res_T1_msg_0.1_16_8_0.6_static", &v2),
            Err(InputError::MissingPrefix { .. })
        ));
        Ok(())
    }

    #[test]
    fn t_reserialise_idempotent() -> Result<()> {
        for (version, name) in [
            ("v1", "out_T1_msg_0.0001_16_8_0.6"),
            ("v2", "out_2021-06-09-12-20-39_a_0.00010_2_1_0.60_dynamic"),
            ("v3", "out_T9_b_1_1_1_1_static_2_4"),
        ] {
            let c = NamingConvention::builtin(version)?;
            let key = RunKey::from_file_name(name, &c)?;
            let renamed = key.to_file_name(&c).expect("all fields present");
            assert_eq!(renamed, name);
            assert_eq!(RunKey::from_file_name(&renamed, &c)?, key);
        }
        Ok(())
    }
}
