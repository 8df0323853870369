//! File naming conventions of the sub-results harness. The run
//! parameters are encoded positionally in the result file name; the
//! positions changed between harness versions, therefore each version
//! is an explicit, named list of fields instead of hard-coded
//! unpacking.

use std::fmt::Display;

use anyhow::{bail, Result};
use itertools::Itertools;
use kstring::KString;

/// A positional field in a result file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    Timestamp,
    /// Carried along for re-creating the name, otherwise ignored
    Token,
    Support,
    Processes,
    Threads,
    Density,
    Schedule,
    Nodes,
    Cpus,
}

impl FieldName {
    pub fn kind(self) -> FieldKind {
        match self {
            FieldName::Timestamp | FieldName::Token => FieldKind::Text,
            FieldName::Support | FieldName::Density => FieldKind::Decimal,
            FieldName::Processes | FieldName::Threads | FieldName::Nodes | FieldName::Cpus => {
                FieldKind::Count
            }
            FieldName::Schedule => FieldKind::Schedule,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Timestamp => "timestamp",
            FieldName::Token => "token",
            FieldName::Support => "support",
            FieldName::Processes => "processes",
            FieldName::Threads => "threads",
            FieldName::Density => "density",
            FieldName::Schedule => "schedule",
            FieldName::Nodes => "nodes",
            FieldName::Cpus => "cpus",
        }
    }

    /// Fields every convention must carry, since `RunKey` can't do
    /// without them.
    pub const REQUIRED: &'static [FieldName] = &[
        FieldName::Timestamp,
        FieldName::Support,
        FieldName::Processes,
        FieldName::Threads,
        FieldName::Density,
    ];
}

impl Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field's text is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any non-empty text
    Text,
    Decimal,
    /// Non-negative integer
    Count,
    /// static|dynamic|guided
    Schedule,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FieldKind::Text => "non-empty text",
            FieldKind::Decimal => "decimal number",
            FieldKind::Count => "non-negative integer",
            FieldKind::Schedule => "schedule (static|dynamic|guided)",
        })
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamingConvention {
    /// Shown in diagnostics
    pub version: KString,
    /// Only files starting with this are considered; it is stripped
    /// before splitting
    pub prefix: KString,
    pub delimiter: char,
    pub fields: Vec<FieldName>,
}

pub const BUILTIN_VERSIONS: &[&str] = &["v1", "v2", "v3"];

impl NamingConvention {
    /// `v1`: out_<timestamp>_<token>_<support>_<processes>_<threads>_<density>,
    /// `v2`: v1 plus `_<schedule>`, `v3`: v2 plus `_<nodes>_<cpus>`.
    pub fn builtin(version: &str) -> Result<Self> {
        use FieldName::*;
        let mut fields = vec![Timestamp, Token, Support, Processes, Threads, Density];
        match version {
            "v1" => (),
            "v2" => fields.push(Schedule),
            "v3" => fields.extend([Schedule, Nodes, Cpus]),
            _ => bail!(
                "unknown naming convention version {version:?}, valid are: {}",
                BUILTIN_VERSIONS.join(", ")
            ),
        }
        Ok(Self {
            version: KString::from_ref(version),
            prefix: KString::from_static("out_"),
            delimiter: '_',
            fields,
        })
    }

    /// Verify that the required fields are present, exactly once.
    pub fn check(&self) -> Result<()> {
        let Self {
            version,
            prefix,
            delimiter,
            fields,
        } = self;
        if let Some(dup) = fields.iter().duplicates().next() {
            bail!("naming convention {version:?} lists field {dup} more than once")
        }
        let missing: Vec<_> = FieldName::REQUIRED
            .iter()
            .filter(|f| !fields.contains(*f))
            .collect();
        if !missing.is_empty() {
            bail!(
                "naming convention {version:?} is missing required fields: {}",
                missing.iter().join(", ")
            )
        }
        if prefix.is_empty() {
            bail!("naming convention {version:?} has an empty prefix")
        }
        if delimiter.is_whitespace() {
            bail!("naming convention {version:?} uses a whitespace delimiter")
        }
        Ok(())
    }

    pub fn matches_prefix(&self, file_name: &str) -> bool {
        file_name.starts_with(self.prefix.as_str())
    }
}
