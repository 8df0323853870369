//! Recoverable input errors: problems with a single file name, log
//! line or CSV row. They are reported and the offending unit is
//! skipped; anything fatal (I/O, config) is an `anyhow::Error`
//! instead.

use std::path::PathBuf;

use kstring::KString;

use crate::naming::{FieldKind, FieldName};

#[derive(thiserror::Error, Debug, Clone)]
pub enum InputError {
    #[error("file name {name:?} does not start with {prefix:?}")]
    MissingPrefix { name: String, prefix: KString },

    #[error(
        "file name {name:?} has {found} fields separated by {delimiter:?}, \
         naming convention {convention:?} expects {expected}"
    )]
    FieldCount {
        name: String,
        delimiter: char,
        convention: KString,
        found: usize,
        expected: usize,
    },

    #[error("file name {name:?}: field {field} = {value:?} is not a valid {kind}")]
    InvalidField {
        name: String,
        field: FieldName,
        value: String,
        kind: FieldKind,
    },

    #[error("file name {name:?}: naming convention {convention:?} is missing field {field}")]
    MissingField {
        name: String,
        convention: KString,
        field: FieldName,
    },

    #[error("line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("header is missing column {0:?}")]
    MissingColumn(&'static str),

    #[error("incomplete run: no {message:?} record for rank {rank}")]
    IncompleteRun { message: KString, rank: u32 },
}

/// An input error together with the file it was found in.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub error: InputError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.path, self.error)
    }
}
