//! Parameter values that the benchmark harness records as decimal
//! strings (e.g. support "0.0001", density "0.6"). The text as
//! written is kept for display and for re-creating file names, while equality
//! and ordering go by the numeric value: "16" sorts after "8", and
//! "0.60" equals "0.6".

use std::{
    cmp::Ordering,
    fmt::Display,
    hash::{Hash, Hasher},
    str::FromStr,
};

use kstring::KString;
use noisy_float::types::R64;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("not a finite decimal number: {0:?}")]
pub struct DecimalError(pub String);

#[derive(Debug, Clone)]
pub struct Decimal {
    text: KString,
    value: R64,
}

impl Decimal {
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: f64 = trimmed.parse().map_err(|_| DecimalError(s.to_owned()))?;
        let value = R64::try_new(value).ok_or_else(|| DecimalError(s.to_owned()))?;
        Ok(Decimal {
            text: KString::from_ref(trimmed),
            value,
        })
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}
