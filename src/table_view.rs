//! A representation of tables as title row and body rows of strings,
//! independent of the output format (terminal, TSV, CSV data files).

use std::{borrow::Cow, sync::Arc};

use kstring::KString;

use crate::{params::ParamValue, record::PingpongRecord, run_key::RunKey};

/// Writes a value as one or more table cells. The number of cells
/// must be the same for all values of a type, as the column titles
/// are given once per table.
pub trait Cells {
    fn push_cells(&self, out: &mut Vec<String>);
}

impl Cells for f64 {
    fn push_cells(&self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl Cells for u32 {
    fn push_cells(&self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl Cells for usize {
    fn push_cells(&self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

impl Cells for KString {
    fn push_cells(&self, out: &mut Vec<String>) {
        out.push(self.as_str().to_owned());
    }
}

impl Cells for ParamValue {
    fn push_cells(&self, out: &mut Vec<String>) {
        out.push(self.to_string());
    }
}

/// `None` is an empty cell
impl<T: Cells> Cells for Option<T> {
    fn push_cells(&self, out: &mut Vec<String>) {
        match self {
            Some(v) => v.push_cells(out),
            None => out.push(String::new()),
        }
    }
}

/// All elements side by side; only usable where the length is fixed
/// per table (e.g. a projection onto a fixed list of parameters).
impl<T: Cells> Cells for Vec<T> {
    fn push_cells(&self, out: &mut Vec<String>) {
        for v in self {
            v.push_cells(out);
        }
    }
}

impl<A: Cells, B: Cells> Cells for (A, B) {
    fn push_cells(&self, out: &mut Vec<String>) {
        self.0.push_cells(out);
        self.1.push_cells(out);
    }
}

impl<T: Cells + ?Sized> Cells for Arc<T> {
    fn push_cells(&self, out: &mut Vec<String>) {
        (**self).push_cells(out)
    }
}

/// "timestamp", "configuration"
impl Cells for RunKey {
    fn push_cells(&self, out: &mut Vec<String>) {
        out.push(self.timestamp.as_str().to_owned());
        out.push(self.configuration.to_string());
    }
}

pub const RUN_KEY_COLUMNS: &[&str] = &["timestamp", "configuration"];

/// "packet size", "time (ms)", "bandwidth (MB/s)"
impl Cells for PingpongRecord {
    fn push_cells(&self, out: &mut Vec<String>) {
        out.push(self.packet_size.to_string());
        out.push(self.elapsed_ms().to_string());
        out.push(self.bandwidth_mb_per_s().to_string());
    }
}

pub const PINGPONG_COLUMNS: &[&str] = &["packet size", "time (ms)", "bandwidth (MB/s)"];

/// A full table. dyn compatible.
pub trait TableView {
    fn table_name(&self) -> Cow<str>;

    /// Column titles, keys first
    fn table_view_header(&self) -> Vec<Cow<str>>;

    fn table_view_body<'s>(&'s self) -> Box<dyn Iterator<Item = Vec<String>> + 's>;

    fn table_is_empty(&self) -> bool;
}
