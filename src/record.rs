//! Parsing of the two benchmark output formats into records.

//! Pingpong: one line per measurement, e.g.
//! `Seconds for size         10: 0.000012, bandwidth: 833333.333bytes/s`,
//! three colon separated fields.

//! Sub-results: one small CSV file per run, ", " separated, with a
//! header containing at least `rank`, `msg` and `time`.

use kstring::KString;
use lazy_static::lazy_static;
use regex::Regex;

use crate::error::InputError;

pub const PINGPONG_BANDWIDTH_UNIT: &str = "bytes/s";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PingpongRecord {
    /// Bytes
    pub packet_size: u64,
    /// Seconds
    pub elapsed_time: f64,
    /// Bytes per second
    pub bandwidth: f64,
}

impl PingpongRecord {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_time * 1000.
    }

    pub fn bandwidth_mb_per_s(&self) -> f64 {
        self.bandwidth / 1_000_000.
    }
}

lazy_static! {
    static ref SIZE_TOKEN: Regex = Regex::new(r"\bsize\s+(\d+)\s*$").expect("valid regex");
}

fn parse_float(s: &str, what: &str, line: usize) -> Result<f64, InputError> {
    let s = s.trim();
    let x: f64 = s.parse().map_err(|_| InputError::MalformedLine {
        line,
        reason: format!("{what} is not a number: {s:?}"),
    })?;
    if x.is_finite() {
        Ok(x)
    } else {
        Err(InputError::MalformedLine {
            line,
            reason: format!("{what} is not finite: {s:?}"),
        })
    }
}

/// Parse a single pingpong line, `line` is the 1-based line number
/// used in errors. A line that doesn't have all three fields in the
/// expected shape is an error, not a partial record.
pub fn parse_pingpong_line(text: &str, line: usize) -> Result<PingpongRecord, InputError> {
    let fields: Vec<&str> = text
        .trim_end_matches(|c| c == '\n' || c == '\r')
        .split(':')
        .collect();
    if fields.len() != 3 {
        return Err(InputError::MalformedLine {
            line,
            reason: format!("expected 3 ':' separated fields, got {}", fields.len()),
        });
    }

    let packet_size = SIZE_TOKEN
        .captures(fields[0])
        .and_then(|c| c.get(1))
        .ok_or_else(|| InputError::MalformedLine {
            line,
            reason: format!("no \"size <N>\" token in {:?}", fields[0]),
        })?
        .as_str()
        .parse::<u64>()
        .map_err(|e| InputError::MalformedLine {
            line,
            reason: format!("packet size out of range: {e}"),
        })?;

    let (seconds, _suffix) = fields[1]
        .split_once(',')
        .ok_or_else(|| InputError::MalformedLine {
            line,
            reason: format!("elapsed time field is not ','-terminated: {:?}", fields[1]),
        })?;
    let elapsed_time = parse_float(seconds, "elapsed time", line)?;

    let bandwidth = fields[2]
        .trim_end()
        .strip_suffix(PINGPONG_BANDWIDTH_UNIT)
        .ok_or_else(|| InputError::MalformedLine {
            line,
            reason: format!(
                "bandwidth field does not end in {PINGPONG_BANDWIDTH_UNIT:?}: {:?}",
                fields[2]
            ),
        })?;
    let bandwidth = parse_float(bandwidth, "bandwidth", line)?;

    Ok(PingpongRecord {
        packet_size,
        elapsed_time,
        bandwidth,
    })
}

/// Parse all lines, dropping (and returning) the ones that don't
/// parse, e.g. the "Hostname: .." banner.
pub fn parse_pingpong_lines(text: &str) -> (Vec<PingpongRecord>, Vec<InputError>) {
    let mut records = Vec::new();
    let mut dropped = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_pingpong_line(line, i + 1) {
            Ok(r) => records.push(r),
            Err(e) => dropped.push(e),
        }
    }
    (records, dropped)
}

/// One row of a sub-results file: how long `msg` (a phase of the
/// mining pipeline) took on `rank`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct SubResultRecord {
    pub rank: u32,
    pub msg: KString,
    /// Seconds
    pub time: f64,
}

pub const SUB_RESULTS_COLUMNS: &[&str] = &["rank", "msg", "time"];

/// The rows of one sub-results file body, and the rows that were
/// dropped for being malformed.
#[derive(Debug, Default)]
pub struct SubResultsBody {
    pub records: Vec<SubResultRecord>,
    pub dropped: Vec<InputError>,
}

/// Parse a sub-results CSV body. A header without the required
/// columns fails the whole body; malformed data rows are dropped.
pub fn parse_sub_results(input: &[u8]) -> Result<SubResultsBody, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| InputError::MalformedRow {
            row: 0,
            reason: format!("unreadable header: {e}"),
        })?
        .clone();
    for &column in SUB_RESULTS_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(InputError::MissingColumn(column));
        }
    }

    let mut body = SubResultsBody::default();
    for (i, result) in reader.deserialize::<SubResultRecord>().enumerate() {
        let row = i + 1;
        match result {
            Ok(record) if record.time.is_finite() => body.records.push(record),
            Ok(record) => body.dropped.push(InputError::MalformedRow {
                row,
                reason: format!("time is not finite: {}", record.time),
            }),
            Err(e) => body.dropped.push(InputError::MalformedRow {
                row,
                reason: e.to_string(),
            }),
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn t_pingpong_lines() {
        let (records, dropped) = parse_pingpong_lines(
            "x size 10:0.001,rest:500000000bytes/s\n\
             x size 20:0.002,rest:250000000bytes/s\n",
        );
        assert!(dropped.is_empty());
        assert_eq!(
            records,
            [
                PingpongRecord {
                    packet_size: 10,
                    elapsed_time: 0.001,
                    bandwidth: 5e8
                },
                PingpongRecord {
                    packet_size: 20,
                    elapsed_time: 0.002,
                    bandwidth: 2.5e8
                }
            ]
        );
    }

    #[test]
    fn t_pingpong_harness_output() -> Result<()> {
        let r = parse_pingpong_line(
            "Seconds for size       1024: 0.000512, bandwidth: 2000000.000bytes/s",
            1,
        )?;
        assert_eq!(r.packet_size, 1024);
        assert!((r.elapsed_ms() - 0.512).abs() < 1e-12);
        assert_eq!(r.bandwidth_mb_per_s(), 2.0);
        Ok(())
    }

    #[test]
    fn t_pingpong_rejects() {
        for line in [
            "Hostname: node-1",
            "x size ten:0.001,rest:5bytes/s",
            "x size 10:0.001 rest:5bytes/s",
            "x size 10:abc,rest:5bytes/s",
            "x size 10:0.001,rest:5",
            "x size 10:0.001,rest:fivebytes/s",
            "x size 10:0.001,rest:5bytes/s:extra",
        ] {
            assert!(
                matches!(
                    parse_pingpong_line(line, 3),
                    Err(InputError::MalformedLine { line: 3, .. })
                ),
                "{line}"
            );
        }
    }

    #[test]
    fn t_sub_results() -> Result<()> {
        let body = parse_sub_results(
            b"rank, msg, time, extra\n\
              0, received global tree, 1.0, a\n\
              1, x, 2.0, b\n\
              one, x, 2.0, c\n\
              2, y, 0.5, d\n",
        )?;
        assert_eq!(body.records.len(), 3);
        assert_eq!(body.records[0].msg.as_str(), "received global tree");
        assert_eq!(body.records[1].time, 2.0);
        assert_eq!(body.dropped.len(), 1);
        assert!(matches!(body.dropped[0], InputError::MalformedRow { row: 3, .. }));
        Ok(())
    }

    #[test]
    fn t_sub_results_missing_column() {
        assert!(matches!(
            parse_sub_results(b"rank, message, time\n0, a, 1.0\n"),
            Err(InputError::MissingColumn("msg"))
        ));
    }
}
