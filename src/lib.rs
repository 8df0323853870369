//! Evaluation of benchmark sweeps: pingpong bandwidth series and the
//! sub-results of parallel frequent itemset mining runs, reduced to
//! chart-ready summary tables.

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod config_file;
pub mod dataset;
pub mod decimal;
pub mod error;
pub mod join;
pub mod naming;
pub mod params;
pub mod pingpong;
pub mod record;
pub mod run_key;
pub mod table_view;
pub mod terminal_table;
pub mod utillib;
