//! Printing `TableView`s to a terminal, aligned with bold italic
//! titles, or as TSV for further processing.

//! Cells are printed as they are, nothing is escaped. Phase names
//! containing tabs would make the TSV output ambiguous.

use std::io::Write;

use anyhow::{bail, Result};
use yansi::{Paint, Style};

use crate::table_view::TableView;

const TITLE_STYLE: Style = Style::new().bold().italic();

/// Column widths have to be known before the first row is printed.
/// The last column gets no padding.
pub struct TerminalTable {
    widths: Vec<usize>,
    /// Print tab separated, without padding and ANSI codes
    pub tsv_mode: bool,
}

impl TerminalTable {
    /// `widths` has one entry less than there are columns.
    pub fn new(widths: Vec<usize>, tsv_mode: bool) -> Self {
        Self { widths, tsv_mode }
    }

    /// Widths fitting all cells of `table`, plus one space.
    pub fn fitting(table: &dyn TableView, tsv_mode: bool) -> Self {
        let mut widths: Vec<usize> = table
            .table_view_header()
            .iter()
            // italic text can be clipped without the extra space
            .map(|title| title.len() + 1)
            .collect();
        for row in table.table_view_body() {
            for (width, cell) in widths.iter_mut().zip(&row) {
                *width = (*width).max(cell.len());
            }
        }
        widths.pop();
        let widths = widths.into_iter().map(|w| w + 1).collect();
        Self::new(widths, tsv_mode)
    }

    fn write_row<S: AsRef<str>>(
        &self,
        row: &[S],
        style: Option<Style>,
        out: &mut impl Write,
    ) -> Result<()> {
        if row.len() != self.widths.len() + 1 {
            bail!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.widths.len() + 1
            )
        }
        for (i, cell) in row.iter().enumerate() {
            let cell = cell.as_ref();
            if self.tsv_mode {
                if i > 0 {
                    out.write_all(b"\t")?;
                }
                out.write_all(cell.as_bytes())?;
                continue;
            }
            if let Some(style) = style {
                write!(out, "{}", cell.paint(style))?;
            } else {
                out.write_all(cell.as_bytes())?;
            }
            if let Some(width) = self.widths.get(i) {
                // at least 1 space even if the cell overflows
                let padding = width.saturating_sub(cell.len()).max(1);
                write!(out, "{:padding$}", "")?;
            }
        }
        out.write_all(b"\n")?;
        Ok(())
    }

    pub fn write_title_row<S: AsRef<str>>(&self, titles: &[S], out: &mut impl Write) -> Result<()> {
        let style = if self.tsv_mode {
            None
        } else {
            Some(TITLE_STYLE)
        };
        self.write_row(titles, style, out)
    }

    pub fn write_data_row<S: AsRef<str>>(&self, row: &[S], out: &mut impl Write) -> Result<()> {
        self.write_row(row, None, out)
    }
}

/// Print the table name (unless in TSV mode), the titles and all rows.
/// An empty table prints its titles only.
pub fn print_table(table: &dyn TableView, tsv_mode: bool, out: &mut impl Write) -> Result<()> {
    let printer = TerminalTable::fitting(table, tsv_mode);
    if !tsv_mode {
        writeln!(out, "{}:", table.table_name().paint(TITLE_STYLE))?;
    }
    printer.write_title_row(&table.table_view_header(), out)?;
    for row in table.table_view_body() {
        printer.write_data_row(&row, out)?;
    }
    if !tsv_mode {
        writeln!(out)?;
    }
    Ok(())
}
