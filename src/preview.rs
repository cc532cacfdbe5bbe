//! Plain text rendering of tables for the terminal.

use std::io::{self, Write};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::table::Table;

/// Tables longer than this are shown abbreviated.
pub const MAX_DISPLAY_ROWS: usize = 60;
/// Rows shown at each end of an abbreviated table.
const EDGE_ROWS: usize = 5;
/// Row positions shown by [`render_preview`].
const SAMPLE_ROWS: [usize; 3] = [1, 2, 3];

const GAP: &str = "  ";

/// Print the column names and a few sample rows.
pub fn render_preview<W: WriteColor>(table: &Table, out: &mut W) -> io::Result<()> {
    writeln!(out, "COLUMN NAMES:")?;
    for column in table.columns() {
        writeln!(out, "{}", column)?;
    }

    writeln!(out, "SAMPLE CONTENTS:")?;
    let sample: Vec<usize> = SAMPLE_ROWS
        .iter()
        .copied()
        .filter(|&i| i < table.len())
        .collect();
    render_rows(table, &[sample.as_slice()], out)?;
    if sample.is_empty() {
        writeln!(out, "[no rows past the first]")?;
    }
    Ok(())
}

/// Print a whole table, abbreviating long ones to their head and tail.
pub fn render_table<W: WriteColor>(table: &Table, out: &mut W) -> io::Result<()> {
    let all: Vec<usize> = (0..table.len()).collect();
    if table.len() > MAX_DISPLAY_ROWS {
        let (head, rest) = all.split_at(EDGE_ROWS);
        let tail = &rest[rest.len() - EDGE_ROWS..];
        render_rows(table, &[head, tail], out)?;
    } else {
        render_rows(table, &[all.as_slice()], out)?;
    }

    if table.len() > MAX_DISPLAY_ROWS || table.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "[{} rows x {} columns]",
            table.len(),
            table.columns().len()
        )?;
    }
    Ok(())
}

/// Render the selected rows as an aligned grid. Each block of row indices
/// is separated from the next by an elision line.
fn render_rows<W: WriteColor>(table: &Table, blocks: &[&[usize]], out: &mut W) -> io::Result<()> {
    let shown = || blocks.iter().flat_map(|block| block.iter().copied());

    let index_width = shown().map(digits).max().unwrap_or(0);
    let mut widths: Vec<usize> = table.columns().iter().map(|c| c.chars().count()).collect();
    for i in shown() {
        if let Some(row) = table.row(i) {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.to_string().chars().count());
            }
        }
    }

    let mut heading = ColorSpec::new();
    heading.set_fg(Some(Color::Cyan)).set_bold(true);

    write!(out, "{:width$}", "", width = index_width)?;
    out.set_color(&heading)?;
    for (column, width) in table.columns().iter().zip(&widths) {
        write!(out, "{}{:<width$}", GAP, column, width = *width)?;
    }
    out.reset()?;
    writeln!(out)?;

    for (n, block) in blocks.iter().enumerate() {
        if n > 0 {
            writeln!(out, "{:>width$}", "...", width = index_width.max(3))?;
        }
        for &i in block.iter() {
            let Some(row) = table.row(i) else { continue };
            write!(out, "{:<width$}", i, width = index_width)?;
            for (cell, width) in row.iter().zip(&widths) {
                write!(out, "{}{:<width$}", GAP, cell.to_string(), width = *width)?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}
