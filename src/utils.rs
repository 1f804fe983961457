/// Utility functions for report formatting
use std::fmt::Write;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::models::Report;

const ENTRIES_PER_ROW: usize = 5;
const SEPARATOR: &str = "======================================";

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    dt.format(format_description!("[day].[month].[year] - [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| dt.to_string())
}

/// Insert `,` between groups of three digits
pub fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Lay out cells five to a line, followed by the separator and total
fn write_section(out: &mut String, title: &str, cells: &[String]) {
    out.push_str(title);
    out.push('\n');

    for (i, cell) in cells.iter().enumerate() {
        out.push_str(cell);
        if (i + 1) % ENTRIES_PER_ROW == 0 {
            out.push('\n');
        }
    }

    let _ = write!(out, "\n{}\nTotal: {}\n\n", SEPARATOR, cells.len());
}

/// Render a report as the receiver and transmitter tables
///
/// Receivers show their sample count for the period; transmitters show the
/// last decoded temperature and `#` when the tag reported "on".
pub fn format_report(report: &Report) -> String {
    let receivers: Vec<String> = report
        .receivers
        .iter()
        .map(|r| format!("{:4}: {:>4} | ", r.id, group_thousands(r.count)))
        .collect();

    let transmitters: Vec<String> = report
        .transmitters
        .iter()
        .map(|t| {
            let marker = match t.on {
                Some(true) => "#",
                _ => " ",
            };
            format!("{:4}: {:5.2}C {}| ", t.id, t.temperature, marker)
        })
        .collect();

    let mut out = String::new();
    write_section(&mut out, "########## RECEIVERS ##########", &receivers);
    write_section(&mut out, "########## TRANSMITTERS ##########", &transmitters);
    out
}
