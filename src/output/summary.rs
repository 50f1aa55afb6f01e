use std::fmt::Write;

use comfy_table::Cell;

use crate::table::ReportTable;

use super::styling::{heading, label, notice, value};
use super::tables::{color_coded_state_cell, create_table, header_cells};

/// Prints a parsed deployment table to stdout.
///
/// The State column is colour coded (green for created, yellow for changed,
/// red for deleted, grey otherwise).
pub fn print_summary(source: &str, table: &ReportTable) {
    println!("{}", render_summary(source, table));
}

fn render_summary(source: &str, table: &ReportTable) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "{}", heading("📄", "Deployment"));
    let _ = writeln!(output, "  {} {}", label("Log:"), value(source));
    let _ = writeln!(
        output,
        "  {} {}",
        label("Rows:"),
        notice(table.data_rows().len())
    );
    output.push('\n');

    if table.is_insufficient() {
        let _ = writeln!(output, "{}", notice("No deployment rows found."));
        return output;
    }

    let mut rendered = create_table();
    rendered.set_header(header_cells(table.rows()[0].cells()));
    for row in table.data_rows() {
        let cells = row.cells();
        let mut line = vec![color_coded_state_cell(&cells[0])];
        line.extend(cells[1..].iter().map(Cell::new));
        rendered.add_row(line);
    }
    let _ = writeln!(output, "{rendered}");

    output
}
