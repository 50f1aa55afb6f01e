use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cells(labels: &[String]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).fg(TableColor::Cyan))
        .collect()
}

/// Colours a deployment state the way the deploy tool's own output reads:
/// additions green, modifications yellow, removals red.
pub fn color_coded_state_cell(state: &str) -> Cell {
    match state.to_ascii_lowercase().as_str() {
        "created" | "added" => Cell::new(state).fg(TableColor::Green),
        "changed" | "modified" => Cell::new(state).fg(TableColor::Yellow),
        "deleted" | "failed" => Cell::new(state).fg(TableColor::Red),
        _ => Cell::new(state).fg(TableColor::DarkGrey),
    }
}
