use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::build::BuildResult;

use super::format_size;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell(value: impl ToString) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn ratio_cell(ratio: Option<f64>) -> Cell {
    match ratio {
        Some(ratio) => Cell::new(format!("{:.1}%", ratio * 100.0)),
        None => dim_cell("-"),
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

/// File, size, gzip size and ratio for every reported asset, plus totals.
pub fn asset_table(result: &BuildResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Size"),
        header_cell("Gzipped"),
        header_cell("Ratio"),
    ]);
    apply_table_style(&mut table);

    for row in &result.assets {
        let compressed = match row.compressed_size {
            Some(size) => Cell::new(format_size(size)),
            None => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(&row.name).fg(Color::Cyan),
            Cell::new(format_size(row.size)),
            compressed,
            ratio_cell(row.ratio()),
        ]);
    }

    let (original, compressed) = result.totals();
    let total_ratio = (original > 0).then(|| compressed as f64 / original as f64);
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(format_size(original)).add_attribute(Attribute::Bold),
        Cell::new(format_size(compressed)).add_attribute(Attribute::Bold),
        ratio_cell(total_ratio),
    ]);

    for index in 1..=3 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table
}
