use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub label: String,
    #[tabled(rename = "Rows")]
    pub count: usize,
}

/// Render label/count pairs as a rounded table
pub fn stats_table(rows: &[(&str, usize)]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let rows: Vec<TableRow> = rows
        .iter()
        .map(|(label, count)| TableRow {
            label: label.to_string(),
            count: *count,
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}
