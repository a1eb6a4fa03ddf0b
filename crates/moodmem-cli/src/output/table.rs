use anyhow::Result;
use comfy_table::{Cell, Table};

pub fn print_table(table: Table) -> Result<()> {
    println!("{table}");
    Ok(())
}

/// Two-column field/value table.
pub fn key_value_table<I, K, V>(rows: I) -> Table
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut table = Table::new();
    table.set_header(vec![Cell::new("Field"), Cell::new("Value")]);
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key.into()), Cell::new(value.into())]);
    }
    table
}
