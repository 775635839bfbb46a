pub mod csv_out;
pub mod display;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
        OutputFormat::Display => display::print_display(value),
    }
}

/// Rows of a tabular result (`result.rows`), if the command produced any.
pub(crate) fn result_rows(value: &Value) -> Option<&Vec<Value>> {
    match value.get("result")?.get("rows")? {
        Value::Array(rows) => Some(rows),
        _ => None,
    }
}
