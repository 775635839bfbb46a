use serde_json::Value;
use std::io::{self, Write};

use super::result_rows;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_csv(stdout.lock(), value) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_csv<W: Write>(writer: W, value: &Value) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    if let Some(rows) = result_rows(value) {
        write_array_csv(&mut wtr, rows)?;
    } else if let Some(result) = value.get("result").filter(|r| r.get("matrix").is_some()) {
        write_matrix_csv(&mut wtr, result)?;
    } else {
        match value {
            Value::Object(map) => {
                // Two-column CSV: field, value
                let fields = match map.get("result") {
                    Some(Value::Object(result)) => result,
                    _ => map,
                };
                wtr.write_record(["field", "value"])?;
                for (key, val) in fields {
                    wtr.write_record([key.as_str(), &format_csv_value(val)])?;
                }
            }
            Value::Array(arr) => write_array_csv(&mut wtr, arr)?,
            _ => wtr.write_record([&format_csv_value(value)])?,
        }
    }

    wtr.flush()?;
    Ok(())
}

fn write_array_csv<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> Result<(), csv::Error> {
    if arr.is_empty() {
        return Ok(());
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        wtr.write_record(&headers)?;

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
    } else {
        for item in arr {
            wtr.write_record([&format_csv_value(item)])?;
        }
    }
    Ok(())
}

/// Long format: one line per grid cell.
fn write_matrix_csv<W: Write>(wtr: &mut csv::Writer<W>, result: &Value) -> Result<(), csv::Error> {
    let name = |key: &str| result.get(key).map(format_csv_value).unwrap_or_default();
    let values = |key: &str| result.get(key).and_then(Value::as_array).cloned().unwrap_or_default();

    wtr.write_record([name("variable_1_name"), name("variable_2_name"), "price".to_string()])?;
    let rows = values("variable_1_values");
    let cols = values("variable_2_values");
    let matrix = values("matrix");
    for (v1, cells) in rows.iter().zip(&matrix) {
        for (v2, cell) in cols.iter().zip(cells.as_array().into_iter().flatten()) {
            wtr.write_record([format_csv_value(v1), format_csv_value(v2), format_csv_value(cell)])?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
