use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::result_rows;

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(rows) = result_rows(value) {
        print_array_table(rows);
        print_footer(value);
        return;
    }
    if let Some(grid) = grid_table(value) {
        println!("{}", grid);
        print_footer(value);
        return;
    }
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result);
                print_footer(value);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value) {
    if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    } else {
        println!("{}", format_value(result));
    }
}

/// Warnings and methodology from the envelope.
fn print_footer(envelope: &Value) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Render a two-way sensitivity matrix with variable values as headers.
fn grid_table(value: &Value) -> Option<Table> {
    let result = value.get("result")?;
    let rows = result.get("variable_1_values")?.as_array()?;
    let cols = result.get("variable_2_values")?.as_array()?;
    let matrix = result.get("matrix")?.as_array()?;
    let corner = format!(
        "{} \\ {}",
        format_value(result.get("variable_1_name")?),
        format_value(result.get("variable_2_name")?)
    );

    let mut builder = Builder::default();
    let mut header = vec![corner];
    header.extend(cols.iter().map(format_value));
    builder.push_record(header);
    for (row_value, cells) in rows.iter().zip(matrix) {
        let mut record = vec![format_value(row_value)];
        if let Value::Array(cells) = cells {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    Some(Table::from(builder))
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    // Collect all keys from first object for headers
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grid_table_renders_headers_and_gaps() {
        let v = json!({
            "result": {
                "variable_1_name": "spot",
                "variable_2_name": "volatility",
                "variable_1_values": [90.0, 110.0],
                "variable_2_values": [0.0, 0.2],
                "matrix": [[null, 4.5], [null, 15.1]],
            }
        });
        let rendered = grid_table(&v).unwrap().to_string();
        assert!(rendered.contains("spot \\ volatility"));
        assert!(rendered.contains("15.1"));
        assert!(rendered.contains("4.5"));
        assert!(!rendered.contains("null"));
    }

    #[test]
    fn test_non_grid_output_has_no_grid() {
        let v = json!({"result": {"price": 1.0}});
        assert!(grid_table(&v).is_none());
    }
}
