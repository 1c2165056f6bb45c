use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// A result object becomes field,value rows. When the result carries a
/// list of records (weights, sectors, scenarios) that list is written as a
/// proper table instead.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match body {
        Value::Object(map) => {
            let records = map
                .values()
                .find_map(|v| v.as_array().filter(|a| a.first().is_some_and(Value::is_object)));
            if let Some(records) = records {
                write_array_csv(&mut wtr, records);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(body)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_written_with_headers() {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_array_csv(
            &mut wtr,
            &[json!({ "name": "A", "weight": "0.6" }), json!({ "name": "B", "weight": "0.4" })],
        );
        let bytes = wtr.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "name,weight\nA,0.6\nB,0.4\n");
    }
}
