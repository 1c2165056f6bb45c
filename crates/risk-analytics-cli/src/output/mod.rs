pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Print a command envelope to stdout in the requested format.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => match render_json(value) {
            Ok(text) => println!("{}", text),
            Err(e) => eprintln!("JSON serialization error: {}", e),
        },
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

fn render_json(value: &Value) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_keeps_decimal_strings_and_nesting() {
        let v = json!({ "result": { "lcr_ratio": "1.25" }, "warnings": [] });
        let text = render_json(&v).unwrap();
        assert!(text.contains("\"lcr_ratio\": \"1.25\""));
        assert!(text.lines().count() > 1);
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, v);
    }
}
