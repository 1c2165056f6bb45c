use serde_json::Value;

/// Headline fields, most specific first.
const PRIORITY_KEYS: [&str; 16] = [
    "lcr_ratio",
    "active_return",
    "sharpe_ratio",
    "information_ratio",
    "max_drawdown",
    "raroc",
    "unexpected_loss",
    "expected_pnl",
    "lgd",
    "ead",
    "herfindahl",
    "vwap",
    "total_allowance",
    "all_pass",
    "expected_return",
    "portfolio_volatility",
];

/// Print just the headline value of the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }
        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result_obj)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_key_wins() {
        let v = json!({ "result": { "total_hqla": "10", "lcr_ratio": "inf" } });
        assert_eq!(minimal_line(&v), "inf");
    }

    #[test]
    fn test_falls_back_to_first_field() {
        let v = json!({ "result": { "covariance": [[1]] } });
        assert_eq!(minimal_line(&v), "covariance: [[1]]");
    }
}
