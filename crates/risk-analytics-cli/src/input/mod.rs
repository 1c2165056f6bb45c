pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Load the command's input document from `--input` or piped stdin.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    let value = read_input_value(path, what)?;
    Ok(serde_json::from_value(value)?)
}

/// Same as [`read_input`] but returns the untyped document.
pub fn read_input_value(
    path: Option<&str>,
    what: &str,
) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_document(path)
    } else if let Some(data) = stdin::read_stdin()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json|file.yaml> or stdin required for {}", what).into())
    }
}
