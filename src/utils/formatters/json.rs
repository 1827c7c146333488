use super::TabularFormatter;
use serde_json::{Map, Value};

/// One JSON object per row, keyed by header. With `no_headers` each row is a
/// bare array instead.
pub struct JsonFormatter {
    no_headers: bool,
}

impl JsonFormatter {
    pub fn new(no_headers: bool) -> Self {
        Self { no_headers }
    }
}

impl TabularFormatter for JsonFormatter {
    type Error = serde_json::Error;

    fn format<R, C>(&self, headers: &[&str], rows: R) -> Result<String, Self::Error>
    where
        R: IntoIterator<Item = Vec<C>>,
        C: ToString,
    {
        let rows: Vec<Value> = rows
            .into_iter()
            .map(|row| {
                let cells = row.iter().map(|cell| Value::String(cell.to_string()));
                if self.no_headers {
                    Value::Array(cells.collect())
                } else {
                    let object: Map<String, Value> = headers
                        .iter()
                        .map(|header| header.to_string())
                        .zip(cells)
                        .collect();
                    Value::Object(object)
                }
            })
            .collect();
        serde_json::to_string_pretty(&rows)
    }
}
