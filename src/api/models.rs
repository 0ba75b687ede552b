use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name column assumed until the server tells us otherwise
pub const DEFAULT_NAME_COLUMN: &str = "name";

/// One CSV record as returned by `/api/lookup`, in server column order
pub type Row = Map<String, Value>;

/// Schema descriptor from `/api/meta`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default = "default_name_col")]
    pub name_col: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub total_rows: u64,
}

fn default_name_col() -> String {
    DEFAULT_NAME_COLUMN.to_string()
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            name_col: default_name_col(),
            columns: Vec::new(),
            total_rows: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub rows: Vec<Row>,
    /// Older servers omit the count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl LookupResponse {
    pub fn match_count(&self) -> usize {
        self.count.unwrap_or(self.rows.len())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReloadResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default = "default_name_col")]
    pub name_col: String,
    #[serde(default)]
    pub total_rows: u64,
}

/// Render a cell value as display text. Null and missing values are empty.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_defaults_when_fields_missing() {
        let meta: Meta = serde_json::from_value(json!({})).unwrap();
        assert_eq!(meta, Meta::default());
        assert_eq!(meta.name_col, "name");
    }

    #[test]
    fn test_lookup_rows_keep_column_order() {
        let body = r#"{"rows":[{"zeta":"1","alpha":"2","mid":"3"}],"count":1}"#;
        let response: LookupResponse = serde_json::from_str(body).unwrap();
        let keys: Vec<&str> = response.rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(response.match_count(), 1);
    }

    #[test]
    fn test_match_count_falls_back_to_rows() {
        let response: LookupResponse =
            serde_json::from_value(json!({"rows": [{"name": "a"}, {"name": "b"}]})).unwrap();
        assert_eq!(response.count, None);
        assert_eq!(response.match_count(), 2);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(Some(&json!("x"))), "x");
        assert_eq!(cell_text(Some(&json!(42))), "42");
        assert_eq!(cell_text(Some(&json!(null))), "");
        assert_eq!(cell_text(None), "");
    }
}
