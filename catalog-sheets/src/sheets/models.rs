//! Google Sheets API v4 request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// `GET /v4/spreadsheets/{id}` (trimmed to the fields we request)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spreadsheet {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Spreadsheet {
    pub fn titles(&self) -> Vec<String> {
        self.sheets
            .iter()
            .map(|sheet| sheet.properties.title.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetProperties {
    pub title: String,
}

/// Values are parsed as if typed into the UI: numbers, dates and formulas are interpreted
pub const USER_ENTERED: &str = "USER_ENTERED";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub major_dimension: &'static str,
    pub values: Vec<Vec<String>>,
}

/// `POST /v4/spreadsheets/{id}/values:batchUpdate`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    pub value_input_option: &'static str,
    pub data: Vec<ValueRange>,
}

impl BatchUpdateValuesRequest {
    pub fn user_entered(range: &str, values: Vec<Vec<String>>) -> Self {
        Self {
            value_input_option: USER_ENTERED,
            data: vec![ValueRange {
                range: range.to_string(),
                major_dimension: "ROWS",
                values,
            }],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesResponse {
    #[serde(default)]
    pub total_updated_rows: usize,
}

/// `POST /v4/spreadsheets/{id}:batchUpdate` body creating one sheet
pub fn add_sheet_request(title: &str) -> Value {
    json!({
        "requests": [
            { "addSheet": { "properties": { "title": title } } }
        ]
    })
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Best human-readable message from an error response body
pub fn api_error_message(body: &str, fallback: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(status) => format!("{} ({})", parsed.error.message, status),
            None => parsed.error.message,
        },
        Err(_) if body.trim().is_empty() => fallback.to_string(),
        Err(_) => format!("{}: {}", fallback, body.trim()),
    }
}
