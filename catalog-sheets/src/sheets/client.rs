//! Google Sheets API v4 client

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use super::SheetSink;
use super::models::{
    BatchUpdateValuesRequest, BatchUpdateValuesResponse, Spreadsheet, add_sheet_request,
    api_error_message,
};
use crate::config::SheetsConfig;
use crate::error::{Result, UploadError};

const SPREADSHEET_FIELDS: &str = "spreadsheetId,sheets.properties.title";

/// Spreadsheet state cached by [`SheetsClient::load_spreadsheet`]
#[derive(Debug, Clone)]
struct LoadedSpreadsheet {
    id: String,
    titles: Vec<String>,
}

/// [`SheetSink`] backed by the Google Sheets REST API
#[derive(Debug)]
pub struct SheetsClient {
    http: Client,
    base_url: String,
    access_token: Option<String>,
    rows_limit: usize,
    spreadsheet: Option<LoadedSpreadsheet>,
}

impl SheetsClient {
    pub fn new(config: &SheetsConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UploadError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            rows_limit: config.rows_limit,
            spreadsheet: None,
        })
    }

    /// Titles known for the loaded spreadsheet
    #[cfg(test)]
    fn sheet_titles(&self) -> &[String] {
        self.spreadsheet
            .as_ref()
            .map(|s| s.titles.as_slice())
            .unwrap_or(&[])
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id)
        )
    }

    fn loaded(&self, context: &str) -> Result<&LoadedSpreadsheet> {
        self.spreadsheet
            .as_ref()
            .ok_or_else(|| UploadError::remote(context, "no spreadsheet loaded"))
    }

    /// Send a request and decode a JSON response, mapping every failure to `Remote`
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, context: &str) -> Result<T> {
        let request = match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| UploadError::remote(context, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let fallback = status.canonical_reason().unwrap_or("request failed");
            return Err(UploadError::remote_status(
                context,
                status.as_u16(),
                api_error_message(&body, fallback),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| UploadError::remote(context, format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl SheetSink for SheetsClient {
    async fn load_spreadsheet(&mut self, spreadsheet_id: &str) -> Result<()> {
        let context = format!("Failed to load spreadsheet {}", spreadsheet_id);
        let url = format!(
            "{}?fields={}",
            self.spreadsheet_url(spreadsheet_id),
            urlencoding::encode(SPREADSHEET_FIELDS)
        );

        debug!("GET {}", url);
        let spreadsheet: Spreadsheet = self.send(self.http.get(&url), &context).await?;
        let titles = spreadsheet.titles();
        debug!(
            "Loaded spreadsheet {} with sheets {:?}",
            spreadsheet.spreadsheet_id, titles
        );

        self.spreadsheet = Some(LoadedSpreadsheet {
            id: spreadsheet.spreadsheet_id,
            titles,
        });
        Ok(())
    }

    async fn add_sheet(&mut self, name: &str) -> bool {
        let context = format!("Cannot create a new sheet titled {}", name);
        let spreadsheet_id = match self.loaded(&context) {
            Ok(loaded) if loaded.titles.iter().any(|t| t == name) => {
                debug!("Sheet '{}' already exists, reusing it", name);
                return true;
            }
            Ok(loaded) => loaded.id.clone(),
            Err(e) => {
                error!("{}", e);
                return false;
            }
        };

        let url = format!("{}:batchUpdate", self.spreadsheet_url(&spreadsheet_id));
        debug!("POST {} (addSheet '{}')", url, name);

        let request = self.http.post(&url).json(&add_sheet_request(name));
        match self.send::<serde_json::Value>(request, &context).await {
            Ok(_) => {
                if let Some(loaded) = self.spreadsheet.as_mut() {
                    loaded.titles.push(name.to_string());
                }
                true
            }
            Err(e) => {
                error!("{}", e);
                false
            }
        }
    }

    async fn write_rows(&mut self, range: &str, values: Vec<Vec<String>>) -> Result<usize> {
        let context = format!("Failed to write rows to {}", range);
        let spreadsheet_id = self.loaded(&context)?.id.clone();
        let url = format!("{}/values:batchUpdate", self.spreadsheet_url(&spreadsheet_id));

        debug!("POST {} ({} rows at {})", url, values.len(), range);
        let body = BatchUpdateValuesRequest::user_entered(range, values);
        let response: BatchUpdateValuesResponse =
            self.send(self.http.post(&url).json(&body), &context).await?;

        Ok(response.total_updated_rows)
    }

    fn rows_limit(&self) -> usize {
        self.rows_limit
    }
}
