//! Case API client
//!
//! Thin wrapper over the REST endpoints the core consumes. Every request
//! carries the bearer token from settings when one is configured; any
//! non-2xx response becomes [`AppError::Api`].

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};

use super::settings::ApiSettings;
use crate::error::{AppError, Result};
use crate::models::CaseRecord;

#[derive(Clone)]
pub struct CaseApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl CaseApi {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("HOPETRACK/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings
                .token
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Pass 2xx responses through; turn anything else into `AppError::Api`.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|value| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
            })
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("Request failed")
                        .to_string()
                } else {
                    body.trim().to_string()
                }
            });

        tracing::warn!("Case API returned {}: {}", status, message);
        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// `GET /cases/:id`
    pub async fn get_case(&self, id: i64) -> Result<CaseRecord> {
        tracing::debug!("Fetching case {}", id);
        let response = self
            .request(Method::GET, &format!("cases/{}", id))
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;
        Ok(CaseRecord::from_value(unwrap_envelope(value, "case")))
    }

    /// `GET /cases/all`
    pub async fn list_cases(&self) -> Result<Vec<CaseRecord>> {
        let response = self.request(Method::GET, "cases/all").send().await?;
        let value: Value = Self::check(response).await?.json().await?;

        let cases = match unwrap_envelope(value, "cases") {
            Value::Array(items) => items.into_iter().map(CaseRecord::from_value).collect(),
            other => {
                return Err(AppError::Generic(format!(
                    "Unexpected case list payload: {}",
                    type_name(&other)
                )))
            }
        };
        Ok(cases)
    }

    /// `PUT /cases/:id`. Returns the record echoed by the server, if any.
    pub async fn update_case(&self, id: i64, patch: &Value) -> Result<Option<CaseRecord>> {
        tracing::info!("Updating case {}", id);
        let response = self
            .request(Method::PUT, &format!("cases/{}", id))
            .json(patch)
            .send()
            .await?;
        let body = Self::check(response).await?.text().await?;

        let echoed = serde_json::from_str::<Value>(&body)
            .ok()
            .map(|value| unwrap_envelope(value, "case"))
            .filter(Value::is_object)
            .map(CaseRecord::from_value);
        Ok(echoed)
    }

    /// `POST /export/cases/pdf-html`: server-rendered bulk PDF.
    pub async fn export_pdf_html(&self, cases: &[CaseRecord]) -> Result<Vec<u8>> {
        tracing::info!("Requesting server-rendered PDF for {} cases", cases.len());
        let response = self
            .request(Method::POST, "export/cases/pdf-html")
            .json(&json!({ "cases": cases }))
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;

        if bytes.is_empty() {
            return Err(AppError::Export("Server returned an empty PDF".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

/// Accept both a bare payload and one wrapped as `{ "<key>": ... }` or
/// `{ "data": ... }`.
fn unwrap_envelope(value: Value, key: &str) -> Value {
    let wrapped = value.as_object().is_some_and(|map| {
        map.len() == 1
            && [key, "data"]
                .iter()
                .any(|name| map.get(*name).is_some_and(|inner| inner.is_object() || inner.is_array()))
    });
    if !wrapped {
        return value;
    }
    match value {
        Value::Object(map) => map.into_iter().next().map(|(_, inner)| inner).unwrap_or_default(),
        other => other,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(
            unwrap_envelope(json!({"cases": [{"id": 1}]}), "cases"),
            json!([{"id": 1}])
        );
        assert_eq!(
            unwrap_envelope(json!({"data": {"id": 2}}), "case"),
            json!({"id": 2})
        );
        assert_eq!(unwrap_envelope(json!([1, 2]), "cases"), json!([1, 2]));

        // A plain record is left alone
        assert_eq!(
            unwrap_envelope(json!({"id": 3, "data": {"x": 1}}), "case"),
            json!({"id": 3, "data": {"x": 1}})
        );
    }

    #[test]
    fn test_token_and_base_url_are_normalized() {
        let api = CaseApi::new(&ApiSettings {
            base_url: "http://localhost:5000/api/".to_string(),
            token: Some("   ".to_string()),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert!(api.token.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let api = CaseApi::new(&ApiSettings {
            base_url: "http://127.0.0.1:9/api".to_string(),
            token: None,
            timeout_secs: 2,
        })
        .unwrap();
        assert!(matches!(api.get_case(1).await, Err(AppError::Http(_))));
    }
}
