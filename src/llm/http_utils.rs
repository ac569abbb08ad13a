//! HTTP utilities for the generation client
//!
//! Client construction with timeout and proxy, plus turning raw response
//! bodies into JSON or a readable API error.

use crate::config::Settings;
use crate::error::FigurineError;
use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

/// Longest error body quoted back to the user
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Creates an HTTP client with the configured timeout and optional proxy.
///
/// The timeout bounds every call, so a stalled avatar host or API only
/// blocks the run that issued the request.
#[must_use]
pub fn create_http_client(settings: &Settings) -> HttpClient {
    let mut builder =
        HttpClient::builder().timeout(Duration::from_secs(settings.request_timeout_secs));

    // Without an explicit proxy, connect directly and ignore *_PROXY env vars
    match settings.effective_proxy() {
        Some(proxy_url) => match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => {
                warn!("Ignoring invalid proxy URL {}: {}", proxy_url, e);
                builder = builder.no_proxy();
            }
        },
        None => builder = builder.no_proxy(),
    }

    builder.build().unwrap_or_else(|e| {
        warn!("Failed to build configured HTTP client, using defaults: {}", e);
        HttpClient::new()
    })
}

/// Parses a generation API response body.
///
/// # Errors
///
/// Returns `FigurineError::ApiError` when the status is an error or the body
/// carries an `error` field, and `FigurineError::Json` when a successful
/// response is not valid JSON.
pub fn parse_response_body(status: StatusCode, text: &str) -> Result<Value, FigurineError> {
    let body: Value = match serde_json::from_str(text) {
        Ok(body) => body,
        Err(_) if status.is_client_error() || status.is_server_error() => {
            return Err(FigurineError::ApiError {
                message: describe_error_body(status, text),
            });
        }
        Err(e) => return Err(FigurineError::Json(e.to_string())),
    };

    let error_field = body.get("error").filter(|e| is_truthy(e));
    if status.is_client_error() || status.is_server_error() || error_field.is_some() {
        let message = error_field
            .and_then(|e| e.get("message").and_then(Value::as_str).or_else(|| e.as_str()))
            .map_or_else(|| format!("HTTP {}", status.as_u16()), ToString::to_string);
        return Err(FigurineError::ApiError { message });
    }

    Ok(body)
}

/// Human-readable summary of a non-JSON error body
#[must_use]
pub fn describe_error_body(status: StatusCode, text: &str) -> String {
    let trimmed = text.trim_start();
    // HTML error pages from Nginx/proxies
    let is_html = trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<HTML");

    if is_html {
        return format!("HTTP {status} (server returned an HTML error page)");
    }
    if trimmed.is_empty() {
        return format!("HTTP {status}");
    }
    if trimmed.chars().count() > MAX_ERROR_BODY_CHARS {
        let head: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return format!("HTTP {status} - {head}... (truncated)");
    }
    format!("HTTP {status} - {trimmed}")
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_field_message_wins() {
        let body = json!({"error": {"message": "Key limit exceeded", "code": 429}}).to_string();
        let err = parse_response_body(StatusCode::TOO_MANY_REQUESTS, &body);
        assert!(matches!(
            err,
            Err(FigurineError::ApiError { message }) if message == "Key limit exceeded"
        ));
    }

    #[test]
    fn test_error_field_on_success_status() {
        let body = json!({"error": {"code": 500}}).to_string();
        let err = parse_response_body(StatusCode::OK, &body);
        assert!(matches!(
            err,
            Err(FigurineError::ApiError { message }) if message == "HTTP 200"
        ));
    }

    #[test]
    fn test_null_error_field_is_ignored() -> Result<(), FigurineError> {
        let body = json!({"error": null, "choices": []}).to_string();
        let parsed = parse_response_body(StatusCode::OK, &body)?;
        assert!(parsed.get("choices").is_some());
        Ok(())
    }

    #[test]
    fn test_html_error_page_is_summarized() {
        let err = parse_response_body(
            StatusCode::BAD_GATEWAY,
            "<html><body>502 Bad Gateway</body></html>",
        );
        assert!(matches!(
            err,
            Err(FigurineError::ApiError { message })
                if message == "HTTP 502 Bad Gateway (server returned an HTML error page)"
        ));
    }

    #[test]
    fn test_invalid_json_on_success() {
        let err = parse_response_body(StatusCode::OK, "not json");
        assert!(matches!(err, Err(FigurineError::Json(_))));
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(600);
        let message = describe_error_body(StatusCode::INTERNAL_SERVER_ERROR, &body);
        assert!(message.ends_with("... (truncated)"));
        assert!(message.len() < 600);
    }
}
