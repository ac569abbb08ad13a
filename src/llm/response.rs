//! Locating the produced image inside a chat completions response.

// lazy_regex! statics, validated at compile time
#![allow(clippy::non_std_lazy_statics)]

use crate::error::FigurineError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;
use serde_json::Value;

/// First URL-shaped run in free text
static RE_CONTENT_URL: Lazy<Regex> = lazy_regex!(r#"https?://[^\s<>"\)\]]+"#);

/// Characters stripped from the end of a URL found in prose
const URL_TRAILING_PUNCTUATION: &[char] = &[')', ']', '}', '>', '\'', '"'];

/// Find the produced image in `choices[0].message`.
///
/// Checked in order: `images[0].image_url.url`, `images[0].url`, then the
/// first URL in the free-text `content`.
#[must_use]
pub fn extract_image_url(body: &Value) -> Option<String> {
    let message = body.get("choices")?.get(0)?.get("message")?;
    let image = message.get("images").and_then(|images| images.get(0));

    let structured = image
        .and_then(|img| img.get("image_url"))
        .and_then(|image_url| image_url.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty());
    if let Some(url) = structured {
        return Some(url.to_string());
    }

    let bare = image
        .and_then(|img| img.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty());
    if let Some(url) = bare {
        return Some(url.to_string());
    }

    let content = message.get("content").and_then(Value::as_str)?;
    RE_CONTENT_URL
        .find(content)
        .map(|m| m.as_str().trim_end_matches(URL_TRAILING_PUNCTUATION))
        .filter(|url| !url.is_empty())
        .map(ToString::to_string)
}

/// Whether `value` is an inline `data:image/...` URL
#[must_use]
pub fn is_inline_image(value: &str) -> bool {
    value.starts_with("data:image/")
}

/// Decode the payload of a `data:<mime>;base64,<payload>` URL.
///
/// # Errors
///
/// Returns `FigurineError::Json` if the URL has no payload or the payload
/// is not valid base64.
pub fn decode_data_url(value: &str) -> Result<Vec<u8>, FigurineError> {
    let (_, payload) = value
        .split_once(',')
        .ok_or_else(|| FigurineError::Json("inline image has no payload".to_string()))?;
    BASE64
        .decode(payload.trim().as_bytes())
        .map_err(|e| FigurineError::Json(format!("inline image is not valid base64: {e}")))
}
