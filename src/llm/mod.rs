/// HTTP client construction and response body handling
pub mod http_utils;
/// Image extraction from chat completions responses
pub mod response;

use crate::config::Settings;
use crate::error::FigurineError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Scheme of inline image references handed around by the chat layer
pub const INLINE_SCHEME: &str = "base64://";

/// Scheme of local file references
pub const FILE_SCHEME: &str = "file://";

/// One generation call: prompt plus image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Model identifier
    pub model: String,
    /// Instruction text
    pub prompt_text: String,
    /// Source image, base64 encoded
    pub image_base64: String,
    /// Output token limit
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// Chat completions body with a single user turn carrying text and image
    #[must_use]
    pub fn to_payload(&self) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        {"type": "text", "text": self.prompt_text},
                        {
                            "type": "image_url",
                            "image_url": {"url": format!("data:image/png;base64,{}", self.image_base64)}
                        }
                    ]
                }
            ],
            "max_tokens": self.max_tokens,
            "stream": false
        })
    }
}

/// Image produced by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// Inline image, decoded and saved under the data directory
    InlineImage {
        /// Decoded image bytes
        bytes: Vec<u8>,
        /// Where the bytes were written
        path: PathBuf,
    },
    /// Image hosted elsewhere
    RemoteImage {
        /// Location of the image
        url: String,
    },
}

/// Build a generation request. Pure, no I/O.
#[must_use]
pub fn build_request(
    model: &str,
    prompt_text: &str,
    image_bytes: &[u8],
    max_tokens: u32,
) -> GenerationRequest {
    GenerationRequest {
        model: model.to_string(),
        prompt_text: prompt_text.to_string(),
        image_base64: BASE64.encode(image_bytes),
        max_tokens,
    }
}

/// Wrap raw bytes as an inline image reference
#[must_use]
pub fn to_inline_reference(bytes: &[u8]) -> String {
    format!("{INLINE_SCHEME}{}", BASE64.encode(bytes))
}

/// Network side of a figurine run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Load the bytes behind an image reference
    async fn fetch_image_bytes(&self, reference: &str) -> Result<Vec<u8>, FigurineError>;

    /// Send a request and return the produced image
    async fn submit(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<GenerationResult, FigurineError>;
}

/// Client for the `OpenRouter` chat completions endpoint
pub struct GenerationClient {
    http_client: HttpClient,
    api_url: String,
    site_url: String,
    site_name: String,
    output_dir: PathBuf,
}

impl GenerationClient {
    /// Create a client from settings
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            http_client: http_utils::create_http_client(settings),
            api_url: settings.openrouter_api_url.clone(),
            site_url: settings.openrouter_site_url.clone(),
            site_name: settings.openrouter_site_name.clone(),
            output_dir: settings.data_dir.clone(),
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FigurineError> {
        debug!("Downloading source image from {}", url);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FigurineError::DownloadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FigurineError::DownloadFailed(format!("HTTP {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FigurineError::DownloadFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Write an inline result to `generated_<unix-millis>.png`
    async fn persist(&self, bytes: &[u8]) -> Result<PathBuf, FigurineError> {
        let local_err = |e: std::io::Error| FigurineError::LocalWriteFailed(e.to_string());
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(local_err)?;
        let file_name = format!("generated_{}.png", chrono::Utc::now().timestamp_millis());
        let path = self.output_dir.join(file_name);
        tokio::fs::write(&path, bytes).await.map_err(local_err)?;
        Ok(path)
    }
}

async fn read_local(path: &Path) -> Result<Vec<u8>, FigurineError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| FigurineError::DownloadFailed(format!("{}: {e}", path.display())))
}

#[async_trait]
impl ImageGenerator for GenerationClient {
    async fn fetch_image_bytes(&self, reference: &str) -> Result<Vec<u8>, FigurineError> {
        if let Some(payload) = reference.strip_prefix(INLINE_SCHEME) {
            return BASE64
                .decode(payload.trim().as_bytes())
                .map_err(|e| FigurineError::DownloadFailed(format!("invalid inline image: {e}")));
        }
        if reference.starts_with("data:") {
            return response::decode_data_url(reference)
                .map_err(|e| FigurineError::DownloadFailed(e.to_string()));
        }
        if let Some(path) = reference.strip_prefix(FILE_SCHEME) {
            return read_local(Path::new(path)).await;
        }
        if tokio::fs::try_exists(reference).await.unwrap_or(false) {
            return read_local(Path::new(reference)).await;
        }
        self.download(reference).await
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<GenerationResult, FigurineError> {
        let mut http_request = self
            .http_client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json");

        if !self.site_url.is_empty() {
            http_request = http_request.header("HTTP-Referer", &self.site_url);
        }
        if !self.site_name.is_empty() {
            http_request = http_request.header("X-Title", &self.site_name);
        }

        let response = http_request
            .json(&request.to_payload())
            .send()
            .await
            .map_err(|e| FigurineError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FigurineError::Network(e.to_string()))?;
        let body = http_utils::parse_response_body(status, &text)?;

        let image_url =
            response::extract_image_url(&body).ok_or(FigurineError::NoImageInResponse)?;

        if response::is_inline_image(&image_url) {
            let bytes = response::decode_data_url(&image_url)?;
            let path = self.persist(&bytes).await?;
            info!("Saved generated image to {}", path.display());
            return Ok(GenerationResult::InlineImage { bytes, path });
        }

        Ok(GenerationResult::RemoteImage { url: image_url })
    }
}
