//! Errors that can abort a figurine run or a key store operation.
//!
//! Every variant is terminal for the current run. The Telegram layer turns
//! them into a user-visible text via [`FigurineError::user_message`].

use thiserror::Error;

/// Errors produced by key storage, image resolution and generation
#[derive(Debug, Error)]
pub enum FigurineError {
    /// The key store holds no credentials
    #[error("no API keys configured, add one with /addkeys")]
    NoKeysConfigured,
    /// None of the supplied tokens looks like an API key
    #[error("no valid API key found (keys must start with {prefix})")]
    InvalidCredentialFormat {
        /// Required credential prefix
        prefix: &'static str,
    },
    /// Neither attachments, mentions nor a sender id yielded an image
    #[error("no usable image or avatar found")]
    NoImageFound,
    /// Source image could not be read or downloaded
    #[error("{0}")]
    DownloadFailed(String),
    /// Generation API rejected the request
    #[error("{message}")]
    ApiError {
        /// Message reported by the API, or the HTTP status
        message: String,
    },
    /// Generation succeeded but the response carried no image
    #[error("no image data in response")]
    NoImageInResponse,
    /// Generated image could not be written to the data directory
    #[error("failed to save generated image: {0}")]
    LocalWriteFailed(String),
    /// Transport failure while talking to the generation API
    #[error("network error: {0}")]
    Network(String),
    /// Response body was not valid JSON
    #[error("invalid response body: {0}")]
    Json(String),
    /// Key store file could not be read, parsed or written
    #[error("key store error: {0}")]
    Storage(String),
}

impl FigurineError {
    /// Text shown to the chat when a run fails
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NoImageFound => "❌ 未找到可用图片或头像".to_string(),
            Self::DownloadFailed(_) => format!("❌ 下载图片失败: {self}"),
            _ => format!("❌ 生成失败: {self}"),
        }
    }
}

impl From<std::io::Error> for FigurineError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for FigurineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
