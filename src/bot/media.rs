//! Telegram-hosted images.
//!
//! Attachments and profile photos are carried through resolution as lazy
//! references (`tg-file://<file_id>`, `tg-avatar://<user_id>`). Only the
//! reference that wins is downloaded, through the Bot API.

use crate::error::FigurineError;
use crate::llm::{GenerationRequest, GenerationResult, ImageGenerator};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, FileMeta, UserId};
use tracing::info;

/// Scheme of Telegram file references
pub const TG_FILE_SCHEME: &str = "tg-file://";

/// Scheme of Telegram profile photo references
pub const TG_AVATAR_SCHEME: &str = "tg-avatar://";

/// Bot API download limit (20 MB)
const MAX_FILE_SIZE: u32 = 20 * 1024 * 1024;

/// A parsed Telegram image reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramRef {
    /// Attachment, by file id
    File(FileId),
    /// Current profile photo of a user
    Avatar(UserId),
}

impl TelegramRef {
    /// Parse a reference. `Ok(None)` means it is not a Telegram reference.
    ///
    /// # Errors
    ///
    /// Returns `FigurineError::DownloadFailed` for a Telegram reference with
    /// an empty file id or a non-numeric user id.
    pub fn parse(reference: &str) -> Result<Option<Self>, FigurineError> {
        if let Some(file_id) = reference.strip_prefix(TG_FILE_SCHEME) {
            if file_id.is_empty() {
                return Err(FigurineError::DownloadFailed(
                    "empty Telegram file reference".to_string(),
                ));
            }
            return Ok(Some(Self::File(FileId(file_id.to_string()))));
        }
        if let Some(user_id) = reference.strip_prefix(TG_AVATAR_SCHEME) {
            return user_id
                .trim()
                .parse::<u64>()
                .map(|id| Some(Self::Avatar(UserId(id))))
                .map_err(|_| {
                    FigurineError::DownloadFailed(format!("invalid Telegram user id: {user_id}"))
                });
        }
        Ok(None)
    }
}

/// Lazy reference to an attachment
#[must_use]
pub fn file_reference(file: &FileMeta) -> String {
    format!("{TG_FILE_SCHEME}{}", file.id.0)
}

/// `ImageGenerator` that serves Telegram references itself and hands
/// everything else to the wrapped generator.
pub struct TelegramImageFetcher {
    bot: Bot,
    inner: Arc<dyn ImageGenerator>,
}

impl TelegramImageFetcher {
    /// Wrap `inner`, downloading Telegram references with `bot`
    #[must_use]
    pub fn new(bot: Bot, inner: Arc<dyn ImageGenerator>) -> Self {
        Self { bot, inner }
    }

    async fn download_file(&self, file_id: FileId) -> Result<Vec<u8>, FigurineError> {
        let file = self
            .bot
            .get_file(file_id)
            .await
            .map_err(|e| FigurineError::DownloadFailed(e.to_string()))?;

        if file.meta.size > MAX_FILE_SIZE {
            return Err(FigurineError::DownloadFailed(format!(
                "file too large: {:.1} MB (max 20 MB)",
                f64::from(file.meta.size) / 1024.0 / 1024.0
            )));
        }

        let mut buf = Vec::new();
        self.bot
            .download_file(&file.path, &mut buf)
            .await
            .map_err(|e| FigurineError::DownloadFailed(e.to_string()))?;

        info!(size = buf.len(), "Downloaded image from Telegram");
        Ok(buf)
    }

    /// Largest size of the user's current profile photo
    async fn download_avatar(&self, user_id: UserId) -> Result<Vec<u8>, FigurineError> {
        let photos = self
            .bot
            .get_user_profile_photos(user_id)
            .limit(1)
            .await
            .map_err(|e| FigurineError::DownloadFailed(e.to_string()))?;

        let largest = photos
            .photos
            .first()
            .and_then(|sizes| sizes.iter().max_by_key(|size| size.width * size.height))
            .ok_or_else(|| {
                FigurineError::DownloadFailed(format!("user {} has no visible profile photo", user_id.0))
            })?;

        self.download_file(largest.file.id.clone()).await
    }
}

#[async_trait]
impl ImageGenerator for TelegramImageFetcher {
    async fn fetch_image_bytes(&self, reference: &str) -> Result<Vec<u8>, FigurineError> {
        match TelegramRef::parse(reference)? {
            Some(TelegramRef::File(file_id)) => self.download_file(file_id).await,
            Some(TelegramRef::Avatar(user_id)) => self.download_avatar(user_id).await,
            None => self.inner.fetch_image_bytes(reference).await,
        }
    }

    async fn submit(
        &self,
        request: &GenerationRequest,
        api_key: &str,
    ) -> Result<GenerationResult, FigurineError> {
        self.inner.submit(request, api_key).await
    }
}
