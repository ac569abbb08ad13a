//! Reply helpers for the Telegram chat.

use crate::figurine::{success_caption, Generated};
use crate::llm::GenerationResult;
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InputFile};
use tracing::{error, warn};

/// Acknowledgment sent before a run starts
pub const WORKING_TEXT: &str = "🎨 正在生成手办化形象，请稍候…";

/// Send a plain text message, logging instead of failing.
///
/// Used for acknowledgments and failure reports, where a send error must
/// not abort the run.
pub async fn send_text_logged(bot: &Bot, chat_id: ChatId, text: &str) {
    if let Err(e) = bot.send_message(chat_id, text).await {
        error!("Failed to send message to chat {}: {}", chat_id, e);
    }
}

/// Send the generated image with its caption.
///
/// Remote images Telegram refuses to fetch, or URLs it cannot parse, are
/// sent as a link instead.
///
/// # Errors
///
/// Returns an error if the fallback text message fails too.
pub async fn send_generated(bot: &Bot, chat_id: ChatId, generated: &Generated) -> Result<()> {
    let caption = success_caption(generated);

    let input = match &generated.result {
        GenerationResult::InlineImage { path, .. } => InputFile::file(path.clone()),
        GenerationResult::RemoteImage { url } => match reqwest::Url::parse(url) {
            Ok(parsed) => InputFile::url(parsed),
            Err(e) => {
                warn!("Generated image URL is not a valid URL ({}): {}", e, url);
                bot.send_message(chat_id, format!("{url}\n{caption}")).await?;
                return Ok(());
            }
        },
    };

    if let Err(e) = bot.send_photo(chat_id, input).caption(caption.clone()).await {
        warn!("Failed to send generated image as photo: {}", e);
        let fallback = match &generated.result {
            GenerationResult::RemoteImage { url } => format!("{url}\n{caption}"),
            GenerationResult::InlineImage { .. } => format!("❌ 发送图片失败: {e}"),
        };
        bot.send_message(chat_id, fallback).await?;
    }
    Ok(())
}
