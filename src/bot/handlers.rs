use crate::bot::event::{build_inbound_event, message_text};
use crate::bot::media::TelegramImageFetcher;
use crate::bot::messaging::{send_generated, send_text_logged, WORKING_TEXT};
use crate::config::{Settings, API_KEY_PREFIX};
use crate::figurine::{self, PRESETS};
use crate::llm::ImageGenerator;
use crate::storage::{extract_candidate_keys, AddKeysReport, KeyStore, MaskedKey};
use anyhow::Result;
use std::sync::Arc;
use teloxide::{prelude::*, utils::command::BotCommands};
use tracing::{error, info, warn};

const ADMIN_ONLY_TEXT: &str = "❌ 仅管理员可用";

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "支持的命令:")]
pub enum Command {
    /// Show usage
    #[command(description = "使用说明")]
    Start,
    /// Add one or more API keys (admins only)
    #[command(description = "添加 API 密钥（仅管理员）")]
    AddKeys(String),
    /// List stored API keys, masked (admins only)
    #[command(description = "查看 API 密钥列表（仅管理员）")]
    Keys,
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
#[must_use]
pub fn get_user_id_safe(msg: &Message) -> i64 {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

fn is_admin(settings: &Settings, msg: &Message) -> bool {
    settings.admin_users().contains(&get_user_id_safe(msg))
}

/// Usage text listing the trigger phrases
#[must_use]
pub fn usage_text() -> String {
    let triggers: Vec<&str> = PRESETS
        .iter()
        .map(|p| match p {
            figurine::Preset::Figurine1 => "手办化",
            other => other.label(),
        })
        .collect();
    format!(
        "发送以下任一指令生成手办化形象：\n{}\n\n可在指令后附加 @用户ID 或 空格+用户ID。\n图片来源优先级：引用消息中的图片 > 提及的用户头像 > 指令中的用户ID > 消息自带图片 > 你自己的头像。",
        triggers.join(" / ")
    )
}

/// Handle `/start`
///
/// # Errors
///
/// Returns an error if the message fails to send.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    bot.send_message(msg.chat.id, usage_text()).await?;
    Ok(())
}

/// Handle `/addkeys <keys…>`
///
/// # Errors
///
/// Returns an error if the reply fails to send.
pub async fn add_keys(
    bot: Bot,
    msg: Message,
    keys: Arc<KeyStore>,
    settings: Arc<Settings>,
    args: String,
) -> Result<()> {
    if !is_admin(&settings, &msg) {
        bot.send_message(msg.chat.id, ADMIN_ONLY_TEXT).await?;
        return Ok(());
    }

    let args = args.trim();
    if args.is_empty() {
        let usage = format!(
            "❌ 请提供API密钥\n\n📝 用法:\n/addkeys <密钥1> [密钥2] ...\n\n支持空格/逗号/分号/换行；格式 {API_KEY_PREFIX}xxxxxxxx..."
        );
        bot.send_message(msg.chat.id, usage).await?;
        return Ok(());
    }

    let reply = match extract_candidate_keys(args) {
        Ok(candidates) => match keys.add_keys(candidates).await {
            Ok(report) => format_add_report(report),
            Err(e) => {
                error!("Failed to add API keys: {}", e);
                e.user_message()
            }
        },
        Err(_) => format!("❌ 未检测到有效密钥（须以 {API_KEY_PREFIX} 开头）"),
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handle `/keys`
///
/// # Errors
///
/// Returns an error if the reply fails to send.
pub async fn list_keys(
    bot: Bot,
    msg: Message,
    keys: Arc<KeyStore>,
    settings: Arc<Settings>,
) -> Result<()> {
    if !is_admin(&settings, &msg) {
        bot.send_message(msg.chat.id, ADMIN_ONLY_TEXT).await?;
        return Ok(());
    }

    let reply = match keys.listing().await {
        Ok(listing) => format_listing(&listing),
        Err(e) => {
            error!("Failed to read API keys: {}", e);
            e.user_message()
        }
    };
    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handle any text or caption; runs the figurine flow when it is a trigger.
///
/// Every run failure is reported to the chat; only a failure to deliver
/// that report is returned.
///
/// # Errors
///
/// Returns an error if the result cannot be delivered.
pub async fn handle_trigger(
    bot: Bot,
    msg: Message,
    generator: Arc<dyn ImageGenerator>,
    keys: Arc<KeyStore>,
    settings: Arc<Settings>,
) -> Result<()> {
    let Some(command) = figurine::parse(message_text(&msg)) else {
        return Ok(());
    };
    info!(
        user_id = get_user_id_safe(&msg),
        preset = command.preset.label(),
        target = ?command.target_id,
        "Figurine trigger received"
    );

    send_text_logged(&bot, msg.chat.id, WORKING_TEXT).await;

    let event = build_inbound_event(&msg);
    let fetcher = TelegramImageFetcher::new(bot.clone(), generator);

    match figurine::run(&fetcher, &keys, &settings, &command, &event).await {
        Ok(generated) => send_generated(&bot, msg.chat.id, &generated).await,
        Err(e) => {
            warn!("Figurine run failed: {}", e);
            bot.send_message(msg.chat.id, e.user_message()).await?;
            Ok(())
        }
    }
}

fn format_add_report(report: AddKeysReport) -> String {
    let mut lines = vec!["✅ 操作完成:".to_string()];
    if report.added > 0 {
        lines.push(format!("- 成功添加 {} 个", report.added));
    }
    if report.duplicates > 0 {
        lines.push(format!("- 跳过 {} 个重复", report.duplicates));
    }
    lines.join("\n")
}

fn format_listing(listing: &[MaskedKey]) -> String {
    if listing.is_empty() {
        return "📝 当前没有配置任何API密钥\n\n使用 /addkeys <密钥> 添加".to_string();
    }
    let mut lines = vec![format!("📝 API密钥列表 ({}个)", listing.len())];
    for (idx, key) in listing.iter().enumerate() {
        let mark = if key.is_current { " (当前)" } else { "" };
        lines.push(format!("{}. {}{}", idx + 1, key.masked, mark));
    }
    lines.join("\n")
}
