//! Converts Telegram messages into the host-neutral `InboundEvent`.
//!
//! Nothing is downloaded here: attachments become `tg-file://` references
//! and are fetched only if the resolver picks them.

use crate::bot::media::file_reference;
use crate::figurine::InboundEvent;
use teloxide::prelude::*;
use teloxide::types::{FileMeta, MessageEntityKind};

/// Build the event for `msg` and the message it replies to
#[must_use]
pub fn build_inbound_event(msg: &Message) -> InboundEvent {
    InboundEvent {
        reply_images: msg
            .reply_to_message()
            .map(image_references)
            .unwrap_or_default(),
        message_images: image_references(msg),
        mentioned_ids: mentioned_ids(msg),
        sender_id: msg.from.as_ref().map(|u| u.id.0.to_string()),
    }
}

/// Text of the message, or its caption for media messages
#[must_use]
pub fn message_text(msg: &Message) -> &str {
    msg.text().or_else(|| msg.caption()).unwrap_or("")
}

/// Ids of users mentioned by a `TextMention` entity, in order of appearance
fn mentioned_ids(msg: &Message) -> Vec<String> {
    msg.entities()
        .or_else(|| msg.caption_entities())
        .unwrap_or_default()
        .iter()
        .filter_map(|entity| match &entity.kind {
            MessageEntityKind::TextMention { user } => Some(user.id.0.to_string()),
            _ => None,
        })
        .collect()
}

/// The largest photo size, or a document with an `image/*` MIME type
fn image_attachment(msg: &Message) -> Option<&FileMeta> {
    if let Some(photo) = msg.photo().and_then(<[_]>::last) {
        return Some(&photo.file);
    }
    msg.document()
        .filter(|doc| {
            doc.mime_type
                .as_ref()
                .is_some_and(|mime| mime.essence_str().starts_with("image/"))
        })
        .map(|doc| &doc.file)
}

fn image_references(msg: &Message) -> Vec<String> {
    image_attachment(msg)
        .map(file_reference)
        .into_iter()
        .collect()
}
