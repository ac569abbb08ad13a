//! Picks the single image a run sends for transformation.
//!
//! Sources are independent functions tried in a fixed order; the first one
//! that yields a reference wins.

/// Host-neutral view of an inbound chat message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundEvent {
    /// Image references attached to the message being replied to
    pub reply_images: Vec<String>,
    /// Image references attached to the message itself
    pub message_images: Vec<String>,
    /// Ids of mentioned participants, in order of appearance
    pub mentioned_ids: Vec<String>,
    /// Id of the author
    pub sender_id: Option<String>,
}

/// Which source produced the image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    /// Attachment of the replied-to message
    ReplyAttachment,
    /// Avatar of the first mentioned participant
    MentionAvatar,
    /// Avatar of the id typed after the trigger
    TargetAvatar,
    /// Attachment of the triggering message
    MessageAttachment,
    /// Avatar of the sender
    SenderAvatar,
}

/// The chosen image and where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    /// What won the priority order
    pub source: ImageSource,
    /// URL, local path or inline-data handle
    pub reference: String,
}

/// Inputs shared by every source
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    /// The inbound message
    pub event: &'a InboundEvent,
    /// Id captured by the command parser
    pub target_id: Option<&'a str>,
    /// Avatar URL with an `{id}` placeholder
    pub avatar_url_template: &'a str,
}

type SourceFn = fn(&ResolveContext<'_>) -> Option<String>;

/// Priority order, first success wins
const PIPELINE: &[(ImageSource, SourceFn)] = &[
    (ImageSource::ReplyAttachment, from_reply_attachment),
    (ImageSource::MentionAvatar, from_mention),
    (ImageSource::TargetAvatar, from_target_id),
    (ImageSource::MessageAttachment, from_message_attachment),
    (ImageSource::SenderAvatar, from_sender),
];

/// Resolve the image for a run.
///
/// Returns `None` when no source yields a reference; the caller reports
/// that to the user.
#[must_use]
pub fn resolve(ctx: &ResolveContext<'_>) -> Option<ResolvedImage> {
    PIPELINE.iter().find_map(|(source, resolve_fn)| {
        resolve_fn(ctx).map(|reference| ResolvedImage {
            source: *source,
            reference,
        })
    })
}

/// Fill the avatar template with a participant id
#[must_use]
pub fn build_avatar_url(template: &str, id: &str) -> String {
    template.replace("{id}", id)
}

fn first_non_empty(refs: &[String]) -> Option<String> {
    refs.iter().find(|r| !r.is_empty()).cloned()
}

fn avatar_for(ctx: &ResolveContext<'_>, id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    Some(build_avatar_url(ctx.avatar_url_template, id))
}

fn from_reply_attachment(ctx: &ResolveContext<'_>) -> Option<String> {
    first_non_empty(&ctx.event.reply_images)
}

fn from_mention(ctx: &ResolveContext<'_>) -> Option<String> {
    ctx.event
        .mentioned_ids
        .iter()
        .find_map(|id| avatar_for(ctx, id))
}

fn from_target_id(ctx: &ResolveContext<'_>) -> Option<String> {
    ctx.target_id.and_then(|id| avatar_for(ctx, id))
}

fn from_message_attachment(ctx: &ResolveContext<'_>) -> Option<String> {
    first_non_empty(&ctx.event.message_images)
}

fn from_sender(ctx: &ResolveContext<'_>) -> Option<String> {
    ctx.event
        .sender_id
        .as_deref()
        .and_then(|id| avatar_for(ctx, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "https://avatar.test/{id}.png";

    fn ctx<'a>(event: &'a InboundEvent, target_id: Option<&'a str>) -> ResolveContext<'a> {
        ResolveContext {
            event,
            target_id,
            avatar_url_template: TEMPLATE,
        }
    }

    fn default_ctx<'a>(event: &'a InboundEvent, target_id: Option<&'a str>) -> ResolveContext<'a> {
        ResolveContext {
            event,
            target_id,
            avatar_url_template: crate::config::DEFAULT_AVATAR_URL_TEMPLATE,
        }
    }

    fn event() -> InboundEvent {
        InboundEvent {
            sender_id: Some("1000".to_string()),
            ..InboundEvent::default()
        }
    }

    #[test]
    fn test_reply_image_beats_mention() {
        let mut ev = event();
        ev.reply_images = vec!["https://cdn.test/reply.jpg".to_string()];
        ev.mentioned_ids = vec!["2000".to_string()];
        ev.message_images = vec!["https://cdn.test/own.jpg".to_string()];

        let resolved = resolve(&ctx(&ev, Some("3000")));
        assert_eq!(
            resolved,
            Some(ResolvedImage {
                source: ImageSource::ReplyAttachment,
                reference: "https://cdn.test/reply.jpg".to_string(),
            })
        );
    }

    #[test]
    fn test_mention_resolves_to_avatar() {
        let mut ev = event();
        ev.mentioned_ids = vec!["2000".to_string()];

        let resolved = resolve(&ctx(&ev, None));
        assert_eq!(
            resolved.map(|r| (r.source, r.reference)),
            Some((
                ImageSource::MentionAvatar,
                "https://avatar.test/2000.png".to_string()
            ))
        );
    }

    #[test]
    fn test_mention_beats_own_attachment_and_target() {
        let mut ev = event();
        ev.mentioned_ids = vec!["2000".to_string()];
        ev.message_images = vec!["https://cdn.test/own.jpg".to_string()];

        let resolved = resolve(&ctx(&ev, Some("3000")));
        assert_eq!(
            resolved.map(|r| r.source),
            Some(ImageSource::MentionAvatar)
        );
    }

    #[test]
    fn test_target_id_beats_own_attachment() {
        let mut ev = event();
        ev.message_images = vec!["https://cdn.test/own.jpg".to_string()];

        let resolved = resolve(&ctx(&ev, Some("3000")));
        assert_eq!(
            resolved.map(|r| r.reference),
            Some("https://avatar.test/3000.png".to_string())
        );
    }

    #[test]
    fn test_own_attachment_beats_sender() {
        let mut ev = event();
        ev.message_images = vec![String::new(), "base64://AAAA".to_string()];

        let resolved = resolve(&ctx(&ev, None));
        assert_eq!(
            resolved,
            Some(ResolvedImage {
                source: ImageSource::MessageAttachment,
                reference: "base64://AAAA".to_string(),
            })
        );
    }

    #[test]
    fn test_falls_back_to_sender_avatar() {
        let ev = event();
        let resolved = resolve(&ctx(&ev, None));
        assert_eq!(
            resolved.map(|r| (r.source, r.reference)),
            Some((
                ImageSource::SenderAvatar,
                "https://avatar.test/1000.png".to_string()
            ))
        );
    }

    #[test]
    fn test_nothing_to_resolve() {
        let ev = InboundEvent::default();
        assert_eq!(resolve(&ctx(&ev, None)), None);
    }

    #[test]
    fn test_build_avatar_url() {
        assert_eq!(
            build_avatar_url(crate::config::DEFAULT_AVATAR_URL_TEMPLATE, "12345"),
            "tg-avatar://12345"
        );
    }

    #[test]
    fn test_default_template_keeps_telegram_avatars() {
        let ev = InboundEvent {
            mentioned_ids: vec!["6000000001".to_string()],
            sender_id: Some("5123456789".to_string()),
            ..InboundEvent::default()
        };

        let sender_only = InboundEvent {
            sender_id: ev.sender_id.clone(),
            ..InboundEvent::default()
        };
        let references = [
            resolve(&default_ctx(&sender_only, None)),
            resolve(&default_ctx(&sender_only, Some("7000000002"))),
            resolve(&default_ctx(&ev, None)),
        ]
        .map(|r| r.map(|r| r.reference));

        assert_eq!(
            references,
            [
                Some("tg-avatar://5123456789".to_string()),
                Some("tg-avatar://7000000002".to_string()),
                Some("tg-avatar://6000000001".to_string()),
            ]
        );
        assert!(references.iter().flatten().all(|r| !r.contains("qlogo")));
    }
}
