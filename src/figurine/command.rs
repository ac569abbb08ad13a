//! Trigger phrase parsing.
//!
//! Matchers are tried top to bottom; longer triggers come before the ones
//! they start with, so `手办化` never shadows `手办化2`.

// lazy_regex! statics, validated at compile time
#![allow(clippy::non_std_lazy_statics)]

use super::presets::Preset;
use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;

static RE_FIGURINE_4: Lazy<Regex> = lazy_regex!(r"^手办化4(?:@(\d+)|\s+(\d+))?\s*$");
static RE_FIGURINE_3: Lazy<Regex> = lazy_regex!(r"^手办化3(?:@(\d+)|\s+(\d+))?\s*$");
static RE_FIGURINE_2: Lazy<Regex> = lazy_regex!(r"^手办化2(?:@(\d+)|\s+(\d+))?\s*$");
static RE_FIGURINE: Lazy<Regex> = lazy_regex!(r"^手办化(?:@(\d+)|\s+(\d+))?\s*$");
static RE_CHIBI: Lazy<Regex> = lazy_regex!(r"^Q版化(?:@(\d+)|\s+(\d+))?\s*$");

/// Prioritized (matcher, preset) pairs
static TRIGGERS: [(&Lazy<Regex>, Preset); 5] = [
    (&RE_FIGURINE_4, Preset::Figurine4),
    (&RE_FIGURINE_3, Preset::Figurine3),
    (&RE_FIGURINE_2, Preset::Figurine2),
    (&RE_FIGURINE, Preset::Figurine1),
    (&RE_CHIBI, Preset::Chibi),
];

/// A recognized trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Selected preset
    pub preset: Preset,
    /// Participant id given as `@123` or ` 123` after the trigger
    pub target_id: Option<String>,
}

/// Match `text` against the trigger phrases.
///
/// Returns `None` for anything that is not exactly a trigger with an
/// optional id.
#[must_use]
pub fn parse(text: &str) -> Option<ParsedCommand> {
    let text = text.trim();
    TRIGGERS.iter().find_map(|(re, preset)| {
        re.captures(text).map(|caps| ParsedCommand {
            preset: *preset,
            target_id: caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string()),
        })
    })
}
