//! Figurine flow
//!
//! Host-neutral core: trigger parsing, presets, image source resolution and
//! the run that ties them to the generation client and key store.

/// Trigger phrase parsing
pub mod command;
/// One generation run
pub mod pipeline;
/// Preset instruction prompts
pub mod presets;
/// Image source priority order
pub mod resolver;

pub use command::{parse, ParsedCommand};
pub use pipeline::{run, success_caption, Generated};
pub use presets::{Preset, PresetPrompt, PRESETS};
pub use resolver::{InboundEvent, ImageSource, ResolvedImage};
