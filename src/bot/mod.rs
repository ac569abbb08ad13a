/// Telegram message → `InboundEvent` conversion
pub mod event;
/// Command and trigger handlers
pub mod handlers;
/// Lazy Telegram image references and their download
pub mod media;
/// Reply helpers
pub mod messaging;
