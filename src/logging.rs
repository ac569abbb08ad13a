//! Logging setup
//!
//! Log lines pass through a writer that masks Telegram bot tokens and
//! `OpenRouter` keys before they reach stderr.

use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting secrets
pub struct RedactionPatterns {
    bot_url_token: Regex,
    bare_token: Regex,
    prefixed_token: Regex,
    openrouter_key: Regex,
    bearer: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bot_url_token: Regex::new(r"(https?://[^/]+/(?:file/)?bot)([0-9]+:[A-Za-z0-9_-]+)(/)")?,
            bare_token: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            prefixed_token: Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
            openrouter_key: Regex::new(r"sk-or-v1-[A-Za-z0-9]+")?,
            bearer: Regex::new(r"(Bearer )[A-Za-z0-9._-]+")?,
        })
    }

    /// Mask every secret found in `input`
    #[must_use]
    pub fn redact(&self, input: &str) -> String {
        let output = self
            .bot_url_token
            .replace_all(input, "$1[TELEGRAM_TOKEN]$3");
        let output = self.bare_token.replace_all(&output, "[TELEGRAM_TOKEN]");
        let output = self
            .prefixed_token
            .replace_all(&output, "${1}[TELEGRAM_TOKEN]");
        let output = self
            .openrouter_key
            .replace_all(&output, "sk-or-v1-[MASKED]");
        self.bearer
            .replace_all(&output, "${1}[MASKED]")
            .into_owned()
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        self.inner.write_all(self.patterns.redact(&s).as_bytes())?;
        // The caller's whole buffer was consumed, whatever the redacted length
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: Arc::clone(&self.patterns),
        }
    }
}

/// Install the global subscriber: `RUST_LOG` filter (default `info`),
/// redacted output on stderr.
pub fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_openrouter_keys() -> Result<(), regex::Error> {
        let patterns = RedactionPatterns::new()?;
        assert_eq!(
            patterns.redact("added sk-or-v1-0123abcdef to store"),
            "added sk-or-v1-[MASKED] to store"
        );
        assert_eq!(
            patterns.redact("Authorization: Bearer abc.def-123"),
            "Authorization: Bearer [MASKED]"
        );
        Ok(())
    }

    #[test]
    fn test_redacts_telegram_tokens() -> Result<(), regex::Error> {
        let patterns = RedactionPatterns::new()?;
        let token = "123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw0";

        let url = format!("https://api.telegram.org/file/bot{token}/photos/file_1.jpg");
        assert_eq!(
            patterns.redact(&url),
            "https://api.telegram.org/file/bot[TELEGRAM_TOKEN]/photos/file_1.jpg"
        );
        assert_eq!(
            patterns.redact(&format!("token={token}")),
            "token=[TELEGRAM_TOKEN]"
        );
        Ok(())
    }

    #[test]
    fn test_writer_redacts_output() -> Result<(), Box<dyn std::error::Error>> {
        let patterns = Arc::new(RedactionPatterns::new()?);
        let mut writer = RedactingWriter {
            inner: Vec::new(),
            patterns,
        };
        let line = b"key sk-or-v1-secret\n";
        assert_eq!(writer.write(line)?, line.len());
        assert_eq!(String::from_utf8(writer.inner)?, "key sk-or-v1-[MASKED]\n");
        Ok(())
    }
}
