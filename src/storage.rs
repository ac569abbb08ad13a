//! API key store
//!
//! Keeps an ordered list of `OpenRouter` keys and a rotation cursor in a single
//! JSON document. Every mutation rewrites the whole document.

use crate::config::API_KEY_PREFIX;
use crate::error::FigurineError;
use lazy_regex::{lazy_regex, Lazy};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Separators accepted between keys in `/addkeys` input
static RE_KEY_SEPARATORS: Lazy<Regex> = lazy_regex!(r"[\s,;，；]+");

/// Number of leading characters left visible when masking a key
const MASK_VISIBLE_CHARS: usize = 12;

/// On-disk representation of the key store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyStoreDocument {
    /// Keys in insertion order
    #[serde(default)]
    pub keys: Vec<String>,
    /// Index of the key handed out next
    #[serde(default)]
    pub current: usize,
}

/// Outcome of adding a batch of keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddKeysReport {
    /// Keys appended to the store
    pub added: usize,
    /// Keys skipped because they were already present
    pub duplicates: usize,
}

/// One row of the masked key listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedKey {
    /// First characters of the key followed by `***`
    pub masked: String,
    /// Whether the cursor points at this key
    pub is_current: bool,
}

/// File-backed key store with round-robin selection.
///
/// Each public operation holds an async lock for its whole
/// read-modify-write cycle, so concurrent handlers in one process never
/// interleave on the cursor.
pub struct KeyStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl KeyStore {
    /// Create a store backed by `path`. Nothing is read until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing document
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the key at the cursor and advance the cursor.
    ///
    /// # Errors
    ///
    /// Returns `FigurineError::NoKeysConfigured` if the store is empty, or
    /// `FigurineError::Storage` if the document cannot be read or written.
    pub async fn next_key(&self) -> Result<String, FigurineError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.keys.is_empty() {
            return Err(FigurineError::NoKeysConfigured);
        }

        let idx = doc.current % doc.keys.len();
        doc.current = (idx + 1) % doc.keys.len();
        let key = doc.keys[idx].clone();
        self.save(&doc).await?;

        debug!(index = idx, total = doc.keys.len(), "Rotated API key");
        Ok(key)
    }

    /// Append keys that are not stored yet.
    ///
    /// Exact duplicates, against the store or earlier in the same batch,
    /// are skipped and counted.
    ///
    /// # Errors
    ///
    /// Returns `FigurineError::InvalidCredentialFormat` if a candidate lacks the
    /// key prefix, or `FigurineError::Storage` on I/O failure.
    pub async fn add_keys<I, S>(&self, candidates: I) -> Result<AddKeysReport, FigurineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidates: Vec<String> = candidates.into_iter().map(Into::into).collect();
        if candidates.iter().any(|k| !k.starts_with(API_KEY_PREFIX)) {
            return Err(FigurineError::InvalidCredentialFormat {
                prefix: API_KEY_PREFIX,
            });
        }

        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let mut seen: HashSet<String> = doc.keys.iter().cloned().collect();
        let mut report = AddKeysReport::default();

        for key in candidates {
            if seen.insert(key.clone()) {
                doc.keys.push(key);
                report.added += 1;
            } else {
                report.duplicates += 1;
            }
        }

        self.save(&doc).await?;
        info!(
            added = report.added,
            duplicates = report.duplicates,
            total = doc.keys.len(),
            "API keys updated"
        );
        Ok(report)
    }

    /// Masked view of the stored keys.
    ///
    /// # Errors
    ///
    /// Returns `FigurineError::Storage` if the document cannot be read.
    pub async fn listing(&self) -> Result<Vec<MaskedKey>, FigurineError> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(doc
            .keys
            .iter()
            .enumerate()
            .map(|(idx, key)| MaskedKey {
                masked: mask_key(key),
                is_current: idx == doc.current,
            })
            .collect())
    }

    /// Read the document, creating it with empty defaults if it is missing.
    async fn load(&self) -> Result<KeyStoreDocument, FigurineError> {
        if !tokio::fs::try_exists(&self.path).await? {
            let doc = KeyStoreDocument::default();
            self.save(&doc).await?;
            info!("Created empty key store at {}", self.path.display());
            return Ok(doc);
        }
        let raw = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Write the whole document to a sibling temp file, then rename it in place.
    async fn save(&self, doc: &KeyStoreDocument) -> Result<(), FigurineError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(doc)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Split free-form input into key candidates.
///
/// Tokens are separated by whitespace, commas or semicolons (ASCII and
/// full-width); only tokens carrying the key prefix are kept.
///
/// # Errors
///
/// Returns `FigurineError::InvalidCredentialFormat` if no token has the prefix.
pub fn extract_candidate_keys(text: &str) -> Result<Vec<String>, FigurineError> {
    let candidates: Vec<String> = RE_KEY_SEPARATORS
        .split(text)
        .filter(|token| token.starts_with(API_KEY_PREFIX))
        .map(ToString::to_string)
        .collect();

    if candidates.is_empty() {
        return Err(FigurineError::InvalidCredentialFormat {
            prefix: API_KEY_PREFIX,
        });
    }
    Ok(candidates)
}

/// Show the first characters of a key, hide the rest
#[must_use]
pub fn mask_key(key: &str) -> String {
    if key.chars().count() < MASK_VISIBLE_CHARS {
        return "***".to_string();
    }
    let visible: String = key.chars().take(MASK_VISIBLE_CHARS).collect();
    format!("{visible}***")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> KeyStore {
        KeyStore::new(dir.path().join("figurine").join("keys.json"))
    }

    #[tokio::test]
    async fn test_empty_store_has_no_keys() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);

        let err = store.next_key().await;
        assert!(matches!(err, Err(FigurineError::NoKeysConfigured)));
        // First access creates the document with defaults
        let raw = std::fs::read_to_string(store.path())?;
        let doc: KeyStoreDocument = serde_json::from_str(&raw)?;
        assert_eq!(doc, KeyStoreDocument::default());
        Ok(())
    }

    #[tokio::test]
    async fn test_round_robin_rotation() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);
        store
            .add_keys(["sk-or-v1-aaa", "sk-or-v1-bbb", "sk-or-v1-ccc"])
            .await?;

        assert_eq!(store.next_key().await?, "sk-or-v1-aaa");
        assert_eq!(store.next_key().await?, "sk-or-v1-bbb");
        assert_eq!(store.next_key().await?, "sk-or-v1-ccc");
        assert_eq!(store.next_key().await?, "sk-or-v1-aaa");
        Ok(())
    }

    #[tokio::test]
    async fn test_cursor_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);
        store.add_keys(["sk-or-v1-aaa", "sk-or-v1-bbb"]).await?;
        store.next_key().await?;

        let reopened = store_in(&dir);
        assert_eq!(reopened.next_key().await?, "sk-or-v1-bbb");
        Ok(())
    }

    #[tokio::test]
    async fn test_out_of_range_cursor_wraps() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("keys.json");
        std::fs::write(
            &path,
            r#"{"keys": ["sk-or-v1-aaa", "sk-or-v1-bbb"], "current": 5}"#,
        )?;

        let store = KeyStore::new(&path);
        assert_eq!(store.next_key().await?, "sk-or-v1-bbb");
        assert_eq!(store.next_key().await?, "sk-or-v1-aaa");
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicates_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);

        let first = store.add_keys(["sk-or-v1-aaa"]).await?;
        assert_eq!(first, AddKeysReport { added: 1, duplicates: 0 });

        let second = store.add_keys(["sk-or-v1-aaa", "sk-or-v1-bbb"]).await?;
        assert_eq!(second, AddKeysReport { added: 1, duplicates: 1 });

        // Same key twice in one batch is stored once
        let third = store.add_keys(["sk-or-v1-ccc", "sk-or-v1-ccc"]).await?;
        assert_eq!(third, AddKeysReport { added: 1, duplicates: 1 });

        assert_eq!(store.listing().await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_rejects_unprefixed_keys() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);

        let result = store.add_keys(["sk-proj-123"]).await;
        assert!(matches!(
            result,
            Err(FigurineError::InvalidCredentialFormat { .. })
        ));
        assert!(store.listing().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_marks_cursor() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = store_in(&dir);
        store
            .add_keys(["sk-or-v1-0123456789abcdef", "sk-or-v1-fedcba9876543210"])
            .await?;
        store.next_key().await?;

        let listing = store.listing().await?;
        assert_eq!(listing[0].masked, "sk-or-v1-012***");
        assert!(!listing[0].is_current);
        assert_eq!(listing[1].masked, "sk-or-v1-fed***");
        assert!(listing[1].is_current);
        Ok(())
    }

    #[test]
    fn test_extract_candidate_keys() -> Result<(), FigurineError> {
        let keys = extract_candidate_keys("sk-or-v1-a, sk-or-v1-b；sk-or-v1-c\nfoo;sk-or-v1-d")?;
        assert_eq!(keys, vec!["sk-or-v1-a", "sk-or-v1-b", "sk-or-v1-c", "sk-or-v1-d"]);

        assert!(matches!(
            extract_candidate_keys("hello world"),
            Err(FigurineError::InvalidCredentialFormat { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_mask_short_key() {
        assert_eq!(mask_key("sk-or-v1"), "***");
        assert_eq!(mask_key("sk-or-v1-abc"), "sk-or-v1-abc***");
    }
}
