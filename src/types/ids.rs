use super::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use uuid::Uuid;

/// Strong typing for IDs with phantom types
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker types for different ID kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WhiteboardMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FolderMarker;

/// Type aliases for specific ID types
pub type DocumentId = Id<DocumentMarker>;
pub type BlockId = Id<BlockMarker>;
pub type WhiteboardId = Id<WhiteboardMarker>;
pub type FolderId = Id<FolderMarker>;

/// Longest token the remote service hands out, with headroom.
const MAX_ID_LENGTH: usize = 128;

static URL_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(?:docx|docs|wiki|drive/folder)/([A-Za-z0-9_-]+)(?:[/?#]|$)")
        .expect("document URL regex is valid")
});

impl<T> Id<T> {
    /// Parse a raw token or a document URL into an ID
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let normalized = normalize_token(input)?;
        Ok(Self {
            value: normalized,
            _phantom: PhantomData,
        })
    }

    /// Create an ID from a string the remote service returned (internal use)
    pub(crate) fn from_remote(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _phantom: PhantomData,
        }
    }

    /// Create a locally unique ID, used for dry runs and tests
    pub fn new_v4() -> Self {
        let uuid = Uuid::new_v4();
        Self {
            value: uuid.as_simple().to_string(),
            _phantom: PhantomData,
        }
    }

    /// Get the ID as a string reference
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Reinterprets the ID as another kind.
    ///
    /// A document's root block shares the document's token, so this is the
    /// only sanctioned way to cross between the two.
    pub fn cast<U>(&self) -> Id<U> {
        Id {
            value: self.value.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::from_remote(value))
    }
}

impl<T> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::from_remote(value)
    }
}

/// Normalize a raw token or a document URL into a bare token
fn normalize_token(input: &str) -> Result<String, ValidationError> {
    let input = input.trim();

    if input.starts_with("http://") || input.starts_with("https://") {
        return URL_TOKEN_REGEX
            .captures(input)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                ValidationError::InvalidId(format!("Could not extract token from URL: {}", input))
            });
    }

    if input.is_empty() {
        return Err(ValidationError::EmptyField("id"));
    }

    if input.len() > MAX_ID_LENGTH {
        return Err(ValidationError::InvalidId(format!(
            "ID too long: {} characters (max {})",
            input.len(),
            MAX_ID_LENGTH
        )));
    }

    if !input
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::InvalidId(format!(
            "ID may only contain letters, digits, '_' and '-': {}",
            input
        )));
    }

    Ok(input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_parsing() {
        let id = DocumentId::parse("doxcnAbCdEf0123456789").unwrap();
        assert_eq!(id.as_str(), "doxcnAbCdEf0123456789");

        let id = DocumentId::parse("  doxcnAbCdEf0123456789\n").unwrap();
        assert_eq!(id.as_str(), "doxcnAbCdEf0123456789");

        let id = DocumentId::parse("https://example.feishu.cn/docx/doxcnAbCdEf0123456789?from=x")
            .unwrap();
        assert_eq!(id.as_str(), "doxcnAbCdEf0123456789");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(DocumentId::parse("").is_err());
        assert!(DocumentId::parse("has spaces in it").is_err());
        assert!(DocumentId::parse("https://example.com/nothing-here").is_err());
        assert!(DocumentId::parse(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_cast_keeps_token() {
        let doc = DocumentId::parse("doxcnRoot").unwrap();
        let root: BlockId = doc.cast();
        assert_eq!(root.as_str(), "doxcnRoot");
    }
}
