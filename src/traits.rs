use crate::model::{DestinationItem, RawAttachment, RawItem};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Which part of the source vault a run reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionScope {
    /// Items of a single collection.
    Collection(String),
    /// Every item the session can read, without a collection filter.
    PersonalVault,
}

impl CollectionScope {
    /// `None` (or the literal `"null"`) selects the personal vault.
    pub fn from_option(collection: Option<&str>) -> Self {
        match collection {
            Some(id) if !id.is_empty() && id != "null" => Self::Collection(id.to_string()),
            _ => Self::PersonalVault,
        }
    }
}

impl fmt::Display for CollectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection(id) => write!(f, "collection {}", id),
            Self::PersonalVault => write!(f, "personal vault"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Source vault unavailable: {0}")]
    Unavailable(String),
    #[error("Collection not found: {0}")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("Destination rejected the item: {0}")]
    Rejected(String),
    #[error("Destination vault unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SourceVault: Send + Sync {
    /// Returns the provider ID used in logs (e.g., "bitwarden").
    fn provider_id(&self) -> &str;

    /// Lists every item in `scope`, in the order the provider returns them.
    async fn list_items(&self, scope: &CollectionScope) -> Result<Vec<RawItem>, SourceError>;

    /// Downloads one attachment of `item` to `dest`.
    async fn fetch_attachment(
        &self,
        item: &RawItem,
        attachment: &RawAttachment,
        dest: &Path,
    ) -> Result<(), SourceError>;
}

#[async_trait]
pub trait DestinationVault: Send + Sync {
    /// Returns the provider ID used in logs (e.g., "1password").
    fn provider_id(&self) -> &str;

    /// Whether concurrent `create_item` calls are documented as safe.
    fn supports_parallel_writes(&self) -> bool {
        false
    }

    /// Creates `item` in `vault` and returns the new item's ID.
    async fn create_item(&self, item: &DestinationItem, vault: &str) -> Result<String, WriteError>;

    /// Attaches the file at `file` to an existing item.
    async fn attach_file(&self, item_id: &str, file: &Path) -> Result<(), WriteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_option() {
        assert_eq!(
            CollectionScope::from_option(Some("abc")),
            CollectionScope::Collection("abc".to_string())
        );
        assert_eq!(CollectionScope::from_option(None), CollectionScope::PersonalVault);
        assert_eq!(
            CollectionScope::from_option(Some("null")),
            CollectionScope::PersonalVault
        );
        assert_eq!(CollectionScope::from_option(Some("")), CollectionScope::PersonalVault);
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(
            CollectionScope::Collection("c1".into()).to_string(),
            "collection c1"
        );
        assert_eq!(CollectionScope::PersonalVault.to_string(), "personal vault");
    }
}
