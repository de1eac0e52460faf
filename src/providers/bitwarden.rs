//! Source vault backed by the Bitwarden CLI (`bw`).

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::model::{RawAttachment, RawItem};
use crate::providers::cli::{CliCommand, CliOutput};
use crate::traits::{CollectionScope, SourceError, SourceVault};

/// Reads items through an already unlocked `bw` session.
///
/// The session key is handed to the child as `BW_SESSION`; this type never
/// logs in or unlocks.
pub struct BitwardenCli {
    command: CliCommand,
}

impl BitwardenCli {
    pub fn new(session: Option<&str>) -> Self {
        Self::with_command(CliCommand::new("bw"), session)
    }

    /// Uses `command` (e.g. a wrapper script) in place of `bw`.
    pub fn with_command(command: CliCommand, session: Option<&str>) -> Self {
        let command = match session {
            Some(key) if !key.is_empty() => command.with_env("BW_SESSION", key),
            _ => command,
        };
        Self { command }
    }

    async fn call(&self, args: &[&str]) -> Result<CliOutput, SourceError> {
        self.command
            .run(args, None)
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))
    }

    /// Fails with [`SourceError::NotFound`] when the collection does not
    /// exist for this session.
    async fn resolve_collection(&self, id: &str) -> Result<(), SourceError> {
        let output = self.call(&["get", "collection", id]).await?;
        if output.success {
            return Ok(());
        }
        let text = output.error_text();
        if text.to_ascii_lowercase().contains("not found") {
            Err(SourceError::NotFound(id.to_string()))
        } else {
            Err(SourceError::Unavailable(text))
        }
    }
}

#[async_trait]
impl SourceVault for BitwardenCli {
    fn provider_id(&self) -> &str {
        "bitwarden"
    }

    #[instrument(skip(self))]
    async fn list_items(&self, scope: &CollectionScope) -> Result<Vec<RawItem>, SourceError> {
        let output = match scope {
            CollectionScope::Collection(id) => {
                self.resolve_collection(id).await?;
                let filter = format!("--collectionid={}", id);
                self.call(&["list", "items", &filter]).await?
            }
            // Everything the session can read, organization items included.
            CollectionScope::PersonalVault => self.call(&["list", "items"]).await?,
        };
        if !output.success {
            return Err(SourceError::Unavailable(output.error_text()));
        }

        let items: Vec<RawItem> = serde_json::from_str(output.stdout.trim()).map_err(|e| {
            SourceError::Unavailable(format!("unexpected item list from bw: {}", e))
        })?;
        info!(count = items.len(), "Listed source items");
        Ok(items)
    }

    #[instrument(skip(self, item, attachment), fields(item = %item.id, file = %attachment.file_name))]
    async fn fetch_attachment(
        &self,
        item: &RawItem,
        attachment: &RawAttachment,
        dest: &Path,
    ) -> Result<(), SourceError> {
        let dest = dest.to_string_lossy();
        let output = self
            .call(&[
                "get",
                "attachment",
                &attachment.id,
                "--itemid",
                &item.id,
                "--output",
                &dest,
            ])
            .await?;
        if !output.success {
            return Err(SourceError::Unavailable(output.error_text()));
        }
        debug!(dest = %dest, "Attachment downloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::cli::shell;

    const FAKE_BW: &str = r#"
case "$1 $2" in
  "get collection")
    if [ "$3" = "col-1" ]; then echo '{"id":"col-1"}'; else echo "Not found." >&2; exit 1; fi ;;
  "list items")
    printf '[{"id":"a","type":1,"name":"%s","folderId":null},{"id":"b","type":2,"name":"%s"}]' "${3:-unfiltered}" "$BW_SESSION" ;;
  "get attachment")
    printf '%s/%s' "$3" "$5" > "$7" ;;
  *)
    echo "unknown command" >&2; exit 2 ;;
esac
"#;

    fn bw(script: &str) -> BitwardenCli {
        BitwardenCli::with_command(shell(script), Some("session-key"))
    }

    #[tokio::test]
    async fn test_lists_collection_items() {
        let items = bw(FAKE_BW)
            .list_items(&CollectionScope::Collection("col-1".into()))
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "--collectionid=col-1");
        assert_eq!(items[1].name, "session-key");
        assert_eq!(items[1].type_tag, 2);
        assert!(items[0].extra.contains_key("folderId"));
    }

    #[tokio::test]
    async fn test_personal_vault_lists_without_filter() {
        let items = bw(FAKE_BW)
            .list_items(&CollectionScope::PersonalVault)
            .await
            .unwrap();
        assert_eq!(items[0].name, "unfiltered");
    }

    #[tokio::test]
    async fn test_unknown_collection_is_not_found() {
        let err = bw(FAKE_BW)
            .list_items(&CollectionScope::Collection("col-9".into()))
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::NotFound("col-9".into()));
    }

    #[tokio::test]
    async fn test_cli_failures_are_unavailable() {
        let locked = bw("echo 'Vault is locked.' >&2; exit 1");
        let err = locked
            .list_items(&CollectionScope::PersonalVault)
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::Unavailable("Vault is locked.".into()));

        let garbage = bw("echo 'not json'");
        assert!(matches!(
            garbage.list_items(&CollectionScope::PersonalVault).await,
            Err(SourceError::Unavailable(_))
        ));

        let missing = BitwardenCli::with_command(CliCommand::new("no-such-bw-binary-7f3a"), None);
        assert!(matches!(
            missing.list_items(&CollectionScope::PersonalVault).await,
            Err(SourceError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_attachment_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("scan.pdf");
        let item = RawItem {
            id: "item-1".into(),
            ..Default::default()
        };
        let attachment = RawAttachment {
            id: "att-1".into(),
            file_name: "scan.pdf".into(),
            size: None,
        };

        bw(FAKE_BW)
            .fetch_attachment(&item, &attachment, &dest)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(dest).unwrap(), "att-1/item-1");
    }
}
