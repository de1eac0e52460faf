//! Destination vault backed by the 1Password CLI (`op`).

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, instrument};

use crate::model::DestinationItem;
use crate::providers::cli::{CliCommand, CliOutput};
use crate::traits::{DestinationVault, WriteError};

/// stderr fragments that mean the CLI could not reach the account, as opposed
/// to rejecting the item.
const UNAVAILABLE_MARKERS: &[&str] = &[
    "could not connect",
    "connection refused",
    "connection reset",
    "network is unreachable",
    "no such host",
    "timed out",
    "timeout",
    "not currently signed in",
    "session expired",
    "authorization prompt dismissed",
];

#[derive(Deserialize)]
struct CreatedItem {
    id: String,
}

/// Creates items with `op item create` in a signed-in account.
pub struct OnePasswordCli {
    command: CliCommand,
    account: String,
    parallel_writes: bool,
}

impl OnePasswordCli {
    pub fn new(account: &str) -> Self {
        Self::with_command(CliCommand::new("op"), account)
    }

    /// Uses `command` (e.g. a wrapper script) in place of `op`.
    pub fn with_command(command: CliCommand, account: &str) -> Self {
        Self {
            command,
            account: account.to_string(),
            parallel_writes: false,
        }
    }

    /// Declares concurrent `item create` calls safe for this account.
    pub fn with_parallel_writes(mut self, enabled: bool) -> Self {
        self.parallel_writes = enabled;
        self
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    async fn call(&self, args: &[&str], stdin: Option<&[u8]>) -> Result<CliOutput, WriteError> {
        let mut full = vec!["--account", self.account.as_str()];
        full.extend_from_slice(args);
        self.command
            .run(&full, stdin)
            .await
            .map_err(|e| WriteError::Unavailable(e.to_string()))
    }
}

/// Classifies a failed `op` invocation.
fn failure(output: &CliOutput) -> WriteError {
    let text = output.error_text();
    let lower = text.to_ascii_lowercase();
    if UNAVAILABLE_MARKERS.iter().any(|marker| lower.contains(marker)) {
        WriteError::Unavailable(text)
    } else {
        WriteError::Rejected(text)
    }
}

/// Escapes the characters `op` treats as syntax in an assignment field name.
fn escape_field_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '.' | '=' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl DestinationVault for OnePasswordCli {
    fn provider_id(&self) -> &str {
        "1password"
    }

    fn supports_parallel_writes(&self) -> bool {
        self.parallel_writes
    }

    #[instrument(skip(self, item), fields(title = %item.title))]
    async fn create_item(&self, item: &DestinationItem, vault: &str) -> Result<String, WriteError> {
        let template = serde_json::to_vec(item)
            .map_err(|e| WriteError::Rejected(format!("item cannot be serialized: {}", e)))?;

        let output = self
            .call(
                &["item", "create", "--vault", vault, "--format=json", "-"],
                Some(&template),
            )
            .await?;
        if !output.success {
            return Err(failure(&output));
        }

        let created: CreatedItem = serde_json::from_str(output.stdout.trim()).map_err(|e| {
            WriteError::Rejected(format!("unexpected response from op item create: {}", e))
        })?;
        debug!(item_id = %created.id, "op item create succeeded");
        Ok(created.id)
    }

    #[instrument(skip(self))]
    async fn attach_file(&self, item_id: &str, file: &Path) -> Result<(), WriteError> {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                WriteError::Rejected(format!("'{}' has no file name", file.display()))
            })?;
        let assignment = format!("{}[file]={}", escape_field_name(&name), file.display());

        let output = self.call(&["item", "edit", item_id, &assignment], None).await?;
        if !output.success {
            return Err(failure(&output));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::testing::sample_destination_item;
    use crate::providers::cli::shell;

    /// Builds the id from the arguments and saves stdin to `$BODY_LOG`.
    const FAKE_OP: &str = r#"
if [ "$3 $4" = "item create" ]; then
  body=$(cat)
  case "$body" in
    *Rejected*) echo "[ERROR] 2024/01/01 validation failed: field 'ccnum' invalid" >&2; exit 1 ;;
    *Offline*) echo "[ERROR] could not connect to my.1password.com" >&2; exit 1 ;;
  esac
  if [ -n "$BODY_LOG" ]; then printf '%s' "$body" > "$BODY_LOG"; fi
  printf '{"id":"%s:%s","title":"x"}' "$2" "$6"
elif [ "$3 $4" = "item edit" ]; then
  printf '%s %s' "$5" "$6" > "$ATTACH_LOG"
else
  exit 9
fi
"#;

    fn op() -> OnePasswordCli {
        OnePasswordCli::with_command(shell(FAKE_OP), "team.1password.com")
    }

    #[tokio::test]
    async fn test_create_item_sends_template_and_returns_id() {
        let dir = tempfile::tempdir().unwrap();
        let body = dir.path().join("body.json");
        let op = OnePasswordCli::with_command(
            shell(FAKE_OP).with_env("BODY_LOG", body.to_string_lossy()),
            "team.1password.com",
        );
        let item = sample_destination_item("GitHub");

        let id = op.create_item(&item, "Imported").await.unwrap();

        assert_eq!(id, "team.1password.com:Imported");
        let sent: DestinationItem =
            serde_json::from_str(&std::fs::read_to_string(body).unwrap()).unwrap();
        assert_eq!(sent, item);
    }

    #[tokio::test]
    async fn test_create_item_failures_are_classified() {
        let err = op()
            .create_item(&sample_destination_item("Rejected"), "Imported")
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::Rejected(text) if text.contains("ccnum")));

        let err = op()
            .create_item(&sample_destination_item("Offline"), "Imported")
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::Unavailable(_)));

        let missing = OnePasswordCli::with_command(CliCommand::new("no-such-op-binary-7f3a"), "a");
        assert!(matches!(
            missing.create_item(&sample_destination_item("x"), "v").await,
            Err(WriteError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_attach_file_uses_file_assignment() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("attach.log");
        let file = dir.path().join("scan.v2.pdf");
        let op = OnePasswordCli::with_command(
            shell(FAKE_OP).with_env("ATTACH_LOG", log.to_string_lossy()),
            "team.1password.com",
        );

        op.attach_file("op-1", &file).await.unwrap();

        let logged = std::fs::read_to_string(log).unwrap();
        assert_eq!(
            logged,
            format!("op-1 scan\\.v2\\.pdf[file]={}", file.display())
        );
    }

    #[test]
    fn test_parallel_writes_off_by_default() {
        assert!(!op().supports_parallel_writes());
        assert!(op().with_parallel_writes(true).supports_parallel_writes());
    }
}
