//! Destination writes with dry-run support.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::model::DestinationItem;
use crate::traits::{DestinationVault, WriteError};

/// Result of a successful [`DestinationWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The destination created the item.
    Created { item_id: String },
    /// Dry run: validated and serialized, nothing persisted.
    Simulated,
}

impl WriteOutcome {
    pub fn item_id(&self) -> Option<&str> {
        match self {
            WriteOutcome::Created { item_id } => Some(item_id),
            WriteOutcome::Simulated => None,
        }
    }
}

/// Validates items and forwards them to a [`DestinationVault`].
pub struct DestinationWriter<D: DestinationVault> {
    destination: Arc<D>,
}

impl<D: DestinationVault> DestinationWriter<D> {
    pub fn new(destination: Arc<D>) -> Self {
        Self { destination }
    }

    pub fn destination(&self) -> &Arc<D> {
        &self.destination
    }

    /// Writes `item` into `vault`.
    ///
    /// The item is validated and serialized in both modes. Without `dry_run`
    /// the destination's create call is issued exactly once; there are no
    /// retries.
    ///
    /// # Errors
    ///
    /// [`WriteError::Rejected`] for schema violations or destination
    /// validation errors, [`WriteError::Unavailable`] when the destination
    /// cannot be reached.
    #[instrument(skip(self, item), fields(title = %item.title))]
    pub async fn write(
        &self,
        item: &DestinationItem,
        vault: &str,
        dry_run: bool,
    ) -> Result<WriteOutcome, WriteError> {
        validate(item, vault)?;
        let payload = serde_json::to_string(item)
            .map_err(|e| WriteError::Rejected(format!("item cannot be serialized: {}", e)))?;

        if dry_run {
            debug!(bytes = payload.len(), "Dry run, skipping create");
            return Ok(WriteOutcome::Simulated);
        }

        let item_id = self.destination.create_item(item, vault).await?;
        info!(item_id = %item_id, "Item created");
        Ok(WriteOutcome::Created { item_id })
    }
}

/// Structural checks the destination would otherwise reject.
pub fn validate(item: &DestinationItem, vault: &str) -> Result<(), WriteError> {
    if vault.trim().is_empty() {
        return Err(WriteError::Rejected("target vault is empty".to_string()));
    }
    if item.title.trim().is_empty() {
        return Err(WriteError::Rejected("item title is empty".to_string()));
    }

    let declared: HashSet<&str> = item.sections.iter().map(|s| s.id.as_str()).collect();
    if declared.len() != item.sections.len() {
        return Err(WriteError::Rejected("duplicate section id".to_string()));
    }

    let mut ids = HashSet::new();
    for field in &item.fields {
        if let Some(id) = field.id.as_deref() {
            if !ids.insert(id) {
                return Err(WriteError::Rejected(format!("duplicate field id '{}'", id)));
            }
        }
        if let Some(section) = &field.section {
            if !declared.contains(section.id.as_str()) {
                return Err(WriteError::Rejected(format!(
                    "field '{}' references undeclared section '{}'",
                    field.label, section.id
                )));
            }
        }
    }

    if let Some(url) = item.urls.iter().find(|u| u.href.trim().is_empty()) {
        return Err(WriteError::Rejected(format!(
            "empty url (primary: {})",
            url.primary
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::testing::{sample_destination_item, FakeDestination};
    use crate::model::SectionRef;

    #[tokio::test]
    async fn test_write_creates_once() {
        let destination = Arc::new(FakeDestination::new());
        let writer = DestinationWriter::new(Arc::clone(&destination));

        let outcome = writer
            .write(&sample_destination_item("GitHub"), "Private", false)
            .await
            .unwrap();

        assert_eq!(outcome.item_id(), Some("op-1"));
        assert_eq!(destination.created().len(), 1);
        assert_eq!(destination.created()[0].1, "Private");
    }

    #[tokio::test]
    async fn test_dry_run_never_persists() {
        let destination = Arc::new(FakeDestination::new());
        let writer = DestinationWriter::new(Arc::clone(&destination));

        let outcome = writer
            .write(&sample_destination_item("GitHub"), "Private", true)
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Simulated);
        assert!(destination.created().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_still_validates() {
        let destination = Arc::new(FakeDestination::new());
        let writer = DestinationWriter::new(Arc::clone(&destination));

        let mut item = sample_destination_item("GitHub");
        item.fields[0].section = Some(SectionRef {
            id: "missing".to_string(),
        });

        let err = writer.write(&item, "Private", true).await.unwrap_err();
        assert!(matches!(err, WriteError::Rejected(msg) if msg.contains("undeclared section")));
    }

    #[tokio::test]
    async fn test_rejection_is_propagated_without_retry() {
        let destination = Arc::new(FakeDestination::new().reject_title("GitHub"));
        let writer = DestinationWriter::new(Arc::clone(&destination));

        let err = writer
            .write(&sample_destination_item("GitHub"), "Private", false)
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Rejected(_)));
        assert_eq!(destination.create_calls(), 1);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_empty_vault() {
        let item = sample_destination_item("x");
        assert!(validate(&item, "").is_err());

        let mut dup = item.clone();
        dup.fields.push(dup.fields[0].clone());
        assert!(matches!(validate(&dup, "v"), Err(WriteError::Rejected(m)) if m.contains("duplicate")));

        assert!(validate(&item, "v").is_ok());
    }
}
