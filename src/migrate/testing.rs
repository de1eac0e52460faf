//! In-memory vaults and item builders shared by the unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::model::{
    Category, DestinationItem, FieldPurpose, FieldType, ItemField, RawAttachment, RawItem,
    RawLogin,
};
use crate::traits::{CollectionScope, DestinationVault, SourceError, SourceVault, WriteError};

pub fn login(id: &str, name: &str) -> RawItem {
    RawItem {
        id: id.to_string(),
        type_tag: 1,
        name: name.to_string(),
        login: Some(RawLogin {
            username: Some("user".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn sample_destination_item(title: &str) -> DestinationItem {
    DestinationItem {
        title: title.to_string(),
        category: Category::Login,
        sections: vec![],
        fields: vec![ItemField {
            id: Some("username".to_string()),
            section: None,
            field_type: FieldType::String,
            purpose: Some(FieldPurpose::Username),
            label: "username".to_string(),
            value: "user".to_string(),
        }],
        urls: vec![],
    }
}

/// Source vault backed by a fixed item list.
#[derive(Default)]
pub struct FakeSource {
    collection_items: Vec<RawItem>,
    personal_items: Vec<RawItem>,
    collections: HashSet<String>,
    unavailable: bool,
    scopes: Mutex<Vec<CollectionScope>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn with_collection(collection: &str, items: Vec<RawItem>) -> Self {
        Self {
            collection_items: items,
            collections: HashSet::from([collection.to_string()]),
            ..Default::default()
        }
    }

    pub fn with_personal(mut self, items: Vec<RawItem>) -> Self {
        self.personal_items = items;
        self
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn scopes(&self) -> Vec<CollectionScope> {
        self.scopes.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceVault for FakeSource {
    fn provider_id(&self) -> &str {
        "fake-source"
    }

    async fn list_items(&self, scope: &CollectionScope) -> Result<Vec<RawItem>, SourceError> {
        self.scopes.lock().unwrap().push(scope.clone());
        if self.unavailable {
            return Err(SourceError::Unavailable("cli not reachable".to_string()));
        }
        match scope {
            CollectionScope::Collection(id) if self.collections.contains(id) => {
                Ok(self.collection_items.clone())
            }
            CollectionScope::Collection(id) => Err(SourceError::NotFound(id.clone())),
            CollectionScope::PersonalVault => Ok(self.personal_items.clone()),
        }
    }

    async fn fetch_attachment(
        &self,
        _item: &RawItem,
        attachment: &RawAttachment,
        dest: &Path,
    ) -> Result<(), SourceError> {
        self.fetched.lock().unwrap().push(attachment.id.clone());
        std::fs::write(dest, attachment.file_name.as_bytes())
            .map_err(|e| SourceError::Unavailable(e.to_string()))
    }
}

/// Destination vault that records every call.
#[derive(Default)]
pub struct FakeDestination {
    created: Mutex<Vec<(DestinationItem, String)>>,
    attached: Mutex<Vec<(String, PathBuf)>>,
    calls: AtomicUsize,
    reject_titles: HashSet<String>,
    delay: Option<Duration>,
    attach_delay: Option<Duration>,
    parallel: bool,
    fail_attachments: bool,
}

impl FakeDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_title(mut self, title: &str) -> Self {
        self.reject_titles.insert(title.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_attach_delay(mut self, delay: Duration) -> Self {
        self.attach_delay = Some(delay);
        self
    }

    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn failing_attachments(mut self) -> Self {
        self.fail_attachments = true;
        self
    }

    pub fn created(&self) -> Vec<(DestinationItem, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn attached(&self) -> Vec<(String, PathBuf)> {
        self.attached.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DestinationVault for FakeDestination {
    fn provider_id(&self) -> &str {
        "fake-destination"
    }

    fn supports_parallel_writes(&self) -> bool {
        self.parallel
    }

    async fn create_item(&self, item: &DestinationItem, vault: &str) -> Result<String, WriteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject_titles.contains(&item.title) {
            return Err(WriteError::Rejected(format!(
                "[ERROR] validation failed for '{}'",
                item.title
            )));
        }
        self.created
            .lock()
            .unwrap()
            .push((item.clone(), vault.to_string()));
        Ok(format!("op-{}", call))
    }

    async fn attach_file(&self, item_id: &str, file: &Path) -> Result<(), WriteError> {
        if let Some(delay) = self.attach_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_attachments {
            return Err(WriteError::Rejected("file too large".to_string()));
        }
        self.attached
            .lock()
            .unwrap()
            .push((item_id.to_string(), file.to_path_buf()));
        Ok(())
    }
}
