//! JSON dump of source items and their translations.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::model::{DestinationItem, RawItem};

const SOURCE_DIR: &str = "bitwarden_items";
const DESTINATION_DIR: &str = "1password_items";

/// Writes `<root>/bitwarden_items/<name>.json` and
/// `<root>/1password_items/<name>.json` per item.
#[derive(Debug, Clone)]
pub struct DumpSink {
    root: PathBuf,
}

impl DumpSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dump_source(&self, item: &RawItem) -> std::io::Result<PathBuf> {
        self.write(SOURCE_DIR, item, item)
    }

    pub fn dump_translated(
        &self,
        raw: &RawItem,
        item: &DestinationItem,
    ) -> std::io::Result<PathBuf> {
        self.write(DESTINATION_DIR, raw, item)
    }

    fn write<T: Serialize>(&self, dir: &str, raw: &RawItem, value: &T) -> std::io::Result<PathBuf> {
        let dir = self.root.join(dir);
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}.json", file_stem(raw)));
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

/// Item name reduced to alphanumerics and spaces; falls back to the item ID
/// when nothing is left.
pub fn file_stem(item: &RawItem) -> String {
    let stem: String = item
        .name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    let stem = stem.trim();
    if stem.is_empty() {
        item.id.clone()
    } else {
        stem.to_string()
    }
}
