//! Records and collections as seen by the navigation core.
//!
//! Only `ordinal` and the record count matter for position math; label and
//! group are carried through for the HUD.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use ts_rs::TS;

/// Identity of a collection, e.g. `"Génesis/1"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CollectionKey(String);

impl CollectionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, rename = "CollectionRecord")]
pub struct Record {
    /// 1-based position within the collection.
    pub ordinal: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub text: String,
}

/// An immutable, ordered set of records. Cloning shares the record list.
#[derive(Debug, Clone)]
pub struct Collection {
    key: CollectionKey,
    records: Arc<[Record]>,
}

impl Collection {
    pub fn new(key: CollectionKey, records: Vec<Record>) -> Self {
        Self {
            key,
            records: records.into(),
        }
    }

    pub fn key(&self) -> &CollectionKey {
        &self.key
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Zero-based index of the first record carrying `ordinal`.
    pub fn position_of(&self, ordinal: u32) -> Option<usize> {
        self.records.iter().position(|r| r.ordinal == ordinal)
    }
}

/// Request to open a collection already positioned at a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLinkTarget {
    pub collection: CollectionKey,
    pub ordinal: u32,
}

impl DeepLinkTarget {
    pub fn new(collection: CollectionKey, ordinal: u32) -> Self {
        Self {
            collection,
            ordinal,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CollectionFile {
    key: String,
    records: Vec<Record>,
}

/// Parse a collection from its JSON form: `{ "key": "...", "records": [...] }`.
pub fn parse_collection(json: &str) -> Result<Collection> {
    let file: CollectionFile =
        serde_json::from_str(json).context("Invalid collection JSON")?;
    if file.key.trim().is_empty() {
        return Err(anyhow!("Collection key must not be empty"));
    }
    debug!(key = %file.key, records = file.records.len(), "Parsed collection");
    Ok(Collection::new(CollectionKey::new(file.key), file.records))
}

pub fn load_collection(path: &Path) -> Result<Collection> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read collection {}", path.display()))?;
    let collection = parse_collection(&data)
        .with_context(|| format!("Failed to load collection {}", path.display()))?;
    info!(
        path = %path.display(),
        key = %collection.key(),
        records = collection.len(),
        "Loaded collection"
    );
    Ok(collection)
}

#[cfg(test)]
pub(crate) fn numbered(key: &str, count: u32) -> Collection {
    let records = (1..=count)
        .map(|ordinal| Record {
            ordinal,
            label: format!("{key}:{ordinal}"),
            group: key.split('/').next().unwrap_or(key).to_string(),
            text: format!("verse {ordinal}"),
        })
        .collect();
    Collection::new(CollectionKey::new(key), records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collection_reads_records_in_order() {
        let json = r#"{
            "key": "Juan/3",
            "records": [
                { "ordinal": 1, "label": "Juan 3:1", "group": "Juan" },
                { "ordinal": 2, "label": "Juan 3:2", "group": "Juan", "text": "..." }
            ]
        }"#;

        let collection = parse_collection(json).expect("valid collection");

        assert_eq!(collection.key().as_str(), "Juan/3");
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.get(1).map(|r| r.ordinal), Some(2));
        assert_eq!(collection.get(0).map(|r| r.text.as_str()), Some(""));
    }

    #[test]
    fn parse_collection_rejects_blank_key() {
        let err = parse_collection(r#"{ "key": " ", "records": [] }"#).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn position_of_returns_first_match() {
        let collection = Collection::new(
            CollectionKey::new("dup"),
            vec![
                Record {
                    ordinal: 1,
                    label: String::new(),
                    group: String::new(),
                    text: String::new(),
                },
                Record {
                    ordinal: 2,
                    label: "first".into(),
                    group: String::new(),
                    text: String::new(),
                },
                Record {
                    ordinal: 2,
                    label: "second".into(),
                    group: String::new(),
                    text: String::new(),
                },
            ],
        );
        assert_eq!(collection.position_of(2), Some(1));
        assert_eq!(collection.position_of(9), None);
    }

    #[test]
    fn load_collection_reports_missing_file() {
        let err = load_collection(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read collection"));
    }
}
