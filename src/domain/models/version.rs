use crate::domain::value_objects::{ObjectKey, VersionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry in an object key's history: either stored content or a delete marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub key: ObjectKey,
    pub version_id: VersionId,
    pub is_latest: bool,
    pub last_modified: DateTime<Utc>,
    pub size: u64,
    pub is_delete_marker: bool,
}

impl VersionRecord {
    /// A live version carrying `size` bytes of content
    pub fn version(
        key: ObjectKey,
        version_id: VersionId,
        is_latest: bool,
        last_modified: DateTime<Utc>,
        size: u64,
    ) -> Self {
        Self {
            key,
            version_id,
            is_latest,
            last_modified,
            size,
            is_delete_marker: false,
        }
    }

    /// A tombstone; always zero bytes
    pub fn delete_marker(
        key: ObjectKey,
        version_id: VersionId,
        is_latest: bool,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            version_id,
            is_latest,
            last_modified,
            size: 0,
            is_delete_marker: true,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.is_delete_marker
    }

    pub fn purge_target(&self) -> PurgeTarget {
        PurgeTarget {
            key: self.key.clone(),
            version_id: self.version_id.clone(),
        }
    }
}

/// Every record of every key in one bucket, grouped by key.
///
/// Records inside a key are kept in arrival order; nothing here sorts them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionHistory {
    entries: BTreeMap<ObjectKey, Vec<VersionRecord>>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: VersionRecord) {
        self.entries
            .entry(record.key.clone())
            .or_default()
            .push(record);
    }

    /// Merge one listing page; versions and markers land in the same per-key list
    pub fn extend_page(&mut self, page: VersionPage) {
        for record in page.versions.into_iter().chain(page.delete_markers) {
            self.push(record);
        }
    }

    pub fn get(&self, key: &ObjectKey) -> Option<&[VersionRecord]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectKey, &[VersionRecord])> {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<VersionRecord> for VersionHistory {
    fn from_iter<I: IntoIterator<Item = VersionRecord>>(iter: I) -> Self {
        let mut history = VersionHistory::new();
        for record in iter {
            history.push(record);
        }
        history
    }
}

/// Cursor returned by a version listing.
///
/// S3 pages by key and, inside a key, by version id; both halves are needed
/// to resume in the middle of a long history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingMarker {
    pub key_marker: String,
    pub version_id_marker: Option<String>,
}

impl ListingMarker {
    pub fn new(key_marker: impl Into<String>) -> Self {
        Self {
            key_marker: key_marker.into(),
            version_id_marker: None,
        }
    }

    pub fn with_version_id(mut self, version_id_marker: impl Into<String>) -> Self {
        self.version_id_marker = Some(version_id_marker.into());
        self
    }
}

/// One page of a paginated version listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionPage {
    pub versions: Vec<VersionRecord>,
    pub delete_markers: Vec<VersionRecord>,
    /// Cursor for the next page; `None` or an empty key marker means the listing is complete
    pub next_marker: Option<ListingMarker>,
}

impl VersionPage {
    pub fn len(&self) -> usize {
        self.versions.len() + self.delete_markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The marker to resume from, if the provider signalled more pages
    pub fn continuation(&self) -> Option<&ListingMarker> {
        self.next_marker
            .as_ref()
            .filter(|marker| !marker.key_marker.is_empty())
    }
}

/// A (key, version id) pair queued for deletion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurgeTarget {
    pub key: ObjectKey,
    pub version_id: VersionId,
}
