use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// Which half of a leap year's Adar a record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdarPreference {
    First,
    Second,
}

impl Serialize for AdarPreference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AdarPreference::First => serializer.serialize_u8(1),
            AdarPreference::Second => serializer.serialize_u8(2),
        }
    }
}

/// (month, day) within the 12-month cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YahrtzeitKey {
    pub month: u8,
    pub day: u32,
}

impl std::fmt::Display for YahrtzeitKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.month, self.day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YahrtzeitRecord {
    pub key: YahrtzeitKey,
    pub text: String,
    pub adar_pref: Option<AdarPreference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexEntry {
    pub text: String,
    pub adar_pref: Option<AdarPreference>,
}

/// Records from every page, grouped by date.
///
/// Within a key, entries keep merge order and an exact (text, adar_pref) repeat
/// is dropped. Entries differing only in `adar_pref` stay distinct.
#[derive(Debug, Default)]
pub struct YahrtzeitIndex {
    entries: BTreeMap<YahrtzeitKey, Vec<IndexEntry>>,
    seen: HashSet<(YahrtzeitKey, IndexEntry)>,
}

impl YahrtzeitIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one unit's local records, in emission order.
    pub fn merge<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = YahrtzeitRecord>,
    {
        for record in records {
            let entry = IndexEntry {
                text: record.text,
                adar_pref: record.adar_pref,
            };
            if self.seen.insert((record.key, entry.clone())) {
                self.entries.entry(record.key).or_default().push(entry);
            }
        }
    }

    #[allow(dead_code)]
    pub fn get(&self, key: YahrtzeitKey) -> &[IndexEntry] {
        self.entries.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct dates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Human-readable JSON: `{"7_20": [{"text": ..., "adar_pref": null}]}`.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write index to {}", path.display()))
    }
}

impl Serialize for YahrtzeitIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entries) in &self.entries {
            map.serialize_entry(&key.to_string(), entries)?;
        }
        map.end()
    }
}
