use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use illustra_core::ComparisonSnapshot;

pub const STORE_FILE: &str = "comparisons.json";

/// A saved comparison as it sits in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredComparison {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub snapshot: ComparisonSnapshot,
}

impl StoredComparison {
    /// A record that has never been saved; the store assigns id and timestamps.
    pub fn new(snapshot: ComparisonSnapshot) -> Self {
        Self {
            id: String::new(),
            created_at: None,
            updated_at: None,
            snapshot,
        }
    }

    /// Re-saving under an existing id replaces that comparison.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn meta(&self) -> ComparisonMeta {
        ComparisonMeta {
            id: self.id.clone(),
            name: self.snapshot.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMeta {
    pub id: String,
    pub name: String,
    pub updated_at: Option<DateTime<Utc>>,
}

pub trait ComparisonStore {
    /// Inserts or replaces a comparison and returns its id.
    fn save(&mut self, record: StoredComparison) -> Result<String>;
    fn load(&self, id: &str) -> Result<StoredComparison>;
    /// Newest first.
    fn list(&self) -> Result<Vec<ComparisonMeta>>;
    /// Returns whether anything was removed.
    fn delete(&mut self, id: &str) -> Result<bool>;
}

type Records = BTreeMap<String, StoredComparison>;

fn stamp(records: &Records, mut record: StoredComparison, now: DateTime<Utc>) -> StoredComparison {
    if record.id.trim().is_empty() {
        let mut millis = now.timestamp_millis();
        while records.contains_key(&format!("comp_{millis}")) {
            millis += 1;
        }
        record.id = format!("comp_{millis}");
    }
    record.created_at = records
        .get(&record.id)
        .and_then(|existing| existing.created_at)
        .or(record.created_at)
        .or(Some(now));
    record.updated_at = Some(now);
    record
}

fn list_records(records: &Records) -> Vec<ComparisonMeta> {
    let mut metas: Vec<ComparisonMeta> = records.values().map(StoredComparison::meta).collect();
    metas.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
    metas
}

fn missing(id: &str) -> anyhow::Error {
    anyhow!("no saved comparison with id {id}")
}

/// Every comparison in one JSON object file keyed by id.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store file inside `dir`; the directory is created on first save.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Records> {
        if !self.path.exists() {
            return Ok(Records::new());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Records::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid comparison store {}", self.path.display()))
    }

    fn write(&self, records: &Records) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(records)?;
        fs::write(&tmp, body).with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

impl ComparisonStore for JsonFileStore {
    fn save(&mut self, record: StoredComparison) -> Result<String> {
        let mut records = self.read()?;
        let record = stamp(&records, record, Utc::now());
        let id = record.id.clone();
        records.insert(id.clone(), record);
        self.write(&records)?;
        tracing::info!(%id, path = %self.path.display(), "saved comparison");
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<StoredComparison> {
        self.read()?.remove(id).ok_or_else(|| missing(id))
    }

    fn list(&self) -> Result<Vec<ComparisonMeta>> {
        Ok(list_records(&self.read()?))
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let mut records = self.read()?;
        if records.remove(id).is_none() {
            return Ok(false);
        }
        self.write(&records)?;
        tracing::info!(%id, "deleted comparison");
        Ok(true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Records,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ComparisonStore for MemoryStore {
    fn save(&mut self, record: StoredComparison) -> Result<String> {
        let record = stamp(&self.records, record, Utc::now());
        let id = record.id.clone();
        self.records.insert(id.clone(), record);
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<StoredComparison> {
        self.records.get(id).cloned().ok_or_else(|| missing(id))
    }

    fn list(&self) -> Result<Vec<ComparisonMeta>> {
        Ok(list_records(&self.records))
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        Ok(self.records.remove(id).is_some())
    }
}

/// Line-delimited JSON export of comparison years. Each record is one line;
/// `finish` flushes the sink and reports how many records went out.
pub struct JsonlWriter<W: Write> {
    writer: W,
    records: usize,
}

impl<W: Write> JsonlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    pub fn write_record<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)
            .with_context(|| format!("failed to encode export record {}", self.records + 1))?;
        self.writer.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().context("failed to flush export")?;
        Ok(self.records)
    }
}
