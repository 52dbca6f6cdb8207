//! Glossary entries and loading.
//! A glossary is replaced wholesale on reload; entries never change in place.

pub mod ingest;
pub mod update;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use ingest::{parse_csv, sanitize_field};
pub use update::{
    check_for_updates, check_updates, GlossarySource, RemoteSource, UpdateStatus, VersionInfo,
};

/// One source/target/note/category translation unit.
/// Missing fields deserialize to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct GlossaryEntry {
    pub source: String,
    pub target: String,
    pub note: String,
    pub category: String,
}

impl GlossaryEntry {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        note: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            note: note.into(),
            category: category.into(),
        }
    }

    /// Dedup key within one search.
    pub fn key(&self) -> (&str, &str) {
        (&self.source, &self.category)
    }
}

/// On-disk JSON glossary format.
#[derive(Debug, Deserialize)]
struct GlossaryFile {
    #[serde(default)]
    version: u32,
    entries: Vec<GlossaryEntry>,
}

/// Loaded glossary with version and content fingerprint.
#[derive(Debug, Clone)]
pub struct Glossary {
    version: u32,
    fingerprint: [u8; 32],
    entries: Vec<GlossaryEntry>,
}

#[derive(Debug)]
pub enum GlossaryError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Fetch(String),
}

impl std::fmt::Display for GlossaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlossaryError::Io(e) => write!(f, "glossary IO error: {e}"),
            GlossaryError::Parse(e) => write!(f, "glossary parse error: {e}"),
            GlossaryError::Fetch(msg) => write!(f, "glossary fetch error: {msg}"),
        }
    }
}

impl std::error::Error for GlossaryError {}

impl From<std::io::Error> for GlossaryError {
    fn from(e: std::io::Error) -> Self {
        GlossaryError::Io(e)
    }
}

impl From<serde_json::Error> for GlossaryError {
    fn from(e: serde_json::Error) -> Self {
        GlossaryError::Parse(e)
    }
}

impl From<reqwest::Error> for GlossaryError {
    fn from(e: reqwest::Error) -> Self {
        GlossaryError::Fetch(e.to_string())
    }
}

impl Glossary {
    pub fn from_entries(version: u32, entries: Vec<GlossaryEntry>) -> Self {
        let fingerprint = fingerprint(&entries);
        Self {
            version,
            fingerprint,
            entries,
        }
    }

    /// Create an empty glossary (fallback when nothing could be loaded).
    pub fn empty() -> Self {
        Self::from_entries(0, Vec::new())
    }

    /// Load from a `.json` document (`{version, entries}`) or, for any other
    /// extension, from CSV.
    pub fn load_from_file(path: &Path) -> Result<Self, GlossaryError> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let glossary = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_csv(&content)
        };
        info!(
            path = %path.display(),
            entries = glossary.len(),
            version = glossary.version,
            "glossary loaded"
        );
        Ok(glossary)
    }

    pub fn from_json(content: &str) -> Result<Self, GlossaryError> {
        let file: GlossaryFile = serde_json::from_str(content)?;
        let entries = file.entries.into_iter().map(sanitize_entry).collect();
        Ok(Self::from_entries(file.version, entries))
    }

    pub fn from_csv(content: &str) -> Self {
        Self::from_entries(0, parse_csv(content))
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<GlossaryEntry> {
        self.entries
    }
}

fn sanitize_entry(entry: GlossaryEntry) -> GlossaryEntry {
    GlossaryEntry {
        source: sanitize_field(&entry.source),
        target: sanitize_field(&entry.target),
        note: sanitize_field(&entry.note),
        category: sanitize_field(&entry.category),
    }
}

/// blake3 digest over every field of every entry, in order.
pub fn fingerprint(entries: &[GlossaryEntry]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(entries.len() as u64).to_le_bytes());
    for entry in entries {
        for field in [&entry.source, &entry.target, &entry.note, &entry.category] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    *hasher.finalize().as_bytes()
}
