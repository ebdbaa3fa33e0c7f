//! Content Store: starter packs, feeds and free-text reasons.
//!
//! Loaders never fail. A missing source logs a warning, any other read
//! problem logs an error, and in both cases the collection comes back empty
//! so the remaining collections still load.
use serde::Deserialize;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::select::ContentKind;

/// A named, linked record with a short description (starter pack or feed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPack {
    pub name: String,
    pub description: String,
    pub link: String,
}

impl ContentPack {
    /// Trim every field; `None` when any of them ends up empty.
    pub fn new(name: &str, description: &str, link: &str) -> Option<Self> {
        let (name, description, link) = (name.trim(), description.trim(), link.trim());
        if name.is_empty() || description.is_empty() || link.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            description: description.to_string(),
            link: link.to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct PackRow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

impl PackRow {
    fn into_pack(self) -> Option<ContentPack> {
        ContentPack::new(
            self.name.as_deref()?,
            self.description.as_deref()?,
            self.link.as_deref()?,
        )
    }
}

#[derive(Debug, Error)]
enum LoadError {
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

fn open(path: &Path) -> Result<std::fs::File, LoadError> {
    std::fs::File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound,
        _ => LoadError::Io(e),
    })
}

/// Parse pack rows from CSV with a header row. Rows lacking a field are skipped.
fn read_packs<R: Read>(reader: R, kind: ContentKind) -> Result<Vec<ContentPack>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut packs = Vec::new();
    for (idx, record) in rdr.deserialize::<PackRow>().enumerate() {
        let row_num = idx + 1;
        let row = match record {
            Ok(row) => row,
            Err(e) if is_row_error(&e) => {
                tracing::warn!(kind = kind.label(), row = row_num, error = %e, "content.row.undecodable");
                continue;
            }
            Err(e) => return Err(e),
        };
        match row.into_pack() {
            Some(pack) => packs.push(pack),
            None => {
                tracing::warn!(
                    kind = kind.label(),
                    row = row_num,
                    "Skipping invalid {} at row {row_num}",
                    kind.label()
                );
            }
        }
    }
    Ok(packs)
}

fn is_row_error(e: &csv::Error) -> bool {
    matches!(
        e.kind(),
        csv::ErrorKind::Deserialize { .. } | csv::ErrorKind::UnequalLengths { .. }
    )
}

fn load_pack_file(path: &Path, kind: ContentKind) -> Vec<ContentPack> {
    let result = open(path).and_then(|file| read_packs(file, kind).map_err(LoadError::from));
    finish(path, kind, result)
}

fn finish<T>(path: &Path, kind: ContentKind, result: Result<Vec<T>, LoadError>) -> Vec<T> {
    match result {
        Ok(items) => {
            tracing::info!(
                kind = kind.label(),
                count = items.len(),
                path = %path.display(),
                "content.loaded"
            );
            items
        }
        Err(LoadError::NotFound) => {
            tracing::warn!(kind = kind.label(), path = %path.display(), "content source not found");
            Vec::new()
        }
        Err(e) => {
            tracing::error!(kind = kind.label(), path = %path.display(), error = %e, "content source unreadable");
            Vec::new()
        }
    }
}

/// Load starter packs from a CSV file with `name`, `description`, `link` columns.
pub fn load_packs(path: &Path) -> Vec<ContentPack> {
    load_pack_file(path, ContentKind::StarterPack)
}

/// Load feeds; same format as [`load_packs`].
pub fn load_feeds(path: &Path) -> Vec<ContentPack> {
    load_pack_file(path, ContentKind::Feed)
}

fn parse_reasons(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load reasons, one per non-blank line, trimmed.
pub fn load_reasons(path: &Path) -> Vec<String> {
    let result = open(path).and_then(|mut file| {
        let mut text = String::new();
        file.read_to_string(&mut text)?;
        Ok(parse_reasons(&text))
    });
    finish(path, ContentKind::Reason, result)
}

/// Where each collection is read from.
#[derive(Debug, Clone)]
pub struct ContentSources {
    pub starter_packs: PathBuf,
    pub feeds: PathBuf,
    pub reasons: PathBuf,
}

/// Everything that can be posted during one process run. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    packs: Vec<ContentPack>,
    feeds: Vec<ContentPack>,
    reasons: Vec<String>,
}

impl ContentCatalog {
    pub fn new(packs: Vec<ContentPack>, feeds: Vec<ContentPack>, reasons: Vec<String>) -> Self {
        Self {
            packs,
            feeds,
            reasons,
        }
    }

    /// Load all three collections independently.
    pub fn load(sources: &ContentSources) -> Self {
        let catalog = Self::new(
            load_packs(&sources.starter_packs),
            load_feeds(&sources.feeds),
            load_reasons(&sources.reasons),
        );
        tracing::info!(
            starter_packs = catalog.packs.len(),
            feeds = catalog.feeds.len(),
            reasons = catalog.reasons.len(),
            "Content loaded - Starter packs: {}, Feeds: {}, Reasons: {}",
            catalog.packs.len(),
            catalog.feeds.len(),
            catalog.reasons.len()
        );
        catalog
    }

    pub fn packs(&self) -> &[ContentPack] {
        &self.packs
    }

    pub fn feeds(&self) -> &[ContentPack] {
        &self.feeds
    }

    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }

    pub fn len_of(&self, kind: ContentKind) -> usize {
        match kind {
            ContentKind::StarterPack => self.packs.len(),
            ContentKind::Feed => self.feeds.len(),
            ContentKind::Reason => self.reasons.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ContentKind::ALL.iter().all(|k| self.len_of(*k) == 0)
    }
}
