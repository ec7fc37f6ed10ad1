//! Domain types shared by the loader, splitter and aggregator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

pub type Meta = BTreeMap<String, String>;

/// Identity of a parent document. Minted once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(Uuid);

/// Identity of a section. Lives in its own namespace, unrelated to `DocId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(Uuid);

impl DocId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl SectionId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for DocId {
    fn default() -> Self { Self::new() }
}

impl Default for SectionId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Whether a record is a whole recipe or a fragment of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Parent,
    Child,
}

/// Difficulty tier read from the star rating in a recipe body.
///
/// Ordered from hardest to easiest; `Unknown` when no star is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    VeryHard,
    Hard,
    Medium,
    Easy,
    VeryEasy,
    Unknown,
}

impl Difficulty {
    /// Tier for a run of `stars` consecutive star glyphs. Runs longer than five
    /// count as five.
    pub fn from_star_run(stars: usize) -> Self {
        match stars {
            0 => Difficulty::Unknown,
            1 => Difficulty::VeryEasy,
            2 => Difficulty::Easy,
            3 => Difficulty::Medium,
            4 => Difficulty::Hard,
            _ => Difficulty::VeryHard,
        }
    }

    /// Label stored in metadata, matching the corpus language.
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::VeryHard => "非常困难",
            Difficulty::Hard => "困难",
            Difficulty::Medium => "中等",
            Difficulty::Easy => "比较简单",
            Difficulty::VeryEasy => "简单",
            Difficulty::Unknown => "难度未知",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

/// Metadata carried by documents and inherited by sections.
///
/// The recognized fields are typed; anything else lands in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub source: PathBuf,
    pub category: Option<String>,
    pub dish_name: Option<String>,
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Meta,
}

/// A complete recipe as loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub content: String,
    pub metadata: Metadata,
}

impl Document {
    pub fn new(source: PathBuf, content: String) -> Self {
        Self {
            id: DocId::new(),
            doc_type: DocType::Parent,
            content,
            metadata: Metadata { source, ..Metadata::default() },
        }
    }
}

/// A heading-scoped fragment of a `Document`.
///
/// - `id`: fresh identity, never derived from the parent
/// - `parent_id`: back-reference used for lookups only
/// - `metadata`: copy of the parent's metadata at split time, plus heading context
/// - `position`: zero-based emission index within the parent
/// - `batch_index`: zero-based index across every section of one splitting pass
/// - `size`: content length in characters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub parent_id: DocId,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub content: String,
    pub metadata: Metadata,
    pub position: usize,
    pub batch_index: usize,
    pub size: usize,
}

/// Output of a structure-aware splitter before the pipeline adopts it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment {
    pub content: String,
    /// Heading label -> heading text for every heading enclosing the fragment.
    pub headings: Meta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_runs_map_to_tiers() {
        assert_eq!(Difficulty::from_star_run(0), Difficulty::Unknown);
        assert_eq!(Difficulty::from_star_run(1), Difficulty::VeryEasy);
        assert_eq!(Difficulty::from_star_run(3), Difficulty::Medium);
        assert_eq!(Difficulty::from_star_run(5), Difficulty::VeryHard);
        assert_eq!(Difficulty::from_star_run(9), Difficulty::VeryHard);
    }

    #[test]
    fn identities_serialize_as_plain_uuids() {
        let id = DocId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn record_types() {
        let doc = Document::new(PathBuf::from("a.md"), "x".into());
        assert_eq!(doc.doc_type, DocType::Parent);
        assert_eq!(doc.metadata.source, PathBuf::from("a.md"));
        assert!(doc.metadata.category.is_none());
    }
}
