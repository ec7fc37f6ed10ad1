//! Load → enrich → split pipeline and parent reconstruction.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::aggregate::{ParentAggregator, ParentMatch};
use crate::config::PrepSettings;
use crate::enrich::MetadataEnricher;
use crate::error::{Error, Result};
use crate::index::{DocumentArena, ParentChildIndex};
use crate::loader::{DocumentLoader, LoadReport};
use crate::splitter::MarkdownHeaderSplitter;
use crate::traits::StructureSplitter;
use crate::types::{DocId, DocType, Document, Fragment, Metadata, Section, SectionId};

/// Corpus-level counts for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub documents: usize,
    pub sections: usize,
    pub categories: BTreeMap<String, usize>,
    pub difficulties: BTreeMap<String, usize>,
    pub avg_section_size: f64,
}

/// Owns the loaded documents, their sections and the section → parent index.
pub struct DataPreparation {
    loader: DocumentLoader,
    splitter: Box<dyn StructureSplitter>,
    documents: DocumentArena,
    sections: Vec<Section>,
    index: ParentChildIndex,
}

impl Default for DataPreparation {
    fn default() -> Self { Self::new(&PrepSettings::default()) }
}

impl DataPreparation {
    pub fn new(settings: &PrepSettings) -> Self {
        Self::with_splitter(settings, Box::new(MarkdownHeaderSplitter::new(&settings.headers)))
    }

    pub fn with_splitter(settings: &PrepSettings, splitter: Box<dyn StructureSplitter>) -> Self {
        let loader = DocumentLoader::new(settings.extensions.clone(), MetadataEnricher::from_settings(settings));
        Self { loader, splitter, documents: DocumentArena::default(), sections: Vec::new(), index: ParentChildIndex::new() }
    }

    /// Replaces the document set with the recipes found under `root`.
    /// Sections and links from any earlier pass are discarded.
    pub fn load_documents(&mut self, root: &Path) -> Result<LoadReport> {
        let (docs, report) = self.loader.load_dir(root)?;
        self.documents = DocumentArena::new(docs);
        self.sections.clear();
        self.index.clear();
        Ok(report)
    }

    /// Splits every loaded document into sections, regenerating all section
    /// identities and links.
    pub fn chunk_documents(&mut self) -> Result<&[Section]> {
        if self.documents.is_empty() {
            return Err(Error::NotLoaded);
        }
        self.sections.clear();
        self.index.clear();

        for doc in self.documents.as_slice() {
            let mut fragments = self.splitter.split(&doc.content);
            if fragments.is_empty() {
                warn!(source = %doc.metadata.source.display(), "no sections found; using whole document");
                fragments.push(Fragment { content: doc.content.clone(), headings: Default::default() });
            }
            let first = self.sections.len();
            for (position, fragment) in fragments.into_iter().enumerate() {
                let section = adopt_fragment(doc, fragment, position, self.sections.len());
                if let Some(previous) = self.index.register(section.id, section.parent_id) {
                    // fresh v4 ids make this unreachable in practice
                    warn!(section = %section.id, %previous, "section id registered twice");
                }
                self.sections.push(section);
            }
            debug!(id = %doc.id, sections = self.sections.len() - first, "split document");
        }

        info!(documents = self.documents.len(), sections = self.sections.len(), "chunking finished");
        Ok(&self.sections)
    }

    /// Distinct parents of `sections`, most matched first.
    pub fn get_parent_documents(&self, sections: &[Section]) -> Result<Vec<&Document>> {
        Ok(self.aggregator()?.parent_documents(sections))
    }

    /// As [`get_parent_documents`](Self::get_parent_documents) with vote counts.
    pub fn rank_parents(&self, sections: &[Section]) -> Result<Vec<ParentMatch<'_>>> {
        Ok(self.aggregator()?.rank_sections(sections))
    }

    /// Ranking from bare section ids, e.g. hits returned by an external index.
    pub fn parents_for_ids<I>(&self, ids: I) -> Result<Vec<ParentMatch<'_>>>
    where
        I: IntoIterator<Item = SectionId>,
    {
        Ok(self.aggregator()?.rank_ids(ids))
    }

    fn aggregator(&self) -> Result<ParentAggregator<'_>> {
        if self.documents.is_empty() {
            return Err(Error::NotLoaded);
        }
        Ok(ParentAggregator::new(&self.index, &self.documents))
    }

    pub fn documents(&self) -> &[Document] { self.documents.as_slice() }

    pub fn document(&self, id: &DocId) -> Option<&Document> { self.documents.get(id) }

    pub fn document_metadata_mut(&mut self, id: &DocId) -> Option<&mut Metadata> { self.documents.metadata_mut(id) }

    pub fn sections(&self) -> &[Section] { &self.sections }

    /// Sections of one document in position order.
    pub fn sections_of(&self, id: &DocId) -> Vec<&Section> {
        let mut out: Vec<&Section> = self.sections.iter().filter(|s| s.parent_id == *id).collect();
        out.sort_by_key(|s| s.position);
        out
    }

    pub fn index(&self) -> &ParentChildIndex { &self.index }

    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics { documents: self.documents.len(), sections: self.sections.len(), ..Statistics::default() };
        for doc in self.documents.as_slice() {
            let category = doc.metadata.category.clone().unwrap_or_default();
            *stats.categories.entry(category).or_insert(0) += 1;
            let difficulty = doc.metadata.difficulty.map(|d| d.label().to_string()).unwrap_or_default();
            *stats.difficulties.entry(difficulty).or_insert(0) += 1;
        }
        if !self.sections.is_empty() {
            let total: usize = self.sections.iter().map(|s| s.size).sum();
            stats.avg_section_size = total as f64 / self.sections.len() as f64;
        }
        stats
    }
}

/// Turns a splitter fragment into a linked section. Parent metadata wins over
/// heading context on key conflicts.
fn adopt_fragment(doc: &Document, fragment: Fragment, position: usize, batch_index: usize) -> Section {
    let mut metadata = doc.metadata.clone();
    for (label, title) in fragment.headings {
        metadata.extra.entry(label).or_insert(title);
    }
    let size = fragment.content.chars().count();
    Section {
        id: SectionId::new(),
        parent_id: doc.id,
        doc_type: DocType::Child,
        content: fragment.content,
        metadata,
        position,
        batch_index,
        size,
    }
}
