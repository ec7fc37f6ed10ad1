use std::collections::HashMap;

use crate::types::{DocId, Document, Metadata, SectionId};

/// Section -> parent document links, built while splitting.
///
/// Every registered section maps to exactly one parent; a parent usually owns
/// many sections.
#[derive(Debug, Default, Clone)]
pub struct ParentChildIndex {
    links: HashMap<SectionId, DocId>,
}

impl ParentChildIndex {
    pub fn new() -> Self { Self::default() }

    /// Registers a link. A section id is only ever registered once per pass;
    /// returns the previous parent if one was overwritten.
    pub fn register(&mut self, section: SectionId, parent: DocId) -> Option<DocId> { self.links.insert(section, parent) }

    pub fn parent_of(&self, section: &SectionId) -> Option<DocId> { self.links.get(section).copied() }

    pub fn contains(&self, section: &SectionId) -> bool { self.links.contains_key(section) }

    pub fn len(&self) -> usize { self.links.len() }

    pub fn is_empty(&self) -> bool { self.links.is_empty() }

    pub fn clear(&mut self) { self.links.clear() }
}

/// Loaded documents in load order, addressable by identity.
#[derive(Debug, Default, Clone)]
pub struct DocumentArena {
    docs: Vec<Document>,
    slots: HashMap<DocId, usize>,
}

impl DocumentArena {
    pub fn new(docs: Vec<Document>) -> Self {
        let slots = docs.iter().enumerate().map(|(i, d)| (d.id, i)).collect();
        Self { docs, slots }
    }

    pub fn get(&self, id: &DocId) -> Option<&Document> { self.slots.get(id).map(|&i| &self.docs[i]) }

    /// Metadata stays mutable after load; identity and content do not change.
    pub fn metadata_mut(&mut self, id: &DocId) -> Option<&mut Metadata> {
        let slot = *self.slots.get(id)?;
        Some(&mut self.docs[slot].metadata)
    }

    pub fn contains(&self, id: &DocId) -> bool { self.slots.contains_key(id) }

    pub fn as_slice(&self) -> &[Document] { &self.docs }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}
