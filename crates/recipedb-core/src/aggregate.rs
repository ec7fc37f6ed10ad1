//! Rebuilds ranked parent documents from matched sections.
//!
//! Ranking is a vote count: each distinct matched section gives one vote to
//! its parent. Parents with equal votes keep the order in which they were
//! first seen in the input.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::index::{DocumentArena, ParentChildIndex};
use crate::types::{DocId, Document, Section, SectionId};

/// A parent document and the number of distinct sections that matched it.
#[derive(Debug, Clone, Copy)]
pub struct ParentMatch<'a> {
    pub document: &'a Document,
    pub hits: usize,
}

pub struct ParentAggregator<'a> {
    index: &'a ParentChildIndex,
    documents: &'a DocumentArena,
}

impl<'a> ParentAggregator<'a> {
    pub fn new(index: &'a ParentChildIndex, documents: &'a DocumentArena) -> Self { Self { index, documents } }

    /// Ranks parents of the given section ids. Duplicate ids vote once; ids
    /// unknown to the index, or whose parent is not loaded, do not vote.
    pub fn rank_ids<I>(&self, ids: I) -> Vec<ParentMatch<'a>>
    where
        I: IntoIterator<Item = SectionId>,
    {
        let mut seen: HashSet<SectionId> = HashSet::new();
        let mut slots: HashMap<DocId, usize> = HashMap::new();
        let mut ranked: Vec<ParentMatch<'a>> = Vec::new();

        for id in ids {
            if !seen.insert(id) {
                continue;
            }
            let Some(parent) = self.index.parent_of(&id) else {
                debug!(section = %id, "section not in index; no vote");
                continue;
            };
            if let Some(&slot) = slots.get(&parent) {
                ranked[slot].hits += 1;
                continue;
            }
            let Some(document) = self.documents.get(&parent) else {
                debug!(section = %id, parent = %parent, "parent not loaded; no vote");
                continue;
            };
            slots.insert(parent, ranked.len());
            ranked.push(ParentMatch { document, hits: 1 });
        }

        // stable: ties keep first-seen order
        ranked.sort_by(|a, b| b.hits.cmp(&a.hits));
        ranked
    }

    /// Like [`rank_ids`](Self::rank_ids), but a section whose recorded parent
    /// disagrees with the index is dropped as unresolvable.
    pub fn rank_sections<'s, I>(&self, sections: I) -> Vec<ParentMatch<'a>>
    where
        I: IntoIterator<Item = &'s Section>,
    {
        let index = self.index;
        self.rank_ids(sections.into_iter().filter_map(|s| match index.parent_of(&s.id) {
            Some(parent) if parent == s.parent_id => Some(s.id),
            _ => {
                debug!(section = %s.id, parent = %s.parent_id, "unresolvable parent link; no vote");
                None
            }
        }))
    }

    pub fn parent_documents<'s, I>(&self, sections: I) -> Vec<&'a Document>
    where
        I: IntoIterator<Item = &'s Section>,
    {
        self.rank_sections(sections).into_iter().map(|m| m.document).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocType, Metadata};
    use std::path::PathBuf;

    fn doc(name: &str) -> Document { Document::new(PathBuf::from(format!("{name}.md")), name.to_string()) }

    fn section(parent: DocId, position: usize) -> Section {
        Section {
            id: SectionId::new(),
            parent_id: parent,
            doc_type: DocType::Child,
            content: String::new(),
            metadata: Metadata::default(),
            position,
            batch_index: 0,
            size: 0,
        }
    }

    struct Fixture {
        index: ParentChildIndex,
        arena: DocumentArena,
        ids: Vec<DocId>,
    }

    fn fixture(names: &[&str]) -> Fixture {
        let docs: Vec<Document> = names.iter().map(|n| doc(n)).collect();
        let ids = docs.iter().map(|d| d.id).collect();
        Fixture { index: ParentChildIndex::new(), arena: DocumentArena::new(docs), ids }
    }

    fn registered(f: &mut Fixture, parent: usize) -> Section {
        let s = section(f.ids[parent], 0);
        f.index.register(s.id, s.parent_id);
        s
    }

    #[test]
    fn more_votes_rank_first() {
        let mut f = fixture(&["p1", "p2"]);
        let hits = vec![registered(&mut f, 1), registered(&mut f, 0), registered(&mut f, 0)];
        let agg = ParentAggregator::new(&f.index, &f.arena);
        let ranked = agg.rank_sections(&hits);
        let order: Vec<DocId> = ranked.iter().map(|m| m.document.id).collect();
        assert_eq!(order, vec![f.ids[0], f.ids[1]]);
        assert_eq!(ranked[0].hits, 2);
        assert_eq!(ranked[1].hits, 1);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let mut f = fixture(&["a", "b", "c"]);
        let hits = vec![registered(&mut f, 2), registered(&mut f, 0), registered(&mut f, 1)];
        let agg = ParentAggregator::new(&f.index, &f.arena);
        let order: Vec<DocId> = agg.parent_documents(&hits).iter().map(|d| d.id).collect();
        assert_eq!(order, vec![f.ids[2], f.ids[0], f.ids[1]]);
    }

    #[test]
    fn duplicate_sections_vote_once() {
        let mut f = fixture(&["a", "b"]);
        let a = registered(&mut f, 0);
        let b1 = registered(&mut f, 1);
        let b2 = registered(&mut f, 1);
        let hits = vec![a.clone(), a.clone(), a, b1, b2];
        let agg = ParentAggregator::new(&f.index, &f.arena);
        let ranked = agg.rank_sections(&hits);
        assert_eq!(ranked[0].document.id, f.ids[1]);
        assert_eq!(ranked[0].hits, 2);
        assert_eq!(ranked[1].hits, 1);
    }

    #[test]
    fn unresolvable_sections_are_dropped() {
        let mut f = fixture(&["a", "b"]);
        let stray = section(DocId::new(), 0);
        let mut mislinked = registered(&mut f, 0);
        mislinked.parent_id = f.ids[1];
        let hits = vec![registered(&mut f, 0), stray, registered(&mut f, 1), mislinked];
        let agg = ParentAggregator::new(&f.index, &f.arena);
        let docs = agg.parent_documents(&hits);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, f.ids[0]);
    }

    #[test]
    fn parent_missing_from_arena_does_not_vote() {
        let mut f = fixture(&["a"]);
        let orphan = section(DocId::new(), 0);
        f.index.register(orphan.id, orphan.parent_id);
        let hits = vec![orphan, registered(&mut f, 0)];
        let agg = ParentAggregator::new(&f.index, &f.arena);
        let ranked = agg.rank_sections(&hits);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].document.id, f.ids[0]);
    }

    #[test]
    fn empty_input_empty_output() {
        let f = fixture(&["a"]);
        let agg = ParentAggregator::new(&f.index, &f.arena);
        assert!(agg.rank_ids(Vec::new()).is_empty());
        assert!(agg.parent_documents(&Vec::<Section>::new()).is_empty());
    }
}
