use crate::types::Fragment;

/// Structure-aware text splitter.
///
/// Implementations return fragments in document order with the heading text
/// kept inside each fragment. An empty result is allowed; the pipeline then
/// falls back to one whole-document fragment.
pub trait StructureSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<Fragment>;
}
