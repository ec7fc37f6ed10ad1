//! Path and content heuristics that tag a recipe with category, dish name
//! and difficulty.

use std::path::{Component, Path};

use crate::config::{CategoryRule, PrepSettings};
use crate::types::{Difficulty, Document};

const STAR: char = '★';

/// Fields derived for one document. Applying the same patch twice is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPatch {
    pub category: String,
    pub dish_name: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone)]
pub struct MetadataEnricher {
    rules: Vec<CategoryRule>,
    default_category: String,
}

impl Default for MetadataEnricher {
    fn default() -> Self { Self::from_settings(&PrepSettings::default()) }
}

impl MetadataEnricher {
    pub fn new(rules: Vec<CategoryRule>, default_category: impl Into<String>) -> Self {
        Self { rules, default_category: default_category.into() }
    }

    pub fn from_settings(settings: &PrepSettings) -> Self {
        Self::new(settings.categories.clone(), settings.default_category.clone())
    }

    /// Pure derivation from `(path, content)`.
    pub fn derive(&self, path: &Path, content: &str) -> MetadataPatch {
        MetadataPatch {
            category: self.category_for(path).to_string(),
            dish_name: dish_name(path),
            difficulty: difficulty_for(content),
        }
    }

    /// Overwrites the enriched fields in place; other metadata is left alone.
    /// Category tokens are only looked for below `root`.
    pub fn enrich(&self, doc: &mut Document, root: &Path) {
        let relative = doc.metadata.source.strip_prefix(root).unwrap_or(doc.metadata.source.as_path());
        let patch = self.derive(relative, &doc.content);
        doc.metadata.category = Some(patch.category);
        doc.metadata.dish_name = Some(patch.dish_name);
        doc.metadata.difficulty = Some(patch.difficulty);
    }

    /// First path segment, in path order, equal to a known token decides the label.
    pub fn category_for(&self, path: &Path) -> &str {
        path.components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .find_map(|segment| self.rules.iter().find(|r| r.token == segment))
            .map(|r| r.label.as_str())
            .unwrap_or(self.default_category.as_str())
    }
}

/// File stem, verbatim.
pub fn dish_name(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
}

/// Tier of the longest run of consecutive star glyphs in `content`.
pub fn difficulty_for(content: &str) -> Difficulty { Difficulty::from_star_run(longest_star_run(content)) }

fn longest_star_run(content: &str) -> usize {
    let mut best = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == STAR {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}
