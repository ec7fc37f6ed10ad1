//! Recursive discovery and loading of recipe files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::enrich::MetadataEnricher;
use crate::error::{Error, Result};
use crate::types::Document;

/// A file that was discovered but could not be turned into a document.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one load pass. Partial success is normal.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extensions: Vec<String>,
    enricher: MetadataEnricher,
}

impl DocumentLoader {
    pub fn new(extensions: Vec<String>, enricher: MetadataEnricher) -> Self {
        let extensions = extensions.into_iter().map(|e| e.trim_start_matches('.').to_ascii_lowercase()).collect();
        Self { extensions, enricher }
    }

    /// Loads and enriches every matching file under `root`.
    ///
    /// Only fully built documents are returned; unreadable files and walk
    /// errors end up in the report instead.
    pub fn load_dir(&self, root: &Path) -> Result<(Vec<Document>, LoadReport)> {
        if !root.is_dir() {
            return Err(Error::NotFound(format!("data directory {}", root.display())));
        }
        let mut report = LoadReport::default();
        let files = self.list_files(root, &mut report);
        if files.is_empty() {
            info!(root = %root.display(), "no recipe files found");
        }

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            match read_file_content(&path) {
                Ok(content) => {
                    let mut doc = Document::new(path, content);
                    self.enricher.enrich(&mut doc, root);
                    debug!(id = %doc.id, source = %doc.metadata.source.display(), "loaded document");
                    documents.push(doc);
                }
                Err(e) => {
                    warn!("skipping unreadable file: {e}");
                    report.skipped.push(SkippedFile { path, reason: e.to_string() });
                }
            }
        }
        report.loaded = documents.len();
        info!(loaded = report.loaded, skipped = report.skipped.len(), "document load finished");
        Ok((documents, report))
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    fn list_files(&self, root: &Path, report: &mut LoadReport) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(root) {
            match entry {
                Ok(entry) if entry.file_type().is_file() && self.matches_extension(entry.path()) => {
                    files.push(entry.into_path());
                }
                Ok(_) => {}
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    warn!(path = %path.display(), "walk error: {e}");
                    report.skipped.push(SkippedFile { path, reason: e.to_string() });
                }
            }
        }
        files.sort();
        files
    }
}

/// UTF-8 only; content is stored verbatim.
fn read_file_content(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Read { path: path.to_path_buf(), source })
}
