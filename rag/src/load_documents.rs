use std::fs;

use walkdir::{DirEntry, WalkDir};

use crate::config::Config;
use crate::document::Document;
use crate::error::{RagError, Result};

/// Read every non-hidden file under the data directory, one `Document` per file.
pub fn load_documents(cfg: &Config) -> Result<Vec<Document>> {
    let base = &cfg.data_dir;
    if !base.is_dir() {
        return Err(RagError::Configuration(format!(
            "document directory {} does not exist",
            base.display()
        )));
    }

    let mut results = Vec::new();
    let walker = WalkDir::new(base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|e| RagError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        if text.trim().is_empty() {
            continue;
        }
        results.push(Document::new(text, path.to_string_lossy()));
    }

    tracing::info!(count = results.len(), dir = %base.display(), "loaded documents");
    Ok(results)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}
