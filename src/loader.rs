//! Document directory loader.
//!
//! Walks the configured directory, filters paths through include/exclude
//! globs, and turns every matching file into a [`Document`]. Hidden files
//! and directories are always skipped. Files whose text cannot be
//! extracted are skipped with a warning; an I/O failure, a missing
//! directory, or a directory with nothing loadable is a data-source error.

use chrono::{DateTime, Utc};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::config::DocumentsConfig;
use crate::error::{Error, Result};
use crate::extract::{self, MIME_TEXT};
use crate::models::Document;

/// Load every document under `config.dir`, sorted by relative path.
pub fn load_documents(config: &DocumentsConfig) -> Result<Vec<Document>> {
    let root = &config.dir;
    if !root.is_dir() {
        return Err(Error::DataSource(format!(
            "document directory does not exist: {}",
            root.display()
        )));
    }

    let include_set = build_globset(&config.include_globs)?;
    let mut excludes = vec!["**/.*".to_string(), "**/.*/**".to_string()];
    excludes.extend(config.exclude_globs.iter().cloned());
    let exclude_set = build_globset(&excludes)?;

    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry.map_err(|e| {
            Error::DataSource(format!("failed to read {}: {}", root.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        if let Some(doc) = load_file(path, &rel_str)? {
            documents.push(doc);
        }
    }

    if documents.is_empty() {
        return Err(Error::DataSource(format!(
            "no loadable documents found in {}",
            root.display()
        )));
    }

    documents.sort_by(|a, b| a.source.cmp(&b.source));
    debug!(count = documents.len(), dir = %root.display(), "loaded documents");
    Ok(documents)
}

/// Read one file. Returns `None` when the file has no usable text.
fn load_file(path: &Path, relative_path: &str) -> Result<Option<Document>> {
    let read_err =
        |e: std::io::Error| Error::DataSource(format!("failed to read {}: {}", path.display(), e));

    let bytes = std::fs::read(path).map_err(read_err)?;
    let modified_at: DateTime<Utc> = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    let content_type = extract::content_type_for(path);
    let body = if content_type == MIME_TEXT {
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                warn!(file = relative_path, "skipping file: not UTF-8 text");
                return Ok(None);
            }
        }
    } else {
        match extract::extract_text(&bytes, content_type) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = relative_path, error = %e, "skipping file");
                return Ok(None);
            }
        }
    };

    if body.trim().is_empty() {
        debug!(file = relative_path, "skipping empty file");
        return Ok(None);
    }

    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| relative_path.to_string());

    Ok(Some(Document {
        id: Uuid::new_v4().to_string(),
        source: relative_path.to_string(),
        path: path.to_path_buf(),
        title,
        content_type: content_type.to_string(),
        modified_at,
        body,
    }))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::Config(format!("invalid glob '{}': {}", pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("invalid glob set: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn docs_config(dir: &Path) -> DocumentsConfig {
        DocumentsConfig {
            dir: dir.to_path_buf(),
            ..DocumentsConfig::default()
        }
    }

    #[test]
    fn test_missing_directory_is_data_source_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_documents(&docs_config(&tmp.path().join("missing")));
        assert!(matches!(result, Err(Error::DataSource(_))));
    }

    #[test]
    fn test_empty_directory_is_data_source_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_documents(&docs_config(tmp.path()));
        assert!(matches!(result, Err(Error::DataSource(_))));
    }

    #[test]
    fn test_loads_nested_files_sorted() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("guides")).unwrap();
        fs::write(tmp.path().join("zeta.txt"), "last").unwrap();
        fs::write(tmp.path().join("guides/setup.md"), "# Setup\n\nRun it.").unwrap();
        fs::write(tmp.path().join("alpha.md"), "first").unwrap();

        let docs = load_documents(&docs_config(tmp.path())).unwrap();
        let sources: Vec<&str> = docs.iter().map(|d| d.source.as_str()).collect();
        assert_eq!(sources, vec!["alpha.md", "guides/setup.md", "zeta.txt"]);
        assert_eq!(docs[1].title, "setup.md");
        assert_eq!(docs[1].content_type, MIME_TEXT);
    }

    #[test]
    fn test_hidden_empty_and_binary_files_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(".git/config"), "secret").unwrap();
        fs::write(tmp.path().join(".env"), "KEY=1").unwrap();
        fs::write(tmp.path().join("blank.txt"), "   \n").unwrap();
        fs::write(tmp.path().join("image.bin"), [0xff, 0xfe, 0x00, 0x81]).unwrap();
        fs::write(tmp.path().join("broken.pdf"), "not really a pdf").unwrap();
        fs::write(tmp.path().join("notes.txt"), "kept").unwrap();

        let docs = load_documents(&docs_config(tmp.path())).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "notes.txt");
        assert_eq!(docs[0].body, "kept");
    }

    #[test]
    fn test_include_and_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("drafts")).unwrap();
        fs::write(tmp.path().join("a.md"), "a").unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        fs::write(tmp.path().join("drafts/c.md"), "c").unwrap();

        let config = DocumentsConfig {
            dir: tmp.path().to_path_buf(),
            include_globs: vec!["**/*.md".to_string()],
            exclude_globs: vec!["drafts/**".to_string()],
            follow_symlinks: false,
        };
        let docs = load_documents(&config).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, "a.md");
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let config = DocumentsConfig {
            dir: tmp.path().to_path_buf(),
            include_globs: vec!["[".to_string()],
            ..DocumentsConfig::default()
        };
        assert!(matches!(load_documents(&config), Err(Error::Config(_))));
    }
}
