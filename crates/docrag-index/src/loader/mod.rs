//! Directory ingestion.
//!
//! Unreadable or unparseable files are skipped: each one is logged with
//! `tracing::warn!` and reported in [`LoadedDocuments::skipped`]. Only a
//! missing source directory fails the whole load.

#[cfg(feature = "pdf")]
mod pdf;
mod text;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use crate::document::Document;
use crate::error::IndexError;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub type LoadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Document>, IndexError>> + Send + 'a>>;

/// Reads one file into documents.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> LoadFuture<'_>;

    fn supported_extensions(&self) -> &[&str];
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub recursive: bool,
    pub include_hidden: bool,
    pub max_file_size: u64,
    /// Lowercase extensions without the dot. Empty means every file.
    pub extensions: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            include_hidden: false,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            extensions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

pub struct DirectoryLoader {
    config: LoaderConfig,
    loaders: Vec<Box<dyn DocumentLoader>>,
    fallback: TextLoader,
}

impl DirectoryLoader {
    #[must_use]
    pub fn new(config: LoaderConfig) -> Self {
        let max_file_size = config.max_file_size;
        #[cfg_attr(not(feature = "pdf"), expect(unused_mut))]
        let mut loaders: Vec<Box<dyn DocumentLoader>> = Vec::new();
        #[cfg(feature = "pdf")]
        loaders.push(Box::new(PdfLoader { max_file_size }));
        Self {
            loaders,
            fallback: TextLoader { max_file_size },
            config,
        }
    }

    /// Register a loader for additional extensions. Later registrations win.
    #[must_use]
    pub fn with_loader(mut self, loader: Box<dyn DocumentLoader>) -> Self {
        self.loaders.insert(0, loader);
        self
    }

    /// Load every eligible file under `dir`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::SourceNotFound`] if `dir` does not exist or is not a directory.
    pub async fn load(&self, dir: &Path) -> Result<LoadedDocuments, IndexError> {
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(IndexError::SourceNotFound(dir.to_path_buf())),
        }

        let mut loaded = LoadedDocuments::default();
        let files = self.collect_files(dir, &mut loaded.skipped);
        tracing::info!(dir = %dir.display(), files = files.len(), "loading documents");

        for path in files {
            let loader = self.loader_for(&path);
            match loader.load(&path).await {
                Ok(docs) => loaded.documents.extend(docs),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping document: {e}");
                    loaded.skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(loaded)
    }

    fn collect_files(&self, dir: &Path, skipped: &mut Vec<SkippedFile>) -> Vec<PathBuf> {
        let mut walker = ignore::WalkBuilder::new(dir);
        walker
            .hidden(!self.config.include_hidden)
            .parents(false)
            .ignore(false)
            .git_global(false)
            .git_exclude(false)
            .git_ignore(self.config.recursive)
            .require_git(false)
            .max_depth(if self.config.recursive { None } else { Some(1) });

        let mut files = Vec::new();
        for entry in walker.build() {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_some_and(|ft| ft.is_file())
                        && self.extension_allowed(entry.path())
                    {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    skipped.push(SkippedFile {
                        path: dir.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        files.sort();
        files
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        if self.config.extensions.is_empty() {
            return true;
        }
        let ext = extension_of(path);
        self.config.extensions.iter().any(|e| *e == ext)
    }

    fn loader_for(&self, path: &Path) -> &dyn DocumentLoader {
        let ext = extension_of(path);
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map_or(&self.fallback as &dyn DocumentLoader, AsRef::as_ref)
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}
