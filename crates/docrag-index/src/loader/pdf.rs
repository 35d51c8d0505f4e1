use std::path::Path;

use super::{DEFAULT_MAX_FILE_SIZE, DocumentLoader, LoadFuture};
use crate::document::Document;
use crate::error::IndexError;

pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(IndexError::FileTooLarge(meta.len()));
            }

            let source = path.display().to_string();
            let extract_path = path.clone();
            let content = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&extract_path).map_err(|e| IndexError::DocumentLoad {
                    path: extract_path.clone(),
                    reason: e.to_string(),
                })
            })
            .await
            .map_err(|e| IndexError::Io(std::io::Error::other(e)))??;

            Ok(vec![Document::new(source, "application/pdf", content)])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}
