use std::path::Path;
use std::sync::Arc;

use docrag_index::{
    DirectoryLoader, IndexBuilder, IndexStore, RetrievedContext, Retriever, SkippedFile,
    TextSplitter,
};
use docrag_llm::LlmProvider;
use tracing::Instrument as _;

use crate::config::Config;
use crate::error::RagError;
use crate::generator::AnswerGenerator;

/// Outcome of a successful [`RagPipeline::build_index`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub documents: usize,
    pub chunks: usize,
    pub skipped: Vec<SkippedFile>,
}

/// Wires loader, builder, store, retriever and generator around one provider.
pub struct RagPipeline<P: LlmProvider> {
    loader: DirectoryLoader,
    builder: IndexBuilder<P>,
    store: IndexStore,
    retriever: Retriever<P>,
    generator: AnswerGenerator<P>,
}

impl<P: LlmProvider> RagPipeline<P> {
    #[must_use]
    pub fn new(config: &Config, provider: Arc<P>) -> Self {
        let builder = IndexBuilder::new(
            Arc::clone(&provider),
            TextSplitter::new(config.splitter_config()),
            config.llm.embedding_model.clone(),
            config.embedding_timeout(),
        );
        let retriever = Retriever::new(
            Arc::clone(&provider),
            config.retrieval_config(),
            config.embedding_timeout(),
        );
        Self {
            loader: DirectoryLoader::new(config.loader_config()),
            builder,
            store: IndexStore::new(config.index.path.clone()),
            retriever,
            generator: AnswerGenerator::new(provider, config.llm_timeout()),
        }
    }

    #[must_use]
    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Load every document under `dir`, embed it and replace the persisted index.
    ///
    /// Concurrent builds targeting the same index file run one after another.
    /// Dropping the returned future mid-write does not release the write lock
    /// before the new file is in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory is missing, an embedding call fails,
    /// or the index cannot be written. The previously persisted index is left
    /// untouched in every failure case.
    pub async fn build_index(&self, dir: &Path) -> Result<BuildReport, RagError> {
        let span = tracing::info_span!("build_index", dir = %dir.display());
        async {
            let guard = self.store.lock_for_write().await;

            let loaded = self.loader.load(dir).await?;
            let index = self.builder.build(&loaded.documents).await?;
            self.store.persist_locked(guard, &index).await?;

            let report = BuildReport {
                documents: loaded.documents.len(),
                chunks: index.len(),
                skipped: loaded.skipped,
            };
            tracing::info!(
                documents = report.documents,
                chunks = report.chunks,
                skipped = report.skipped.len(),
                path = %self.store.path().display(),
                "index built"
            );
            Ok::<_, RagError>(report)
        }
        .instrument(span)
        .await
    }

    /// Answer `query` from the persisted index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is missing, corrupt or empty, if the query
    /// cannot be embedded, or if generation fails.
    pub async fn answer(&self, query: &str) -> Result<String, RagError> {
        let span = tracing::info_span!("process_query");
        async {
            let context = self.retrieve(query).await?;
            self.generator.generate(query, &context).await
        }
        .instrument(span)
        .await
    }

    /// Load the persisted index and rank its chunks against `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is missing, corrupt or empty, or if the
    /// query cannot be embedded.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievedContext, RagError> {
        let index = self.store.load().await?;
        Ok(self.retriever.retrieve(query, &index).await?)
    }
}

#[cfg(test)]
mod tests {
    use docrag_index::IndexError;
    use docrag_llm::mock::MockProvider;

    use super::*;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.index.path = dir.join("document_index.json");
        config
    }

    fn write_docs(dir: &Path, files: &[(&str, &str)]) {
        std::fs::create_dir_all(dir).unwrap();
        for (name, content) in files {
            std::fs::write(dir.join(name), content).unwrap();
        }
    }

    #[tokio::test]
    async fn answers_from_built_index() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        write_docs(&docs, &[("a.txt", "The sky is blue.")]);

        let mock = MockProvider::echoing();
        let pipeline = RagPipeline::new(&config_in(tmp.path()), Arc::new(mock.clone()));

        let report = pipeline.build_index(&docs).await.unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks, 1);
        assert!(report.skipped.is_empty());

        let context = pipeline.retrieve("What color is the sky?").await.unwrap();
        assert!(context.text().contains("sky is blue"));

        let answer = pipeline.answer("What color is the sky?").await.unwrap();
        assert!(answer.contains("blue"));
        assert!(mock.recorded_prompts()[0].contains("<question>\nWhat color is the sky?"));
    }

    #[tokio::test]
    async fn rebuilding_same_directory_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        write_docs(&docs, &[("a.txt", "Alpha. Beta."), ("b.md", "# Gamma\nDelta.")]);

        let pipeline =
            RagPipeline::new(&config_in(tmp.path()), Arc::new(MockProvider::default()));
        pipeline.build_index(&docs).await.unwrap();
        let first = pipeline.store().load().await.unwrap();
        pipeline.build_index(&docs).await.unwrap();
        let second = pipeline.store().load().await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn empty_directory_builds_empty_index() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("empty");
        std::fs::create_dir_all(&docs).unwrap();

        let pipeline =
            RagPipeline::new(&config_in(tmp.path()), Arc::new(MockProvider::echoing()));
        let report = pipeline.build_index(&docs).await.unwrap();
        assert_eq!(report.documents, 0);
        assert_eq!(report.chunks, 0);
        assert!(pipeline.store().path().exists());

        let err = pipeline.answer("anything?").await.unwrap_err();
        assert!(matches!(err, RagError::Index(IndexError::EmptyIndex)));
    }

    #[tokio::test]
    async fn query_before_build_reports_missing_index() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline =
            RagPipeline::new(&config_in(tmp.path()), Arc::new(MockProvider::echoing()));

        let err = pipeline.answer("What color is the sky?").await.unwrap_err();
        assert!(matches!(err, RagError::Index(IndexError::IndexNotFound(_))));
    }

    #[tokio::test]
    async fn missing_directory_leaves_previous_index() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        write_docs(&docs, &[("a.txt", "The sky is blue.")]);

        let pipeline =
            RagPipeline::new(&config_in(tmp.path()), Arc::new(MockProvider::default()));
        pipeline.build_index(&docs).await.unwrap();
        let before = pipeline.store().load().await.unwrap();

        let err = pipeline
            .build_index(&tmp.path().join("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Index(IndexError::SourceNotFound(_))));
        assert_eq!(pipeline.store().load().await.unwrap(), before);
    }

    #[tokio::test]
    async fn failed_embedding_keeps_previous_index() {
        let tmp = tempfile::tempdir().unwrap();
        let docs = tmp.path().join("docs");
        write_docs(&docs, &[("a.txt", "The sky is blue.")]);
        let config = config_in(tmp.path());

        RagPipeline::new(&config, Arc::new(MockProvider::default()))
            .build_index(&docs)
            .await
            .unwrap();

        let pipeline = RagPipeline::new(&config, Arc::new(MockProvider::failing_embed()));
        let err = pipeline.build_index(&docs).await.unwrap_err();
        assert!(matches!(err, RagError::Index(IndexError::Embedding(_))));
        assert_eq!(pipeline.store().load().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancelled_build_never_overwrites_later_build() {
        let tmp = tempfile::tempdir().unwrap();
        let bulk = tmp.path().join("bulk");
        let small = tmp.path().join("small");
        let sentence = "Stale words fill this document. ".repeat(400);
        let files: Vec<(String, String)> = (0..40)
            .map(|i| (format!("doc{i:02}.txt"), sentence.clone()))
            .collect();
        let refs: Vec<(&str, &str)> = files
            .iter()
            .map(|(n, c)| (n.as_str(), c.as_str()))
            .collect();
        write_docs(&bulk, &refs);
        write_docs(&small, &[("fresh.txt", "Fresh content.")]);

        let pipeline =
            RagPipeline::new(&config_in(tmp.path()), Arc::new(MockProvider::default()));
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(5),
            pipeline.build_index(&bulk),
        )
        .await;
        pipeline.build_index(&small).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let index = pipeline.store().load().await.unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.entries[0].content, "Fresh content.");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_builds_never_mix_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        write_docs(&first, &[("a.txt", "Apples are red."), ("b.txt", "Bananas.")]);
        write_docs(
            &second,
            &[
                ("c.txt", "Cherries are dark."),
                ("d.txt", "Dates are sweet."),
                ("e.txt", "Elderberries."),
            ],
        );

        let pipeline = Arc::new(RagPipeline::new(
            &config_in(tmp.path()),
            Arc::new(MockProvider::default()),
        ));

        let mut handles = Vec::new();
        for i in 0..8 {
            let pipeline = Arc::clone(&pipeline);
            let dir = if i % 2 == 0 { first.clone() } else { second.clone() };
            handles.push(tokio::spawn(async move { pipeline.build_index(&dir).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let index = pipeline.store().load().await.unwrap();
        let names: Vec<String> = index
            .entries
            .iter()
            .filter_map(|e| Path::new(&e.source).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        let all_first = names.iter().all(|n| n == "a.txt" || n == "b.txt");
        let all_second = names.iter().all(|n| ["c.txt", "d.txt", "e.txt"].contains(&n.as_str()));
        assert!(all_first || all_second, "mixed index: {names:?}");
        assert!(index.len() == 2 || index.len() == 3);
    }
}
