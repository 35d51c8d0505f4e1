use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DOCRAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DOCRAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("DOCRAG_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("DOCRAG_INDEX_PATH") {
            self.index.path = v.into();
        }
        if let Some(n) = parsed_env::<usize>("DOCRAG_INDEX_CHUNK_SIZE") {
            self.index.chunk_size = n;
        }
        if let Some(n) = parsed_env::<usize>("DOCRAG_INDEX_CHUNK_OVERLAP") {
            self.index.chunk_overlap = n;
        }
        if let Some(recursive) = parsed_env::<bool>("DOCRAG_LOADER_RECURSIVE") {
            self.loader.recursive = recursive;
        }
        if let Some(n) = parsed_env::<usize>("DOCRAG_RETRIEVAL_TOP_K") {
            self.retrieval.top_k = n;
        }
        if let Some(t) = parsed_env::<f32>("DOCRAG_RETRIEVAL_SCORE_THRESHOLD") {
            self.retrieval.score_threshold = t.clamp(-1.0, 1.0);
        }
        if let Some(secs) = parsed_env::<u64>("DOCRAG_TIMEOUT_LLM") {
            self.timeouts.llm_secs = secs;
        }
        if let Some(secs) = parsed_env::<u64>("DOCRAG_TIMEOUT_EMBEDDING") {
            self.timeouts.embedding_secs = secs;
        }
        if let Ok(v) = std::env::var("DOCRAG_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Some(port) = parsed_env::<u16>("DOCRAG_GATEWAY_PORT") {
            self.gateway.port = port;
        }
    }
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("ignoring invalid {key} value: {raw}");
            None
        }
    }
}
