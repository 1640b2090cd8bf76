use crate::config::{IndexConfig, SourceColumns};
use crate::corpus::{self, Corpus};
use crate::error::DataLoadError;
use crate::features::{self, FeatureMatrix};
use crate::similarity::{self, SimilarityMatrix};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// The immutable artifact set a recommender queries: the corpus and the two
/// matrices derived from it. Built once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyIndex {
    corpus: Corpus,
    features: FeatureMatrix,
    similarity: SimilarityMatrix,
    config: IndexConfig,
    fingerprint: String,
}

impl ReadyIndex {
    pub fn build(corpus: Corpus, config: &IndexConfig) -> Self {
        let start = Instant::now();
        let fingerprint = corpus.fingerprint();
        let features = features::build(&corpus, config);
        let similarity = similarity::build(&features);
        tracing::info!(
            items = corpus.len(),
            fingerprint = %fingerprint,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "index ready"
        );
        Self { corpus, features, similarity, config: config.clone(), fingerprint }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(corpus: Corpus, features: FeatureMatrix, similarity: SimilarityMatrix, config: IndexConfig) -> Self {
        let fingerprint = corpus.fingerprint();
        Self { corpus, features, similarity, config, fingerprint }
    }

    pub fn corpus(&self) -> &Corpus { &self.corpus }

    pub fn features(&self) -> &FeatureMatrix { &self.features }

    pub fn similarity(&self) -> &SimilarityMatrix { &self.similarity }

    pub fn config(&self) -> &IndexConfig { &self.config }

    /// Fingerprint of the corpus this index was built from.
    pub fn fingerprint(&self) -> &str { &self.fingerprint }

    fn matches(&self, fingerprint: &str, config: &IndexConfig) -> bool {
        self.fingerprint == fingerprint && &self.config == config
    }
}

/// Shared slot holding the current index. Readers take an `Arc` snapshot and
/// query it without holding the lock; a rebuild swaps in a complete new index.
pub struct IndexHandle {
    current: RwLock<Arc<ReadyIndex>>,
}

impl IndexHandle {
    pub fn new(index: ReadyIndex) -> Self {
        Self { current: RwLock::new(Arc::new(index)) }
    }

    pub fn current(&self) -> Arc<ReadyIndex> {
        self.current.read().clone()
    }

    pub fn replace(&self, index: ReadyIndex) -> Arc<ReadyIndex> {
        let next = Arc::new(index);
        *self.current.write() = next.clone();
        next
    }

    /// Return the current index if it was built from an identical corpus with
    /// the same config, otherwise build a new one and swap it in.
    pub fn get_or_build(&self, corpus: Corpus, config: &IndexConfig) -> Arc<ReadyIndex> {
        let fingerprint = corpus.fingerprint();
        let current = self.current();
        if current.matches(&fingerprint, config) {
            tracing::debug!(fingerprint = %fingerprint, "reusing cached index");
            return current;
        }
        self.replace(ReadyIndex::build(corpus, config))
    }

    /// Load the source again and swap in the rebuilt index. On failure the
    /// current index stays in place.
    pub fn reload(&self, source: &Path, columns: &SourceColumns, config: &IndexConfig) -> Result<Arc<ReadyIndex>, DataLoadError> {
        let corpus = corpus::load(source, columns)?;
        Ok(self.get_or_build(corpus, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdfScheme;

    fn corpus() -> Corpus {
        Corpus::from_pairs([("A", "space adventure crew"), ("B", "space adventure alien")]).unwrap()
    }

    #[test]
    fn same_corpus_reuses_cached_index() {
        let cfg = IndexConfig::default();
        let handle = IndexHandle::new(ReadyIndex::build(corpus(), &cfg));
        let first = handle.current();
        let again = handle.get_or_build(corpus(), &cfg);
        assert!(Arc::ptr_eq(&first, &again));
    }

    #[test]
    fn changed_config_or_corpus_rebuilds() {
        let cfg = IndexConfig::default();
        let handle = IndexHandle::new(ReadyIndex::build(corpus(), &cfg));
        let first = handle.current();

        let plain = IndexConfig { idf: IdfScheme::Plain, ..IndexConfig::default() };
        let rebuilt = handle.get_or_build(corpus(), &plain);
        assert!(!Arc::ptr_eq(&first, &rebuilt));

        let other = Corpus::from_pairs([("C", "romantic comedy")]).unwrap();
        let swapped = handle.get_or_build(other, &plain);
        assert_eq!(handle.current().corpus().len(), 1);
        assert!(Arc::ptr_eq(&swapped, &handle.current()));
        // readers holding the old snapshot keep a complete index
        assert_eq!(first.corpus().len(), 2);
        assert_eq!(first.similarity().len(), 2);
    }

    #[test]
    fn reload_swaps_in_metadata_only_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("movies.csv");
        std::fs::write(&path, "title,soup,poster_path\nA,space crew,old.jpg\nB,space alien,b.jpg\n").unwrap();
        let cfg = IndexConfig::default();
        let columns = SourceColumns::default();
        let handle = IndexHandle::new(ReadyIndex::build(corpus::load(&path, &columns).unwrap(), &cfg));
        let before = handle.current();

        std::fs::write(&path, "title,soup,poster_path\nA,space crew,new.jpg\nB,space alien,b.jpg\n").unwrap();
        let after = handle.reload(&path, &columns, &cfg).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.corpus().get("A").unwrap().field("poster_path"), Some("new.jpg"));
        assert_eq!(handle.current().corpus().get("A").unwrap().field("poster_path"), Some("new.jpg"));

        // an unchanged file still reuses the cached index
        let again = handle.reload(&path, &columns, &cfg).unwrap();
        assert!(Arc::ptr_eq(&after, &again));
    }

    #[test]
    fn failed_reload_keeps_current_index() {
        let cfg = IndexConfig::default();
        let handle = IndexHandle::new(ReadyIndex::build(corpus(), &cfg));
        let res = handle.reload(Path::new("/nonexistent/movies.csv"), &SourceColumns::default(), &cfg);
        assert!(matches!(res, Err(DataLoadError::NotFound(_))));
        assert_eq!(handle.current().corpus().len(), 2);
    }
}
