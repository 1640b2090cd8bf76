use crate::config::DEFAULT_TOP_N;
use crate::corpus::ItemRecord;
use crate::index::ReadyIndex;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation<'a> {
    pub record: &'a ItemRecord,
    pub score: f32,
}

/// Read-only top-N query over a built index.
#[derive(Debug, Clone)]
pub struct Recommender {
    index: Arc<ReadyIndex>,
}

impl Recommender {
    pub fn new(index: Arc<ReadyIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &ReadyIndex { &self.index }

    /// The `top_n` items most similar to `key`, best first. An unknown key
    /// yields an empty list.
    pub fn recommend(&self, key: &str, top_n: usize) -> Vec<&ItemRecord> {
        self.recommend_scored(key, top_n).into_iter().map(|r| r.record).collect()
    }

    pub fn recommend_default(&self, key: &str) -> Vec<&ItemRecord> {
        self.recommend(key, DEFAULT_TOP_N)
    }

    pub fn recommend_scored(&self, key: &str, top_n: usize) -> Vec<Recommendation<'_>> {
        let corpus = self.index.corpus();
        let Some(position) = corpus.position(key) else {
            tracing::debug!(key, "no such item");
            return Vec::new();
        };
        if top_n == 0 {
            return Vec::new();
        }
        let Some(row) = self.index.similarity().row(position) else {
            return Vec::new();
        };

        let mut scored: Vec<(usize, f32)> = row.filter(|(p, _)| *p != position).collect();
        // stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_n);

        scored
            .into_iter()
            .filter_map(|(p, score)| corpus.by_position(p).map(|record| Recommendation { record, score }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::corpus::Corpus;

    fn recommender(pairs: &[(&str, &str)]) -> Recommender {
        let corpus = Corpus::from_pairs(pairs.iter().copied()).unwrap();
        Recommender::new(Arc::new(ReadyIndex::build(corpus, &IndexConfig::default())))
    }

    fn keys(records: &[&ItemRecord]) -> Vec<String> {
        records.iter().map(|r| r.key.clone()).collect()
    }

    #[test]
    fn ranks_shared_vocabulary_first() {
        let rec = recommender(&[
            ("A", "space adventure crew"),
            ("B", "space adventure alien"),
            ("C", "romantic comedy wedding"),
        ]);
        assert_eq!(keys(&rec.recommend("A", 2)), vec!["B", "C"]);
    }

    #[test]
    fn unknown_key_is_empty() {
        let rec = recommender(&[("A", "space"), ("B", "space")]);
        assert!(rec.recommend("nonexistent-title-xyz", 10).is_empty());
        assert!(rec.recommend("A", 0).is_empty());
    }

    #[test]
    fn excludes_self_even_with_identical_twin() {
        let rec = recommender(&[("A", "heist"), ("B", "heist"), ("C", "heist")]);
        let out = rec.recommend("B", 10);
        assert_eq!(keys(&out), vec!["A", "C"]);
    }

    #[test]
    fn scores_are_descending() {
        let rec = recommender(&[
            ("A", "space adventure crew"),
            ("B", "space adventure alien"),
            ("C", "space opera"),
            ("D", "romantic comedy"),
        ]);
        let out = rec.recommend_scored("A", 10);
        assert_eq!(out.len(), 3);
        assert!(out.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(out[2].record.key, "D");
        assert_eq!(out[2].score, 0.0);
    }
}
