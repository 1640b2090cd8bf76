use crate::config::IndexConfig;
use crate::corpus::Corpus;
use crate::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

pub type TermId = u32;

/// Closed vocabulary fixed at build time. Term ids follow lexicographic term order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    df: Vec<u32>,
    idf: Vec<f32>,
}

impl Vocabulary {
    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok().map(|i| i as TermId)
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn document_frequency(&self, id: TermId) -> Option<u32> {
        self.df.get(id as usize).copied()
    }

    pub fn idf(&self, id: TermId) -> Option<f32> {
        self.idf.get(id as usize).copied()
    }
}

/// Sparse row: (term id, weight) entries in increasing term id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(TermId, f32)>,
}

impl SparseVector {
    pub fn entries(&self) -> &[(TermId, f32)] { &self.entries }

    pub fn is_zero(&self) -> bool { self.entries.iter().all(|(_, w)| *w == 0.0) }

    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    pub fn weight(&self, id: TermId) -> f32 {
        self.entries
            .binary_search_by_key(&id, |(t, _)| *t)
            .map(|i| self.entries[i].1)
            .unwrap_or(0.0)
    }

    /// Merge-join dot product. Terms are visited in increasing id order on
    /// both sides, so `a.dot(b)` and `b.dot(a)` are bit-identical.
    pub fn dot(&self, other: &SparseVector) -> f32 {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0f32;
        while i < a.len() && j < b.len() {
            match a[i].0.cmp(&b[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += a[i].1 * b[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// N x V TF-IDF matrix, row i belongs to the item at corpus position i.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    vocabulary: Vocabulary,
    rows: Vec<SparseVector>,
}

impl FeatureMatrix {
    pub fn nrows(&self) -> usize { self.rows.len() }

    pub fn ncols(&self) -> usize { self.vocabulary.len() }

    pub fn row(&self, position: usize) -> Option<&SparseVector> { self.rows.get(position) }

    pub fn rows(&self) -> &[SparseVector] { &self.rows }

    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
}

/// Build the L2-normalized TF-IDF matrix for every descriptor in the corpus.
pub fn build(corpus: &Corpus, config: &IndexConfig) -> FeatureMatrix {
    let start = Instant::now();
    let n = corpus.len();

    // Per-document term counts, BTreeMap keeps terms sorted.
    let counts: Vec<BTreeMap<String, u32>> = corpus
        .records()
        .iter()
        .map(|r| {
            let mut tf: BTreeMap<String, u32> = BTreeMap::new();
            for term in tokenize(&r.descriptor, &config.tokenizer) {
                *tf.entry(term).or_insert(0) += 1;
            }
            tf
        })
        .collect();

    let terms: Vec<String> = counts
        .iter()
        .flat_map(|tf| tf.keys().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect();
    let mut df = vec![0u32; terms.len()];
    let vocab_id = |term: &str| terms.binary_search_by(|t| t.as_str().cmp(term)).ok();
    for tf in &counts {
        for term in tf.keys() {
            if let Some(id) = vocab_id(term) {
                df[id] += 1;
            }
        }
    }
    let idf: Vec<f32> = df.iter().map(|&d| config.idf.weight(n, d)).collect();

    let rows: Vec<SparseVector> = counts
        .iter()
        .map(|tf| {
            let mut entries: Vec<(TermId, f32)> = Vec::with_capacity(tf.len());
            for (term, &count) in tf {
                let Some(id) = vocab_id(term) else { continue };
                let tf_w = if config.sublinear_tf { 1.0 + (count as f32).ln() } else { count as f32 };
                entries.push((id as TermId, tf_w * idf[id]));
            }
            let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            if norm > 0.0 {
                for (_, w) in entries.iter_mut() { *w /= norm; }
            }
            entries.retain(|(_, w)| *w != 0.0);
            SparseVector { entries }
        })
        .collect();

    tracing::info!(
        items = n,
        vocabulary = terms.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "feature matrix built"
    );
    FeatureMatrix { vocabulary: Vocabulary { terms, df, idf }, rows }
}
