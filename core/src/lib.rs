//! Content-based item similarity: TF-IDF features over item descriptors,
//! a dense cosine similarity matrix, and top-N retrieval by item key.

pub mod config;
pub mod corpus;
pub mod display;
pub mod error;
pub mod features;
pub mod index;
pub mod persist;
pub mod recommend;
pub mod similarity;
pub mod tokenizer;

pub use config::{IdfScheme, IndexConfig, SourceColumns, TokenPattern, TokenizerConfig, DEFAULT_TOP_N};
pub use corpus::{Corpus, ItemRecord, RawRecord};
pub use error::{DataLoadError, MalformedRecordError};
pub use features::{FeatureMatrix, SparseVector, TermId, Vocabulary};
pub use index::{IndexHandle, ReadyIndex};
pub use recommend::{Recommendation, Recommender};
pub use similarity::SimilarityMatrix;
