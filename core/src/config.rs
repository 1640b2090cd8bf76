use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_KEY_COLUMN: &str = "title";
pub const DEFAULT_DESCRIPTOR_COLUMN: &str = "soup";

/// Inverse document frequency variant. `n` is the corpus size, `df` the
/// number of documents containing the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdfScheme {
    /// ln((1 + n) / (1 + df)) + 1
    #[default]
    Smooth,
    /// ln(n / df)
    Plain,
    /// ln(n / df) + 1
    Unsmoothed,
}

impl IdfScheme {
    pub fn weight(self, n: usize, df: u32) -> f32 {
        let n = n as f32;
        let df = df.max(1) as f32;
        match self {
            IdfScheme::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
            IdfScheme::Plain => (n / df).ln(),
            IdfScheme::Unsmoothed => (n / df).ln() + 1.0,
        }
    }
}

impl std::str::FromStr for IdfScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smooth" => Ok(IdfScheme::Smooth),
            "plain" => Ok(IdfScheme::Plain),
            "unsmoothed" => Ok(IdfScheme::Unsmoothed),
            other => Err(format!("unknown idf scheme `{other}` (expected smooth, plain or unsmoothed)")),
        }
    }
}

/// Which character runs count as a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPattern {
    /// `\b\w+\b`: runs of letters, digits and underscore. Apostrophes split.
    #[default]
    Word,
    /// `\p{L}[\p{L}\p{N}_']*`: must start with a letter, apostrophes stay inside.
    Letter,
}

impl std::str::FromStr for TokenPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "word" => Ok(TokenPattern::Word),
            "letter" => Ok(TokenPattern::Letter),
            other => Err(format!("unknown token pattern `{other}` (expected word or letter)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub pattern: TokenPattern,
    /// Tokens with fewer characters are discarded.
    pub min_token_len: usize,
    /// Apply English Snowball stemming after stopword removal.
    pub stem: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { pattern: TokenPattern::Word, min_token_len: 2, stem: false }
    }
}

/// Everything that influences the derived matrices. Two builds with equal
/// configs over the same corpus produce identical artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    pub tokenizer: TokenizerConfig,
    pub idf: IdfScheme,
    /// Use 1 + ln(count) instead of the raw count as term frequency.
    pub sublinear_tf: bool,
}

/// Column names used when reading a tabular source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceColumns {
    pub key: String,
    pub descriptor: String,
}

impl Default for SourceColumns {
    fn default() -> Self {
        Self { key: DEFAULT_KEY_COLUMN.to_string(), descriptor: DEFAULT_DESCRIPTOR_COLUMN.to_string() }
    }
}
