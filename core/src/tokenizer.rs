use crate::config::{TokenPattern, TokenizerConfig};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"(?u)\b\w+\b").expect("valid regex");
    static ref LETTER_RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Split a descriptor into index terms: NFKC normalization, lowercase, token
/// pattern, minimum length, stopword removal, optional stemming. Order of appearance
/// is preserved and repeated terms are kept so callers can count them.
pub fn tokenize(text: &str, config: &TokenizerConfig) -> Vec<String> {
    let normalized = text.nfkc().collect::<String>().to_lowercase();
    let re: &Regex = match config.pattern {
        TokenPattern::Word => &*WORD_RE,
        TokenPattern::Letter => &*LETTER_RE,
    };
    let mut tokens = Vec::new();
    for mat in re.find_iter(&normalized) {
        let token = mat.as_str();
        if token.chars().count() < config.min_token_len { continue; }
        if is_stopword(token) { continue; }
        if config.stem {
            tokens.push(STEMMER.stem(token).into_owned());
        } else {
            tokens.push(token.to_string());
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let cfg = TokenizerConfig { stem: true, ..TokenizerConfig::default() };
        let t = tokenize("Running, runner's run!", &cfg);
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn word_pattern_keeps_numbers_and_splits_apostrophes() {
        let t = tokenize("2001 odyssey 007 x_men runner's", &TokenizerConfig::default());
        assert_eq!(t, vec!["2001", "odyssey", "007", "x_men", "runner"]);
    }

    #[test]
    fn letter_pattern_needs_a_leading_letter() {
        let cfg = TokenizerConfig { pattern: TokenPattern::Letter, ..TokenizerConfig::default() };
        let t = tokenize("2001 odyssey 007 x_men runner's", &cfg);
        assert_eq!(t, vec!["odyssey", "x_men", "runner's"]);
    }

    #[test]
    fn short_tokens_are_dropped() {
        let t = tokenize("x men 2 k9 unit", &TokenizerConfig::default());
        assert_eq!(t, vec!["men", "k9", "unit"]);
    }
}
