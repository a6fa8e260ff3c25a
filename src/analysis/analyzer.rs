use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::trim::TrimFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{KeywordTokenizer, StandardTokenizer, Tokenizer};

/// Text analysis pipeline.
///
/// The same analyzer instance is shared by ingestion and the query parser:
/// whatever it produces for a field value at index time is exactly what a
/// literal or search term has to produce to hit that posting.
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let tokens = self.tokenizer.tokenize(text);
        self.apply_filters(tokens)
    }

    /// Index terms for a field value. Values without any word characters
    /// ("#", "-") fall back to their normalized form so they stay indexable.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let terms: Vec<String> = self.analyze(text).into_iter().map(|t| t.text).collect();
        if !terms.is_empty() {
            return terms;
        }
        match self.normalize(text) {
            Some(normalized) => vec![normalized],
            None => Vec::new(),
        }
    }

    /// Normalize a whole value without splitting it: the exact-match form
    /// used by literals, buckets and ranges.
    pub fn normalize(&self, value: &str) -> Option<String> {
        let token = Token::new(value.to_string(), 0, 0);
        self.apply_filters(vec![token]).into_iter().next().map(|t| t.text)
    }

    fn apply_filters(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }
        tokens
    }

    /// Unicode words, lower-cased and trimmed.
    pub fn standard() -> Self {
        Analyzer::new("standard".to_string(),
                      Box::new(StandardTokenizer::default()))
            .add_filter(Box::new(TrimFilter))
            .add_filter(Box::new(LowercaseFilter))
    }

    /// Whole values, lower-cased and trimmed.
    pub fn keyword() -> Self {
        Analyzer::new("keyword".to_string(), Box::new(KeywordTokenizer))
            .add_filter(Box::new(TrimFilter))
            .add_filter(Box::new(LowercaseFilter))
    }
}

impl Clone for Analyzer {
    fn clone(&self) -> Self {
        Analyzer {
            tokenizer: self.tokenizer.clone_box(),
            filters: self.filters.iter().map(|f| f.clone_box()).collect(),
            name: self.name.clone(),
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::standard()
    }
}
