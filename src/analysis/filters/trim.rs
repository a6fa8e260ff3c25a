use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Strips surrounding whitespace and drops tokens left empty.
pub struct TrimFilter;

impl TokenFilter for TrimFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .filter_map(|mut token| {
                let trimmed = token.text.trim();
                if trimmed.is_empty() {
                    return None;
                }
                if trimmed.len() != token.text.len() {
                    token.text = trimmed.to_string();
                    token.length = token.text.len();
                }
                Some(token)
            })
            .collect()
    }

    fn name(&self) -> &str {
        "trim"
    }

    fn clone_box(&self) -> Box<dyn TokenFilter> {
        Box::new(TrimFilter)
    }
}
