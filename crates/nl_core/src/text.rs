//! Text normalisation and token windowing shared by every analysis pipeline.

use crate::types::TextChunk;
use crate::{Error, Result};

/// Keeps letters, digits and whitespace, collapses whitespace runs to a single
/// space and trims both ends.
pub fn clean(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !cleaned.is_empty();
        } else if c.is_alphanumeric() {
            if pending_space {
                cleaned.push(' ');
                pending_space = false;
            }
            cleaned.push(c);
        }
    }

    cleaned
}

/// Model-specific conversion between text and tokens.
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<String>;
    fn decode(&self, tokens: &[String]) -> String;
}

/// One token per whitespace-separated word.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn encode(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn decode(&self, tokens: &[String]) -> String {
        tokens.join(" ")
    }
}

/// Splits `text` into consecutive windows of at most `max_length` tokens.
pub fn chunk<'a>(text: &str, max_length: usize, tokenizer: &'a dyn Tokenizer) -> Result<Chunks<'a>> {
    if max_length == 0 {
        return Err(Error::InvalidInput(
            "chunk size must be a positive number of tokens".to_string(),
        ));
    }

    Ok(Chunks {
        tokens: tokenizer.encode(text),
        max_length,
        position: 0,
        tokenizer,
    })
}

/// Lazy iterator over the windows produced by [`chunk`]. Chunks are decoded
/// on demand; cloning or calling [`Chunks::restart`] replays the sequence.
#[derive(Clone)]
pub struct Chunks<'a> {
    tokens: Vec<String>,
    max_length: usize,
    position: usize,
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> Chunks<'a> {
    pub fn total_tokens(&self) -> usize {
        self.tokens.len()
    }

    pub fn restart(&mut self) {
        self.position = 0;
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = TextChunk;

    fn next(&mut self) -> Option<TextChunk> {
        let start = self.position * self.max_length;
        if start >= self.tokens.len() {
            return None;
        }
        let end = (start + self.max_length).min(self.tokens.len());
        let window = &self.tokens[start..end];
        let chunk = TextChunk {
            index: self.position,
            token_count: window.len(),
            text: self.tokenizer.decode(window),
        };
        self.position += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = self.tokens.len().div_ceil(self.max_length);
        let remaining = total.saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for Chunks<'a> {}

/// Keeps the first `max_tokens` tokens of `text`.
pub fn truncate_tokens(text: &str, max_tokens: usize, tokenizer: &dyn Tokenizer) -> String {
    let tokens = tokenizer.encode(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }
    tokenizer.decode(&tokens[..max_tokens])
}

/// Keeps the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Arithmetic mean rounded to two decimals. An empty slice is an error.
pub fn average(scores: &[f64]) -> Result<f64> {
    if scores.is_empty() {
        return Err(Error::InvalidInput(
            "article has no text to score".to_string(),
        ));
    }
    let total: f64 = scores.iter().sum();
    Ok(round2(total / scores.len() as f64))
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Star rating from labels such as `"4 stars"`.
pub fn star_rating(label: &str) -> Option<u8> {
    label
        .trim()
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .map(|d| d as u8)
        .filter(|d| (1..=5).contains(d))
}
