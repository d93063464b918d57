//! Term-frequency sparse vectors for hybrid search.
//!
//! The store applies the IDF modifier at indexing time, which turns these
//! raw term frequencies into BM25-like scores when hybrid search is
//! enabled.

use crate::point::{fnv1a_32, to_point_id};
use std::collections::BTreeMap;

const MIN_TOKEN_LEN: usize = 2;

/// A sparse vector in index/value pair form, sorted by index.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Lowercase `text` and emit runs of `[a-z0-9]` of length >= 2.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            current.push(ch);
        } else if !current.is_empty() {
            if current.len() >= MIN_TOKEN_LEN {
                tokens.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= MIN_TOKEN_LEN {
        tokens.push(current);
    }
    tokens
}

/// Hash tokens to indices and count term frequencies.
///
/// A token's index is its FNV-1a hash mapped into `[0, 2^31)`, the same
/// mapping point ids use; pairs come out sorted by index for
/// reproducibility.
pub fn sparse_vector(text: &str) -> SparseVector {
    let mut frequencies: BTreeMap<u32, u32> = BTreeMap::new();
    for token in tokenize(text) {
        let index = to_point_id(fnv1a_32(&token)) as u32;
        *frequencies.entry(index).or_default() += 1;
    }

    let mut indices = Vec::with_capacity(frequencies.len());
    let mut values = Vec::with_capacity(frequencies.len());
    for (index, count) in frequencies {
        indices.push(index);
        values.push(count as f32);
    }
    SparseVector { indices, values }
}
