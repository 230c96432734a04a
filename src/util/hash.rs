//! Hashing utilities for solver-input memos and cache directory names.

use sha2::{Digest, Sha256};

/// Compute the hex SHA-256 of a string.
pub fn sha256_str(s: &str) -> String {
    hex::encode(Sha256::digest(s.as_bytes()))
}

/// Incremental hasher for solver inputs.
///
/// Components are NUL-separated and sections are tagged, so `["ab", "c"]`
/// and `["a", "bc"]` never collide, nor do the same strings placed in
/// different sections.
#[derive(Default)]
pub struct InputsHasher {
    hasher: Sha256,
}

impl InputsHasher {
    pub fn new() -> Self {
        InputsHasher {
            hasher: Sha256::new(),
        }
    }

    /// Start a named section.
    pub fn section(&mut self, name: &str) -> &mut Self {
        self.hasher.update(b"-");
        self.hasher.update(name.as_bytes());
        self.hasher.update(b"-\0");
        self
    }

    /// Add a string component.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    /// Add a set of strings; order of the input does not matter.
    pub fn update_sorted<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) -> &mut Self {
        let mut items: Vec<&str> = items.into_iter().collect();
        items.sort_unstable();
        items.dedup();
        for item in items {
            self.update_str(item);
        }
        self
    }

    /// Finalize into a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}
