//! Sync cursor: the highest block currently reflected in the projections.
//!
//! There is no separate cursor row: the cursor is read back from the Block
//! projection, so it can never disagree with what was actually indexed.

use serde::{Deserialize, Serialize};

/// The indexer's current position in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub height: u64,
    pub hash: String,
}

impl Cursor {
    pub fn new(height: u64, hash: impl Into<String>) -> Self {
        Self {
            height,
            hash: hash.into(),
        }
    }

    /// The next height to ask the node for.
    pub fn next_height(&self) -> u64 {
        self.height + 1
    }

    /// Returns `true` once the projections cover `height`.
    pub fn has_reached(&self, height: u64) -> bool {
        self.height >= height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_next_height() {
        let cursor = Cursor::new(500, "aa");
        assert_eq!(cursor.next_height(), 501);
    }

    #[test]
    fn cursor_has_reached() {
        let cursor = Cursor::new(100, "aa");
        assert!(cursor.has_reached(99));
        assert!(cursor.has_reached(100));
        assert!(!cursor.has_reached(101));
    }
}
