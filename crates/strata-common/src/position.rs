//! Source ranges.
//!
//! The engine never reads source text itself; ranges are handed over by the
//! parser collaborator and only carried through for diagnostics.

use serde::{Deserialize, Serialize};

/// Half-open character range `[pos, end)` into the original source.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub pos: u32,
    pub end: u32,
}

impl TextRange {
    /// Range used for synthesized nodes (factory-created or produced by lowering).
    pub const SYNTHESIZED: TextRange = TextRange { pos: 0, end: 0 };

    pub const fn new(pos: u32, end: u32) -> Self {
        TextRange { pos, end }
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.pos)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_synthesized(&self) -> bool {
        self.pos == 0 && self.end == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_range_is_empty() {
        assert!(TextRange::SYNTHESIZED.is_synthesized());
        assert!(TextRange::SYNTHESIZED.is_empty());
        assert_eq!(TextRange::new(4, 10).len(), 6);
        assert_eq!(TextRange::new(10, 4).len(), 0);
    }
}
