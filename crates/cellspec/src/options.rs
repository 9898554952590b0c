//! Knobs for a single decode call.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options accepted by [crate::Schema::decode_with_options] and
/// [crate::Schema::try_decode_with_options]. The default decodes without limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DecodeOptions {
    /// Maximum nesting of named-type decodes. `None` means unbounded; cyclic
    /// generic schemas can then recurse until the stack runs out.
    pub max_depth: Option<usize>,
}

impl DecodeOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
}
