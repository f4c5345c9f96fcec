//! Encoder and decoder options
//!
//! Both option bags implement `serde::Deserialize` with `#[serde(default)]`,
//! so a partial configuration document only overrides what it names.
//!
//! # Usage Example
//!
//! ```rust
//! use ber_codec::options::DecoderOptions;
//!
//! let options = DecoderOptions::new()
//!     .with_skip_unknown_elements(false)
//!     .with_max_depth(8);
//! assert_eq!(options.max_depth, 8);
//! ```

use serde::{Deserialize, Serialize};

/// Default limit on nested composites while decoding
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default limit on elements of one array and bytes of one string (1 GiB)
pub const DEFAULT_MAX_SEQUENCE_SIZE: usize = 1 << 30;

/// Options for [`crate::codec::BerEncoder`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Write absent nullable values as NULL instead of omitting them
    pub explicit_nulls: bool,
    /// Omit `DEFAULT_VALUE` members that hold their default
    pub elide_default_values: bool,
    /// Write empty array members; when false they are omitted
    pub encode_empty_arrays: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            explicit_nulls: false,
            elide_default_values: false,
            encode_empty_arrays: true,
        }
    }
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explicit_nulls(mut self, explicit_nulls: bool) -> Self {
        self.explicit_nulls = explicit_nulls;
        self
    }

    pub fn with_elide_default_values(mut self, elide_default_values: bool) -> Self {
        self.elide_default_values = elide_default_values;
        self
    }

    pub fn with_encode_empty_arrays(mut self, encode_empty_arrays: bool) -> Self {
        self.encode_empty_arrays = encode_empty_arrays;
        self
    }
}

/// Options for [`crate::codec::BerDecoder`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Skip elements that match no member instead of failing
    pub skip_unknown_elements: bool,
    /// Maximum number of nested composites
    pub max_depth: usize,
    /// Maximum elements in one array and bytes in one string
    pub max_sequence_size: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            skip_unknown_elements: true,
            max_depth: DEFAULT_MAX_DEPTH,
            max_sequence_size: DEFAULT_MAX_SEQUENCE_SIZE,
        }
    }
}

impl DecoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient (`true`) or strict (`false`) handling of unknown elements
    pub fn with_skip_unknown_elements(mut self, skip: bool) -> Self {
        self.skip_unknown_elements = skip;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_sequence_size(mut self, max_sequence_size: usize) -> Self {
        self.max_sequence_size = max_sequence_size;
        self
    }
}
