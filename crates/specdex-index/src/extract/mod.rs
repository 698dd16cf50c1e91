//! Structure-aware extraction of typed chunks from specs and markdown.

pub mod markdown;
pub mod spec;

pub use markdown::{MarkdownConfig, MarkdownExtractor};
pub use spec::{SpecExtractor, strip_vendor_extensions};

use crate::chunk::DocumentChunk;

/// Chunks produced from one source plus the number of malformed nodes that
/// were skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub chunks: Vec<DocumentChunk>,
    pub skipped: usize,
}
