//! Trace document encoding.

use crate::error::Result;
use crate::export::document::TraceDocument;

/// Converts a [`TraceDocument`] to bytes and back.
pub trait TraceCodec {
    /// Encode a document.
    fn encode(&self, document: &TraceDocument) -> Result<Vec<u8>>;

    /// Decode a document.
    fn decode(&self, bytes: &[u8]) -> Result<TraceDocument>;
}

/// JSON codec producing Chrome Trace Event Format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Compact single-line output.
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented output.
    #[must_use]
    pub const fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl TraceCodec for JsonCodec {
    fn encode(&self, document: &TraceDocument) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(document)?
        } else {
            serde_json::to_vec(document)?
        };
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<TraceDocument> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
