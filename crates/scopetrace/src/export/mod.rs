//! Trace export: document shape, encoding and storage.
//!
//! The tracer hands its buffered events to this module after swapping them
//! out under the lock. Building the document, encoding and writing all happen
//! without the lock held.

pub mod codec;
pub mod document;
pub mod storage;

pub use codec::{JsonCodec, TraceCodec};
pub use document::{TraceDocument, DISPLAY_TIME_UNIT};
pub use storage::{FsStorage, MemoryStorage, TraceStorage};
