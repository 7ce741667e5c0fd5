//! File-backed persistence for the AutoStream agent.
//!
//! Two concerns live here, both behind narrow interfaces:
//! - `KnowledgeStore` - loads the static knowledge document once at startup
//!   and shares it read-only across sessions.
//! - `LeadSink` - durable append of captured leads. The file implementation
//!   writes an append-only JSONL log; a corrupt log is recoverable (reads
//!   fall back to an empty list) while captures keep appending.

pub mod knowledge;
pub mod leads;

pub use knowledge::KnowledgeStore;
pub use leads::{FileLeadSink, LeadReceipt, LeadSink, MemoryLeadSink};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read knowledge document `{path}`: {source}")]
    KnowledgeRead { path: PathBuf, source: std::io::Error },
    #[error("could not parse knowledge document `{path}`: {source}")]
    KnowledgeParse { path: PathBuf, source: serde_json::Error },
    #[error("could not append to lead log `{path}`: {source}")]
    LeadAppend { path: PathBuf, source: std::io::Error },
    #[error("could not encode lead record: {0}")]
    LeadEncode(#[from] serde_json::Error),
}
