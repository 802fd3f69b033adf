//! Reference summarization server for the tab harvester.
mod api;
mod archive;
mod server;
mod summary;

pub use api::{AppState, SummarizeResponse, MAX_CONTENT_CHARS, PREVIEW_CHARS};
pub use archive::{Archive, ArchiveRecord};
pub use server::{build_router, start_server};
pub use summary::{digest, leading_sentences, top_terms, Digest};
