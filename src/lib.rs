//! contentmill - batch blog-content generation driven by a local LLM.
//!
//! Topics go in (spreadsheet, CSV, JSON, or in-memory rows), one structured
//! post per topic comes out, exported in the requested format, with
//! progress streamed incrementally and cooperative out-of-band cancellation.

pub mod cli;
pub mod config;
pub mod export;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod server;
