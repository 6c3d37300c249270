//! Data models for contentmill.

mod outline;
mod post;
mod topic;

pub use outline::{Outline, OutlineSection};
pub use post::{slugify, word_count, Post, SectionResult, SourceRef};
pub use topic::Topic;
