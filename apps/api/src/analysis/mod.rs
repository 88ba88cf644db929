// Keyword extraction, job description analysis, scoring, suggestions and AI rewrites.
// Everything here except `rewrite` is pure and synchronous.

pub mod handlers;
pub mod job_description;
pub mod keywords;
pub mod rewrite;
pub mod scoring;
pub mod suggestions;
pub mod tables;
pub mod text;
