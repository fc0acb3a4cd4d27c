//! Parsing of editor-recorded workspace URIs.

pub mod authority;
pub mod uri;

pub use authority::{Classification, classify};
pub use uri::ParsedUri;
