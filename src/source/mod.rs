//! Video source handling.
//!
//! Resolves user-supplied references (URLs, bare ids) to stable video ids
//! and lists recent uploads from channels and playlists.

mod youtube;

pub use youtube::YoutubeSource;
