//! Torrent file and magnet link parsing
//!
//! Bencode decoding, metainfo extraction, magnet URI handling, path
//! sanitation, and the piece/block arithmetic that maps torrent sizes onto
//! transfer units. Everything here is synchronous and side-effect free:
//! callers hand in bytes and get back owned values or an error.

pub mod bencode;
pub mod layout;
pub mod magnet;
pub mod parser;
pub mod sanitize;
pub mod types;

// Re-export public API
pub use layout::{BlockInfo, MAX_BLOCK_SIZE, bytes_in_piece, piece_count, piece_for_offset};
pub use sanitize::sanitize_component;
pub use types::{ByteRange, FileEntry, MagnetLink, Metainfo, Tracker};
