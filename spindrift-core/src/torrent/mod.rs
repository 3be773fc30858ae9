//! Torrent metainfo parsing and piece addressing

pub mod parsing;
#[cfg(test)]
pub mod test_data;

use std::fmt;

pub use parsing::{
    BlockInfo, ByteRange, FileEntry, MAX_BLOCK_SIZE, MagnetLink, Metainfo, Tracker,
    bytes_in_piece, piece_count, piece_for_offset, sanitize_component,
};

/// SHA-1 hash identifying a unique torrent.
///
/// 20-byte SHA-1 hash of the info dictionary from a torrent file.
/// Used to uniquely identify torrents across the BitTorrent network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoHash([u8; 20]);

impl InfoHash {
    /// Creates InfoHash from 20-byte SHA-1 hash.
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Parses InfoHash from a 40-character hex string.
    ///
    /// Accepts both lowercase and uppercase digits. Returns `None` for any
    /// other length or for non-hex characters.
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        if hex_str.len() != 40 {
            return None;
        }
        let bytes = hex::decode(hex_str).ok()?;
        let hash: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(hash))
    }

    /// Returns reference to underlying 20-byte hash.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns the hash as a 40-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for InfoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Zero-based index of a piece within a torrent.
///
/// Torrent files are divided into pieces for downloading and verification.
/// Each piece has a sequential index starting from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PieceIndex(pub u32);

impl PieceIndex {
    /// Creates PieceIndex from zero-based index.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the underlying piece index as u32.
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PieceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur while parsing torrent metainfo.
///
/// Covers all failure modes of the parsing pipeline: malformed bencode,
/// schema violations in well-formed metainfo, and unusable magnet links.
/// Every variant is recoverable; no partial result escapes on failure.
#[derive(Debug, thiserror::Error)]
pub enum TorrentError {
    /// Input violates the bencode grammar. `offset` is the byte position
    /// where decoding failed.
    #[error("Invalid bencode at byte {offset}: {reason}")]
    InvalidBencode { reason: String, offset: usize },

    /// Well-formed bencode that is not a valid torrent. `reason` is a short
    /// machine-stable string such as "missing info dictionary" or
    /// "piece count mismatch".
    #[error("Failed to parse torrent file: {reason}")]
    InvalidTorrentFile { reason: String },

    /// Magnet link with a missing or malformed `xt` parameter.
    #[error("Invalid magnet link: {reason}")]
    InvalidMagnetLink { reason: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}
