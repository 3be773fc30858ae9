//! Spindrift Core - Torrent metainfo parsing and piece addressing
//!
//! This crate provides the metadata layer of a BitTorrent client: bencode
//! decoding and encoding, `.torrent` file parsing with filesystem-safe path
//! handling, magnet URI parsing and generation, and the piece/block
//! arithmetic that maps torrent sizes onto transfer units. It performs no
//! network or disk I/O of its own beyond reading a torrent file on request.

pub mod torrent;

// Re-export main types for convenient access
pub use torrent::{
    BlockInfo, ByteRange, FileEntry, InfoHash, MAX_BLOCK_SIZE, MagnetLink, Metainfo, PieceIndex,
    TorrentError, Tracker,
};
