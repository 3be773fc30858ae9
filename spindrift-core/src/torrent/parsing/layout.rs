//! Piece and block layout arithmetic
//!
//! Pieces are the verification unit of a torrent; blocks are the smaller
//! wire-transfer unit inside a piece. Everything here is a pure function of
//! `(total_size, piece_size)`, shared by the parser (per-file piece ranges)
//! and by download scheduling. Zero sizes yield zero results rather than a
//! division fault.

use crate::torrent::PieceIndex;

/// Largest transfer block requested from a peer, in bytes.
///
/// The effective block size of a torrent never exceeds its piece size.
pub const MAX_BLOCK_SIZE: u32 = 16_384; // 16 KiB

/// Number of pieces needed to cover `total_size` bytes.
pub fn piece_count(total_size: u64, piece_size: u32) -> u32 {
    if total_size == 0 || piece_size == 0 {
        return 0;
    }
    total_size.div_ceil(u64::from(piece_size)) as u32
}

/// Byte length of the given piece.
///
/// Every piece is `piece_size` bytes except the final one, which carries
/// whatever remains.
pub fn bytes_in_piece(piece: PieceIndex, total_size: u64, piece_size: u32, piece_count: u32) -> u32 {
    if total_size == 0 || piece_size == 0 || piece_count == 0 {
        return 0;
    }
    if piece.as_u32() == piece_count - 1 {
        (total_size - u64::from(piece_size) * u64::from(piece_count - 1)) as u32
    } else {
        piece_size
    }
}

/// Maps a byte offset within the torrent to the piece containing it.
///
/// `offset == total_size` maps to the final piece, so a zero-length file
/// positioned at the very end of a torrent still gets a valid piece index.
pub fn piece_for_offset(
    offset: u64,
    total_size: u64,
    piece_size: u32,
    piece_count: u32,
) -> PieceIndex {
    if total_size == 0 || piece_size == 0 || piece_count == 0 {
        return PieceIndex::new(0);
    }
    if offset == total_size {
        return PieceIndex::new(piece_count - 1);
    }
    PieceIndex::new((offset / u64::from(piece_size)) as u32)
}

/// Block-level layout of a torrent, derived from its sizes.
///
/// Recomputable at any time from `(total_size, piece_size)`; carries no
/// identity of its own. Degenerate sizes produce an all-zero layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockInfo {
    pub total_size: u64,
    pub piece_size: u32,
    pub n_pieces: u32,
    pub n_blocks: u32,
    pub n_blocks_in_piece: u32,
    pub n_blocks_in_final_piece: u32,
    pub block_size: u32,
    pub final_block_size: u32,
    pub final_piece_size: u32,
}

impl BlockInfo {
    /// Computes the full block layout for the given sizes.
    pub fn new(total_size: u64, piece_size: u32) -> Self {
        if total_size == 0 || piece_size == 0 {
            return Self::default();
        }

        let block_size = piece_size.min(MAX_BLOCK_SIZE);

        let piece_remainder = (total_size % u64::from(piece_size)) as u32;
        let final_piece_size = if piece_remainder == 0 {
            piece_size
        } else {
            piece_remainder
        };

        let block_remainder = (total_size % u64::from(block_size)) as u32;
        let final_block_size = if block_remainder == 0 {
            block_size
        } else {
            block_remainder
        };

        Self {
            total_size,
            piece_size,
            n_pieces: total_size.div_ceil(u64::from(piece_size)) as u32,
            n_blocks: total_size.div_ceil(u64::from(block_size)) as u32,
            n_blocks_in_piece: piece_size.div_ceil(block_size),
            n_blocks_in_final_piece: final_piece_size.div_ceil(block_size),
            block_size,
            final_block_size,
            final_piece_size,
        }
    }

    /// Piece that the given block belongs to.
    pub fn piece_of_block(&self, block: u32) -> PieceIndex {
        if self.n_blocks_in_piece == 0 {
            return PieceIndex::new(0);
        }
        PieceIndex::new(block / self.n_blocks_in_piece)
    }

    /// Byte length of the given piece.
    pub fn bytes_in_piece(&self, piece: PieceIndex) -> u32 {
        if self.n_pieces == 0 {
            0
        } else if piece.as_u32() == self.n_pieces - 1 {
            self.final_piece_size
        } else {
            self.piece_size
        }
    }

    /// Byte length of the given block.
    pub fn bytes_in_block(&self, block: u32) -> u32 {
        if self.n_blocks == 0 {
            0
        } else if block == self.n_blocks - 1 {
            self.final_block_size
        } else {
            self.block_size
        }
    }
}
