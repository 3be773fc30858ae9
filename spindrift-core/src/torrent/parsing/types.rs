//! Parsed metainfo data model

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::super::{InfoHash, PieceIndex};
use super::layout::BlockInfo;

/// Byte span within the buffer a torrent was parsed from.
///
/// `Metainfo` owns copies of everything it needs, so these are plain
/// offsets rather than borrowed slices; they are only meaningful against
/// the buffer the caller handed to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

/// A tracker entry derived from an announce URL.
///
/// Tiers group trackers for fallback ordering per BEP-12: every tracker in
/// tier N is tried before any tracker in tier N+1. Within a tier, order is
/// insertion order from the announce-list.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracker {
    pub announce_url: String,
    pub scrape_url: Option<String>,
    pub tier: u32,
}

impl Tracker {
    /// Creates a tracker from its announce URL, deriving the scrape URL.
    pub fn from_announce(tier: u32, announce_url: &str) -> Self {
        Self {
            announce_url: announce_url.to_string(),
            scrape_url: announce_to_scrape(announce_url),
            tier,
        }
    }
}

/// Derives a scrape URL from an announce URL.
///
/// If the text from the last `/` onward begins with `announce`, that
/// segment becomes `scrape` (any suffix such as a query string is kept).
/// UDP trackers scrape over the announce connection, so the announce URL
/// itself is returned. Anything else has no scrape support.
fn announce_to_scrape(announce: &str) -> Option<String> {
    if let Some(pos) = announce.rfind('/') {
        if announce[pos..].starts_with("/announce") {
            let mut scrape = String::with_capacity(announce.len());
            scrape.push_str(&announce[..pos]);
            scrape.push_str("/scrape");
            scrape.push_str(&announce[pos + "/announce".len()..]);
            return Some(scrape);
        }
    }

    if announce.starts_with("udp:") {
        return Some(announce.to_string());
    }

    None
}

/// Whether a URL is usable as a tracker announce endpoint.
pub(super) fn is_valid_tracker_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https" | "udp"),
        Err(_) => false,
    }
}

/// Whether a URL is usable as a webseed source.
pub(super) fn is_valid_webseed_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https" | "ftp" | "sftp"),
        Err(_) => false,
    }
}

/// Individual file within a torrent.
///
/// `path` is the sanitized relative path (multi-file entries live under the
/// torrent's root directory name). Files are laid out back to back in one
/// virtual blob; `offset` is the file's position within it, and
/// `first_piece`/`final_piece` are the inclusive piece range its bytes span.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size: u64,
    pub offset: u64,
    pub first_piece: PieceIndex,
    pub final_piece: PieceIndex,
    /// True if sanitization altered any component of the original path.
    pub is_renamed: bool,
}

/// Complete validated metadata from a torrent file.
///
/// Built once by the parser and immutable afterwards. Invariants upheld by
/// construction: `piece_count == ceil(total_size / piece_size)`,
/// `pieces.len() == piece_count`, `files` is non-empty, `total_size > 0`,
/// and file sizes sum to `total_size`.
#[derive(Debug, Clone, PartialEq)]
pub struct Metainfo {
    pub name: String,
    pub comment: String,
    pub creator: String,
    pub source: String,
    pub info_hash: InfoHash,
    pub trackers: Vec<Tracker>,
    pub webseed_urls: Vec<String>,
    pub pieces: Vec<[u8; 20]>,
    pub files: Vec<FileEntry>,
    pub total_size: u64,
    pub piece_size: u32,
    pub piece_count: u32,
    pub is_private: bool,
    pub time_created: Option<DateTime<Utc>>,
    /// Span of the bencoded info dictionary within the parsed buffer. The
    /// info-hash is the SHA-1 of exactly these bytes.
    pub info_dict_range: ByteRange,
    /// Span of the raw piece-hash bytes within the parsed buffer.
    pub pieces_range: ByteRange,
}

impl Metainfo {
    /// Returns the info-hash as a 40-character lowercase hex string.
    pub fn info_hash_hex(&self) -> String {
        self.info_hash.to_hex()
    }

    /// Computes the block-level layout for this torrent's sizes.
    pub fn block_info(&self) -> BlockInfo {
        BlockInfo::new(self.total_size, self.piece_size)
    }
}

/// Magnet link components.
///
/// The subset of metainfo obtainable from a magnet URI alone: file and
/// piece data stay unknown until the full metainfo is fetched from peers
/// (BEP-9), so only identity, name, trackers and webseeds appear here.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnetLink {
    pub info_hash: InfoHash,
    pub display_name: Option<String>,
    pub trackers: Vec<Tracker>,
    pub webseed_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_derived_from_announce_path() {
        let tracker = Tracker::from_announce(0, "http://example.org/announce");
        assert_eq!(tracker.scrape_url.as_deref(), Some("http://example.org/scrape"));
    }

    #[test]
    fn test_scrape_keeps_query_suffix() {
        let tracker = Tracker::from_announce(0, "http://example.org/announce?id=foo");
        assert_eq!(
            tracker.scrape_url.as_deref(),
            Some("http://example.org/scrape?id=foo")
        );
    }

    #[test]
    fn test_scrape_handles_announce_prefix_segment() {
        let tracker = Tracker::from_announce(0, "http://example.org/announce.php");
        assert_eq!(
            tracker.scrape_url.as_deref(),
            Some("http://example.org/scrape.php")
        );
    }

    #[test]
    fn test_no_scrape_without_announce_segment() {
        let tracker = Tracker::from_announce(0, "http://example.org/foo");
        assert_eq!(tracker.scrape_url, None);

        // Last path segment is not "announce...".
        let tracker = Tracker::from_announce(0, "http://example.org/announce/x");
        assert_eq!(tracker.scrape_url, None);
    }

    #[test]
    fn test_udp_scrape_equals_announce() {
        let tracker = Tracker::from_announce(0, "udp://tracker.example:6969");
        assert_eq!(
            tracker.scrape_url.as_deref(),
            Some("udp://tracker.example:6969")
        );
    }

    #[test]
    fn test_tracker_url_validation() {
        assert!(is_valid_tracker_url("http://example.org/announce"));
        assert!(is_valid_tracker_url("https://example.org/announce"));
        assert!(is_valid_tracker_url("udp://tracker.example:6969/announce"));
        assert!(!is_valid_tracker_url("ftp://example.org/announce"));
        assert!(!is_valid_tracker_url("not a url"));
        assert!(!is_valid_tracker_url(""));
    }

    #[test]
    fn test_webseed_url_validation() {
        assert!(is_valid_webseed_url("http://example.org/data/"));
        assert!(is_valid_webseed_url("ftp://example.org/data/"));
        assert!(!is_valid_webseed_url("udp://example.org/data/"));
        assert!(!is_valid_webseed_url("data"));
    }
}
