//! Torrent metainfo parsing
//!
//! `Metainfo::from_bytes` is the entry point: one bencode decode followed by
//! field extraction in a fixed order, so an input with several problems
//! always reports the same failure reason. The info-hash is computed over
//! the literal byte span of the info dictionary within the input, never a
//! re-encoding, so torrents with non-canonical key order keep the hash the
//! rest of the swarm agrees on.

use std::path::{Path, PathBuf};

use chrono::DateTime;
use sha1::{Digest, Sha1};

use super::super::{InfoHash, TorrentError};
use super::bencode::{self, Value};
use super::layout::piece_for_offset;
use super::sanitize::sanitize_component;
use super::types::{
    ByteRange, FileEntry, Metainfo, Tracker, is_valid_tracker_url, is_valid_webseed_url,
};

fn schema_error(reason: &str) -> TorrentError {
    TorrentError::InvalidTorrentFile {
        reason: reason.to_string(),
    }
}

/// Replaces invalid UTF-8 sequences instead of rejecting the field.
fn clean_utf8(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Reads a text field, preferring the `.utf-8` variant key some torrent
/// creators emit alongside the plain one.
fn text_field(dict: &Value, utf8_key: &[u8], key: &[u8]) -> Option<String> {
    dict.get(utf8_key)
        .and_then(Value::as_bytes)
        .or_else(|| dict.get(key).and_then(Value::as_bytes))
        .map(|bytes| clean_utf8(bytes))
}

/// File row before piece spans are known.
struct RawFile {
    path: PathBuf,
    size: u64,
    is_renamed: bool,
}

/// Builds the file table from the info dictionary.
///
/// Single-file torrents carry a `length` directly in `info` and use the
/// sanitized name as their one path. Multi-file torrents carry a `files`
/// list whose entries each hold a component-list path and a length; each
/// component is sanitized and the path joined under the sanitized name.
fn parse_files(info: &Value, name: &str) -> Result<(Vec<RawFile>, u64), TorrentError> {
    let (root, root_adjusted) = sanitize_component(name);
    if root.is_empty() {
        return Err(schema_error("invalid name"));
    }

    let mut files = Vec::new();
    let mut total_size = 0u64;

    if let Some(length) = info.get(b"length").and_then(Value::as_integer) {
        if length < 0 {
            return Err(schema_error("invalid file entry"));
        }
        total_size = length as u64;
        files.push(RawFile {
            path: PathBuf::from(&root),
            size: total_size,
            is_renamed: root_adjusted,
        });
    } else if let Some(entries) = info.get(b"files").and_then(Value::as_list) {
        for entry in entries {
            let components = entry
                .get(b"path.utf-8")
                .and_then(Value::as_list)
                .or_else(|| entry.get(b"path").and_then(Value::as_list))
                .ok_or_else(|| schema_error("invalid file entry"))?;
            let (path, adjusted) = parse_path(&root, components)?;

            let length = entry
                .get(b"length")
                .and_then(Value::as_integer)
                .ok_or_else(|| schema_error("invalid file entry"))?;
            if length < 0 {
                return Err(schema_error("invalid file entry"));
            }

            total_size = total_size
                .checked_add(length as u64)
                .ok_or_else(|| schema_error("invalid file entry"))?;
            files.push(RawFile {
                path,
                size: length as u64,
                is_renamed: root_adjusted || adjusted,
            });
        }
    }

    Ok((files, total_size))
}

/// Sanitizes and joins one file's path components under the root directory.
///
/// A component that sanitizes to nothing (all whitespace, dots, or banned
/// characters) makes the whole entry invalid rather than silently vanishing
/// from the path. The returned flag is set when UTF-8 cleaning or
/// sanitization altered any component.
fn parse_path(root: &str, components: &[Value]) -> Result<(PathBuf, bool), TorrentError> {
    if components.is_empty() {
        return Err(schema_error("invalid file entry"));
    }

    let mut path = PathBuf::from(root);
    let mut adjusted = false;
    for component in components {
        let bytes = component
            .as_bytes()
            .ok_or_else(|| schema_error("invalid file entry"))?;
        let cleaned = clean_utf8(bytes);
        let (clean, component_adjusted) = sanitize_component(&cleaned);
        if clean.is_empty() {
            return Err(schema_error("invalid file entry"));
        }
        // Replacing invalid UTF-8 counts as an adjustment even when the
        // sanitizer leaves the cleaned text alone.
        adjusted = adjusted || component_adjusted || cleaned.as_bytes() != &bytes[..];
        path.push(clean);
    }

    Ok((path, adjusted))
}

/// Collects trackers from `announce-list`, falling back to `announce`.
///
/// Tiers that contribute no usable URL do not advance the tier counter, so
/// the output tiers are always contiguous from zero. The single `announce`
/// URL is consulted only when the announce-list produced nothing.
fn parse_trackers(top: &Value) -> Vec<Tracker> {
    let mut trackers = Vec::new();
    let mut tier = 0u32;

    if let Some(tiers) = top.get(b"announce-list").and_then(Value::as_list) {
        for tier_urls in tiers {
            let Some(urls) = tier_urls.as_list() else {
                continue;
            };

            let mut added_in_tier = false;
            for url in urls {
                let Some(text) = url.as_str() else {
                    continue;
                };
                let text = text.trim();
                if is_valid_tracker_url(text) {
                    trackers.push(Tracker::from_announce(tier, text));
                    added_in_tier = true;
                } else {
                    tracing::debug!("dropping invalid tracker URL: {text:?}");
                }
            }
            if added_in_tier {
                tier += 1;
            }
        }
    }

    if trackers.is_empty() {
        if let Some(text) = top.get(b"announce").and_then(Value::as_str) {
            let text = text.trim();
            if is_valid_tracker_url(text) {
                trackers.push(Tracker::from_announce(tier, text));
            } else {
                tracing::debug!("dropping invalid announce URL: {text:?}");
            }
        }
    }

    trackers
}

/// Collects webseed URLs from `url-list`, which may be a list or a single
/// string.
fn parse_webseeds(top: &Value, file_count: usize) -> Vec<String> {
    let mut webseeds = Vec::new();

    match top.get(b"url-list") {
        Some(Value::List(urls)) => {
            for url in urls {
                if let Some(text) = url.as_str() {
                    add_webseed(&mut webseeds, text, file_count);
                }
            }
        }
        Some(value) => {
            if let Some(text) = value.as_str() {
                add_webseed(&mut webseeds, text, file_count);
            }
        }
        None => {}
    }

    webseeds
}

fn add_webseed(webseeds: &mut Vec<String>, url: &str, file_count: usize) {
    let url = url.trim();
    if !is_valid_webseed_url(url) {
        tracing::debug!("dropping invalid webseed URL: {url:?}");
        return;
    }

    // Multi-file webseeds are base directories; BEP-19 wants them
    // slash-terminated so file paths can be appended directly.
    let mut fixed = url.to_string();
    if file_count > 1 && !fixed.ends_with('/') {
        fixed.push('/');
    }
    webseeds.push(fixed);
}

impl Metainfo {
    /// Parses a complete torrent file from its raw bencoded bytes.
    ///
    /// Required fields are the info dictionary with `name`, `piece length`,
    /// `pieces`, and either `length` or a `files` list. Optional metadata
    /// (comment, creator, creation date, private flag, source, trackers,
    /// webseeds) is taken when present; unusable tracker and webseed URLs
    /// are dropped without failing the parse.
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidBencode` - If the input is not well-formed
    ///   bencode.
    /// - `TorrentError::InvalidTorrentFile` - If a required field is
    ///   missing or malformed, or the piece list disagrees with the file
    ///   sizes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TorrentError> {
        let (top, _) = bencode::decode(data)?;
        if top.as_dict().is_none() {
            return Err(schema_error("invalid bencode"));
        }

        let info = top
            .get(b"info")
            .ok_or_else(|| schema_error("missing info dictionary"))?;
        if info.as_dict().is_none() {
            return Err(schema_error("missing info dictionary"));
        }

        let info_span = bencode::locate_dict_value(data, 0, b"info")?
            .ok_or_else(|| schema_error("missing info dictionary"))?;
        let info_hash = InfoHash::new(Sha1::digest(&data[info_span.clone()]).into());

        let name =
            text_field(info, b"name.utf-8", b"name").ok_or_else(|| schema_error("missing name"))?;

        let comment = text_field(&top, b"comment.utf-8", b"comment").unwrap_or_default();
        let creator = text_field(&top, b"created by.utf-8", b"created by").unwrap_or_default();

        let date_created = top
            .get(b"creation date")
            .and_then(Value::as_integer)
            .unwrap_or(0);
        let time_created = if date_created > 0 {
            DateTime::from_timestamp(date_created, 0)
        } else {
            None
        };

        let is_private = info
            .get(b"private")
            .and_then(Value::as_integer)
            .or_else(|| top.get(b"private").and_then(Value::as_integer))
            .unwrap_or(0)
            != 0;

        let source = info
            .get(b"source")
            .and_then(Value::as_bytes)
            .or_else(|| top.get(b"source").and_then(Value::as_bytes))
            .map(|bytes| clean_utf8(bytes))
            .unwrap_or_default();

        let piece_length = info
            .get(b"piece length")
            .and_then(Value::as_integer)
            .ok_or_else(|| schema_error("invalid piece length"))?;
        if piece_length <= 0 || piece_length > i64::from(u32::MAX) {
            return Err(schema_error("invalid piece length"));
        }
        let piece_size = piece_length as u32;

        let pieces_bytes = info
            .get(b"pieces")
            .and_then(Value::as_bytes)
            .ok_or_else(|| schema_error("invalid pieces field"))?;
        if pieces_bytes.len() % 20 != 0 {
            return Err(schema_error("invalid pieces field"));
        }
        let pieces: Vec<[u8; 20]> = pieces_bytes
            .chunks_exact(20)
            .map(|chunk| {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect();

        let pieces_span = bencode::locate_dict_value(data, info_span.start, b"pieces")?
            .ok_or_else(|| schema_error("invalid pieces field"))?;
        let pieces_start = pieces_span.end - pieces_bytes.len();

        let (raw_files, total_size) = parse_files(info, &name)?;
        if raw_files.is_empty() || total_size == 0 {
            return Err(schema_error("no files found"));
        }

        let expected_pieces = total_size.div_ceil(u64::from(piece_size));
        if pieces.len() as u64 != expected_pieces {
            return Err(schema_error("piece count mismatch"));
        }
        let piece_count = pieces.len() as u32;

        let mut files = Vec::with_capacity(raw_files.len());
        let mut offset = 0u64;
        for raw in raw_files {
            // A zero-length file occupies no bytes; its span is the piece
            // holding its offset, clamped to the last piece at end of
            // torrent.
            let last_byte = offset + if raw.size != 0 { raw.size - 1 } else { 0 };
            files.push(FileEntry {
                first_piece: piece_for_offset(offset, total_size, piece_size, piece_count),
                final_piece: piece_for_offset(last_byte, total_size, piece_size, piece_count),
                path: raw.path,
                size: raw.size,
                offset,
                is_renamed: raw.is_renamed,
            });
            offset += raw.size;
        }

        let trackers = parse_trackers(&top);
        let webseed_urls = parse_webseeds(&top, files.len());

        Ok(Self {
            name,
            comment,
            creator,
            source,
            info_hash,
            trackers,
            webseed_urls,
            pieces,
            files,
            total_size,
            piece_size,
            piece_count,
            is_private,
            time_created,
            info_dict_range: ByteRange {
                offset: info_span.start as u64,
                length: info_span.len() as u64,
            },
            pieces_range: ByteRange {
                offset: pieces_start as u64,
                length: pieces_bytes.len() as u64,
            },
        })
    }

    /// Reads and parses a torrent file from disk.
    ///
    /// # Errors
    ///
    /// - `TorrentError::Io` - If the file cannot be read.
    /// - Any error `from_bytes` reports for the file's contents.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TorrentError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }
}
