//! Magnet URI encoding and decoding
//!
//! Implements the `magnet:?xt=urn:btih:...` form from BEP-9. Parsing
//! accepts both 40-character hex and 32-character base32 info-hashes;
//! generated URIs always use lowercase hex.

use super::super::{InfoHash, TorrentError};
use super::types::{MagnetLink, Metainfo, Tracker, is_valid_tracker_url, is_valid_webseed_url};

const BTIH_PREFIX: &str = "urn:btih:";

fn magnet_error(reason: &str) -> TorrentError {
    TorrentError::InvalidMagnetLink {
        reason: reason.to_string(),
    }
}

/// Decodes a `urn:btih:` value in either hex or base32 form.
fn parse_btih(value: &str) -> Option<InfoHash> {
    let encoded = value.strip_prefix(BTIH_PREFIX)?;
    if encoded.len() == 40 {
        return InfoHash::from_hex(encoded);
    }
    if encoded.len() == 32 {
        return decode_base32(encoded).map(InfoHash::new);
    }
    None
}

/// Decodes 32 base32 characters (RFC 4648 alphabet, no padding) into the
/// 20-byte hash they represent. Case-insensitive.
fn decode_base32(text: &str) -> Option<[u8; 20]> {
    let mut hash = [0u8; 20];
    let mut acc = 0u64;
    let mut acc_bits = 0u32;
    let mut written = 0usize;

    for ch in text.bytes() {
        let bits = match ch {
            b'A'..=b'Z' => ch - b'A',
            b'a'..=b'z' => ch - b'a',
            b'2'..=b'7' => ch - b'2' + 26,
            _ => return None,
        };
        acc = (acc << 5) | u64::from(bits);
        acc_bits += 5;
        if acc_bits >= 8 {
            acc_bits -= 8;
            if written == hash.len() {
                return None;
            }
            hash[written] = (acc >> acc_bits) as u8;
            written += 1;
        }
    }

    (written == hash.len()).then_some(hash)
}

fn build_magnet_uri<'a>(
    info_hash: &InfoHash,
    name: Option<&str>,
    announce_urls: impl Iterator<Item = &'a str>,
    webseed_urls: impl Iterator<Item = &'a str>,
) -> String {
    let mut uri = format!("magnet:?xt=urn:btih:{}", info_hash.to_hex());

    if let Some(name) = name {
        uri.push_str("&dn=");
        uri.push_str(&urlencoding::encode(name));
    }
    for url in announce_urls {
        uri.push_str("&tr=");
        uri.push_str(&urlencoding::encode(url));
    }
    for url in webseed_urls {
        uri.push_str("&ws=");
        uri.push_str(&urlencoding::encode(url));
    }

    uri
}

impl MagnetLink {
    /// Parses a `magnet:?...` URI.
    ///
    /// The `xt` info-hash is the only required parameter; the first usable
    /// one wins if several appear. Each valid `tr` tracker is placed in its
    /// own tier in appearance order. Invalid tracker and webseed URLs are
    /// dropped without failing the parse, matching how optional torrent
    /// metadata is treated elsewhere.
    ///
    /// # Errors
    ///
    /// - `TorrentError::InvalidMagnetLink` - If the scheme is not
    ///   `magnet:?` or no usable `xt` info-hash is present.
    pub fn parse(uri: &str) -> Result<Self, TorrentError> {
        let query = uri
            .strip_prefix("magnet:?")
            .ok_or_else(|| magnet_error("not a magnet URI"))?;

        let mut info_hash = None;
        let mut display_name = None;
        let mut trackers: Vec<Tracker> = Vec::new();
        let mut webseed_urls = Vec::new();

        for param in query.split('&') {
            let Some((key, raw_value)) = param.split_once('=') else {
                continue;
            };
            let Ok(value) = urlencoding::decode(raw_value) else {
                tracing::debug!("dropping undecodable magnet parameter: {key:?}");
                continue;
            };

            match key {
                "xt" => {
                    if info_hash.is_none() {
                        info_hash = parse_btih(&value);
                    }
                }
                "dn" => display_name = Some(value.into_owned()),
                "tr" => {
                    let url = value.trim();
                    if is_valid_tracker_url(url) {
                        let tier = trackers.len() as u32;
                        trackers.push(Tracker::from_announce(tier, url));
                    } else {
                        tracing::debug!("dropping invalid magnet tracker URL: {url:?}");
                    }
                }
                "ws" => {
                    let url = value.trim();
                    if is_valid_webseed_url(url) {
                        webseed_urls.push(url.to_string());
                    } else {
                        tracing::debug!("dropping invalid magnet webseed URL: {url:?}");
                    }
                }
                _ => {}
            }
        }

        let info_hash =
            info_hash.ok_or_else(|| magnet_error("missing or invalid xt parameter"))?;

        Ok(Self {
            info_hash,
            display_name,
            trackers,
            webseed_urls,
        })
    }

    /// Renders this link back into a magnet URI.
    pub fn to_uri(&self) -> String {
        build_magnet_uri(
            &self.info_hash,
            self.display_name.as_deref(),
            self.trackers.iter().map(|t| t.announce_url.as_str()),
            self.webseed_urls.iter().map(String::as_str),
        )
    }
}

impl Metainfo {
    /// Builds the magnet URI equivalent of this metainfo.
    ///
    /// Carries the info-hash, name, trackers in tier order, and webseeds.
    /// File and piece data have no magnet representation; a client joining
    /// from this URI fetches them from peers.
    pub fn magnet_uri(&self) -> String {
        let name = if self.name.is_empty() {
            None
        } else {
            Some(self.name.as_str())
        };
        build_magnet_uri(
            &self.info_hash,
            name,
            self.trackers.iter().map(|t| t.announce_url.as_str()),
            self.webseed_urls.iter().map(String::as_str),
        )
    }
}
