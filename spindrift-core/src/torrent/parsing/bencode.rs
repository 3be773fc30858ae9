//! Bencode decoding and encoding
//!
//! Bencode has four data types: integers, byte strings, lists, and
//! dictionaries. `Value` models all four; `decode` and `encode` convert
//! between `Value` trees and raw bytes. Dictionaries keep their original key
//! order so that re-encoding a decoded value reproduces the input bytes.

use std::ops::Range;

use bytes::Bytes;

use crate::torrent::TorrentError;

// Nesting cap for untrusted input. Real torrents stay in single digits.
const MAX_DEPTH: usize = 64;

/// A bencode value.
///
/// Dictionaries are stored as key/value pairs in original insertion order
/// rather than sorted, so a decode/encode round trip is byte-exact even for
/// torrents with non-canonical key order. Keys are unique; the decoder
/// rejects duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string (may or may not be valid UTF-8).
    Bytes(Bytes),
    /// An ordered list of values.
    List(Vec<Value>),
    /// A dictionary with byte string keys, in insertion order.
    Dict(Vec<(Bytes, Value)>),
}

impl Value {
    /// Creates a byte string value from a UTF-8 string.
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Returns the value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a byte string, if it is one.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as a UTF-8 string, if it is a valid UTF-8 byte string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Returns the value as a list slice, if it is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the value as a slice of key/value pairs, if it is a dictionary.
    pub fn as_dict(&self) -> Option<&[(Bytes, Value)]> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a key in this value if it is a dictionary.
    ///
    /// Returns `None` if the value is not a dictionary or the key is absent.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<Vec<(Bytes, Value)>> for Value {
    fn from(d: Vec<(Bytes, Value)>) -> Self {
        Value::Dict(d)
    }
}

fn decode_error(reason: impl Into<String>, offset: usize) -> TorrentError {
    TorrentError::InvalidBencode {
        reason: reason.into(),
        offset,
    }
}

/// Decodes one bencode value from the front of `data`.
///
/// Returns the value together with the number of bytes it occupied. Trailing
/// bytes after a complete value are not an error here; callers that need the
/// whole buffer consumed compare the count against `data.len()`.
///
/// # Errors
///
/// - `TorrentError::InvalidBencode` - If the input violates the bencode
///   grammar (truncated input, malformed lengths, integers with leading
///   zeros, non-string or duplicate dictionary keys). Carries the byte
///   offset of the failure.
pub fn decode(data: &[u8]) -> Result<(Value, usize), TorrentError> {
    let mut pos = 0;
    let value = decode_value(data, &mut pos, 0)?;
    Ok((value, pos))
}

fn decode_value(data: &[u8], pos: &mut usize, depth: usize) -> Result<Value, TorrentError> {
    if depth > MAX_DEPTH {
        return Err(decode_error("nesting too deep", *pos));
    }

    if *pos >= data.len() {
        return Err(decode_error("unexpected end of input", *pos));
    }

    match data[*pos] {
        b'i' => decode_integer(data, pos),
        b'l' => decode_list(data, pos, depth),
        b'd' => decode_dict(data, pos, depth),
        b'0'..=b'9' => decode_bytes(data, pos),
        c => Err(decode_error(
            format!("unexpected character {:?}", c as char),
            *pos,
        )),
    }
}

fn decode_integer(data: &[u8], pos: &mut usize) -> Result<Value, TorrentError> {
    let int_start = *pos;
    *pos += 1;

    let digits_start = *pos;
    while *pos < data.len() && data[*pos] != b'e' {
        *pos += 1;
    }

    if *pos >= data.len() {
        return Err(decode_error("unterminated integer", int_start));
    }

    let int_str = std::str::from_utf8(&data[digits_start..*pos])
        .map_err(|_| decode_error("invalid integer", int_start))?;

    if int_str.is_empty() || int_str == "-" {
        return Err(decode_error("empty integer", int_start));
    }

    if int_str.starts_with("-0") || (int_str.starts_with('0') && int_str.len() > 1) {
        return Err(decode_error("integer has leading zeros", int_start));
    }

    let value: i64 = int_str
        .parse()
        .map_err(|_| decode_error(format!("invalid integer {int_str:?}"), int_start))?;

    *pos += 1;
    Ok(Value::Integer(value))
}

fn decode_bytes(data: &[u8], pos: &mut usize) -> Result<Value, TorrentError> {
    let len_start = *pos;
    while *pos < data.len() && data[*pos].is_ascii_digit() {
        *pos += 1;
    }

    if *pos >= data.len() || data[*pos] != b':' {
        return Err(decode_error("malformed string length", len_start));
    }

    let len_str = std::str::from_utf8(&data[len_start..*pos])
        .map_err(|_| decode_error("malformed string length", len_start))?;
    let len: usize = len_str
        .parse()
        .map_err(|_| decode_error("malformed string length", len_start))?;

    *pos += 1;

    if len > data.len() - *pos {
        return Err(decode_error("string length exceeds input", len_start));
    }

    let bytes = Bytes::copy_from_slice(&data[*pos..*pos + len]);
    *pos += len;

    Ok(Value::Bytes(bytes))
}

fn decode_list(data: &[u8], pos: &mut usize, depth: usize) -> Result<Value, TorrentError> {
    let list_start = *pos;
    *pos += 1;
    let mut list = Vec::new();

    while *pos < data.len() && data[*pos] != b'e' {
        list.push(decode_value(data, pos, depth + 1)?);
    }

    if *pos >= data.len() {
        return Err(decode_error("unterminated list", list_start));
    }

    *pos += 1;
    Ok(Value::List(list))
}

fn decode_dict(data: &[u8], pos: &mut usize, depth: usize) -> Result<Value, TorrentError> {
    let dict_start = *pos;
    *pos += 1;
    let mut dict: Vec<(Bytes, Value)> = Vec::new();

    while *pos < data.len() && data[*pos] != b'e' {
        let key_start = *pos;
        let key = match decode_value(data, pos, depth + 1)? {
            Value::Bytes(b) => b,
            _ => {
                return Err(decode_error(
                    "dictionary key must be a byte string",
                    key_start,
                ));
            }
        };

        if dict.iter().any(|(k, _)| *k == key) {
            return Err(decode_error("duplicate dictionary key", key_start));
        }

        let value = decode_value(data, pos, depth + 1)?;
        dict.push((key, value));
    }

    if *pos >= data.len() {
        return Err(decode_error("unterminated dictionary", dict_start));
    }

    *pos += 1;
    Ok(Value::Dict(dict))
}

/// Encodes a value back into bencode bytes.
///
/// Dictionaries are written in their stored key order, so encoding a decoded
/// value reproduces the original bytes exactly.
pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_value(value, &mut out);
    out
}

fn encode_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Integer(i) => {
            out.push(b'i');
            out.extend_from_slice(i.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Bytes(bytes) => {
            out.extend_from_slice(bytes.len().to_string().as_bytes());
            out.push(b':');
            out.extend_from_slice(bytes);
        }
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_value(item, out);
            }
            out.push(b'e');
        }
        Value::Dict(pairs) => {
            out.push(b'd');
            for (key, item) in pairs {
                out.extend_from_slice(key.len().to_string().as_bytes());
                out.push(b':');
                out.extend_from_slice(key);
                encode_value(item, out);
            }
            out.push(b'e');
        }
    }
}

/// Advances past one complete bencode value and returns the position just
/// after it.
///
/// Walks the grammar structurally without building values, so it is cheap to
/// call on input that `decode` already validated.
///
/// # Errors
///
/// - `TorrentError::InvalidBencode` - If the value at `start` is truncated
///   or malformed.
pub(super) fn skip_value(data: &[u8], start: usize) -> Result<usize, TorrentError> {
    let mut pos = start;
    let mut depth = 0usize;

    loop {
        if pos >= data.len() {
            return Err(decode_error("unexpected end of input", pos));
        }

        match data[pos] {
            b'd' | b'l' => {
                depth += 1;
                pos += 1;
            }
            b'e' => {
                if depth == 0 {
                    return Err(decode_error("unexpected character 'e'", pos));
                }
                depth -= 1;
                pos += 1;
            }
            b'i' => {
                pos += 1;
                while pos < data.len() && data[pos] != b'e' {
                    pos += 1;
                }
                if pos >= data.len() {
                    return Err(decode_error("unterminated integer", pos));
                }
                pos += 1;
            }
            b'0'..=b'9' => {
                let len_start = pos;
                while pos < data.len() && data[pos].is_ascii_digit() {
                    pos += 1;
                }
                if pos >= data.len() || data[pos] != b':' {
                    return Err(decode_error("malformed string length", len_start));
                }
                let len_str = std::str::from_utf8(&data[len_start..pos])
                    .map_err(|_| decode_error("malformed string length", len_start))?;
                let len: usize = len_str
                    .parse()
                    .map_err(|_| decode_error("malformed string length", len_start))?;
                pos += 1;
                if len > data.len() - pos {
                    return Err(decode_error("string length exceeds input", len_start));
                }
                pos += len;
            }
            c => {
                return Err(decode_error(
                    format!("unexpected character {:?}", c as char),
                    pos,
                ));
            }
        }

        if depth == 0 {
            return Ok(pos);
        }
    }
}

/// Finds the byte span of the value stored under `key` in the dictionary
/// starting at `dict_start`.
///
/// This is how the parser recovers the literal sub-slice of the input that a
/// nested value occupies (the info dictionary for hashing, the pieces string
/// for offset bookkeeping) without re-encoding anything. Returns `Ok(None)`
/// if the key is absent.
///
/// # Errors
///
/// - `TorrentError::InvalidBencode` - If `dict_start` does not point at a
///   dictionary or the dictionary is malformed.
pub(super) fn locate_dict_value(
    data: &[u8],
    dict_start: usize,
    key: &[u8],
) -> Result<Option<Range<usize>>, TorrentError> {
    if dict_start >= data.len() || data[dict_start] != b'd' {
        return Err(decode_error("expected dictionary", dict_start));
    }

    let mut pos = dict_start + 1;
    while pos < data.len() && data[pos] != b'e' {
        let key_start = pos;
        if !data[pos].is_ascii_digit() {
            return Err(decode_error("dictionary key must be a byte string", pos));
        }

        let key_end = skip_value(data, key_start)?;
        let value_start = key_end;
        let value_end = skip_value(data, value_start)?;

        let colon = data[key_start..key_end]
            .iter()
            .position(|&b| b == b':')
            .ok_or_else(|| decode_error("malformed string length", key_start))?;
        let key_bytes = &data[key_start + colon + 1..key_end];

        if key_bytes == key {
            return Ok(Some(value_start..value_end));
        }
        pos = value_end;
    }

    if pos >= data.len() {
        return Err(decode_error("unterminated dictionary", dict_start));
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integer() {
        let (value, consumed) = decode(b"i42e").unwrap();
        assert_eq!(value, Value::Integer(42));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_decode_negative_integer() {
        let (value, _) = decode(b"i-17e").unwrap();
        assert_eq!(value, Value::Integer(-17));
    }

    #[test]
    fn test_decode_zero() {
        let (value, _) = decode(b"i0e").unwrap();
        assert_eq!(value, Value::Integer(0));
    }

    #[test]
    fn test_decode_rejects_leading_zeros() {
        assert!(decode(b"i03e").is_err());
        assert!(decode(b"i-0e").is_err());
        assert!(decode(b"i00e").is_err());
    }

    #[test]
    fn test_decode_rejects_empty_integer() {
        assert!(decode(b"ie").is_err());
        assert!(decode(b"i-e").is_err());
    }

    #[test]
    fn test_decode_rejects_non_digit_integer() {
        assert!(decode(b"i4x2e").is_err());
    }

    #[test]
    fn test_decode_bytes() {
        let (value, consumed) = decode(b"5:hello").unwrap();
        assert_eq!(value, Value::string("hello"));
        assert_eq!(consumed, 7);
    }

    #[test]
    fn test_decode_empty_bytes() {
        let (value, consumed) = decode(b"0:").unwrap();
        assert_eq!(value.as_bytes().map(|b| b.len()), Some(0));
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_decode_truncated_bytes() {
        let result = decode(b"10:short");
        let Err(TorrentError::InvalidBencode { offset, .. }) = result else {
            panic!("expected bencode error");
        };
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_decode_list() {
        let (value, _) = decode(b"l4:spami42ee").unwrap();
        let list = value.as_list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].as_str(), Some("spam"));
        assert_eq!(list[1].as_integer(), Some(42));
    }

    #[test]
    fn test_decode_unterminated_list() {
        assert!(decode(b"l4:spam").is_err());
    }

    #[test]
    fn test_decode_dict_preserves_insertion_order() {
        // Keys deliberately out of sorted order.
        let (value, _) = decode(b"d3:zzzi1e3:aaai2ee").unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict[0].0.as_ref(), b"zzz".as_slice());
        assert_eq!(dict[1].0.as_ref(), b"aaa".as_slice());
    }

    #[test]
    fn test_decode_dict_lookup() {
        let (value, _) = decode(b"d3:foo3:bar4:spami7ee").unwrap();
        assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
        assert_eq!(value.get(b"spam").and_then(|v| v.as_integer()), Some(7));
        assert!(value.get(b"missing").is_none());
    }

    #[test]
    fn test_decode_rejects_non_string_key() {
        let result = decode(b"di1e3:fooe");
        let Err(TorrentError::InvalidBencode { offset, .. }) = result else {
            panic!("expected bencode error");
        };
        assert_eq!(offset, 1);
    }

    #[test]
    fn test_decode_rejects_duplicate_key() {
        assert!(decode(b"d3:fooi1e3:fooi2ee").is_err());
    }

    #[test]
    fn test_decode_nested_containers() {
        let (value, consumed) = decode(b"d4:listld3:keyi1eeee").unwrap();
        let inner = value.get(b"list").and_then(|v| v.as_list()).unwrap();
        assert_eq!(inner[0].get(b"key").and_then(|v| v.as_integer()), Some(1));
        assert_eq!(consumed, 20);
    }

    #[test]
    fn test_decode_reports_trailing_bytes_via_consumed() {
        let (value, consumed) = decode(b"i42etrailing").unwrap();
        assert_eq!(value, Value::Integer(42));
        assert_eq!(consumed, 4);
    }

    #[test]
    fn test_decode_error_offset_points_at_failure() {
        // The broken integer starts at byte 8.
        let result = decode(b"d3:fooi0i3e");
        let Err(TorrentError::InvalidBencode { offset, .. }) = result else {
            panic!("expected bencode error");
        };
        assert_eq!(offset, 6);
    }

    #[test]
    fn test_decode_depth_limit() {
        let mut data = Vec::new();
        data.extend(std::iter::repeat_n(b'l', MAX_DEPTH + 2));
        data.extend(std::iter::repeat_n(b'e', MAX_DEPTH + 2));
        assert!(decode(&data).is_err());
    }

    #[test]
    fn test_encode_round_trip_preserves_key_order() {
        let original = b"d3:zzzi1e3:aaal4:spamee";
        let (value, _) = decode(original).unwrap();
        assert_eq!(encode(&value), original);
    }

    #[test]
    fn test_encode_scalar_values() {
        assert_eq!(encode(&Value::Integer(-3)), b"i-3e");
        assert_eq!(encode(&Value::string("cow")), b"3:cow");
        assert_eq!(encode(&Value::List(vec![])), b"le");
        assert_eq!(encode(&Value::Dict(vec![])), b"de");
    }

    #[test]
    fn test_skip_value_over_each_kind() {
        assert_eq!(skip_value(b"i42e", 0).unwrap(), 4);
        assert_eq!(skip_value(b"4:spam", 0).unwrap(), 6);
        assert_eq!(skip_value(b"l4:spami42ee", 0).unwrap(), 12);
        assert_eq!(skip_value(b"d3:keyd4:namei42eee", 0).unwrap(), 19);
    }

    #[test]
    fn test_skip_value_truncated() {
        assert!(skip_value(b"d3:key", 0).is_err());
        assert!(skip_value(b"d3:key999:", 0).is_err());
    }

    #[test]
    fn test_locate_dict_value() {
        let data = b"d3:foo3:bar4:infod3:keyi1eee";
        let range = locate_dict_value(data, 0, b"info").unwrap().unwrap();
        assert_eq!(&data[range], b"d3:keyi1ee".as_slice());
    }

    #[test]
    fn test_locate_dict_value_missing_key() {
        let data = b"d3:foo3:bare";
        assert!(locate_dict_value(data, 0, b"info").unwrap().is_none());
    }

    #[test]
    fn test_locate_dict_value_nested_start() {
        // Locate inside the inner dictionary, not the outer one.
        let data = b"d4:infod6:pieces3:abc4:spami1eee";
        let info = locate_dict_value(data, 0, b"info").unwrap().unwrap();
        let pieces = locate_dict_value(data, info.start, b"pieces")
            .unwrap()
            .unwrap();
        assert_eq!(&data[pieces], b"3:abc".as_slice());
    }

    #[test]
    fn test_locate_dict_value_rejects_non_dictionary() {
        assert!(locate_dict_value(b"l4:teste", 0, b"info").is_err());
    }

    #[test]
    fn test_locate_ignores_key_lookalike_inside_string_value() {
        // The byte string value contains "4:info"; a substring search would
        // land on it, the structural walk must not.
        let data = b"d1:a6:4:info4:infoi9ee";
        let range = locate_dict_value(data, 0, b"info").unwrap().unwrap();
        assert_eq!(&data[range], b"i9e".as_slice());
    }
}
