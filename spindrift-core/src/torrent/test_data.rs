//! Shared torrent fixtures for tests
//!
//! Builders return complete torrents as `Value` trees so a test can mutate
//! one field and re-encode, instead of hand-editing byte literals. The
//! encoded forms are deterministic, which lets tests pin the resulting
//! info-hashes as constants.

use bytes::Bytes;

use super::parsing::bencode::{Value, encode};

/// SHA-1 of the six bytes `hello\n`, the only piece of the one-file fixture.
pub const HELLO_PIECE_HASH: [u8; 20] = [
    0xf5, 0x72, 0xd3, 0x96, 0xfa, 0xe9, 0x20, 0x66, 0x28, 0x71, 0x4f, 0xb2, 0xce, 0x00, 0xf7,
    0x2e, 0x94, 0xf2, 0x25, 0x8f,
];

/// SHA-1 of `hello\nworld\n`, the only piece of the multi-file fixture.
pub const HELLO_WORLD_PIECE_HASH: [u8; 20] = [
    0x58, 0x85, 0x3e, 0x8a, 0x5e, 0x82, 0x72, 0xb1, 0x01, 0x2f, 0x9a, 0x52, 0xa8, 0x07, 0x58,
    0xb2, 0x7b, 0xd0, 0xd3, 0xcb,
];

/// Info-hash of the torrent returned by `single_file_torrent`.
pub const SINGLE_FILE_INFO_HASH: &str = "3e7e121dbb2213c522eaf21c5ad048a3b944d053";

/// Info-hash of the torrent returned by `multi_file_torrent`.
pub const MULTI_FILE_INFO_HASH: &str = "340e46ec8bc7bbfab525de697c5852a91a33930d";

/// Builds one dictionary entry.
pub fn pair(key: &str, value: Value) -> (Bytes, Value) {
    (Bytes::copy_from_slice(key.as_bytes()), value)
}

/// Replaces the value under `key`, or appends the entry if absent.
pub fn dict_set(value: &mut Value, key: &str, new_value: Value) {
    let Value::Dict(entries) = value else {
        panic!("not a dictionary");
    };
    match entries
        .iter_mut()
        .find(|(k, _)| k.as_ref() == key.as_bytes())
    {
        Some((_, slot)) => *slot = new_value,
        None => entries.push(pair(key, new_value)),
    }
}

/// Removes the entry under `key` if present.
pub fn dict_remove(value: &mut Value, key: &str) {
    let Value::Dict(entries) = value else {
        panic!("not a dictionary");
    };
    entries.retain(|(k, _)| k.as_ref() != key.as_bytes());
}

/// Mutable access to the value stored under `key`.
pub fn dict_get_mut<'a>(value: &'a mut Value, key: &str) -> &'a mut Value {
    let Value::Dict(entries) = value else {
        panic!("not a dictionary");
    };
    entries
        .iter_mut()
        .find(|(k, _)| k.as_ref() == key.as_bytes())
        .map(|(_, v)| v)
        .expect("key present")
}

/// One-file torrent: `hello.txt`, 6 bytes, one 16 KiB piece, private.
pub fn single_file_value() -> Value {
    Value::Dict(vec![
        pair("announce", Value::string("http://example.org/announce")),
        pair("created by", Value::string("Spindrift 0.1.0")),
        pair("creation date", Value::Integer(1_636_238_372)),
        pair(
            "info",
            Value::Dict(vec![
                pair("length", Value::Integer(6)),
                pair("name", Value::string("hello.txt")),
                pair("piece length", Value::Integer(16_384)),
                pair(
                    "pieces",
                    Value::Bytes(Bytes::copy_from_slice(&HELLO_PIECE_HASH)),
                ),
                pair("private", Value::Integer(1)),
            ]),
        ),
    ])
}

/// Two-file torrent under root `test`: `hello.txt` and `world.txt`, 6 bytes
/// each, one 16 KiB piece, two tracker tiers and one webseed.
pub fn multi_file_value() -> Value {
    Value::Dict(vec![
        pair(
            "announce",
            Value::string("http://example.org/announce?id=foo"),
        ),
        pair(
            "announce-list",
            Value::List(vec![
                Value::List(vec![Value::string("http://example.org/announce?id=foo")]),
                Value::List(vec![Value::string("udp://backup.example:6969/announce")]),
            ]),
        ),
        pair("comment", Value::string("this is the comment")),
        pair("created by", Value::string("Spindrift 0.1.0")),
        pair("creation date", Value::Integer(1_636_238_372)),
        pair(
            "info",
            Value::Dict(vec![
                pair(
                    "files",
                    Value::List(vec![
                        Value::Dict(vec![
                            pair("length", Value::Integer(6)),
                            pair("path", Value::List(vec![Value::string("hello.txt")])),
                        ]),
                        Value::Dict(vec![
                            pair("length", Value::Integer(6)),
                            pair("path", Value::List(vec![Value::string("world.txt")])),
                        ]),
                    ]),
                ),
                pair("name", Value::string("test")),
                pair("piece length", Value::Integer(16_384)),
                pair(
                    "pieces",
                    Value::Bytes(Bytes::copy_from_slice(&HELLO_WORLD_PIECE_HASH)),
                ),
            ]),
        ),
        pair(
            "url-list",
            Value::List(vec![Value::string("http://example.org/data")]),
        ),
    ])
}

/// Encoded form of `single_file_value`.
pub fn single_file_torrent() -> Vec<u8> {
    encode(&single_file_value())
}

/// Encoded form of `multi_file_value`.
pub fn multi_file_torrent() -> Vec<u8> {
    encode(&multi_file_value())
}
