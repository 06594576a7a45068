//! Canonical snapshot hashing.
//!
//! Each turn yields a new song snapshot; its identity is
//! `hex(BLAKE3(JCS(song_json)))`, so two snapshots with the same content hash
//! the same regardless of field order in the source JSON.

use std::fmt::Write as _;

use serde_json::Value;

use crate::error::SongError;
use crate::song::Song;

/// Number of hex characters shown by [`short_hash`].
pub const SHORT_HASH_LEN: usize = 12;

/// Computes the canonical BLAKE3 hash of a song.
///
/// # Returns
/// * A 64-character lowercase hexadecimal string
///
/// # Example
/// ```
/// use tabforge_spec::hash::canonical_song_hash;
/// use tabforge_spec::ops::empty_song;
///
/// let hash = canonical_song_hash(&empty_song()).unwrap();
/// assert_eq!(hash.len(), 64);
/// ```
pub fn canonical_song_hash(song: &Song) -> Result<String, SongError> {
    let value = song.to_value()?;
    Ok(canonical_value_hash(&value))
}

/// Computes the canonical BLAKE3 hash of a JSON value.
pub fn canonical_value_hash(value: &Value) -> String {
    blake3::hash(canonicalize_json(value).as_bytes())
        .to_hex()
        .to_string()
}

/// Leading characters of a hash, for display.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_HASH_LEN).unwrap_or(hash)
}

/// Canonicalizes a JSON value (RFC 8785): sorted keys, no whitespace,
/// minimal string escaping.
pub fn canonicalize_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(n, out),
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out);
                out.push(':');
                write_canonical(item, out);
            }
            out.push('}');
        }
    }
}

fn write_number(n: &serde_json::Number, out: &mut String) {
    if let Some(i) = n.as_i64() {
        let _ = write!(out, "{}", i);
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{}", u);
    } else {
        match n.as_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                let _ = write!(out, "{}", f as i64);
            }
            Some(f) if f.is_finite() => {
                let _ = write!(out, "{}", f);
            }
            _ => out.push_str("null"),
        }
    }
}

fn write_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}
