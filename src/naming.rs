//! Name translation between the source and destination backends.
//!
//! Two pure functions live here: [`decode_key`], which turns the
//! percent-encoded key from the manifest into the real object key, and
//! [`destination_container`], which adapts a source container name to the
//! destination backend's naming rules.

use thiserror::Error;

/// A key that could not be percent-decoded.
///
/// This is a per-item failure: the offending item is reported and counted,
/// and the run continues with the remaining items.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeKeyError {
    /// A `%` escape that is truncated or not followed by two hex digits.
    #[error("invalid percent escape at byte {position}")]
    InvalidEscape {
        /// Byte offset of the `%` that started the bad escape
        position: usize,
    },

    /// The decoded bytes are not valid UTF-8.
    #[error("decoded key is not valid UTF-8 (valid up to byte {valid_up_to})")]
    NotUtf8 {
        /// Length of the longest valid UTF-8 prefix of the decoded bytes
        valid_up_to: usize,
    },
}

/// Decode a percent-encoded object key.
///
/// Uses query-string semantics: `%XX` escapes become the corresponding byte
/// and `+` becomes a space. Decoding is strict — a lone or malformed `%`
/// escape is an error rather than being passed through, so a bad manifest
/// entry surfaces as a failed item instead of silently producing a wrong
/// destination key.
pub fn decode_key(raw: &str) -> Result<String, DecodeKeyError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hi = bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16));
                let lo = bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => return Err(DecodeKeyError::InvalidEscape { position: i }),
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|err| DecodeKeyError::NotUtf8 {
        valid_up_to: err.utf8_error().valid_up_to(),
    })
}

/// Map a source container name onto the destination backend's naming rules.
///
/// Azure container names cannot contain `.`, which is common in S3 bucket
/// names; every `.` is replaced with `-`. The mapping is deterministic and
/// case-preserving: a given input always produces the same output.
pub fn destination_container(source: &str) -> String {
    source.replace('.', "-")
}
