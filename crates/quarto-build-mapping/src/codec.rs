/*
 * codec.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Base64 VLQ codec for the `mappings` field of a flat source map.
//!
//! The normalizer only ever talks to the [`MappingsCodec`] trait, so callers
//! with their own codec can pass it to [`crate::normalize_with`].

use crate::types::{DecodedMappings, SourceMapSegment};
use thiserror::Error;

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_BASE_MASK: i64 = 0b11111;
const VLQ_CONTINUATION_BIT: u8 = 0b100000;

// Seven digits carry 35 bits, enough for a sign bit and a u32 magnitude.
const VLQ_MAX_SHIFT: u32 = 35;

/// Errors produced while encoding or decoding mappings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid base64 character {character:?} in mappings at byte {position}")]
    InvalidBase64 { character: char, position: usize },

    #[error("Unterminated VLQ value in mappings at byte {position}")]
    UnterminatedVlq { position: usize },

    #[error("Mapping segment at byte {position} has {length} fields (expected 1, 4 or 5)")]
    InvalidSegmentLength { length: usize, position: usize },

    #[error("Mapping segment {index} on line {line} has {length} fields (expected 1, 4 or 5)")]
    MalformedSegment {
        line: usize,
        index: usize,
        length: usize,
    },

    #[error("VLQ value in mappings at byte {position} does not fit in 32 bits")]
    Overflow { position: usize },

    #[error("Mapping segment at byte {position} decodes to a negative field")]
    Negative { position: usize },
}

/// Converts between the encoded and decoded forms of `mappings`.
pub trait MappingsCodec {
    fn decode(&self, mappings: &str) -> Result<DecodedMappings, CodecError>;
    fn encode(&self, mappings: &DecodedMappings) -> Result<String, CodecError>;
}

/// The standard base64 VLQ codec
#[derive(Debug, Clone, Copy, Default)]
pub struct VlqCodec;

impl MappingsCodec for VlqCodec {
    fn decode(&self, mappings: &str) -> Result<DecodedMappings, CodecError> {
        let bytes = mappings.as_bytes();
        let mut decoded = Vec::new();
        let mut line = Vec::new();
        // generated column, source, original line, original column, name
        let mut state = [0i64; 5];
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b';' => {
                    decoded.push(std::mem::take(&mut line));
                    state[0] = 0;
                    pos += 1;
                }
                b',' => pos += 1,
                _ => {
                    let start = pos;
                    let mut fields = Vec::with_capacity(5);
                    while pos < bytes.len() && bytes[pos] != b',' && bytes[pos] != b';' {
                        let (value, next) = decode_vlq(mappings, pos)?;
                        fields.push(value);
                        pos = next;
                    }
                    line.push(apply_segment(&mut state, &fields, start)?);
                }
            }
        }

        decoded.push(line);
        Ok(decoded)
    }

    fn encode(&self, mappings: &DecodedMappings) -> Result<String, CodecError> {
        let mut out = String::new();
        let mut state = [0i64; 5];

        for (line_index, line) in mappings.iter().enumerate() {
            if line_index > 0 {
                out.push(';');
            }
            state[0] = 0;

            for (index, segment) in line.iter().enumerate() {
                if !matches!(segment.len(), 1 | 4 | 5) {
                    return Err(CodecError::MalformedSegment {
                        line: line_index,
                        index,
                        length: segment.len(),
                    });
                }
                if index > 0 {
                    out.push(',');
                }
                for (field, value) in segment.iter().enumerate() {
                    let value = i64::from(*value);
                    encode_vlq(&mut out, value - state[field]);
                    state[field] = value;
                }
            }
        }

        Ok(out)
    }
}

/// Turn one segment's relative fields into absolute ones, updating `state`
fn apply_segment(
    state: &mut [i64; 5],
    fields: &[i64],
    position: usize,
) -> Result<SourceMapSegment, CodecError> {
    if !matches!(fields.len(), 1 | 4 | 5) {
        return Err(CodecError::InvalidSegmentLength {
            length: fields.len(),
            position,
        });
    }

    let mut segment = Vec::with_capacity(fields.len());
    for (field, delta) in fields.iter().enumerate() {
        state[field] += delta;
        let value = state[field];
        if value < 0 {
            return Err(CodecError::Negative { position });
        }
        let value = u32::try_from(value).map_err(|_| CodecError::Overflow { position })?;
        segment.push(value);
    }
    Ok(segment)
}

/// Decode one VLQ value starting at `start`, returning it and the next position
fn decode_vlq(mappings: &str, start: usize) -> Result<(i64, usize), CodecError> {
    let bytes = mappings.as_bytes();
    let mut value: i64 = 0;
    let mut shift = 0;
    let mut pos = start;

    loop {
        let byte = match bytes.get(pos) {
            Some(b',' | b';') | None => {
                return Err(CodecError::UnterminatedVlq { position: start });
            }
            Some(byte) => *byte,
        };
        let digit = base64_value(byte).ok_or_else(|| CodecError::InvalidBase64 {
            character: mappings[pos..].chars().next().unwrap_or_default(),
            position: pos,
        })?;
        if shift >= VLQ_MAX_SHIFT {
            return Err(CodecError::Overflow { position: start });
        }

        value |= (i64::from(digit) & VLQ_BASE_MASK) << shift;
        shift += VLQ_BASE_SHIFT;
        pos += 1;

        if digit & VLQ_CONTINUATION_BIT == 0 {
            break;
        }
    }

    let negative = value & 1 == 1;
    value >>= 1;
    Ok((if negative { -value } else { value }, pos))
}

fn encode_vlq(out: &mut String, value: i64) {
    let mut vlq = if value < 0 {
        (-value << 1) | 1
    } else {
        value << 1
    };

    loop {
        let mut digit = (vlq & VLQ_BASE_MASK) as u8;
        vlq >>= VLQ_BASE_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION_BIT;
        }
        out.push(BASE64_ALPHABET[usize::from(digit)] as char);
        if vlq == 0 {
            break;
        }
    }
}

fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(mappings: &str) -> Result<DecodedMappings, CodecError> {
        VlqCodec.decode(mappings)
    }

    fn encode(mappings: &DecodedMappings) -> String {
        VlqCodec.encode(mappings).unwrap()
    }

    #[test]
    fn test_decode_single_segment() {
        assert_eq!(decode("AAAA").unwrap(), vec![vec![vec![0, 0, 0, 0]]]);
    }

    #[test]
    fn test_decode_empty_is_one_empty_line() {
        assert_eq!(decode("").unwrap(), vec![Vec::<SourceMapSegment>::new()]);
        assert_eq!(
            decode(";").unwrap(),
            vec![Vec::<SourceMapSegment>::new(), vec![]]
        );
    }

    #[test]
    fn test_decode_accumulates_across_lines() {
        // Generated column resets per line; source fields carry over.
        let decoded = decode("AAAA,IAAI;AACA,EAAE").unwrap();
        assert_eq!(
            decoded,
            vec![
                vec![vec![0, 0, 0, 0], vec![4, 0, 0, 4]],
                vec![vec![0, 0, 1, 4], vec![2, 0, 1, 6]],
            ]
        );
    }

    #[test]
    fn test_decode_name_and_negative_delta() {
        // "D" is -1
        let decoded = decode("AAAEA,EAADC").unwrap();
        assert_eq!(decoded, vec![vec![vec![0, 0, 0, 2, 0], vec![2, 0, 0, 1, 1]]]);
        assert_eq!(encode(&decoded), "AAAEA,EAADC");
    }

    #[test]
    fn test_decode_multi_digit_values() {
        // 16 needs a continuation digit: "gB"
        let decoded = decode("gBAAA").unwrap();
        assert_eq!(decoded, vec![vec![vec![16, 0, 0, 0]]]);
        assert_eq!(encode(&decoded), "gBAAA");
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&vec![]), "");
        assert_eq!(encode(&vec![vec![]]), "");
        assert_eq!(encode(&vec![vec![], vec![vec![0]]]), ";A");
    }

    #[test]
    fn test_decode_skips_empty_segments() {
        assert_eq!(decode("A,,C").unwrap(), vec![vec![vec![0], vec![1]]]);
    }

    #[test]
    fn test_invalid_base64() {
        assert_eq!(
            decode("AA!A").unwrap_err(),
            CodecError::InvalidBase64 {
                character: '!',
                position: 2
            }
        );
        assert_eq!(
            decode("é").unwrap_err(),
            CodecError::InvalidBase64 {
                character: 'é',
                position: 0
            }
        );
    }

    #[test]
    fn test_unterminated_vlq() {
        // 'g' has the continuation bit set
        assert_eq!(
            decode("AAAg").unwrap_err(),
            CodecError::UnterminatedVlq { position: 3 }
        );
        assert_eq!(
            decode("g;").unwrap_err(),
            CodecError::UnterminatedVlq { position: 0 }
        );
    }

    #[test]
    fn test_invalid_segment_length() {
        assert_eq!(
            decode("AAAA,AA").unwrap_err(),
            CodecError::InvalidSegmentLength {
                length: 2,
                position: 5
            }
        );
    }

    #[test]
    fn test_negative_field() {
        assert_eq!(
            decode("DAAA").unwrap_err(),
            CodecError::Negative { position: 0 }
        );
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            decode("gggggggB").unwrap_err(),
            CodecError::Overflow { position: 0 }
        );
    }

    #[test]
    fn test_encode_rejects_malformed_segment() {
        assert_eq!(
            VlqCodec.encode(&vec![vec![vec![0]], vec![vec![0], vec![1, 2]]]),
            Err(CodecError::MalformedSegment {
                line: 1,
                index: 1,
                length: 2
            })
        );
    }
}
