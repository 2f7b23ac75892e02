//! Binary image formats shared by the control store and main memory.
//!
//! Both images open with a 4-byte big-endian magic number:
//! - Microcode (`.mic1`): [`MICROCODE_MAGIC`], then 36-bit control words
//!   packed back to back, most significant bit first
//! - IJVM programs (`.ijvm`): [`PROGRAM_MAGIC`], then
//!   `(start, length, bytes...)` blocks

use crate::cpu::decode::CONTROL_WORD_BITS;
use crate::datapath::SignalError;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Magic number opening a microcode image.
pub const MICROCODE_MAGIC: u32 = 0x1234_5677;

/// Magic number opening an IJVM program image.
pub const PROGRAM_MAGIC: u32 = 0x1DEA_DFAD;

/// Read a whole image from disk.
pub fn read_image<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, FormatError> {
    std::fs::read(path.as_ref()).map_err(|e| FormatError::Io(format!("{}: {}", path.as_ref().display(), e)))
}

/// Drain a reader into memory.
pub fn read_all<R: Read>(mut reader: R) -> Result<Vec<u8>, FormatError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| FormatError::Io(e.to_string()))?;
    Ok(bytes)
}

/// Check the magic number and return the rest of the image.
pub fn strip_magic(bytes: &[u8], expected: u32) -> Result<&[u8], FormatError> {
    let (head, rest) = split_u32(bytes).ok_or(FormatError::MissingMagic)?;
    if head != expected {
        return Err(FormatError::BadMagic { expected, found: head });
    }
    Ok(rest)
}

/// Split a big-endian `u32` off the front of `bytes`.
pub fn split_u32(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let (head, rest) = bytes.split_first_chunk::<4>()?;
    Some((u32::from_be_bytes(*head), rest))
}

/// Split a byte stream into 36-bit control words.
///
/// Leftover bits must stay inside the final byte and be zero; anything
/// longer is a cut-off record.
pub fn unpack_control_words(body: &[u8]) -> Result<Vec<u64>, FormatError> {
    let total_bits = body.len() as u64 * 8;
    let count = total_bits / CONTROL_WORD_BITS as u64;
    let spare = total_bits % CONTROL_WORD_BITS as u64;

    if spare >= 8 {
        return Err(FormatError::TruncatedRecord { index: count as usize, bits: spare as u32 });
    }

    let mut words = Vec::with_capacity(count as usize);
    let mut acc: u128 = 0;
    let mut held: u32 = 0;

    for &byte in body {
        acc = (acc << 8) | byte as u128;
        held += 8;
        if held >= CONTROL_WORD_BITS {
            held -= CONTROL_WORD_BITS;
            words.push(((acc >> held) as u64) & ((1 << CONTROL_WORD_BITS) - 1));
            acc &= (1u128 << held) - 1;
        }
    }

    if acc != 0 {
        return Err(FormatError::NonZeroPadding);
    }
    Ok(words)
}

/// Pack 36-bit control words back to back, zero-padding the last byte.
pub fn pack_control_words(words: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(words.len() * 9 / 2 + 1);
    let mut acc: u128 = 0;
    let mut held: u32 = 0;

    for &word in words {
        acc = (acc << CONTROL_WORD_BITS) | (word & ((1 << CONTROL_WORD_BITS) - 1)) as u128;
        held += CONTROL_WORD_BITS;
        while held >= 8 {
            held -= 8;
            out.push((acc >> held) as u8);
        }
        acc &= (1u128 << held) - 1;
    }
    if held > 0 {
        out.push((acc << (8 - held)) as u8);
    }
    out
}

/// Errors that can occur while reading an image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("image is shorter than its magic number")]
    MissingMagic,

    #[error("bad magic number: expected {expected:#010X}, found {found:#010X}")]
    BadMagic { expected: u32, found: u32 },

    #[error("control word {index} is cut off after {bits} bits")]
    TruncatedRecord { index: usize, bits: u32 },

    #[error("padding after the last control word is not zero")]
    NonZeroPadding,

    #[error("microcode holds {count} control words, the control store has {max} slots")]
    TooManyInstructions { count: usize, max: usize },

    #[error("illegal control word at {address:#05X}: {source}")]
    IllegalInstruction { address: u16, source: SignalError },

    #[error("block header at offset {offset} is cut off")]
    TruncatedBlockHeader { offset: usize },

    #[error("block at {start:#010X} declares {declared} bytes, only {available} present")]
    TruncatedBlock { start: u32, declared: u32, available: usize },

    #[error("block at {start:#010X} with {len} bytes does not fit in {memory_bytes} bytes of memory")]
    BlockOutOfRange { start: u32, len: u32, memory_bytes: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_magic() {
        let image = [0x1D, 0xEA, 0xDF, 0xAD, 0x42];
        assert_eq!(strip_magic(&image, PROGRAM_MAGIC).unwrap(), &[0x42]);

        assert_eq!(
            strip_magic(&image, MICROCODE_MAGIC),
            Err(FormatError::BadMagic { expected: MICROCODE_MAGIC, found: PROGRAM_MAGIC })
        );
        assert_eq!(strip_magic(&image[..3], PROGRAM_MAGIC), Err(FormatError::MissingMagic));
    }

    #[test]
    fn test_two_words_fill_nine_bytes() {
        let words = [0xF_FFFF_FFFF, 0x0_0000_0001];
        let packed = pack_control_words(&words);
        assert_eq!(packed.len(), 9);
        assert_eq!(packed[0], 0xFF);
        assert_eq!(packed[4], 0xF0);
        assert_eq!(packed[8], 0x01);
        assert_eq!(unpack_control_words(&packed).unwrap(), words);
    }

    #[test]
    fn test_odd_count_pads_last_byte() {
        let words = [0x1_2345_6789, 0xA_BCDE_F012, 0x3_0000_0003];
        let packed = pack_control_words(&words);
        // 108 bits -> 14 bytes, 4 padding bits
        assert_eq!(packed.len(), 14);
        assert_eq!(unpack_control_words(&packed).unwrap(), words);
    }

    #[test]
    fn test_truncated_record() {
        let mut packed = pack_control_words(&[1, 2]);
        packed.truncate(6);
        assert!(matches!(
            unpack_control_words(&packed),
            Err(FormatError::TruncatedRecord { index: 1, bits: 12 })
        ));
    }

    #[test]
    fn test_nonzero_padding() {
        let mut packed = pack_control_words(&[1]);
        let last = packed.len() - 1;
        packed[last] |= 0x01;
        assert_eq!(unpack_control_words(&packed), Err(FormatError::NonZeroPadding));
    }

    #[test]
    fn test_empty_body() {
        assert!(unpack_control_words(&[]).unwrap().is_empty());
    }
}
