//! MIC-1 main memory.
//!
//! Memory is a flat array of 32-bit words. MAR addresses it by word, PC by
//! byte (byte `b` lives in word `b / 4`, most significant byte first).
//! One word address, [`IO_PORT`], is wired to the console instead of RAM.

use crate::cpu::decode::MemorySignals;
use crate::cpu::format::{self, FormatError, PROGRAM_MAGIC};
use std::collections::VecDeque;
use thiserror::Error;

/// Default memory size in words (256 KiB).
pub const DEFAULT_MEMORY_WORDS: usize = 0x1_0000;

/// Largest memory whose byte addresses all fit in 32 bits.
pub const MAX_MEMORY_WORDS: usize = 1 << 30;

/// Word address of the memory-mapped console (`-3` in a register).
pub const IO_PORT: u32 = 0xFFFF_FFFD;

/// A loaded program block, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: u32,
    pub len: u32,
}

impl Segment {
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.len)
    }

    pub fn contains(&self, byte_addr: u32) -> bool {
        byte_addr >= self.start && byte_addr < self.end()
    }
}

/// Console side channel behind [`IO_PORT`].
#[derive(Debug, Clone, Default)]
pub struct Console {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl Console {
    /// Queue bytes for later reads of the port.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.input.extend(bytes);
    }

    /// Next input byte, `0` when nothing is queued.
    fn read(&mut self) -> i32 {
        self.input.pop_front().map_or(0, i32::from)
    }

    fn write(&mut self, byte: u8) {
        self.output.push(byte);
    }

    /// Everything written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Take the output written so far, leaving the buffer empty.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    pub fn pending_input(&self) -> usize {
        self.input.len()
    }
}

/// Results of the previous tick's READ/FETCH, waiting for write-back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fill {
    /// Word for MDR.
    pub word: Option<i32>,
    /// Byte for MBR.
    pub byte: Option<u8>,
}

/// Access requested by the current tick.
#[derive(Debug, Clone, Copy, Default)]
struct Request {
    signals: MemorySignals,
    mar: u32,
    mdr: i32,
    pc: u32,
}

/// Word/byte addressable main memory.
#[derive(Clone)]
pub struct Memory {
    words: Vec<i32>,
    /// Contents right after loading, restored by [`Memory::restore`].
    image: Vec<i32>,
    segments: Vec<Segment>,
    request: Option<Request>,
    pending: Fill,
    console: Console,
}

impl Memory {
    /// Create zeroed memory of `words` words.
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![0; words],
            image: vec![0; words],
            segments: Vec::new(),
            request: None,
            pending: Fill::default(),
            console: Console::default(),
        }
    }

    /// Load an IJVM program image into fresh memory of `words` words.
    pub fn load(bytes: &[u8], words: usize) -> Result<Self, FormatError> {
        let mut mem = Self::new(words);
        let mut body = format::strip_magic(bytes, PROGRAM_MAGIC)?;
        let memory_bytes = words.saturating_mul(4);

        while !body.is_empty() {
            let offset = bytes.len() - body.len();
            let (start, rest) = format::split_u32(body).ok_or(FormatError::TruncatedBlockHeader { offset })?;
            let (len, rest) = format::split_u32(rest).ok_or(FormatError::TruncatedBlockHeader { offset })?;

            if rest.len() < len as usize {
                return Err(FormatError::TruncatedBlock { start, declared: len, available: rest.len() });
            }
            if start as u64 + len as u64 > memory_bytes as u64 {
                return Err(FormatError::BlockOutOfRange { start, len, memory_bytes });
            }

            let (data, rest) = rest.split_at(len as usize);
            for (i, &byte) in data.iter().enumerate() {
                mem.poke_byte(start as usize + i, byte);
            }
            mem.segments.push(Segment { start, len });
            tracing::debug!(start = format_args!("{start:#010X}"), len, "program block loaded");
            body = rest;
        }

        mem.image.clone_from(&mem.words);
        Ok(mem)
    }

    /// Number of words.
    pub fn size(&self) -> usize {
        self.words.len()
    }

    /// Loaded blocks in file order. The first one is the method area.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn read_word(&self, addr: u32) -> Result<i32, MemoryError> {
        self.words
            .get(addr as usize)
            .copied()
            .ok_or(MemoryError::WordOutOfRange { addr, size: self.words.len() })
    }

    pub fn write_word(&mut self, addr: u32, value: i32) -> Result<(), MemoryError> {
        let size = self.words.len();
        let slot = self
            .words
            .get_mut(addr as usize)
            .ok_or(MemoryError::WordOutOfRange { addr, size })?;
        *slot = value;
        Ok(())
    }

    pub fn read_byte(&self, addr: u32) -> Result<u8, MemoryError> {
        let word = self
            .words
            .get((addr / 4) as usize)
            .ok_or(MemoryError::ByteOutOfRange { addr, size: self.words.len() * 4 })?;
        Ok(((*word as u32) >> byte_shift(addr)) as u8)
    }

    fn poke_byte(&mut self, addr: usize, byte: u8) {
        let shift = byte_shift(addr as u32);
        let word = &mut self.words[addr / 4];
        *word = ((*word as u32 & !(0xFF << shift)) | (byte as u32) << shift) as i32;
    }

    /// Set up this tick's access. Nothing happens until [`Memory::apply`].
    pub fn stage(&mut self, signals: MemorySignals, mar: i32, mdr: i32, pc: i32) {
        self.request = signals.any().then_some(Request {
            signals,
            mar: mar as u32,
            mdr,
            pc: pc as u32,
        });
    }

    /// Perform the staged access.
    ///
    /// WRITE lands immediately. READ and FETCH results wait in the latch
    /// until the next [`Memory::fill`]. A READ sees memory as it was before
    /// a WRITE in the same tick.
    pub fn apply(&mut self) -> Result<(), MemoryError> {
        let Some(req) = self.request.take() else {
            return Ok(());
        };

        if req.signals.read {
            let word = if req.mar == IO_PORT {
                self.console.read()
            } else {
                self.read_word(req.mar)?
            };
            self.pending.word = Some(word);
        }
        if req.signals.fetch {
            self.pending.byte = Some(self.read_byte(req.pc)?);
        }
        if req.signals.write {
            if req.mar == IO_PORT {
                self.console.write(req.mdr as u8);
            } else {
                self.write_word(req.mar, req.mdr)?;
            }
        }
        Ok(())
    }

    /// Hand over latched READ/FETCH results and clear the latch.
    pub fn fill(&mut self) -> Fill {
        std::mem::take(&mut self.pending)
    }

    /// Latched results still waiting for write-back.
    pub fn pending(&self) -> Fill {
        self.pending
    }

    /// Put memory back to its freshly loaded contents. The console is kept.
    pub fn restore(&mut self) {
        self.words.clone_from(&self.image);
        self.request = None;
        self.pending = Fill::default();
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut Console {
        &mut self.console
    }

    /// `(address, value)` pairs for a window of words, clipped to memory.
    pub fn dump(&self, start: u32, count: usize) -> Vec<(u32, i32)> {
        let start = (start as usize).min(self.words.len());
        let end = start.saturating_add(count).min(self.words.len());
        (start..end).map(|i| (i as u32, self.words[i])).collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_WORDS)
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memory")
            .field("words", &self.words.len())
            .field("non_zero_words", &self.words.iter().filter(|w| **w != 0).count())
            .field("segments", &self.segments)
            .finish()
    }
}

/// Bit offset of a byte inside its big-endian word.
fn byte_shift(addr: u32) -> u32 {
    (3 - (addr % 4)) * 8
}

/// Build an IJVM program image from `(start byte address, bytes)` blocks.
pub fn encode_program(blocks: &[(u32, &[u8])]) -> Vec<u8> {
    let mut image = PROGRAM_MAGIC.to_be_bytes().to_vec();
    for (start, data) in blocks {
        image.extend(start.to_be_bytes());
        image.extend((data.len() as u32).to_be_bytes());
        image.extend_from_slice(data);
    }
    image
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("word address {addr:#010X} out of range (memory has {size} words)")]
    WordOutOfRange { addr: u32, size: usize },

    #[error("byte address {addr:#010X} out of range (memory has {size} bytes)")]
    ByteOutOfRange { addr: u32, size: usize },
}
