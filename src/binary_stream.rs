use std::fmt;
use std::io;
use std::io::Write;
use std::str::FromStr;

use crate::{error::Error, Result};

/// An ordered sequence of bits, most significant first when packed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitString {
    bits: Vec<bool>,
}

impl BitString {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn append(&mut self, other: &BitString) {
        self.bits.extend_from_slice(&other.bits);
    }

    pub fn reverse(&mut self) {
        self.bits.reverse();
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }

    /// copy of the bits in `start..end`
    pub fn slice(&self, start: usize, end: usize) -> Option<BitString> {
        self.bits.get(start..end).map(|bits| BitString {
            bits: bits.to_vec(),
        })
    }

    /// zero extended to the next multiple of 8, together with the number of bits added
    pub fn padded_to_byte_boundary(&self) -> (BitString, u8) {
        let padding = (8 - self.bits.len() % 8) % 8;
        let mut padded = self.clone();
        padded.bits.resize(self.bits.len() + padding, false);
        (padded, padding as u8)
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

impl FromStr for BitString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(Error::CorruptBitstream(format!(
                    "'{}' is not a binary digit",
                    other
                ))),
            })
            .collect()
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// State for writing individual bits to a Writer
pub struct BitWriter<'a, T: Write> {
    /// the underlying output stream
    writer: &'a mut T,
    /// buffer of individual bits not yet written
    buffer: u8,
    /// how many bits are waiting to be written
    buffer_space_used: u8,
}

impl<'a, T: Write> BitWriter<'a, T> {
    pub fn new(writer: &'a mut T) -> BitWriter<'a, T> {
        BitWriter {
            writer,
            buffer: 0,
            buffer_space_used: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if bit {
            self.buffer |= 0b10000000_u8.rotate_right(self.buffer_space_used as u32);
        } else {
            self.buffer &= 0b01111111_u8.rotate_right(self.buffer_space_used as u32);
        }
        self.buffer_space_used += 1;
        if self.buffer_space_used == 8 {
            self.writer.write_all(&[self.buffer])?;
            self.buffer_space_used = 0;
            self.buffer = 0; // depended upon in flush()
        }
        Ok(())
    }

    pub fn write_bit_string(&mut self, bits: &BitString) -> io::Result<()> {
        for bit in bits.iter() {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    /// Flush all bits and the underlying writer;
    ///
    /// If there are non-byte-aligned bits still
    /// in the buffer, they will be written to the output
    /// with 0 padding to the next byte;
    pub fn flush(&mut self) -> io::Result<()> {
        if self.buffer_space_used != 0 {
            self.writer.write_all(&[self.buffer])?;
            self.buffer = 0;
            self.buffer_space_used = 0;
        }
        self.writer.flush()
    }
}

/// Iterates the bits of a byte slice, most significant bit first
pub struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
    length: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_length(bytes, bytes.len() * 8)
    }

    fn with_length(bytes: &'a [u8], length: usize) -> Self {
        Self {
            bytes,
            position: 0,
            length,
        }
    }
}

impl Iterator for BitReader<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.position >= self.length {
            return None;
        }
        let byte = self.bytes[self.position / 8];
        let bit = byte & (0b10000000_u8 >> (self.position % 8)) > 0;
        self.position += 1;
        Some(bit)
    }
}

/// Bytes of a bit string whose length is already a multiple of 8
pub fn aligned_bytes(bits: &BitString) -> Result<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(Error::AlignmentViolation(bits.len()));
    }
    let mut output = Vec::with_capacity(bits.len() / 8);
    let mut writer = BitWriter::new(&mut output);
    writer
        .write_bit_string(bits)
        .and_then(|_| writer.flush())
        .map_err(Error::FailedToWriteOutput)?;
    Ok(output)
}

/// Packs a bit string of any length: one byte holding the pad count (0-7),
/// followed by the zero padded bits.
pub fn pack(bits: &BitString) -> Result<Vec<u8>> {
    let (padded, padding) = bits.padded_to_byte_boundary();
    let mut output = Vec::with_capacity(padded.len() / 8 + 1);
    output.push(padding);
    output.extend(aligned_bytes(&padded)?);
    Ok(output)
}

pub fn unpack(bytes: &[u8]) -> Result<BitString> {
    let (&padding, packed) = bytes.split_first().ok_or(Error::CorruptBitstream(
        "packed bit string lacks its pad count".to_owned(),
    ))?;
    if padding > 7 {
        return Err(Error::CorruptBitstream(format!(
            "pad count {} exceeds 7",
            padding
        )));
    }
    let available = packed.len() * 8;
    if (padding as usize) > available {
        return Err(Error::CorruptBitstream(format!(
            "pad count {} exceeds the {} packed bits",
            padding, available
        )));
    }
    Ok(BitReader::with_length(packed, available - padding as usize).collect())
}
