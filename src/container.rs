pub mod payload;

use std::fmt;
use std::str::FromStr;

use clap::{builder::PossibleValue, ValueEnum};
use log::debug;

use crate::{
    binary_stream::BitString, error::Error, huffman::TableEntry, logger::log_segment, Result,
};
pub use payload::Payload;

/// Codec family, identified by the leading tag of the byte stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecType {
    Block,
    Wavelet,
}

impl CodecType {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Block => "JPEG",
            Self::Wavelet => "HIC",
        }
    }

    /// Tables, streams and shape segments following the settings
    pub fn segment_count(&self) -> usize {
        match self {
            Self::Block => 19,
            Self::Wavelet => 14,
        }
    }
}

impl ValueEnum for CodecType {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Block, Self::Wavelet]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Block => Some(PossibleValue::new("block")),
            Self::Wavelet => Some(PossibleValue::new("wavelet")),
        }
    }
}

impl fmt::Display for CodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CodecType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::value_variants()
            .iter()
            .find(|codec_type| codec_type.tag() == s)
            .copied()
            .ok_or_else(|| Error::UnknownCodecType(s.to_owned()))
    }
}

/// Tag, settings and the positional segment list of one compressed image.
///
/// Segments carry no keys; their meaning follows only from their index.
#[derive(Clone, Debug, PartialEq)]
pub struct ContainerImage {
    codec_type: CodecType,
    settings: Vec<Payload>,
    segments: Vec<Payload>,
}

impl ContainerImage {
    pub fn new(codec_type: CodecType, settings: Vec<Payload>, segments: Vec<Payload>) -> Result<Self> {
        if segments.len() != codec_type.segment_count() {
            return Err(Error::DimensionMismatch(format!(
                "{} container needs {} segments, got {}",
                codec_type,
                codec_type.segment_count(),
                segments.len()
            )));
        }
        Ok(Self {
            codec_type,
            settings,
            segments,
        })
    }

    pub fn codec_type(&self) -> CodecType {
        self.codec_type
    }

    pub fn settings(&self) -> &[Payload] {
        &self.settings
    }

    pub fn into_parts(self) -> (CodecType, Vec<Payload>, Vec<Payload>) {
        (self.codec_type, self.settings, self.segments)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        Payload::Plain(self.codec_type.tag().to_owned()).write_to(&mut output)?;
        Payload::List(self.settings.clone()).write_to(&mut output)?;
        for (index, segment) in self.segments.iter().enumerate() {
            let start = output.len();
            segment.write_to(&mut output)?;
            log_segment(index, segment, output.len() - start);
        }
        debug!(
            "Serialized {} container into {} bytes",
            self.codec_type,
            output.len()
        );
        Ok(output)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut input = bytes;
        let codec_type: CodecType = Payload::read_from(&mut input)?.into_plain()?.parse()?;
        let settings = Payload::read_from(&mut input)?.into_list()?;
        let mut segments = Vec::with_capacity(codec_type.segment_count());
        for index in 0..codec_type.segment_count() {
            let before = input.len();
            let segment = Payload::read_from(&mut input)?;
            log_segment(index, &segment, before - input.len());
            segments.push(segment);
        }
        if !input.is_empty() {
            return Err(Error::CorruptBitstream(format!(
                "{} bytes follow the last segment",
                input.len()
            )));
        }
        Self::new(codec_type, settings, segments)
    }
}

/// `[bits(all codes), list(pair(symbol, code length)...)]`
pub fn table_to_payload(table: &[TableEntry<i32>]) -> Result<Payload> {
    let mut codes = BitString::new();
    let mut lengths = Vec::with_capacity(table.len());
    for entry in table {
        codes.append(&entry.code);
        let length = i32::try_from(entry.code.len()).map_err(|_| {
            Error::DimensionMismatch(format!("code of length {} is too long", entry.code.len()))
        })?;
        lengths.push(Payload::Pair(entry.symbol, length));
    }
    Ok(Payload::List(vec![
        Payload::Bits(codes),
        Payload::List(lengths),
    ]))
}

pub fn table_from_payload(payload: Payload) -> Result<Vec<TableEntry<i32>>> {
    let mut parts = payload.into_list()?.into_iter();
    let (Some(codes), Some(lengths), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::CorruptBitstream(
            "Huffman table needs exactly a code and a length payload".to_owned(),
        ));
    };
    let codes = codes.into_bits()?;
    let mut offset = 0;
    let mut table = Vec::new();
    for pair in lengths.into_list()? {
        let (symbol, length) = pair.into_pair()?;
        let length = usize::try_from(length).map_err(|_| {
            Error::CorruptBitstream(format!("negative code length {}", length))
        })?;
        let code = codes.slice(offset, offset + length).ok_or_else(|| {
            Error::CorruptBitstream(format!(
                "code of symbol {} reaches past the {} transmitted bits",
                symbol,
                codes.len()
            ))
        })?;
        offset += length;
        table.push(TableEntry { symbol, code });
    }
    if offset != codes.len() {
        return Err(Error::CorruptBitstream(format!(
            "{} code bits remain unassigned",
            codes.len() - offset
        )));
    }
    Ok(table)
}
