use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    binary_stream::{pack, unpack, BitString},
    error::Error,
    Result,
};

const PAIR_KIND: u8 = 1;
const BITS_KIND: u8 = 2;
const PLAIN_KIND: u8 = 3;
const LIST_KIND: u8 = 4;

/// Lists nest at most this deep, a Huffman table inside the segment list
const MAX_LIST_DEPTH: usize = 2;

/// A typed value of the container stream.
///
/// Every payload starts with one kind byte; all integers are big endian.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    /// two `i32`
    Pair(i32, i32),
    /// `u32` byte count, then the pad-count-prefixed packed bits
    Bits(BitString),
    /// `u32` length, then ASCII
    Plain(String),
    /// `u32` item count, then the items
    List(Vec<Payload>),
}

fn truncated(error: io::Error) -> Error {
    Error::CorruptBitstream(format!("payload is truncated: {}", error))
}

fn length_prefix(length: usize) -> Result<u32> {
    u32::try_from(length).map_err(|_| {
        Error::DimensionMismatch(format!("length {} does not fit the payload header", length))
    })
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Pair(..) => "pair",
            Self::Bits(_) => "bits",
            Self::Plain(_) => "plain",
            Self::List(_) => "list",
        }
    }

    pub fn write_to(&self, output: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::Pair(first, second) => {
                output.write_u8(PAIR_KIND).map_err(Error::FailedToWriteOutput)?;
                output
                    .write_i32::<BigEndian>(*first)
                    .map_err(Error::FailedToWriteOutput)?;
                output
                    .write_i32::<BigEndian>(*second)
                    .map_err(Error::FailedToWriteOutput)?;
            }
            Self::Bits(bits) => {
                let packed = pack(bits)?;
                write_sized(output, BITS_KIND, &packed)?;
            }
            Self::Plain(text) => write_sized(output, PLAIN_KIND, text.as_bytes())?,
            Self::List(items) => {
                output.write_u8(LIST_KIND).map_err(Error::FailedToWriteOutput)?;
                output
                    .write_u32::<BigEndian>(length_prefix(items.len())?)
                    .map_err(Error::FailedToWriteOutput)?;
                for item in items {
                    item.write_to(output)?;
                }
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.write_to(&mut output)?;
        Ok(output)
    }

    pub fn read_from<R: Read>(input: &mut R) -> Result<Payload> {
        Self::read_nested(input, 0)
    }

    fn read_nested<R: Read>(input: &mut R, depth: usize) -> Result<Payload> {
        let kind = input.read_u8().map_err(truncated)?;
        match kind {
            PAIR_KIND => {
                let first = input.read_i32::<BigEndian>().map_err(truncated)?;
                let second = input.read_i32::<BigEndian>().map_err(truncated)?;
                Ok(Self::Pair(first, second))
            }
            BITS_KIND => {
                let bytes = read_sized(input)?;
                Ok(Self::Bits(unpack(&bytes)?))
            }
            PLAIN_KIND => {
                let bytes = read_sized(input)?;
                if !bytes.is_ascii() {
                    return Err(Error::CorruptBitstream(
                        "plain string payload is not ASCII".to_owned(),
                    ));
                }
                String::from_utf8(bytes)
                    .map(Self::Plain)
                    .map_err(|e| Error::CorruptBitstream(e.to_string()))
            }
            LIST_KIND => {
                if depth >= MAX_LIST_DEPTH {
                    return Err(Error::CorruptBitstream(format!(
                        "lists nest deeper than {} levels",
                        MAX_LIST_DEPTH
                    )));
                }
                let count = input.read_u32::<BigEndian>().map_err(truncated)?;
                let mut items = Vec::new();
                for _ in 0..count {
                    items.push(Self::read_nested(input, depth + 1)?);
                }
                Ok(Self::List(items))
            }
            other => Err(Error::CorruptBitstream(format!(
                "unknown payload kind {}",
                other
            ))),
        }
    }

    pub fn into_pair(self) -> Result<(i32, i32)> {
        match self {
            Self::Pair(first, second) => Ok((first, second)),
            other => Err(unexpected("pair", &other)),
        }
    }

    pub fn into_bits(self) -> Result<BitString> {
        match self {
            Self::Bits(bits) => Ok(bits),
            other => Err(unexpected("bits", &other)),
        }
    }

    pub fn into_plain(self) -> Result<String> {
        match self {
            Self::Plain(text) => Ok(text),
            other => Err(unexpected("plain", &other)),
        }
    }

    pub fn into_list(self) -> Result<Vec<Payload>> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(unexpected("list", &other)),
        }
    }
}

fn unexpected(expected: &str, actual: &Payload) -> Error {
    Error::CorruptBitstream(format!(
        "expected a {} payload, found a {} payload",
        expected,
        actual.kind()
    ))
}

fn write_sized(output: &mut Vec<u8>, kind: u8, bytes: &[u8]) -> Result<()> {
    output.write_u8(kind).map_err(Error::FailedToWriteOutput)?;
    output
        .write_u32::<BigEndian>(length_prefix(bytes.len())?)
        .map_err(Error::FailedToWriteOutput)?;
    output.extend_from_slice(bytes);
    Ok(())
}

fn read_sized<R: Read>(input: &mut R) -> Result<Vec<u8>> {
    let length = input.read_u32::<BigEndian>().map_err(truncated)? as u64;
    let mut bytes = Vec::new();
    input
        .by_ref()
        .take(length)
        .read_to_end(&mut bytes)
        .map_err(truncated)?;
    if bytes.len() as u64 != length {
        return Err(Error::CorruptBitstream(format!(
            "payload announces {} bytes but only {} follow",
            length,
            bytes.len()
        )));
    }
    Ok(bytes)
}

#[cfg(test)]
mod test {
    use super::Payload;
    use crate::error::Error;

    #[test]
    fn pair_layout() {
        let bytes = Payload::Pair(1, -2).to_bytes().unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0, 1, 255, 255, 255, 254]);
    }

    #[test]
    fn bits_layout() {
        let bytes = Payload::Bits("000111".parse().unwrap()).to_bytes().unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, 2, 2, 0b0001_1100]);
    }

    #[test]
    fn plain_layout() {
        let bytes = Payload::Plain("HIC".to_owned()).to_bytes().unwrap();
        assert_eq!(bytes, vec![3, 0, 0, 0, 3, b'H', b'I', b'C']);
    }

    #[test]
    fn nested_list_survives_reading() {
        let payload = Payload::List(vec![
            Payload::Plain("haar".to_owned()),
            Payload::List(vec![Payload::Pair(7, 9), Payload::Bits("1".parse().unwrap())]),
            Payload::List(vec![]),
        ]);
        let bytes = payload.to_bytes().unwrap();
        let read = Payload::read_from(&mut bytes.as_slice()).unwrap();
        assert_eq!(read, payload);
    }

    #[test]
    fn consecutive_payloads_read_in_order() {
        let mut bytes = Payload::Pair(3, 4).to_bytes().unwrap();
        bytes.extend(Payload::Plain("x".to_owned()).to_bytes().unwrap());
        let mut input = bytes.as_slice();
        assert_eq!(Payload::read_from(&mut input).unwrap(), Payload::Pair(3, 4));
        assert_eq!(
            Payload::read_from(&mut input).unwrap(),
            Payload::Plain("x".to_owned())
        );
        assert!(input.is_empty());
    }

    #[test]
    fn reject_truncated_payload() {
        let bytes = Payload::Plain("abc".to_owned()).to_bytes().unwrap();
        assert!(matches!(
            Payload::read_from(&mut &bytes[..bytes.len() - 1]),
            Err(Error::CorruptBitstream(_))
        ));
        assert!(matches!(
            Payload::read_from(&mut &[1_u8, 0, 0][..]),
            Err(Error::CorruptBitstream(_))
        ));
    }

    #[test]
    fn reject_deeply_nested_lists() {
        let bytes: Vec<u8> = [4_u8, 0, 0, 0, 1].repeat(100_000);
        assert!(matches!(
            Payload::read_from(&mut bytes.as_slice()),
            Err(Error::CorruptBitstream(_))
        ));
        let three_levels = Payload::List(vec![Payload::List(vec![Payload::List(vec![])])]);
        let bytes = three_levels.to_bytes().unwrap();
        assert!(matches!(
            Payload::read_from(&mut bytes.as_slice()),
            Err(Error::CorruptBitstream(_))
        ));
    }

    #[test]
    fn reject_unknown_kind() {
        assert!(matches!(
            Payload::read_from(&mut &[9_u8][..]),
            Err(Error::CorruptBitstream(_))
        ));
    }

    #[test]
    fn reject_wrong_kind_on_access() {
        assert!(matches!(
            Payload::Pair(1, 2).into_bits(),
            Err(Error::CorruptBitstream(_))
        ));
    }
}
