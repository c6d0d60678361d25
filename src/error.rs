use std::fmt::Display;

#[derive(Debug)]
pub enum Error {
    InvalidFrequencyTable(&'static str),
    SymbolNotPresentInTree(String),
    UnknownCodecType(String),
    DimensionMismatch(String),
    CorruptBitstream(String),
    AlignmentViolation(usize),
    InvalidSettings(&'static str),
    EmptyImage,
    ChannelWorkerFailed,
    ColorValueOutOfRange(u16, u16),
    PPMFileDoesNotContainRequiredToken(&'static str),
    ParsingOfTokenFailed(&'static str),
    IncompletePixelParsed(usize),
    MismatchOfSizeBetweenHeaderAndValues,
    UnableToOpenInputFileForReading(String, std::io::Error),
    UnableToOpenOutputFileForWriting(String, std::io::Error),
    FailedToReadInput(std::io::Error),
    FailedToWriteOutput(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFrequencyTable(reason) => {
                write!(f, "Invalid Huffman frequency table: {}", reason)
            }
            Self::SymbolNotPresentInTree(symbol) => {
                write!(f, "Symbol '{}' is not present in the Huffman tree", symbol)
            }
            Self::UnknownCodecType(tag) => {
                write!(f, "Container type tag '{}' is not a known codec", tag)
            }
            Self::DimensionMismatch(details) => {
                write!(f, "Dimension mismatch: {}", details)
            }
            Self::CorruptBitstream(details) => {
                write!(f, "Corrupt bitstream: {}", details)
            }
            Self::AlignmentViolation(length) => {
                write!(
                    f,
                    "Bit string of length {} is not aligned to a multiple of 8",
                    length
                )
            }
            Self::InvalidSettings(reason) => write!(f, "Invalid settings: {}", reason),
            Self::EmptyImage => write!(f, "Image must have a width and height of at least 1"),
            Self::ChannelWorkerFailed => {
                write!(f, "A channel worker terminated without reporting a result")
            }
            Self::ColorValueOutOfRange(value, max) => {
                write!(
                    f,
                    "Color value {} is greater than the max value of {}",
                    value, max
                )
            }
            Self::PPMFileDoesNotContainRequiredToken(token_name) => {
                write!(f, "Expected token '{}' not found in PPM file", token_name)
            }
            Self::ParsingOfTokenFailed(token_name) => {
                write!(f, "Parsing of token '{}' failed", token_name)
            }
            Self::IncompletePixelParsed(number_of_tokens_parsed) => {
                write!(
                    f,
                    "Incomplete pixel parsed. Expected 3 components, but got {}.",
                    number_of_tokens_parsed
                )
            }
            Self::MismatchOfSizeBetweenHeaderAndValues => {
                write!(
                    f,
                    "Number of pixels does not match the size provided in header"
                )
            }
            Self::UnableToOpenInputFileForReading(path, error) => {
                write!(
                    f,
                    "Unable to open input file '{}' for reading: {}",
                    path, error
                )
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path, error
                )
            }
            Self::FailedToReadInput(error) => write!(f, "Failed to read input: {}", error),
            Self::FailedToWriteOutput(error) => write!(f, "Failed to write output: {}", error),
        }
    }
}

impl std::error::Error for Error {}
