use std::{
    fs::{File, OpenOptions},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

pub use cli::CLIParser;
pub use codec::{decode, encode};
pub use container::CodecType;
use error::Error;
pub use image::Image;
use image::ppm::{write_ppm, PPMParser, PPMTokenizer};
pub use settings::Settings;

pub mod binary_stream;
mod cli;
pub mod codec;
pub mod color;
pub mod container;
pub mod cosine_transform;
pub mod error;
pub mod huffman;
pub mod image;
mod logger;
pub mod run_length;
pub mod settings;
pub mod transform;

pub type Result<T> = std::result::Result<T, error::Error>;

pub struct Arguments {
    input_file: PathBuf,
    output_file: PathBuf,
    decompress: bool,
    codec_type: CodecType,
    settings: Settings,
}

fn open_input_file(file_path: &Path) -> Result<File> {
    File::open(file_path).map_err(|e| {
        Error::UnableToOpenInputFileForReading(file_path.display().to_string(), e)
    })
}

fn open_output_file(file_path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_path)
        .map_err(|e| {
            Error::UnableToOpenOutputFileForWriting(file_path.display().to_string(), e)
        })
}

/// Compresses a PPM file, or restores one with `--decompress`
pub fn run(arguments: &Arguments) -> Result<()> {
    if arguments.decompress {
        decompress_file(arguments)
    } else {
        compress_file(arguments)
    }
}

fn compress_file(arguments: &Arguments) -> Result<()> {
    let input_file = open_input_file(&arguments.input_file)?;
    let image = PPMParser::parse(PPMTokenizer::new(BufReader::new(&input_file)))?;
    let bytes = encode(&image, arguments.codec_type, &arguments.settings)?;
    let mut output_file = open_output_file(&arguments.output_file)?;
    output_file
        .write_all(&bytes)
        .map_err(Error::FailedToWriteOutput)
}

fn decompress_file(arguments: &Arguments) -> Result<()> {
    let mut bytes = Vec::new();
    BufReader::new(open_input_file(&arguments.input_file)?)
        .read_to_end(&mut bytes)
        .map_err(Error::FailedToReadInput)?;
    let image = decode(&bytes, &arguments.settings)?;
    let output_file = open_output_file(&arguments.output_file)?;
    let mut output_file_writer = BufWriter::new(&output_file);
    write_ppm(&mut output_file_writer, &image)?;
    output_file_writer.flush().map_err(Error::FailedToWriteOutput)
}
