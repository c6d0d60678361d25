use std::io::{self, Bytes, Read, Write};

use super::Image;
use crate::color::{RGBColorFormat, RangeColorFormat};
use crate::error::Error;

/// Whitespace separated tokens of a PPM stream, without `#` comments.
///
/// Reading stops at the first IO error.
pub struct PPMTokenizer<R: Read> {
    bytes: Bytes<R>,
}

impl<R: Read> PPMTokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
        }
    }
}

impl<R: Read> Iterator for PPMTokenizer<R> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut token = String::new();
        let mut in_comment = false;
        while let Some(Ok(byte)) = self.bytes.next() {
            match byte {
                b'\n' if in_comment => in_comment = false,
                _ if in_comment => {}
                b'#' => in_comment = true,
                _ if byte.is_ascii_whitespace() => {
                    if !token.is_empty() {
                        break;
                    }
                }
                _ => token.push(char::from(byte)),
            }
        }
        (!token.is_empty()).then_some(token)
    }
}

pub struct PPMParser;

impl PPMParser {
    fn header_value(
        tokens: &mut impl Iterator<Item = String>,
        token_name: &'static str,
    ) -> crate::Result<u16> {
        tokens
            .next()
            .ok_or(Error::PPMFileDoesNotContainRequiredToken(token_name))?
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(token_name))
    }

    /// Reads a plain `P3` image; component values are rescaled from the
    /// header's max value to 8 bit.
    pub fn parse(mut tokens: impl Iterator<Item = String>) -> crate::Result<Image> {
        if tokens.next().as_deref() != Some("P3") {
            return Err(Error::PPMFileDoesNotContainRequiredToken("P3 magic number"));
        }
        let width = usize::from(Self::header_value(&mut tokens, "width")?);
        let height = usize::from(Self::header_value(&mut tokens, "height")?);
        let max = Self::header_value(&mut tokens, "max value")?;

        let components = tokens
            .map(|token| {
                token
                    .parse::<u16>()
                    .map_err(|_| Error::ParsingOfTokenFailed("color component"))
            })
            .collect::<crate::Result<Vec<u16>>>()?;
        let leftover = components.len() % 3;
        if leftover != 0 {
            return Err(Error::IncompletePixelParsed(leftover));
        }
        if components.len() / 3 != width * height {
            return Err(Error::MismatchOfSizeBetweenHeaderAndValues);
        }
        let pixels = components
            .chunks_exact(3)
            .map(|rgb| {
                RangeColorFormat::new(max, rgb[0], rgb[1], rgb[2])
                    .map(|color| RGBColorFormat::from(&color))
            })
            .collect::<crate::Result<Vec<_>>>()?;
        Image::new(width, height, pixels)
    }
}

/// Writes `image` as plain `P3` with a max value of 255, one row per line
pub fn write_ppm<W: Write>(writer: &mut W, image: &Image) -> crate::Result<()> {
    let mut write = || -> io::Result<()> {
        write!(writer, "P3\n{} {}\n255\n", image.width(), image.height())?;
        for row in image.pixels().chunks(image.width()) {
            for (index, pixel) in row.iter().enumerate() {
                let separator = if index == 0 { "" } else { "  " };
                write!(
                    writer,
                    "{}{} {} {}",
                    separator, pixel.red, pixel.green, pixel.blue
                )?;
            }
            writeln!(writer)?;
        }
        writer.flush()
    };
    write().map_err(Error::FailedToWriteOutput)
}

#[cfg(test)]
mod test {
    use super::{write_ppm, PPMParser, PPMTokenizer};
    use crate::error::Error;
    use crate::image::Image;

    fn parse(text: &str) -> crate::Result<Image> {
        PPMParser::parse(PPMTokenizer::new(text.as_bytes()))
    }

    #[test]
    fn tokens_skip_comments() {
        let tokens: Vec<String> = PPMTokenizer::new("P3 # two\n# lines\n 1\t2\n".as_bytes()).collect();
        assert_eq!(tokens, vec!["P3", "1", "2"]);
    }

    #[test]
    fn read_with_comment_and_line_breaks() {
        let image = parse("P3\n# a 3x2 image\n3 2\n255\n255 0 0  0 255 0  0 0 255\n9 9 9  8 8 8  7 7 7\n").unwrap();
        assert_eq!((image.width(), image.height()), (3, 2));
        assert_eq!(image.pixels()[1].green, 255);
        assert_eq!(image.pixels()[5].blue, 7);
    }

    #[test]
    fn read_single_line() {
        let image = parse("P3 2 1 255 1 2 3 4 5 6").unwrap();
        assert_eq!(image.pixels()[1].red, 4);
    }

    #[test]
    fn read_rescales_to_eight_bit() {
        let image = parse("P3 1 1 15 2 5 15").unwrap();
        let pixel = image.pixels()[0];
        assert_eq!((pixel.red, pixel.green, pixel.blue), (34, 85, 255));
    }

    #[test]
    fn reject_other_magic_number() {
        assert!(matches!(
            parse("P6 1 1 255 0 0 0"),
            Err(Error::PPMFileDoesNotContainRequiredToken(_))
        ));
    }

    #[test]
    fn reject_incomplete_pixel() {
        assert!(matches!(
            parse("P3\n3 2 255 0 0 255 0 0"),
            Err(Error::IncompletePixelParsed(2))
        ));
    }

    #[test]
    fn reject_wrong_pixel_count() {
        assert!(matches!(
            parse("P3\n3 2 255 0 0 255"),
            Err(Error::MismatchOfSizeBetweenHeaderAndValues)
        ));
    }

    #[test]
    fn reject_value_above_max() {
        assert!(matches!(
            parse("P3 1 1 100 0 101 0"),
            Err(Error::ColorValueOutOfRange(101, 100))
        ));
    }

    #[test]
    fn written_image_reads_back() {
        let image = parse("P3 2 2 255 1 2 3  4 5 6  7 8 9  250 251 252").unwrap();
        let mut output = Vec::new();
        write_ppm(&mut output, &image).unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("P3\n2 2\n255\n1 2 3  4 5 6\n"));
        assert_eq!(parse(&text).unwrap(), image);
    }
}
