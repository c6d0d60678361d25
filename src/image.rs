use crate::{
    color::{RGBColorFormat, YCbCrColorFormat},
    error::Error,
    Result,
};

pub mod ppm;
pub mod subsampling;

/// An 8 bit RGB pixel buffer in row-major order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<RGBColorFormat<u8>>,
}

impl Image {
    pub fn new(width: usize, height: usize, pixels: Vec<RGBColorFormat<u8>>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage);
        }
        if pixels.len() != width * height {
            return Err(Error::MismatchOfSizeBetweenHeaderAndValues);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[RGBColorFormat<u8>] {
        &self.pixels
    }

    /// Splits the image into luma and the two chroma planes
    pub fn to_channels(&self) -> ColorChannels<f64> {
        let mut luma = Vec::with_capacity(self.pixels.len());
        let mut chroma_blue = Vec::with_capacity(self.pixels.len());
        let mut chroma_red = Vec::with_capacity(self.pixels.len());
        for pixel in &self.pixels {
            let converted = YCbCrColorFormat::<f64>::from(pixel);
            luma.push(converted.luma);
            chroma_blue.push(converted.chroma_blue);
            chroma_red.push(converted.chroma_red);
        }
        let channel = |dots| ColorChannel {
            width: self.width,
            height: self.height,
            dots,
        };
        ColorChannels {
            luma: channel(luma),
            chroma_blue: channel(chroma_blue),
            chroma_red: channel(chroma_red),
        }
    }

    /// Merges three planes of identical shape back into RGB
    pub fn from_channels(channels: &ColorChannels<f64>) -> Result<Self> {
        let shape = channels.luma.shape();
        for channel in channels.iter().skip(1) {
            if channel.shape() != shape {
                return Err(Error::DimensionMismatch(format!(
                    "chroma shape {:?} differs from luma shape {:?}",
                    channel.shape(),
                    shape
                )));
            }
        }
        let pixels = channels
            .luma
            .dots
            .iter()
            .zip(&channels.chroma_blue.dots)
            .zip(&channels.chroma_red.dots)
            .map(|((&luma, &chroma_blue), &chroma_red)| {
                RGBColorFormat::from(&YCbCrColorFormat {
                    luma,
                    chroma_blue,
                    chroma_red,
                })
            })
            .collect();
        Self::new(channels.luma.width, channels.luma.height, pixels)
    }
}

/// One plane of values in row-major order
#[derive(Clone, Debug, PartialEq)]
pub struct ColorChannel<T> {
    pub width: usize,
    pub height: usize,
    pub dots: Vec<T>,
}

impl<T: Copy> ColorChannel<T> {
    pub fn new(width: usize, height: usize, dots: Vec<T>) -> Result<Self> {
        if dots.len() != width * height {
            return Err(Error::DimensionMismatch(format!(
                "{} values do not fill a {}x{} channel",
                dots.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            dots,
        })
    }

    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            dots: vec![value; width * height],
        }
    }

    /// `(height, width)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn dot(&self, column_index: usize, row_index: usize) -> T {
        self.dots[column_index + row_index * self.width]
    }

    pub fn set_dot(&mut self, column_index: usize, row_index: usize, value: T) {
        self.dots[column_index + row_index * self.width] = value;
    }

    pub fn row(&self, row_index: usize) -> &[T] {
        let start = row_index * self.width;
        &self.dots[start..start + self.width]
    }

    pub fn column(&self, column_index: usize) -> Vec<T> {
        (0..self.height)
            .map(|row_index| self.dot(column_index, row_index))
            .collect()
    }

    /// Extends to `width` x `height` with trailing columns and rows of `fill`
    pub fn padded(&self, width: usize, height: usize, fill: T) -> Self {
        let mut output = Self::filled(width.max(self.width), height.max(self.height), fill);
        for row_index in 0..self.height {
            let start = row_index * output.width;
            output.dots[start..start + self.width].copy_from_slice(self.row(row_index));
        }
        output
    }

    /// Keeps the top left `width` x `height` corner
    pub fn cropped(&self, width: usize, height: usize) -> Self {
        let width = width.min(self.width);
        let height = height.min(self.height);
        let mut dots = Vec::with_capacity(width * height);
        for row_index in 0..height {
            dots.extend_from_slice(&self.row(row_index)[..width]);
        }
        Self {
            width,
            height,
            dots,
        }
    }

    pub fn map<U>(&self, f: impl Fn(T) -> U) -> ColorChannel<U> {
        ColorChannel {
            width: self.width,
            height: self.height,
            dots: self.dots.iter().map(|&dot| f(dot)).collect(),
        }
    }
}

/// The three planes of one image, always in luma, chroma blue, chroma red order
#[derive(Clone, Debug, PartialEq)]
pub struct ColorChannels<T> {
    pub luma: ColorChannel<T>,
    pub chroma_blue: ColorChannel<T>,
    pub chroma_red: ColorChannel<T>,
}

pub const CHANNEL_NAMES: [&str; 3] = ["luma", "chroma blue", "chroma red"];

impl<T> ColorChannels<T> {
    pub fn iter(&self) -> impl Iterator<Item = &ColorChannel<T>> {
        [&self.luma, &self.chroma_blue, &self.chroma_red].into_iter()
    }

    pub fn into_array(self) -> [ColorChannel<T>; 3] {
        [self.luma, self.chroma_blue, self.chroma_red]
    }

    pub fn from_array(channels: [ColorChannel<T>; 3]) -> Self {
        let [luma, chroma_blue, chroma_red] = channels;
        Self {
            luma,
            chroma_blue,
            chroma_red,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ColorChannel, Image};
    use crate::color::RGBColorFormat;
    use crate::error::Error;

    #[rustfmt::skip]
    const TEST_CHANNEL_ONE: &[f64] = &[
         1.0,  2.0,  3.0,
         4.0,  5.0,  6.0,
    ];

    fn test_channel() -> ColorChannel<f64> {
        ColorChannel::new(3, 2, Vec::from(TEST_CHANNEL_ONE)).unwrap()
    }

    #[test]
    fn dot_and_column_access() {
        let channel = test_channel();
        assert_eq!(channel.dot(2, 1), 6.0);
        assert_eq!(channel.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(channel.column(1), vec![2.0, 5.0]);
        assert_eq!(channel.shape(), (2, 3));
    }

    #[test]
    fn pad_with_trailing_values() {
        let padded = test_channel().padded(4, 3, 0.0);
        #[rustfmt::skip]
        let expected = vec![
            1.0, 2.0, 3.0, 0.0,
            4.0, 5.0, 6.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ];
        assert_eq!(padded.dots, expected);
        assert_eq!(padded.cropped(3, 2), test_channel());
    }

    #[test]
    fn reject_channel_of_wrong_length() {
        assert!(matches!(
            ColorChannel::new(3, 3, Vec::from(TEST_CHANNEL_ONE)),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn split_and_merge_image() {
        let pixels = (0..6)
            .map(|i| RGBColorFormat {
                red: i * 40,
                green: 255 - i * 30,
                blue: i * i,
            })
            .collect();
        let image = Image::new(3, 2, pixels).unwrap();
        let channels = image.to_channels();
        assert_eq!(channels.chroma_red.shape(), (2, 3));
        let merged = Image::from_channels(&channels).unwrap();
        assert_eq!(merged, image);
    }

    #[test]
    fn reject_empty_image() {
        assert!(matches!(Image::new(0, 4, vec![]), Err(Error::EmptyImage)));
    }
}
