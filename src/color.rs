use crate::{error::Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RGBColorFormat<T> {
    pub red: T,
    pub green: T,
    pub blue: T,
}

/// A color whose components share an arbitrary maximum, as read from a PPM file
pub struct RangeColorFormat<T> {
    max: T,
    red: T,
    green: T,
    blue: T,
}

/// Full range YCbCr with chroma centered on 128
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YCbCrColorFormat<T> {
    pub luma: T,
    pub chroma_blue: T,
    pub chroma_red: T,
}

impl RangeColorFormat<u16> {
    pub fn new(max: u16, red: u16, green: u16, blue: u16) -> Result<Self> {
        for value in [red, green, blue] {
            if value > max {
                return Err(Error::ColorValueOutOfRange(value, max));
            }
        }
        Ok(RangeColorFormat {
            max,
            red,
            green,
            blue,
        })
    }
}

fn scale_to_byte(value: u16, max: u16) -> u8 {
    if max == 0 {
        return 0;
    }
    (value as f64 * 255.0 / max as f64).round() as u8
}

impl From<&RangeColorFormat<u16>> for RGBColorFormat<u8> {
    fn from(value: &RangeColorFormat<u16>) -> Self {
        RGBColorFormat {
            red: scale_to_byte(value.red, value.max),
            green: scale_to_byte(value.green, value.max),
            blue: scale_to_byte(value.blue, value.max),
        }
    }
}

impl From<&RGBColorFormat<u8>> for YCbCrColorFormat<f64> {
    fn from(value: &RGBColorFormat<u8>) -> Self {
        let red = value.red as f64;
        let green = value.green as f64;
        let blue = value.blue as f64;

        let luma = 0.299 * red + 0.587 * green + 0.114 * blue;
        let chroma_blue = 128.0 - 0.168736 * red - 0.331264 * green + 0.5 * blue;
        let chroma_red = 128.0 + 0.5 * red - 0.418688 * green - 0.081312 * blue;

        YCbCrColorFormat {
            luma,
            chroma_blue,
            chroma_red,
        }
    }
}

fn clamp_to_byte(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

impl From<&YCbCrColorFormat<f64>> for RGBColorFormat<u8> {
    fn from(value: &YCbCrColorFormat<f64>) -> Self {
        let chroma_blue = value.chroma_blue - 128.0;
        let chroma_red = value.chroma_red - 128.0;

        RGBColorFormat {
            red: clamp_to_byte(value.luma + 1.402 * chroma_red),
            green: clamp_to_byte(value.luma - 0.344136 * chroma_blue - 0.714136 * chroma_red),
            blue: clamp_to_byte(value.luma + 1.772 * chroma_blue),
        }
    }
}
