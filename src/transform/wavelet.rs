pub mod filter;
pub mod quantizer;

use log::debug;

use crate::{error::Error, image::ColorChannel, Result};
pub use filter::Wavelet;

/// Offset subtracted from every sample before the decomposition
pub const BIAS: f64 = 128.0;

/// The three detail subbands of one decomposition level
#[derive(Clone, Debug, PartialEq)]
pub struct DetailLevel<T> {
    pub horizontal: ColorChannel<T>,
    pub vertical: ColorChannel<T>,
    pub diagonal: ColorChannel<T>,
}

impl<T> DetailLevel<T> {
    fn subbands(&self) -> [&ColorChannel<T>; 3] {
        [&self.horizontal, &self.vertical, &self.diagonal]
    }

    fn subbands_mut(&mut self) -> [&mut ColorChannel<T>; 3] {
        [&mut self.horizontal, &mut self.vertical, &mut self.diagonal]
    }
}

/// Approximation plus detail levels, the coarsest level first
#[derive(Clone, Debug, PartialEq)]
pub struct SubbandPyramid<T> {
    pub approximation: ColorChannel<T>,
    pub details: Vec<DetailLevel<T>>,
}

impl<T: Copy> SubbandPyramid<T> {
    pub fn levels(&self) -> usize {
        self.details.len()
    }

    /// `(height, width)` of the approximation
    pub fn smallest_shape(&self) -> (usize, usize) {
        self.approximation.shape()
    }

    /// `(height, width)` of the finest detail subbands
    pub fn largest_shape(&self) -> (usize, usize) {
        self.details
            .last()
            .map(|level| level.horizontal.shape())
            .unwrap_or_else(|| self.approximation.shape())
    }

    /// Approximation first, then horizontal, vertical and diagonal of every
    /// level from coarsest to finest
    pub fn linearize(&self) -> Vec<T> {
        let mut values = self.approximation.dots.clone();
        for level in &self.details {
            for subband in level.subbands() {
                values.extend_from_slice(&subband.dots);
            }
        }
        values
    }

    /// Inverse of [`SubbandPyramid::linearize`] for an approximation of
    /// `smallest_shape` and `levels` detail levels
    pub fn from_linear(
        values: &[T],
        smallest_shape: (usize, usize),
        levels: usize,
    ) -> Result<Self> {
        let (height, width) = smallest_shape;
        let expected = (0..levels).fold(width * height, |sum, level| {
            sum + 3 * (width << level) * (height << level)
        });
        if values.len() != expected {
            return Err(Error::DimensionMismatch(format!(
                "{} subband coefficients do not fill {} levels over a {}x{} approximation",
                values.len(),
                levels,
                width,
                height
            )));
        }
        let mut remaining = values;
        let mut take = |width: usize, height: usize| {
            let (dots, rest) = remaining.split_at(width * height);
            remaining = rest;
            ColorChannel {
                width,
                height,
                dots: dots.to_vec(),
            }
        };
        let approximation = take(width, height);
        let details = (0..levels)
            .map(|level| {
                let (width, height) = (width << level, height << level);
                DetailLevel {
                    horizontal: take(width, height),
                    vertical: take(width, height),
                    diagonal: take(width, height),
                }
            })
            .collect();
        Ok(Self {
            approximation,
            details,
        })
    }

    /// Applies `approximation` to the approximation and `detail` to every
    /// detail coefficient together with its level counted from the finest
    pub fn map<U: Copy>(
        &self,
        approximation: impl Fn(T) -> U,
        detail: impl Fn(usize, T) -> U,
    ) -> SubbandPyramid<U> {
        let levels = self.levels();
        SubbandPyramid {
            approximation: self.approximation.map(approximation),
            details: self
                .details
                .iter()
                .enumerate()
                .map(|(index, level)| {
                    let level_from_finest = levels - 1 - index;
                    let f = |value| detail(level_from_finest, value);
                    DetailLevel {
                        horizontal: level.horizontal.map(f),
                        vertical: level.vertical.map(f),
                        diagonal: level.diagonal.map(f),
                    }
                })
                .collect(),
        }
    }

    pub fn detail_values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.details
            .iter_mut()
            .flat_map(|level| level.subbands_mut())
            .flat_map(|subband| subband.dots.iter_mut())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        let Self {
            approximation,
            details,
        } = self;
        approximation.dots.iter_mut().chain(
            details
                .iter_mut()
                .flat_map(|level| level.subbands_mut())
                .flat_map(|subband| subband.dots.iter_mut()),
        )
    }
}

fn columns_of(channel: &ColorChannel<f64>) -> impl Iterator<Item = Vec<f64>> + '_ {
    (0..channel.width).map(|column_index| channel.column(column_index))
}

fn from_columns(columns: Vec<Vec<f64>>, height: usize) -> ColorChannel<f64> {
    let width = columns.len();
    let mut channel = ColorChannel::filled(width, height, 0.0);
    for (column_index, column) in columns.into_iter().enumerate() {
        for (row_index, value) in column.into_iter().enumerate() {
            channel.set_dot(column_index, row_index, value);
        }
    }
    channel
}

fn from_rows(rows: Vec<Vec<f64>>, width: usize) -> ColorChannel<f64> {
    let height = rows.len();
    ColorChannel {
        width,
        height,
        dots: rows.into_iter().flatten().collect(),
    }
}

pub struct WaveletTransform {
    wavelet: Wavelet,
    levels: usize,
}

impl WaveletTransform {
    pub fn new(wavelet: Wavelet, levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(Error::InvalidSettings("wavelet levels must be at least 1"));
        }
        Ok(Self { wavelet, levels })
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    /// One level: rows into low|high, then the columns of both halves.
    /// Columns of the row low pass give approximation and horizontal detail,
    /// columns of the row high pass give vertical and diagonal detail.
    fn analyze_level(&self, channel: &ColorChannel<f64>) -> (ColorChannel<f64>, DetailLevel<f64>) {
        let half_width = channel.width / 2;
        let half_height = channel.height / 2;
        let (row_lows, row_highs): (Vec<_>, Vec<_>) = (0..channel.height)
            .map(|row_index| self.wavelet.analyze(channel.row(row_index)))
            .unzip();
        let row_low = from_rows(row_lows, half_width);
        let row_high = from_rows(row_highs, half_width);
        let split_columns = |half: &ColorChannel<f64>| {
            let (lows, highs): (Vec<_>, Vec<_>) = columns_of(half)
                .map(|column| self.wavelet.analyze(&column))
                .unzip();
            (
                from_columns(lows, half_height),
                from_columns(highs, half_height),
            )
        };
        let (approximation, horizontal) = split_columns(&row_low);
        let (vertical, diagonal) = split_columns(&row_high);
        (
            approximation,
            DetailLevel {
                horizontal,
                vertical,
                diagonal,
            },
        )
    }

    fn synthesize_level(
        &self,
        approximation: &ColorChannel<f64>,
        level: &DetailLevel<f64>,
    ) -> ColorChannel<f64> {
        let height = approximation.height * 2;
        let width = approximation.width * 2;
        let merge_columns = |low: &ColorChannel<f64>, high: &ColorChannel<f64>| {
            let columns = columns_of(low)
                .zip(columns_of(high))
                .map(|(low, high)| self.wavelet.synthesize(&low, &high))
                .collect();
            from_columns(columns, height)
        };
        let row_low = merge_columns(approximation, &level.horizontal);
        let row_high = merge_columns(&level.vertical, &level.diagonal);
        let rows = (0..height)
            .map(|row_index| {
                self.wavelet
                    .synthesize(row_low.row(row_index), row_high.row(row_index))
            })
            .collect();
        from_rows(rows, width)
    }

    /// Edge lengths divisible by `2^levels`
    fn padded_edge(&self, edge: usize) -> usize {
        let multiple = 1 << self.levels;
        edge.div_ceil(multiple) * multiple
    }

    /// Subtracts the bias, zero pads and decomposes `levels` times
    pub fn forward(&self, channel: &ColorChannel<f64>) -> SubbandPyramid<f64> {
        let mut approximation = channel.map(|dot| dot - BIAS).padded(
            self.padded_edge(channel.width),
            self.padded_edge(channel.height),
            0.0,
        );
        debug!(
            "Decomposing a {}x{} channel over {} levels with {}",
            approximation.width, approximation.height, self.levels, self.wavelet
        );
        let mut details = Vec::with_capacity(self.levels);
        for _ in 0..self.levels {
            let (next, level) = self.analyze_level(&approximation);
            details.push(level);
            approximation = next;
        }
        details.reverse();
        SubbandPyramid {
            approximation,
            details,
        }
    }

    /// Recomposes, crops to `width` x `height` and adds the bias back
    pub fn inverse(
        &self,
        pyramid: &SubbandPyramid<f64>,
        width: usize,
        height: usize,
    ) -> Result<ColorChannel<f64>> {
        if pyramid.levels() != self.levels {
            return Err(Error::DimensionMismatch(format!(
                "pyramid has {} levels instead of {}",
                pyramid.levels(),
                self.levels
            )));
        }
        let mut approximation = pyramid.approximation.clone();
        for level in &pyramid.details {
            if level.horizontal.shape() != approximation.shape() {
                return Err(Error::DimensionMismatch(format!(
                    "detail shape {:?} does not match approximation shape {:?}",
                    level.horizontal.shape(),
                    approximation.shape()
                )));
            }
            approximation = self.synthesize_level(&approximation, level);
        }
        if approximation.width < width || approximation.height < height {
            return Err(Error::DimensionMismatch(format!(
                "{}x{} channel is smaller than the expected {}x{}",
                approximation.width, approximation.height, width, height
            )));
        }
        Ok(approximation.cropped(width, height).map(|dot| dot + BIAS))
    }
}

/// Number of levels and subband shapes implied by the smallest and largest
/// persisted subband shapes
pub fn derive_levels(
    smallest_shape: (usize, usize),
    largest_shape: (usize, usize),
) -> Result<(usize, Vec<(usize, usize)>)> {
    let (smallest_height, smallest_width) = smallest_shape;
    let (largest_height, largest_width) = largest_shape;
    let mismatch = || {
        Error::DimensionMismatch(format!(
            "subband shapes {:?} and {:?} are not related by a power of two",
            smallest_shape, largest_shape
        ))
    };
    if smallest_height == 0 || smallest_width == 0 || largest_height % smallest_height != 0 {
        return Err(mismatch());
    }
    let ratio = largest_height / smallest_height;
    if !ratio.is_power_of_two() || largest_width != smallest_width * ratio {
        return Err(mismatch());
    }
    let depth = ratio.trailing_zeros() as usize;
    let shapes = (0..=depth)
        .map(|i| (smallest_height << i, smallest_width << i))
        .collect();
    Ok((depth + 1, shapes))
}
